//! Static registry tables for the municipal-finance schema.
//!
//! Ordering invariant: `ENTITIES` follows the `Entity` discriminant order so
//! `Catalog::describe` can index directly.

use super::{Entity, EntityDescriptor, FieldDescriptor, FieldType, RelationDescriptor};

const MUNICIPALITY_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("id", FieldType::Text),
    FieldDescriptor::new("name", FieldType::Text).groupable(),
    FieldDescriptor::new("country", FieldType::Text).groupable(),
    FieldDescriptor::new("region", FieldType::Text).groupable(),
    FieldDescriptor::new("locale", FieldType::Text),
    FieldDescriptor::new("timezone", FieldType::Text),
];

const FISCAL_YEAR_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("id", FieldType::Text),
    FieldDescriptor::new("year", FieldType::Int).groupable(),
    FieldDescriptor::new("status", FieldType::Text).groupable(),
    FieldDescriptor::new("lockedAt", FieldType::Date),
];

const BUDGET_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("id", FieldType::Text),
    FieldDescriptor::new("municipalityId", FieldType::Ref(Entity::Municipality)),
    FieldDescriptor::new("fiscalYearId", FieldType::Ref(Entity::FiscalYear)).groupable(),
    FieldDescriptor::new("department", FieldType::Text).groupable(),
    FieldDescriptor::new("program", FieldType::Text).groupable(),
    FieldDescriptor::new("category", FieldType::Text).groupable(),
    FieldDescriptor::new("subcategory", FieldType::Text).groupable(),
    FieldDescriptor::new("amountPlanned", FieldType::Decimal).aggregatable(),
    FieldDescriptor::new("currency", FieldType::Text).groupable(),
    FieldDescriptor::new("notes", FieldType::Text).unqueryable(),
];

const EXPENDITURE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("id", FieldType::Text),
    FieldDescriptor::new("municipalityId", FieldType::Ref(Entity::Municipality)),
    FieldDescriptor::new("fiscalYearId", FieldType::Ref(Entity::FiscalYear)).groupable(),
    FieldDescriptor::new("date", FieldType::Date).groupable(),
    FieldDescriptor::new("department", FieldType::Text).groupable(),
    FieldDescriptor::new("program", FieldType::Text).groupable(),
    FieldDescriptor::new("category", FieldType::Text).groupable(),
    FieldDescriptor::new("subcategory", FieldType::Text).groupable(),
    FieldDescriptor::new("concept", FieldType::Text),
    FieldDescriptor::new("amountActual", FieldType::Decimal).aggregatable(),
    FieldDescriptor::new("currency", FieldType::Text).groupable(),
    FieldDescriptor::new("supplierId", FieldType::Ref(Entity::Supplier)),
    FieldDescriptor::new("procurementRef", FieldType::Text),
    FieldDescriptor::new("location", FieldType::Text).groupable(),
];

const PROJECT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("id", FieldType::Text),
    FieldDescriptor::new("municipalityId", FieldType::Ref(Entity::Municipality)),
    FieldDescriptor::new("title", FieldType::Text),
    FieldDescriptor::new("status", FieldType::Text).groupable(),
    FieldDescriptor::new("startDate", FieldType::Date),
    FieldDescriptor::new("endDate", FieldType::Date),
    FieldDescriptor::new("department", FieldType::Text).groupable(),
    FieldDescriptor::new("category", FieldType::Text).groupable(),
    FieldDescriptor::new("requestedBudget", FieldType::Decimal).aggregatable(),
    FieldDescriptor::new("approvedBudget", FieldType::Decimal).aggregatable(),
    FieldDescriptor::new("fundingSourceId", FieldType::Ref(Entity::FundingSource)),
    FieldDescriptor::new("location", FieldType::Text).groupable(),
];

const FUNDING_SOURCE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("id", FieldType::Text),
    FieldDescriptor::new("name", FieldType::Text).groupable(),
    FieldDescriptor::new("type", FieldType::Text).groupable(),
    FieldDescriptor::new("description", FieldType::Text).unqueryable(),
];

const SUPPLIER_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("id", FieldType::Text),
    FieldDescriptor::new("name", FieldType::Text).groupable(),
    FieldDescriptor::new("taxId", FieldType::Text),
    FieldDescriptor::new("sector", FieldType::Text).groupable(),
    FieldDescriptor::new("locality", FieldType::Text).groupable(),
];

const DATASET_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("id", FieldType::Text),
    FieldDescriptor::new("name", FieldType::Text).groupable(),
    FieldDescriptor::new("loadedAt", FieldType::Date),
];

const BUDGET_RELATIONS: &[RelationDescriptor] = &[RelationDescriptor::new(
    "fiscalYear",
    "fiscalYearId",
    Entity::FiscalYear,
)];

const EXPENDITURE_RELATIONS: &[RelationDescriptor] = &[
    RelationDescriptor::new("fiscalYear", "fiscalYearId", Entity::FiscalYear),
    RelationDescriptor::new("supplier", "supplierId", Entity::Supplier),
];

const PROJECT_RELATIONS: &[RelationDescriptor] = &[RelationDescriptor::new(
    "fundingSource",
    "fundingSourceId",
    Entity::FundingSource,
)];

pub(super) const ENTITIES: &[EntityDescriptor] = &[
    EntityDescriptor {
        entity: Entity::Municipality,
        tenant_field: Some("id"),
        dataset: "municipalities",
        fields: MUNICIPALITY_FIELDS,
        relations: &[],
    },
    EntityDescriptor {
        entity: Entity::FiscalYear,
        tenant_field: None,
        dataset: "fiscal_years",
        fields: FISCAL_YEAR_FIELDS,
        relations: &[],
    },
    EntityDescriptor {
        entity: Entity::Budget,
        tenant_field: Some("municipalityId"),
        dataset: "budgets",
        fields: BUDGET_FIELDS,
        relations: BUDGET_RELATIONS,
    },
    EntityDescriptor {
        entity: Entity::Expenditure,
        tenant_field: Some("municipalityId"),
        dataset: "expenditures",
        fields: EXPENDITURE_FIELDS,
        relations: EXPENDITURE_RELATIONS,
    },
    EntityDescriptor {
        entity: Entity::Project,
        tenant_field: Some("municipalityId"),
        dataset: "projects",
        fields: PROJECT_FIELDS,
        relations: PROJECT_RELATIONS,
    },
    EntityDescriptor {
        entity: Entity::FundingSource,
        tenant_field: None,
        dataset: "funding_sources",
        fields: FUNDING_SOURCE_FIELDS,
        relations: &[],
    },
    EntityDescriptor {
        entity: Entity::Supplier,
        tenant_field: None,
        dataset: "suppliers",
        fields: SUPPLIER_FIELDS,
        relations: &[],
    },
    EntityDescriptor {
        entity: Entity::Dataset,
        tenant_field: None,
        dataset: "datasets",
        fields: DATASET_FIELDS,
        relations: &[],
    },
];
