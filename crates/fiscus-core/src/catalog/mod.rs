mod registry;


use crate::{error::ValidateError, value::Value};
use serde::Serialize;
use std::fmt;

///
/// Entity
///
/// Closed set of queryable entities. Raw entity names from the intent layer
/// resolve through [`Entity::parse`]; past that boundary an unknown entity
/// is unrepresentable.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Entity {
    Municipality,
    FiscalYear,
    Budget,
    Expenditure,
    Project,
    FundingSource,
    Supplier,
    Dataset,
}

impl Entity {
    pub const ALL: [Self; 8] = [
        Self::Municipality,
        Self::FiscalYear,
        Self::Budget,
        Self::Expenditure,
        Self::Project,
        Self::FundingSource,
        Self::Supplier,
        Self::Dataset,
    ];

    /// Canonical entity name as it appears in intents and audit records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Municipality => "Municipality",
            Self::FiscalYear => "FiscalYear",
            Self::Budget => "Budget",
            Self::Expenditure => "Expenditure",
            Self::Project => "Project",
            Self::FundingSource => "FundingSource",
            Self::Supplier => "Supplier",
            Self::Dataset => "Dataset",
        }
    }

    /// Resolve a raw entity name, failing with `UnknownEntity` otherwise.
    pub fn parse(name: &str) -> Result<Self, ValidateError> {
        Self::ALL
            .into_iter()
            .find(|entity| entity.as_str() == name)
            .ok_or_else(|| ValidateError::UnknownEntity {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

///
/// FieldType
///
/// Declared storage type of a catalog field. Identifier and foreign-key
/// fields are `Ref`; monetary fields are `Decimal` and are the only
/// aggregatable kind.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldType {
    Text,
    Int,
    Decimal,
    Date,
    Bool,
    Ref(Entity),
}

impl FieldType {
    /// Whether a scalar literal agrees with this declared type.
    ///
    /// `Int` literals widen into `Decimal` fields; the reverse narrowing is
    /// rejected. Lists are never accepted here; multi-value operators check
    /// each element.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (Self::Text | Self::Ref(_), Value::Text(_))
            | (Self::Int, Value::Int(_))
            | (Self::Decimal, Value::Int(_) | Value::Decimal(_))
            | (Self::Date, Value::Date(_))
            | (Self::Bool, Value::Bool(_)) => true,
            _ => false,
        }
    }

    /// True for time-like fields, which steer chart selection toward lines.
    #[must_use]
    pub const fn is_time_like(self) -> bool {
        matches!(self, Self::Date | Self::Ref(Entity::FiscalYear))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Text => "text",
            Self::Int => "int",
            Self::Decimal => "decimal",
            Self::Date => "date",
            Self::Bool => "bool",
            Self::Ref(entity) => return write!(f, "ref<{entity}>"),
        };
        write!(f, "{label}")
    }
}

///
/// FieldDescriptor
///

#[derive(Clone, Copy, Debug)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub ty: FieldType,
    pub queryable: bool,
    pub groupable: bool,
    pub aggregatable: bool,
}

impl FieldDescriptor {
    const fn new(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            queryable: true,
            groupable: false,
            aggregatable: false,
        }
    }

    const fn groupable(mut self) -> Self {
        self.groupable = true;
        self
    }

    const fn aggregatable(mut self) -> Self {
        self.aggregatable = true;
        self
    }

    /// Free-text fields (notes, descriptions) stay out of the query surface.
    const fn unqueryable(mut self) -> Self {
        self.queryable = false;
        self
    }
}

///
/// RelationDescriptor
///
/// A declared one-hop relation. Filter paths like `supplier.sector` resolve
/// through these; anything deeper is fenced at intent validation.
///

#[derive(Clone, Copy, Debug)]
pub struct RelationDescriptor {
    pub name: &'static str,
    pub local_field: &'static str,
    pub target: Entity,
}

impl RelationDescriptor {
    const fn new(name: &'static str, local_field: &'static str, target: Entity) -> Self {
        Self {
            name,
            local_field,
            target,
        }
    }
}

///
/// EntityDescriptor
///

#[derive(Clone, Copy, Debug)]
pub struct EntityDescriptor {
    pub entity: Entity,
    /// Name of the Dataset whose ingestion runs load this entity's rows.
    /// Audit records reference datasets by this name, not by id.
    pub dataset: &'static str,
    /// Field the compiler pins to the caller's municipality. `None` marks
    /// municipality-independent reference data (fiscal years, suppliers,
    /// funding sources, datasets), which carries nothing to leak across
    /// tenants.
    pub tenant_field: Option<&'static str>,
    pub fields: &'static [FieldDescriptor],
    pub relations: &'static [RelationDescriptor],
}

impl EntityDescriptor {
    /// Look up a field by its canonical name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Look up a declared one-hop relation by name.
    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&'static RelationDescriptor> {
        self.relations.iter().find(|rel| rel.name == name)
    }

    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

///
/// Catalog
///
/// Process-wide immutable registry of queryable entities. Built entirely at
/// compile time; safe for concurrent reads and never mutated.
///

#[derive(Clone, Copy, Debug)]
pub struct Catalog {
    entities: &'static [EntityDescriptor],
}

impl Catalog {
    /// The global catalog instance.
    #[must_use]
    pub const fn global() -> Self {
        Self {
            entities: registry::ENTITIES,
        }
    }

    /// Describe an entity. Total over the closed [`Entity`] set.
    ///
    /// The registry is ordered to match the `Entity` discriminants.
    #[must_use]
    pub fn describe(self, entity: Entity) -> &'static EntityDescriptor {
        let descriptor = &self.entities[entity as usize];
        debug_assert!(descriptor.entity == entity);
        descriptor
    }

    /// True if `field` exists on `entity` and participates in queries.
    #[must_use]
    pub fn is_queryable(self, entity: Entity, field: &str) -> bool {
        self.describe(entity)
            .field(field)
            .is_some_and(|descriptor| descriptor.queryable)
    }

    /// True only for numeric (decimal) fields declared aggregatable.
    #[must_use]
    pub fn is_aggregatable(self, entity: Entity, field: &str) -> bool {
        self.describe(entity)
            .field(field)
            .is_some_and(|descriptor| descriptor.aggregatable)
    }
}
