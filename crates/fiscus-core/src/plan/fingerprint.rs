//! Stable plan fingerprinting.
//!
//! Every semantic plan field is fed into an xxh3 hasher with explicit tags
//! and big-endian integer encodings, so a fingerprint is reproducible
//! across processes, architectures, and releases. Derived fields (datasets,
//! readable text) are excluded; they carry no information the structured
//! fields do not.
#![allow(clippy::cast_possible_truncation)]

use super::{CompiledPlan, OrderDirection, WherePredicate};
use crate::{intent::FieldPath, value::Value};
use chrono::Datelike;
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

///
/// PlanFingerprint
///
/// Stable, deterministic fingerprint for compiled plans.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PlanFingerprint(u64);

impl PlanFingerprint {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlanFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl CompiledPlan {
    /// Compute a stable fingerprint for this plan, used for determinism
    /// checks and audit correlation. Identical plans always fingerprint
    /// identically, including across restarts.
    #[must_use]
    pub fn fingerprint(&self) -> PlanFingerprint {
        let mut h = Xxh3::new();
        feed_bytes(&mut h, b"planfp:v1");
        feed_u8(&mut h, self.entity as u8);

        feed_u32(&mut h, self.select.len() as u32);
        for field in &self.select {
            feed_str(&mut h, field);
        }

        feed_u32(&mut h, self.where_clause.predicates.len() as u32);
        for predicate in &self.where_clause.predicates {
            feed_predicate(&mut h, predicate);
        }

        feed_u32(&mut h, self.group_by.len() as u32);
        for field in &self.group_by {
            feed_str(&mut h, field);
        }

        match &self.aggregate {
            Some(aggregate) => {
                feed_u8(&mut h, 0x01);
                feed_u8(&mut h, aggregate.kind as u8);
                feed_str(&mut h, &aggregate.field);
            }
            None => feed_u8(&mut h, 0x00),
        }

        feed_str(&mut h, &self.order_by.field);
        feed_u8(
            &mut h,
            match self.order_by.direction {
                OrderDirection::Asc => 0x00,
                OrderDirection::Desc => 0x01,
            },
        );

        feed_u32(&mut h, self.limit);

        feed_u32(&mut h, self.joins.len() as u32);
        for join in &self.joins {
            feed_str(&mut h, &join.relation);
            feed_u8(&mut h, join.target as u8);
        }

        PlanFingerprint(h.digest())
    }
}

fn feed_u8(h: &mut Xxh3, x: u8) {
    h.update(&[x]);
}
fn feed_u32(h: &mut Xxh3, x: u32) {
    h.update(&x.to_be_bytes());
}
fn feed_i32(h: &mut Xxh3, x: i32) {
    h.update(&x.to_be_bytes());
}
fn feed_i64(h: &mut Xxh3, x: i64) {
    h.update(&x.to_be_bytes());
}
fn feed_bytes(h: &mut Xxh3, b: &[u8]) {
    h.update(b);
}
fn feed_str(h: &mut Xxh3, s: &str) {
    feed_u32(h, s.len() as u32);
    feed_bytes(h, s.as_bytes());
}

fn feed_path(h: &mut Xxh3, path: &FieldPath) {
    match path {
        FieldPath::Local(field) => {
            feed_u8(h, 0x00);
            feed_str(h, field);
        }
        FieldPath::Related { relation, field } => {
            feed_u8(h, 0x01);
            feed_str(h, relation);
            feed_str(h, field);
        }
    }
}

fn feed_predicate(h: &mut Xxh3, predicate: &WherePredicate) {
    feed_path(h, &predicate.path);
    feed_u8(h, predicate.op as u8);
    feed_u8(h, predicate.origin as u8);
    feed_value(h, &predicate.value);
}

fn feed_value(h: &mut Xxh3, value: &Value) {
    match value {
        Value::Null => feed_u8(h, 0x00),
        Value::Bool(b) => {
            feed_u8(h, 0x01);
            feed_u8(h, u8::from(*b));
        }
        Value::Int(i) => {
            feed_u8(h, 0x02);
            feed_i64(h, *i);
        }
        Value::Decimal(d) => {
            feed_u8(h, 0x03);
            // encode (sign, scale, mantissa) deterministically:
            let normalized = d.normalize();
            feed_u8(h, u8::from(normalized.is_sign_negative()));
            feed_u32(h, normalized.scale());
            feed_bytes(h, &normalized.mantissa().to_be_bytes());
        }
        Value::Text(s) => {
            feed_u8(h, 0x04);
            feed_str(h, s);
        }
        Value::Date(d) => {
            feed_u8(h, 0x05);
            feed_i32(h, d.num_days_from_ce());
        }
        Value::List(items) => {
            feed_u8(h, 0x06);
            feed_u32(h, items.len() as u32);
            for item in items {
                feed_value(h, item);
            }
        }
    }
}
