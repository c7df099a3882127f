//! Hashable row keys for grouping and join matching.

use crate::model::Value;
use std::hash::{Hash, Hasher};

/// Wrapper type for keys that implements Hash and Eq.
///
/// NULL equals NULL here, so rows with missing key cells group together.
/// Reals hash by bit pattern; integer and real cells never share a key.
#[derive(Clone, Debug)]
pub struct GroupKey(pub Vec<Value>);

impl Hash for GroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for value in &self.0 {
            match value {
                Value::Null => {
                    0u8.hash(state);
                }
                Value::Boolean(b) => {
                    1u8.hash(state);
                    b.hash(state);
                }
                Value::Integer(i) => {
                    2u8.hash(state);
                    i.hash(state);
                }
                Value::Number(n) => {
                    3u8.hash(state);
                    n.to_bits().hash(state);
                }
                Value::String(s) => {
                    4u8.hash(state);
                    s.hash(state);
                }
                Value::Dataset(ds) => {
                    5u8.hash(state);
                    ds.len().hash(state);
                }
            }
        }
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(&other.0).all(|(a, b)| match (a, b) {
                (Value::Number(x), Value::Number(y)) => x.to_bits() == y.to_bits(),
                _ => a == b,
            })
    }
}

impl Eq for GroupKey {}
