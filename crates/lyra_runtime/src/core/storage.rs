//! List storage representations.
//!
//! Lists keep their elements in the narrowest of a closed set of layouts:
//! packed booleans, packed native integers, or a generic object array.
//! Appending a value the current layout cannot hold promotes the storage;
//! promotion never runs in the other direction.

use crate::core::value::Value;

#[derive(Clone, Debug)]
pub enum SequenceStorage {
    Empty,
    BoolPacked(Vec<bool>),
    IntPacked(Vec<i64>),
    ObjectArray(Vec<Value>),
}

impl SequenceStorage {
    pub fn new() -> Self {
        SequenceStorage::Empty
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        if values.is_empty() {
            return SequenceStorage::Empty;
        }
        if values.iter().all(|v| matches!(v, Value::Bool(_))) {
            let packed = values
                .iter()
                .map(|v| match v {
                    Value::Bool(b) => *b,
                    _ => unreachable!(),
                })
                .collect();
            return SequenceStorage::BoolPacked(packed);
        }
        if values.iter().all(|v| matches!(v, Value::Int(_))) {
            let packed = values
                .iter()
                .map(|v| match v {
                    Value::Int(i) => *i,
                    _ => unreachable!(),
                })
                .collect();
            return SequenceStorage::IntPacked(packed);
        }
        SequenceStorage::ObjectArray(values)
    }

    pub fn len(&self) -> usize {
        match self {
            SequenceStorage::Empty => 0,
            SequenceStorage::BoolPacked(v) => v.len(),
            SequenceStorage::IntPacked(v) => v.len(),
            SequenceStorage::ObjectArray(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            SequenceStorage::Empty => None,
            SequenceStorage::BoolPacked(v) => v.get(index).map(|b| Value::Bool(*b)),
            SequenceStorage::IntPacked(v) => v.get(index).map(|i| Value::Int(*i)),
            SequenceStorage::ObjectArray(v) => v.get(index).cloned(),
        }
    }

    /// Append, promoting the layout when the value does not fit.
    pub fn push(&mut self, value: Value) {
        if matches!(self, SequenceStorage::Empty) {
            *self = match value {
                Value::Bool(b) => SequenceStorage::BoolPacked(vec![b]),
                Value::Int(i) => SequenceStorage::IntPacked(vec![i]),
                other => SequenceStorage::ObjectArray(vec![other]),
            };
            return;
        }
        let fits = matches!(
            (&*self, &value),
            (SequenceStorage::BoolPacked(_), Value::Bool(_))
                | (SequenceStorage::IntPacked(_), Value::Int(_))
                | (SequenceStorage::ObjectArray(_), _)
        );
        if !fits {
            self.promote_to_object();
        }
        match (&mut *self, value) {
            (SequenceStorage::BoolPacked(v), Value::Bool(b)) => v.push(b),
            (SequenceStorage::IntPacked(v), Value::Int(i)) => v.push(i),
            (SequenceStorage::ObjectArray(v), other) => v.push(other),
            _ => unreachable!("storage promoted above"),
        }
    }

    fn promote_to_object(&mut self) {
        let values = self.to_values();
        *self = SequenceStorage::ObjectArray(values);
    }

    pub fn to_values(&self) -> Vec<Value> {
        match self {
            SequenceStorage::Empty => Vec::new(),
            SequenceStorage::BoolPacked(v) => v.iter().map(|b| Value::Bool(*b)).collect(),
            SequenceStorage::IntPacked(v) => v.iter().map(|i| Value::Int(*i)).collect(),
            SequenceStorage::ObjectArray(v) => v.clone(),
        }
    }

    /// Unboxed view for integer fast paths.
    pub fn as_int_slice(&self) -> Option<&[i64]> {
        match self {
            SequenceStorage::IntPacked(v) => Some(v),
            _ => None,
        }
    }

    /// Unboxed view for boolean fast paths.
    pub fn as_bool_slice(&self) -> Option<&[bool]> {
        match self {
            SequenceStorage::BoolPacked(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object_slice(&self) -> Option<&[Value]> {
        match self {
            SequenceStorage::ObjectArray(v) => Some(v),
            _ => None,
        }
    }
}

impl Default for SequenceStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_keeps_packed_layout_for_homogeneous_ints() {
        let mut s = SequenceStorage::new();
        s.push(Value::Int(1));
        s.push(Value::Int(2));
        assert!(matches!(s, SequenceStorage::IntPacked(_)));
        assert_eq!(s.as_int_slice(), Some(&[1, 2][..]));
    }

    #[test]
    fn push_promotes_on_heterogeneous_append() {
        let mut s = SequenceStorage::new();
        s.push(Value::Int(1));
        s.push(Value::Float(2.5));
        assert!(matches!(s, SequenceStorage::ObjectArray(_)));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn bool_layout_promotes_to_object_not_int() {
        let mut s = SequenceStorage::new();
        s.push(Value::Bool(true));
        s.push(Value::Int(3));
        assert!(matches!(s, SequenceStorage::ObjectArray(_)));
    }
}
