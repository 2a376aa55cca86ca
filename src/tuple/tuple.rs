//! Immutable rows

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::value::Value;

/// An immutable, fixed-arity row.
///
/// Cloning is cheap: the field vector is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    values: Arc<[Value]>,
}

impl Tuple {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values: values.into(),
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn arity(&self) -> usize {
        self.values.len()
    }

    /// Field at `index`.
    ///
    /// Panics when `index` is out of range; indices are resolved against the
    /// schema before execution starts.
    pub fn value(&self, index: usize) -> &Value {
        &self.values[index]
    }

    /// Compares two tuples at the same field index
    pub fn compare_at(&self, other: &Tuple, index: usize) -> Ordering {
        self.value(index).compare(other.value(index))
    }

    /// Compares field `left_index` of self with field `right_index` of other
    pub fn compare_across(&self, other: &Tuple, left_index: usize, right_index: usize) -> Ordering {
        self.value(left_index).compare(other.value(right_index))
    }

    /// Compares over an ordered key list, stopping at the first difference
    pub fn compare_keys(&self, other: &Tuple, indices: &[usize]) -> Ordering {
        for &index in indices {
            let ordering = self.compare_at(other, index);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Join result: self's fields followed by other's fields
    pub fn join_with(&self, other: &Tuple) -> Tuple {
        let mut values = Vec::with_capacity(self.arity() + other.arity());
        values.extend(self.values.iter().cloned());
        values.extend(other.values.iter().cloned());
        Tuple::new(values)
    }

    /// New tuple holding only the fields at `indices`, in that order
    pub fn project(&self, indices: &[usize]) -> Tuple {
        Tuple::new(indices.iter().map(|&i| self.value(i).clone()).collect())
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, ")")
    }
}

/// Builds a tuple from heterogeneous literals.
///
/// ```ignore
/// let t = tuple![1, "a", 2.5];
/// ```
#[macro_export]
macro_rules! tuple {
    ($($value:expr),* $(,)?) => {
        $crate::tuple::Tuple::new(vec![$($crate::tuple::Value::from($value)),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_at() {
        let a = crate::tuple![1i64, "x"];
        let b = crate::tuple![2i64, "a"];
        assert_eq!(a.compare_at(&b, 0), Ordering::Less);
        assert_eq!(a.compare_at(&b, 1), Ordering::Greater);
    }

    #[test]
    fn test_compare_across() {
        let left = crate::tuple!["k", 7i64];
        let right = crate::tuple![7i64];
        assert_eq!(left.compare_across(&right, 1, 0), Ordering::Equal);
    }

    #[test]
    fn test_compare_keys_short_circuits() {
        let a = crate::tuple![1i64, "b", 9i64];
        let b = crate::tuple![1i64, "c", 0i64];
        assert_eq!(a.compare_keys(&b, &[0, 1, 2]), Ordering::Less);
        assert_eq!(a.compare_keys(&b, &[0]), Ordering::Equal);
    }

    #[test]
    fn test_join_with() {
        let joined = crate::tuple![1i64, "a"].join_with(&crate::tuple![1i64, "x"]);
        assert_eq!(joined, crate::tuple![1i64, "a", 1i64, "x"]);
    }

    #[test]
    fn test_project() {
        let t = crate::tuple![1i64, "a", 3.5];
        assert_eq!(t.project(&[2, 0]), crate::tuple![3.5, 1i64]);
    }

    #[test]
    fn test_display() {
        assert_eq!(crate::tuple![1i64, "a"].to_string(), "(1, a)");
    }
}
