//! Equi-join conditions

use std::fmt;

use crate::executor::{ExecError, ExecResult};
use crate::tuple::Schema;

/// `left = right`, by attribute name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCondition {
    pub left: String,
    pub right: String,
}

/// A condition resolved to field indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinKeys {
    pub left: usize,
    pub right: usize,
}

impl JoinCondition {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Resolves both names. The two attributes must share a type.
    pub fn resolve(&self, left: &Schema, right: &Schema) -> ExecResult<JoinKeys> {
        let left_index = left.index_of(&self.left)?;
        let right_index = right.index_of(&self.right)?;

        let left_type = left.attributes()[left_index].data_type;
        let right_type = right.attributes()[right_index].data_type;
        if left_type != right_type {
            return Err(ExecError::schema_mismatch(format!(
                "Cannot join {} ({}) with {} ({})",
                self.left, left_type, self.right, right_type
            )));
        }

        Ok(JoinKeys {
            left: left_index,
            right: right_index,
        })
    }
}

impl fmt::Display for JoinCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.left, self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecErrorCode;
    use crate::tuple::{Attribute, DataType};

    fn emp() -> Schema {
        Schema::new(vec![
            Attribute::new("emp.id", DataType::Int),
            Attribute::new("emp.dept", DataType::Int),
        ])
    }

    fn dept() -> Schema {
        Schema::new(vec![
            Attribute::with_size("dept.name", DataType::Text, 12),
            Attribute::new("dept.id", DataType::Int),
        ])
    }

    #[test]
    fn test_resolve() {
        let keys = JoinCondition::new("emp.dept", "dept.id")
            .resolve(&emp(), &dept())
            .unwrap();
        assert_eq!(keys, JoinKeys { left: 1, right: 1 });
    }

    #[test]
    fn test_type_conflict() {
        let err = JoinCondition::new("emp.dept", "dept.name")
            .resolve(&emp(), &dept())
            .unwrap_err();
        assert_eq!(err.code(), ExecErrorCode::SchemaMismatch);
    }

    #[test]
    fn test_unknown_side() {
        let err = JoinCondition::new("emp.dept", "emp.id")
            .resolve(&emp(), &dept())
            .unwrap_err();
        assert_eq!(err.code(), ExecErrorCode::SchemaMismatch);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            JoinCondition::new("emp.dept", "dept.id").to_string(),
            "emp.dept = dept.id"
        );
    }
}
