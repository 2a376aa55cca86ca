//! Relation schemas
//!
//! A schema is the ordered attribute list attached to every operator's
//! output. The declared byte sizes drive page capacity.

use serde::{Deserialize, Serialize};

use super::value::DataType;
use crate::executor::{ExecError, ExecResult};

/// A single attribute of a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Qualified attribute name, e.g. `emp.id`
    pub name: String,
    /// Value type
    pub data_type: DataType,
    /// Declared byte size used for capacity accounting
    pub size: usize,
}

impl Attribute {
    /// Creates an attribute with the default size for its type.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            size: data_type.default_size(),
        }
    }

    /// Creates an attribute with an explicit byte size.
    pub fn with_size(name: impl Into<String>, data_type: DataType, size: usize) -> Self {
        Self {
            name: name.into(),
            data_type,
            size,
        }
    }
}

/// Ordered list of attributes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn attribute(&self, index: usize) -> Option<&Attribute> {
        self.attributes.get(index)
    }

    /// Sum of declared attribute sizes in bytes
    pub fn tuple_size(&self) -> usize {
        self.attributes.iter().map(|a| a.size).sum()
    }

    /// Number of tuples that fit in a page of `page_size` bytes.
    ///
    /// Fails with AERO_BUFFER_BUDGET if not even one tuple fits.
    pub fn page_capacity(&self, page_size: usize) -> ExecResult<usize> {
        let tuple_size = self.tuple_size();
        if tuple_size == 0 {
            return Err(ExecError::buffer_budget(
                "Schema declares a zero-byte tuple; page capacity is undefined",
            ));
        }
        let capacity = page_size / tuple_size;
        if capacity == 0 {
            return Err(ExecError::buffer_budget(format!(
                "Tuple of {} bytes does not fit in a page of {} bytes",
                tuple_size, page_size
            )));
        }
        Ok(capacity)
    }

    /// Position of the named attribute, if present
    pub fn position(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    /// Position of the named attribute.
    ///
    /// Fails with AERO_SCHEMA_MISMATCH when the name is unknown.
    pub fn index_of(&self, name: &str) -> ExecResult<usize> {
        self.position(name).ok_or_else(|| {
            ExecError::schema_mismatch(format!(
                "Attribute '{}' not found in schema ({})",
                name,
                self.names().join(", ")
            ))
        })
    }

    /// Output schema of a join: left attributes followed by right attributes
    pub fn join(&self, right: &Schema) -> Schema {
        let mut attributes = self.attributes.clone();
        attributes.extend(right.attributes.iter().cloned());
        Schema { attributes }
    }

    /// Sub-schema over the named attributes, in request order
    pub fn project(&self, names: &[String]) -> ExecResult<Schema> {
        let mut attributes = Vec::with_capacity(names.len());
        for name in names {
            let index = self.index_of(name)?;
            attributes.push(self.attributes[index].clone());
        }
        Ok(Schema { attributes })
    }

    fn names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name.as_str()).collect()
    }
}
