//! Row model: values, tuples and schemas

mod schema;
#[allow(clippy::module_inception)]
mod tuple;
mod value;

pub use schema::{Attribute, Schema};
pub use tuple::Tuple;
pub use value::{DataType, Value};
