pub mod error;
pub mod types;
pub mod value;

pub use error::{Arity, ErrorKind, ListError, Result};
pub use types::{Column, DataType, ElementSchema, ObjectSchema, Row};
pub use value::{ObjectId, ObjectRef, Value};
