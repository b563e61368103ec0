use super::{ListError, Result, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type Row = Vec<Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Float,
    Text,
    Boolean,
    /// Link to an object of the named class.
    Object(String),
}

impl DataType {
    pub fn is_compatible(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Integer, Value::Integer(_)) => true,
            (Self::Float, Value::Float(_)) => true,
            (Self::Float, Value::Integer(_)) => true,
            (Self::Text, Value::Text(_)) => true,
            (Self::Boolean, Value::Boolean(_)) => true,
            (Self::Object(class), Value::Object(obj)) => obj.class == *class,
            _ => false,
        }
    }

    /// Widens the value to this type where a lossless conversion exists.
    fn coerce(&self, value: Value) -> Value {
        match (self, value) {
            (Self::Float, Value::Integer(i)) => Value::Float(i as f64),
            (_, value) => value,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "INTEGER"),
            Self::Float => write!(f, "FLOAT"),
            Self::Text => write!(f, "TEXT"),
            Self::Boolean => write!(f, "BOOLEAN"),
            Self::Object(class) => write!(f, "OBJECT<{}>", class),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn validate(&self, value: &Value) -> Result<()> {
        if value.is_null() {
            if !self.nullable {
                return Err(ListError::TypeMismatch(format!(
                    "Property '{}' cannot be null",
                    self.name
                )));
            }
            return Ok(());
        }

        if !self.data_type.is_compatible(value) {
            return Err(ListError::TypeMismatch(format!(
                "Property '{}' expects type {}, got {}",
                self.name,
                self.data_type,
                value.type_name()
            )));
        }

        Ok(())
    }
}

/// Schema of a stored object class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSchema {
    name: String,
    columns: Vec<Column>,
}

impl ObjectSchema {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn find_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.find_column_index(name).map(|idx| &self.columns[idx])
    }

    /// Validates a full row against the class, widening integers for float
    /// columns.
    pub fn validate_row(&self, row: Row) -> Result<Row> {
        if row.len() != self.columns.len() {
            return Err(ListError::TypeMismatch(format!(
                "Object of type '{}' expects {} properties, got {}",
                self.name,
                self.columns.len(),
                row.len()
            )));
        }

        self.columns
            .iter()
            .zip(row)
            .map(|(column, value)| {
                column.validate(&value)?;
                Ok(column.data_type.coerce(value))
            })
            .collect()
    }
}

/// What each slot of a list holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementSchema {
    Primitive { data_type: DataType, nullable: bool },
    Object { class: String },
}

impl ElementSchema {
    pub fn primitive(data_type: DataType) -> Self {
        Self::Primitive {
            data_type,
            nullable: false,
        }
    }

    pub fn nullable(data_type: DataType) -> Self {
        Self::Primitive {
            data_type,
            nullable: true,
        }
    }

    pub fn object(class: impl Into<String>) -> Self {
        Self::Object {
            class: class.into(),
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object { .. })
    }

    pub fn object_class(&self) -> Option<&str> {
        match self {
            Self::Object { class } => Some(class),
            Self::Primitive { .. } => None,
        }
    }

    /// Converts a value into something storable in a slot of this schema.
    pub fn coerce(&self, value: Value) -> Result<Value> {
        match self {
            Self::Primitive {
                data_type,
                nullable,
            } => {
                if value.is_null() {
                    return if *nullable {
                        Ok(value)
                    } else {
                        Err(ListError::TypeMismatch(format!(
                            "List of {} does not accept null",
                            data_type
                        )))
                    };
                }
                if !data_type.is_compatible(&value) {
                    return Err(ListError::TypeMismatch(format!(
                        "List of {} cannot hold a value of type {}",
                        data_type,
                        value.type_name()
                    )));
                }
                Ok(data_type.coerce(value))
            }
            Self::Object { class } => match &value {
                Value::Object(obj) if obj.class == *class => Ok(value),
                Value::Object(obj) => Err(ListError::TypeMismatch(format!(
                    "List of '{}' objects cannot hold an object of type '{}'",
                    class, obj.class
                ))),
                other => Err(ListError::TypeMismatch(format!(
                    "List of '{}' objects cannot hold a value of type {}",
                    class,
                    other.type_name()
                ))),
            },
        }
    }
}

impl fmt::Display for ElementSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive {
                data_type,
                nullable: true,
            } => write!(f, "{}?", data_type),
            Self::Primitive { data_type, .. } => write!(f, "{}", data_type),
            Self::Object { class } => write!(f, "{}", class),
        }
    }
}
