//! Method surface of a managed list.
//!
//! Calls are checked in a fixed order: argument count, then argument types,
//! then (for mutating methods) the presence of a write transaction.

use super::ManagedList;
use crate::core::{Arity, ListError, Result, Value};
use crate::results::Results;
use crate::storage::{MemoryStore, StoreBackend};
use crate::transaction::TxToken;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListMethod {
    Push,
    Pop,
    Shift,
    Unshift,
    Splice,
    Filtered,
    Sorted,
    Snapshot,
}

impl ListMethod {
    pub const ALL: [ListMethod; 8] = [
        Self::Push,
        Self::Pop,
        Self::Shift,
        Self::Unshift,
        Self::Splice,
        Self::Filtered,
        Self::Sorted,
        Self::Snapshot,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Pop => "pop",
            Self::Shift => "shift",
            Self::Unshift => "unshift",
            Self::Splice => "splice",
            Self::Filtered => "filtered",
            Self::Sorted => "sorted",
            Self::Snapshot => "snapshot",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Self::Push | Self::Unshift | Self::Splice | Self::Filtered => Arity::AtLeast(1),
            Self::Pop | Self::Shift | Self::Snapshot => Arity::Exactly(0),
            Self::Sorted => Arity::Between(1, 2),
        }
    }

    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::Push | Self::Pop | Self::Shift | Self::Unshift | Self::Splice
        )
    }
}

/// Host-facing result of a method call.
#[derive(Debug)]
pub enum MethodResult<B: StoreBackend = MemoryStore> {
    /// New length after push/unshift
    Length(usize),
    Value(Value),
    /// pop/shift on an empty list
    Undefined,
    /// Elements removed by splice
    Array(Vec<Value>),
    Results(Results<B>),
}

impl<B: StoreBackend> MethodResult<B> {
    pub fn into_results(self) -> Option<Results<B>> {
        match self {
            Self::Results(results) => Some(results),
            _ => None,
        }
    }
}

/// Arguments after type conversion.
enum Call<'a> {
    Push(&'a [Value]),
    Pop,
    Shift,
    Unshift(&'a [Value]),
    Splice {
        start: i64,
        delete_count: Option<i64>,
        items: &'a [Value],
    },
    Filtered {
        predicate: &'a str,
        args: &'a [Value],
    },
    Sorted {
        property: &'a str,
        ascending: bool,
    },
    Snapshot,
}

impl<'a> Call<'a> {
    fn bind(method: ListMethod, args: &'a [Value]) -> Result<Self> {
        method.arity().check(method.name(), args.len())?;
        Ok(match method {
            ListMethod::Push => Call::Push(args),
            ListMethod::Pop => Call::Pop,
            ListMethod::Shift => Call::Shift,
            ListMethod::Unshift => Call::Unshift(args),
            ListMethod::Splice => Call::Splice {
                start: numeric_arg(method, &args[0])?,
                delete_count: args.get(1).map(|arg| numeric_arg(method, arg)).transpose()?,
                items: args.get(2..).unwrap_or_default(),
            },
            ListMethod::Filtered => Call::Filtered {
                predicate: text_arg(method, &args[0])?,
                args: &args[1..],
            },
            ListMethod::Sorted => Call::Sorted {
                property: text_arg(method, &args[0])?,
                ascending: match args.get(1) {
                    Some(Value::Boolean(ascending)) => *ascending,
                    Some(other) => return Err(argument_mismatch(method, "boolean", other)),
                    None => true,
                },
            },
            ListMethod::Snapshot => Call::Snapshot,
        })
    }
}

impl<B: StoreBackend> ManagedList<B> {
    /// Invokes a list method by name. Returns `Ok(None)` for names this list
    /// does not implement.
    pub fn call_method(
        &self,
        name: &str,
        args: &[Value],
        tx: Option<TxToken>,
    ) -> Result<Option<MethodResult<B>>> {
        let Some(method) = ListMethod::from_name(name) else {
            trace!(list = %self.id, name, "method not handled");
            return Ok(None);
        };
        let call = Call::bind(method, args)?;
        let tx = if method.is_mutating() {
            Some(tx.ok_or(ListError::WriteOutsideTransaction)?)
        } else {
            None
        };

        let result = match (call, tx) {
            (Call::Push(values), Some(tx)) => MethodResult::Length(self.push(tx, values)?),
            (Call::Unshift(values), Some(tx)) => MethodResult::Length(self.unshift(tx, values)?),
            (Call::Pop, Some(tx)) => self.pop(tx)?.map_or(MethodResult::Undefined, MethodResult::Value),
            (Call::Shift, Some(tx)) => self.shift(tx)?.map_or(MethodResult::Undefined, MethodResult::Value),
            (
                Call::Splice {
                    start,
                    delete_count,
                    items,
                },
                Some(tx),
            ) => MethodResult::Array(self.splice(tx, start, delete_count, items)?),
            (Call::Filtered { predicate, args }, _) => {
                MethodResult::Results(self.filtered(predicate, args)?)
            }
            (Call::Sorted { property, ascending }, _) => {
                MethodResult::Results(self.sorted(property, ascending)?)
            }
            (Call::Snapshot, _) => MethodResult::Results(self.snapshot()?),
            (_, None) => return Err(ListError::WriteOutsideTransaction),
        };
        Ok(Some(result))
    }
}

/// Converts a numeric argument: integers, finite floats (truncated) and
/// numeric text are accepted.
fn numeric_arg(method: ListMethod, value: &Value) -> Result<i64> {
    let converted = match value {
        Value::Integer(i) => Some(*i),
        Value::Float(_) => value.as_i64(),
        Value::Text(text) => {
            let text = text.trim();
            text.parse::<i64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .and_then(|f| Value::Float(f).as_i64())
            })
        }
        _ => None,
    };
    converted.ok_or_else(|| argument_mismatch(method, "number", value))
}

fn text_arg(method: ListMethod, value: &Value) -> Result<&str> {
    value
        .as_str()
        .ok_or_else(|| argument_mismatch(method, "string", value))
}

fn argument_mismatch(method: ListMethod, expected: &str, actual: &Value) -> ListError {
    ListError::TypeMismatch(format!(
        "'{}' expects a {} argument, got {}",
        method.name(),
        expected,
        actual.type_name()
    ))
}
