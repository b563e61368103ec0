// ============================================================================
// Predicate expressions for filtered views
// ============================================================================
//
// Predicates are written as SQL boolean expressions over element properties,
// e.g. `age >= 18 AND name LIKE 'A%'`. Positional arguments `$0`, `$1`, ...
// are bound from the values supplied next to the predicate text. Elements of
// primitive lists are referenced as `self`.
//
// ============================================================================

use super::pattern::like_match;
use crate::core::{ListError, Result, Value};
use sqlparser::ast::{self as sql_ast, BinaryOperator, UnaryOperator};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token;
use std::cmp::Ordering;

/// Name under which primitive elements are referenced.
pub const SELF_PROPERTY: &str = "self";

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Key path, e.g. `["owner", "name"]`
    Property(Vec<String>),
    Literal(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    fn from_sql(op: &BinaryOperator) -> Option<Self> {
        match op {
            BinaryOperator::Eq => Some(Self::Eq),
            BinaryOperator::NotEq => Some(Self::NotEq),
            BinaryOperator::Lt => Some(Self::Lt),
            BinaryOperator::LtEq => Some(Self::LtEq),
            BinaryOperator::Gt => Some(Self::Gt),
            BinaryOperator::GtEq => Some(Self::GtEq),
            _ => None,
        }
    }

    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::NotEq => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::LtEq => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::GtEq => ordering != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Constant(bool),
    Compare {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },
    IsNull {
        operand: Operand,
        negated: bool,
    },
    Like {
        operand: Operand,
        pattern: String,
        negated: bool,
        case_insensitive: bool,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

/// Resolves key paths against one element while a predicate is evaluated.
pub trait PropertySource {
    fn resolve(&self, path: &[String]) -> Result<Value>;
}

impl Predicate {
    /// Parses `text`, binding `$n` placeholders to `args[n]`.
    pub fn parse(text: &str, args: &[Value]) -> Result<Self> {
        let dialect = PostgreSqlDialect {};
        let mut parser = Parser::new(&dialect)
            .try_with_sql(text)
            .map_err(|err| ListError::Query(format!("Invalid predicate '{}': {}", text, err)))?;
        let expr = parser
            .parse_expr()
            .map_err(|err| ListError::Query(format!("Invalid predicate '{}': {}", text, err)))?;
        if parser.peek_token().token != Token::EOF {
            return Err(ListError::Query(format!(
                "Invalid predicate '{}': unexpected trailing input",
                text
            )));
        }

        PredicateBuilder { args }.predicate(expr)
    }

    pub fn evaluate(&self, row: &dyn PropertySource) -> Result<bool> {
        match self {
            Self::Constant(b) => Ok(*b),
            Self::Compare { left, op, right } => {
                let left = operand_value(left, row)?;
                let right = operand_value(right, row)?;
                compare(&left, *op, &right)
            }
            Self::IsNull { operand, negated } => {
                Ok(operand_value(operand, row)?.is_null() != *negated)
            }
            Self::Like {
                operand,
                pattern,
                negated,
                case_insensitive,
            } => {
                let matched = match operand_value(operand, row)? {
                    Value::Text(text) => like_match(&text, pattern, *case_insensitive)?,
                    Value::Null => return Ok(false),
                    other => {
                        return Err(ListError::Query(format!(
                            "LIKE requires a text operand, got {}",
                            other.type_name()
                        )));
                    }
                };
                Ok(matched != *negated)
            }
            Self::And(left, right) => Ok(left.evaluate(row)? && right.evaluate(row)?),
            Self::Or(left, right) => Ok(left.evaluate(row)? || right.evaluate(row)?),
            Self::Not(inner) => Ok(!inner.evaluate(row)?),
        }
    }

    /// Every key path the predicate reads.
    pub fn referenced_paths(&self) -> Vec<&[String]> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a [String]>) {
        match self {
            Self::Constant(_) => {}
            Self::Compare { left, right, .. } => {
                push_path(left, out);
                push_path(right, out);
            }
            Self::IsNull { operand, .. } | Self::Like { operand, .. } => push_path(operand, out),
            Self::And(left, right) | Self::Or(left, right) => {
                left.collect_paths(out);
                right.collect_paths(out);
            }
            Self::Not(inner) => inner.collect_paths(out),
        }
    }
}

fn push_path<'a>(operand: &'a Operand, out: &mut Vec<&'a [String]>) {
    if let Operand::Property(path) = operand {
        out.push(path.as_slice());
    }
}

fn operand_value(operand: &Operand, row: &dyn PropertySource) -> Result<Value> {
    match operand {
        Operand::Property(path) => row.resolve(path),
        Operand::Literal(value) => Ok(value.clone()),
    }
}

fn compare(left: &Value, op: CompareOp, right: &Value) -> Result<bool> {
    // NULL only ever equals NULL; ordering against NULL never holds
    if left.is_null() || right.is_null() {
        let both = left.is_null() && right.is_null();
        return Ok(match op {
            CompareOp::Eq => both,
            CompareOp::NotEq => !both,
            _ => false,
        });
    }
    let ordering = left
        .compare(right)
        .map_err(|err| ListError::Query(err.to_string()))?;
    Ok(op.holds(ordering))
}

struct PredicateBuilder<'a> {
    args: &'a [Value],
}

impl PredicateBuilder<'_> {
    fn predicate(&self, expr: sql_ast::Expr) -> Result<Predicate> {
        match expr {
            sql_ast::Expr::Nested(inner) => self.predicate(*inner),
            sql_ast::Expr::BinaryOp { left, op, right } => match op {
                BinaryOperator::And => Ok(Predicate::And(
                    Box::new(self.predicate(*left)?),
                    Box::new(self.predicate(*right)?),
                )),
                BinaryOperator::Or => Ok(Predicate::Or(
                    Box::new(self.predicate(*left)?),
                    Box::new(self.predicate(*right)?),
                )),
                other => {
                    let op = CompareOp::from_sql(&other).ok_or_else(|| {
                        ListError::Query(format!("Unsupported operator '{}'", other))
                    })?;
                    Ok(Predicate::Compare {
                        left: self.operand(*left)?,
                        op,
                        right: self.operand(*right)?,
                    })
                }
            },
            sql_ast::Expr::UnaryOp {
                op: UnaryOperator::Not,
                expr,
            } => Ok(Predicate::Not(Box::new(self.predicate(*expr)?))),
            sql_ast::Expr::IsNull(expr) => Ok(Predicate::IsNull {
                operand: self.operand(*expr)?,
                negated: false,
            }),
            sql_ast::Expr::IsNotNull(expr) => Ok(Predicate::IsNull {
                operand: self.operand(*expr)?,
                negated: true,
            }),
            sql_ast::Expr::Like {
                negated,
                expr,
                pattern,
                escape_char,
                ..
            } => self.like(*expr, *pattern, negated, escape_char.is_some(), false),
            sql_ast::Expr::ILike {
                negated,
                expr,
                pattern,
                escape_char,
                ..
            } => self.like(*expr, *pattern, negated, escape_char.is_some(), true),
            sql_ast::Expr::Between {
                expr,
                negated,
                low,
                high,
            } => {
                let operand = self.operand(*expr)?;
                let range = Predicate::And(
                    Box::new(Predicate::Compare {
                        left: operand.clone(),
                        op: CompareOp::GtEq,
                        right: self.operand(*low)?,
                    }),
                    Box::new(Predicate::Compare {
                        left: operand,
                        op: CompareOp::LtEq,
                        right: self.operand(*high)?,
                    }),
                );
                Ok(if negated {
                    Predicate::Not(Box::new(range))
                } else {
                    range
                })
            }
            sql_ast::Expr::InList {
                expr,
                list,
                negated,
            } => {
                let operand = self.operand(*expr)?;
                let mut any = Predicate::Constant(false);
                for item in list {
                    let candidate = Predicate::Compare {
                        left: operand.clone(),
                        op: CompareOp::Eq,
                        right: self.operand(item)?,
                    };
                    any = Predicate::Or(Box::new(any), Box::new(candidate));
                }
                Ok(if negated {
                    Predicate::Not(Box::new(any))
                } else {
                    any
                })
            }
            // Bare operands: boolean literals or boolean properties
            other => match self.operand(other)? {
                Operand::Literal(Value::Boolean(b)) => Ok(Predicate::Constant(b)),
                Operand::Literal(value) => Err(ListError::Query(format!(
                    "Expected a boolean expression, got literal {}",
                    value
                ))),
                property => Ok(Predicate::Compare {
                    left: property,
                    op: CompareOp::Eq,
                    right: Operand::Literal(Value::Boolean(true)),
                }),
            },
        }
    }

    fn like(
        &self,
        expr: sql_ast::Expr,
        pattern: sql_ast::Expr,
        negated: bool,
        has_escape: bool,
        case_insensitive: bool,
    ) -> Result<Predicate> {
        if has_escape {
            return Err(ListError::Query("LIKE ESCAPE is not supported".into()));
        }
        let pattern = match self.operand(pattern)? {
            Operand::Literal(Value::Text(pattern)) => pattern,
            _ => {
                return Err(ListError::Query(
                    "LIKE pattern must be a string literal or text argument".into(),
                ));
            }
        };
        Ok(Predicate::Like {
            operand: self.operand(expr)?,
            pattern,
            negated,
            case_insensitive,
        })
    }

    fn operand(&self, expr: sql_ast::Expr) -> Result<Operand> {
        match expr {
            sql_ast::Expr::Nested(inner) => self.operand(*inner),
            sql_ast::Expr::Identifier(ident) => Ok(Operand::Property(vec![ident.value])),
            sql_ast::Expr::CompoundIdentifier(idents) => Ok(Operand::Property(
                idents.into_iter().map(|ident| ident.value).collect(),
            )),
            sql_ast::Expr::Value(value_with_span) => self.literal(value_with_span.value),
            sql_ast::Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr,
            } => match self.operand(*expr)? {
                Operand::Literal(Value::Integer(i)) => i
                    .checked_neg()
                    .map(|negated| Operand::Literal(Value::Integer(negated)))
                    .ok_or_else(|| ListError::Query("Integer literal out of range".into())),
                Operand::Literal(Value::Float(f)) => Ok(Operand::Literal(Value::Float(-f))),
                _ => Err(ListError::Query(
                    "Unary minus is only supported on numeric literals".into(),
                )),
            },
            other => Err(ListError::Query(format!(
                "Unsupported expression '{}'",
                other
            ))),
        }
    }

    fn literal(&self, value: sql_ast::Value) -> Result<Operand> {
        let value = match value {
            sql_ast::Value::Number(n, _) => match n.parse::<i64>() {
                Ok(i) => Value::Integer(i),
                Err(_) => n
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| ListError::Query(format!("Invalid number '{}'", n)))?,
            },
            sql_ast::Value::SingleQuotedString(s) => Value::Text(s),
            sql_ast::Value::Boolean(b) => Value::Boolean(b),
            sql_ast::Value::Null => Value::Null,
            sql_ast::Value::Placeholder(name) => self.argument(&name)?,
            other => {
                return Err(ListError::Query(format!(
                    "Unsupported literal '{}'",
                    other
                )));
            }
        };
        Ok(Operand::Literal(value))
    }

    fn argument(&self, placeholder: &str) -> Result<Value> {
        let index = placeholder
            .strip_prefix('$')
            .and_then(|digits| digits.parse::<usize>().ok())
            .ok_or_else(|| {
                ListError::Query(format!(
                    "Unsupported placeholder '{}', expected $0, $1, ...",
                    placeholder
                ))
            })?;
        self.args.get(index).cloned().ok_or_else(|| {
            ListError::Query(format!(
                "Request for argument at index {} but only {} arguments are provided",
                index,
                self.args.len()
            ))
        })
    }
}
