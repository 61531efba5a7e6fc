//! Location-rule evaluation.
//!
//! Field groups carry a JSON-logic-like boolean expression deciding which
//! entities they apply to. The stored JSON is parsed once into a small AST
//! and evaluated against a caller-built context map. No I/O, no side
//! effects, same input ⇒ same boolean.

use std::collections::HashMap;

use serde_json::Value;

/// Runtime context a rule tree is evaluated against, built per-entity by an
/// [`EntityFieldProvider`](crate::provider::EntityFieldProvider).
pub type RuleContext = HashMap<String, Value>;

/// Parsed form of a stored `location_rules` tree.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationRule {
    /// No constraints: the group applies everywhere. This is the parse of an
    /// empty/absent rule set, not an error fallback.
    Always,
    And(Vec<LocationRule>),
    Or(Vec<LocationRule>),
    Eq { var: String, value: Value },
    Neq { var: String, value: Value },
    In { var: String, values: Vec<Value> },
    /// Anything unrecognized. Evaluates to false so a malformed or
    /// unknown-operator rule can never open a group everywhere.
    Unsupported,
}

impl LocationRule {
    /// Parse a stored rule tree. Never fails: unparseable nodes become
    /// [`LocationRule::Unsupported`].
    pub fn parse(json: &Value) -> Self {
        match json {
            Value::Null => Self::Always,
            Value::Object(map) if map.is_empty() => Self::Always,
            Value::Array(items) if items.is_empty() => Self::Always,
            Value::Object(map) if map.len() == 1 => {
                let Some((op, operands)) = map.iter().next() else {
                    return Self::Always;
                };
                match op.as_str() {
                    "and" => match operands.as_array() {
                        Some(children) => Self::And(children.iter().map(Self::parse).collect()),
                        None => Self::Unsupported,
                    },
                    "or" => match operands.as_array() {
                        Some(children) => Self::Or(children.iter().map(Self::parse).collect()),
                        None => Self::Unsupported,
                    },
                    "==" => Self::parse_comparison(operands)
                        .map(|(var, value)| Self::Eq { var, value })
                        .unwrap_or(Self::Unsupported),
                    "!=" => Self::parse_comparison(operands)
                        .map(|(var, value)| Self::Neq { var, value })
                        .unwrap_or(Self::Unsupported),
                    "in" => Self::parse_membership(operands)
                        .map(|(var, values)| Self::In { var, values })
                        .unwrap_or(Self::Unsupported),
                    _ => Self::Unsupported,
                }
            }
            _ => Self::Unsupported,
        }
    }

    /// `[{"var": key}, literal]`
    fn parse_comparison(operands: &Value) -> Option<(String, Value)> {
        let pair = operands.as_array()?;
        if pair.len() != 2 {
            return None;
        }
        let var = Self::parse_var(&pair[0])?;
        Some((var, pair[1].clone()))
    }

    /// `[{"var": key}, [literal, ...]]`
    fn parse_membership(operands: &Value) -> Option<(String, Vec<Value>)> {
        let pair = operands.as_array()?;
        if pair.len() != 2 {
            return None;
        }
        let var = Self::parse_var(&pair[0])?;
        let values = pair[1].as_array()?.clone();
        Some((var, values))
    }

    fn parse_var(operand: &Value) -> Option<String> {
        operand.get("var")?.as_str().map(str::to_string)
    }

    /// Evaluate against a context. `and`/`or` short-circuit; context lookups
    /// may be backed by expensive derivations upstream.
    pub fn evaluate(&self, ctx: &RuleContext) -> bool {
        match self {
            Self::Always => true,
            Self::And(children) => children.iter().all(|c| c.evaluate(ctx)),
            Self::Or(children) => children.iter().any(|c| c.evaluate(ctx)),
            Self::Eq { var, value } => ctx.get(var) == Some(value),
            // A missing key is "not equal": the entity simply doesn't have
            // the compared property.
            Self::Neq { var, value } => ctx.get(var) != Some(value),
            Self::In { var, values } => {
                ctx.get(var).map(|v| values.contains(v)).unwrap_or(false)
            }
            Self::Unsupported => false,
        }
    }
}

/// Parse + evaluate in one call. Empty or absent rules always match.
pub fn match_location(rules: &Value, ctx: &RuleContext) -> bool {
    LocationRule::parse(rules).evaluate(ctx)
}
