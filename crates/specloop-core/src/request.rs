//! Parsing of caller payloads for the three engine operations.
//!
//! These are the only places where malformed input becomes a hard
//! [`SpecError`]; everything downstream works on validated values.

use serde_json::Value;

use crate::error::{Result, SpecError};
use crate::spec::{json_kind, Specification};

/// Default prompt length limit, in characters.
pub const DEFAULT_MAX_PROMPT_LEN: usize = 10_000;
/// Default iteration budget when a request names none.
pub const DEFAULT_MAX_ITERS: usize = 3;

/// Extracts the `prompt` string from a generate payload.
pub fn parse_prompt(payload: &Value, max_len: usize) -> Result<String> {
    let map = payload.as_object().ok_or(SpecError::NotAnObject {
        what: "generate payload",
    })?;
    let prompt = match map.get("prompt") {
        None | Some(Value::Null) => return Err(SpecError::MissingField("prompt")),
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(SpecError::invalid(
                "prompt",
                format!("expected a string, found {}", json_kind(other)),
            ))
        }
    };
    check_prompt_len(prompt, max_len)?;
    Ok(prompt.clone())
}

/// Rejects prompts longer than `max_len` characters.
pub fn check_prompt_len(prompt: &str, max_len: usize) -> Result<()> {
    let len = prompt.chars().count();
    if len > max_len {
        return Err(SpecError::PromptTooLong { len, max: max_len });
    }
    Ok(())
}

/// A parsed iterate payload.
#[derive(Debug, Clone, PartialEq)]
pub struct IterateRequest {
    pub spec: Specification,
    /// Zero means "return immediately with an empty history".
    pub max_iters: usize,
}

impl IterateRequest {
    /// Parses `{"spec": {...}, "max_iters": n}`; `max_iters` defaults to
    /// `default_iters` and negative values clamp to zero.
    pub fn from_value(payload: Value, default_iters: usize) -> Result<Self> {
        let Value::Object(mut map) = payload else {
            return Err(SpecError::NotAnObject {
                what: "iterate payload",
            });
        };
        let spec = match map.remove("spec") {
            None | Some(Value::Null) => return Err(SpecError::MissingField("spec")),
            Some(value) => Specification::from_value(value)?,
        };
        let max_iters = match map.get("max_iters") {
            None | Some(Value::Null) => default_iters,
            Some(Value::Number(n)) => {
                if let Some(v) = n.as_u64() {
                    usize::try_from(v).unwrap_or(usize::MAX)
                } else if n.as_i64().is_some() {
                    0
                } else {
                    return Err(SpecError::invalid(
                        "max_iters",
                        format!("expected an integer, found {n}"),
                    ));
                }
            }
            Some(other) => {
                return Err(SpecError::invalid(
                    "max_iters",
                    format!("expected an integer, found {}", json_kind(other)),
                ))
            }
        };
        Ok(Self { spec, max_iters })
    }
}
