//! Soft schema validation for provider payloads.
//!
//! Providers drift. A payload that doesn't match the expected shape is
//! still passed through; the mismatches come back as [`Diagnostic`]s that
//! the caller can log or surface in the envelope.

use serde::Serialize;
use serde_json::Value;

/// JSON type expected at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonKind {
    Object,
    Array,
    String,
    Number,
    Bool,
    /// A number, or a string holding one (ChEMBL and NCBI send both).
    Numeric,
    Any,
}

impl JsonKind {
    fn matches(&self, value: &Value) -> bool {
        match self {
            JsonKind::Object  => value.is_object(),
            JsonKind::Array   => value.is_array(),
            JsonKind::String  => value.is_string(),
            JsonKind::Number  => value.is_number(),
            JsonKind::Bool    => value.is_boolean(),
            JsonKind::Numeric => {
                value.is_number()
                    || value.as_str().is_some_and(|s| s.trim().parse::<f64>().is_ok())
            }
            JsonKind::Any => true,
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null      => "null",
        Value::Bool(_)   => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_)  => "array",
        Value::Object(_) => "object",
    }
}

/// One expected field, addressed by a dotted path (`"data.target.id"`,
/// `"studies.0.protocolSection"`).
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub path: &'static str,
    pub kind: JsonKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(path: &'static str, kind: JsonKind) -> Self {
        Self { path, kind, required: true }
    }

    pub const fn optional(path: &'static str, kind: JsonKind) -> Self {
        Self { path, kind, required: false }
    }
}

/// A non-fatal shape mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub path: String,
    pub expected: JsonKind,
    pub found: &'static str,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: expected {:?}, found {}", self.path, self.expected, self.found)
    }
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let pointer: String = path.split('.').map(|seg| format!("/{seg}")).collect();
    value.pointer(&pointer)
}

/// Checks `value` against `specs` and returns every mismatch.
///
/// A missing optional field is fine; a present field of the wrong type is
/// always reported.
pub fn validate(value: &Value, specs: &[FieldSpec]) -> Vec<Diagnostic> {
    specs
        .iter()
        .filter_map(|spec| match lookup(value, spec.path) {
            None | Some(Value::Null) if !spec.required => None,
            None => Some(Diagnostic {
                path: spec.path.to_string(),
                expected: spec.kind,
                found: "missing",
            }),
            Some(found) if spec.kind.matches(found) => None,
            Some(found) => Some(Diagnostic {
                path: spec.path.to_string(),
                expected: spec.kind,
                found: kind_of(found),
            }),
        })
        .collect()
}

/// Reads an integer count from a field that may be a JSON number or a numeric string.
pub fn count_field(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.max(0.0) as u64),
        _ => None,
    }
}

/// Reads a float from a field that may be a JSON number or a numeric string.
pub fn float_field(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
