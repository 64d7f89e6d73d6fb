//! Declared types of bound fields, parameters and return values
//!
//! The textual form is what catalogues use:
//!
//! ```text
//! void | boolean | int | number | double | string | String
//! Array | array | array<T>
//! <identifier>            bound class id or custom coercion rule
//! <type>?                 nullable
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The declared type of a binding slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeclaredType {
    /// No value (method returns only)
    Void,
    /// Boolean
    Bool,
    /// 32-bit integer, carried as an integral host number
    Int,
    /// Double
    Number,
    /// Text
    Text,
    /// Opaque host collection with optional element type
    Sequence(Option<Box<DeclaredType>>),
    /// A bound class id, or the name of a custom coercion rule
    Named(String),
    /// The inner type, or null
    Nullable(Box<DeclaredType>),
}

impl DeclaredType {
    /// Bound class / custom rule reference
    pub fn named(name: impl Into<String>) -> Self {
        DeclaredType::Named(name.into())
    }

    /// Sequence of the given element type
    pub fn sequence_of(element: DeclaredType) -> Self {
        DeclaredType::Sequence(Some(Box::new(element)))
    }

    /// Make this type nullable (idempotent)
    pub fn nullable(self) -> Self {
        match self {
            DeclaredType::Nullable(_) | DeclaredType::Void => self,
            other => DeclaredType::Nullable(Box::new(other)),
        }
    }

    /// Check if this is `Void`
    pub fn is_void(&self) -> bool {
        matches!(self, DeclaredType::Void)
    }

    /// Check if null is an acceptable value
    pub fn is_nullable(&self) -> bool {
        matches!(self, DeclaredType::Nullable(_))
    }

    /// Strip one level of nullability
    pub fn non_null(&self) -> &DeclaredType {
        match self {
            DeclaredType::Nullable(inner) => inner,
            other => other,
        }
    }

    /// Every `Named` type reachable from this one, in order of appearance
    pub fn named_types(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_named(&mut out);
        out
    }

    fn collect_named<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            DeclaredType::Named(name) => out.push(name),
            DeclaredType::Sequence(Some(elem)) => elem.collect_named(out),
            DeclaredType::Nullable(inner) => inner.collect_named(out),
            _ => {}
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredType::Void => write!(f, "void"),
            DeclaredType::Bool => write!(f, "boolean"),
            DeclaredType::Int => write!(f, "int"),
            DeclaredType::Number => write!(f, "number"),
            DeclaredType::Text => write!(f, "string"),
            DeclaredType::Sequence(None) => write!(f, "array"),
            DeclaredType::Sequence(Some(elem)) => write!(f, "array<{}>", elem),
            DeclaredType::Named(name) => write!(f, "{}", name),
            DeclaredType::Nullable(inner) => write!(f, "{}?", inner),
        }
    }
}

/// Error parsing a textual declared type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid type '{input}': {reason}")]
pub struct TypeParseError {
    input: String,
    reason: &'static str,
}

impl TypeParseError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

impl FromStr for DeclaredType {
    type Err = TypeParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim();
        if s.is_empty() {
            return Err(TypeParseError::new(input, "empty type"));
        }

        if let Some(inner) = s.strip_suffix('?') {
            let inner: DeclaredType = inner.parse()?;
            return match inner {
                DeclaredType::Void => Err(TypeParseError::new(input, "void cannot be nullable")),
                DeclaredType::Nullable(_) => {
                    Err(TypeParseError::new(input, "nested nullable type"))
                }
                other => Ok(DeclaredType::Nullable(Box::new(other))),
            };
        }

        if let Some(rest) = s.strip_prefix("array<").or_else(|| s.strip_prefix("Array<")) {
            let elem = rest
                .strip_suffix('>')
                .ok_or_else(|| TypeParseError::new(input, "unclosed '<'"))?;
            let elem: DeclaredType = elem.parse()?;
            if elem.is_void() {
                return Err(TypeParseError::new(input, "void element type"));
            }
            return Ok(DeclaredType::Sequence(Some(Box::new(elem))));
        }

        let ty = match s {
            "void" => DeclaredType::Void,
            "boolean" | "bool" => DeclaredType::Bool,
            "int" => DeclaredType::Int,
            "number" | "double" => DeclaredType::Number,
            "string" | "String" => DeclaredType::Text,
            "array" | "Array" => DeclaredType::Sequence(None),
            name => {
                if !is_valid_type_name(name) {
                    return Err(TypeParseError::new(input, "not a type name"));
                }
                DeclaredType::Named(name.to_string())
            }
        };
        Ok(ty)
    }
}

/// Dotted identifier: `html5.HTMLElement`, `Node`, `my_rule`
fn is_valid_type_name(name: &str) -> bool {
    name.split('.').all(|part| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
            && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
    })
}

impl TryFrom<String> for DeclaredType {
    type Error = TypeParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DeclaredType> for String {
    fn from(ty: DeclaredType) -> Self {
        ty.to_string()
    }
}
