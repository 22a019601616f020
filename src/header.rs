//! `Header`: the name/typed-value pair shared by [`crate::request::Request`]
//! and [`crate::reply::Reply`].

use std::fmt;

/// The name that carries the integer variant; every other header name
/// carries [`HeaderValue::Text`].
pub const CONTENT_LENGTH: &str = "Content-Length";

/// A header's value, tagged by variant: an integer or a plain string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HeaderValue {
    Integer(u64),
    Text(String),
}

impl HeaderValue {
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            HeaderValue::Integer(v) => Some(*v),
            HeaderValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            HeaderValue::Text(v) => Some(v),
            HeaderValue::Integer(_) => None,
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Integer(v) => write!(f, "{v}"),
            HeaderValue::Text(v) => write!(f, "{v}"),
        }
    }
}

/// A single `name: value` header line.
///
/// Names are matched case-sensitively; no normalisation is applied (see
/// DESIGN.md for the rationale).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Header {
    pub name: String,
    pub value: HeaderValue,
}

impl Header {
    pub fn new(name: impl Into<String>, value: HeaderValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, HeaderValue::Text(value.into()))
    }

    pub fn content_length(len: u64) -> Self {
        Self::new(CONTENT_LENGTH, HeaderValue::Integer(len))
    }

    /// Whether `self.value`'s variant matches what `self.name` requires.
    /// `Content-Length` must be [`HeaderValue::Integer`]; every other
    /// header must be [`HeaderValue::Text`].
    pub fn has_valid_variant(&self) -> bool {
        if self.name == CONTENT_LENGTH {
            matches!(self.value, HeaderValue::Integer(_))
        } else {
            matches!(self.value, HeaderValue::Text(_))
        }
    }
}

/// Finds a header by exact name, returning the last match. Callers that
/// accumulate duplicate header lines during parsing rely on this so the
/// last occurrence wins.
pub fn find_header_value<'a>(headers: &'a [Header], name: &str) -> Option<&'a HeaderValue> {
    headers
        .iter()
        .rev()
        .find(|h| h.name == name)
        .map(|h| &h.value)
}
