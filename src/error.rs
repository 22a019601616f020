//! Status codes and the error taxonomy of the wire protocol.

use std::fmt;

/// The closed set of reply status codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatusCode {
    /// 200 — request served.
    Ok,
    /// 400 — generic malformed request.
    BadReq,
    /// 404 — FOF: noun not in dictionary.
    NounNotFound,
    /// 411 — version major mismatch.
    BadMajor,
    /// 412 — version minor mismatch.
    BadMinor,
    /// 413 — version patch mismatch.
    BadPatch,
    /// 420 — verb not in {ISSING, FOF}.
    UnknownVerb,
    /// 500 — handler failure.
    Internal,
}

impl StatusCode {
    pub fn code(self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadReq => 400,
            StatusCode::NounNotFound => 404,
            StatusCode::BadMajor => 411,
            StatusCode::BadMinor => 412,
            StatusCode::BadPatch => 413,
            StatusCode::UnknownVerb => 420,
            StatusCode::Internal => 500,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadReq => "Bad Request",
            StatusCode::NounNotFound => "Noun Not Found",
            StatusCode::BadMajor => "Bad Major Version",
            StatusCode::BadMinor => "Bad Minor Version",
            StatusCode::BadPatch => "Bad Patch Version",
            StatusCode::UnknownVerb => "Unknown Verb",
            StatusCode::Internal => "Internal Error",
        }
    }

    /// Recovers a `StatusCode` from a three-digit wire code, used by the
    /// reply parser once the three code digits have been read.
    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            200 => StatusCode::Ok,
            400 => StatusCode::BadReq,
            404 => StatusCode::NounNotFound,
            411 => StatusCode::BadMajor,
            412 => StatusCode::BadMinor,
            413 => StatusCode::BadPatch,
            420 => StatusCode::UnknownVerb,
            500 => StatusCode::Internal,
            _ => return None,
        })
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

/// The subset of [`StatusCode`] a parser can produce on `rejected`: parse
/// errors surfaced as a stock reply.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureCode {
    BadReq,
    BadMajor,
    BadMinor,
    BadPatch,
    UnknownVerb,
}

impl From<FailureCode> for StatusCode {
    fn from(f: FailureCode) -> Self {
        match f {
            FailureCode::BadReq => StatusCode::BadReq,
            FailureCode::BadMajor => StatusCode::BadMajor,
            FailureCode::BadMinor => StatusCode::BadMinor,
            FailureCode::BadPatch => StatusCode::BadPatch,
            FailureCode::UnknownVerb => StatusCode::UnknownVerb,
        }
    }
}

/// Programmer-facing errors raised by the encoder and the request handler.
/// These are local mistakes, not wire-level failures, and are never sent to
/// a peer directly.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ProtoError {
    /// A header's stored value doesn't match the variant its name requires.
    #[error("header `{name}` has a value of the wrong type for encoding")]
    BadHeaderValue { name: String },

    /// A header was looked up by name but isn't present.
    #[error("no such header: `{0}`")]
    UnknownHeader(String),

    /// `Content-Length` was missing or not an integer at encode time.
    #[error("missing or non-integer Content-Length")]
    MissingContentLength,

    /// Attempted to encode a `Request` whose command is still `Invalid`.
    #[error("cannot encode a request with no command set")]
    InvalidCommand,
}

/// I/O errors from a [`crate::connection::Connection`]'s read/write/accept
/// paths. These are not recovered: they terminate the connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),
    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_round_trips_through_its_wire_code() {
        for sc in [
            StatusCode::Ok,
            StatusCode::BadReq,
            StatusCode::NounNotFound,
            StatusCode::BadMajor,
            StatusCode::BadMinor,
            StatusCode::BadPatch,
            StatusCode::UnknownVerb,
            StatusCode::Internal,
        ] {
            assert_eq!(StatusCode::from_code(sc.code()), Some(sc));
        }
    }

    #[test]
    fn unknown_wire_code_is_rejected() {
        assert_eq!(StatusCode::from_code(999), None);
    }

    #[test]
    fn failure_code_maps_onto_its_status_code() {
        assert_eq!(StatusCode::from(FailureCode::BadMajor), StatusCode::BadMajor);
        assert_eq!(StatusCode::from(FailureCode::UnknownVerb).code(), 420);
    }
}
