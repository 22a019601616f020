//! Incremental byte-level parsers.
//!
//! Both parsers expose a single `feed` operation returning a tri-valued
//! [`Outcome`] rather than implementing a buffering codec trait: the
//! contract requires that feeding a byte sequence split at any boundary
//! yields the same result as feeding it in one shot, which is most directly
//! expressed as a plain state machine over `&[u8]`.

mod headers;
pub mod reply;
pub mod request;

use crate::error::FailureCode;

/// The result of a single [`request::RequestParser::feed`] or
/// [`reply::ReplyParser::feed`] call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The structure is fully populated; the paired `usize` from `feed` is
    /// one past the final byte consumed.
    Accepted,
    /// Parsing failed; [`request::RequestParser::failure_reason`] (or the
    /// reply parser's equivalent) holds the code.
    Rejected(FailureCode),
    /// More bytes are needed; internal state is preserved across calls.
    NeedMore,
}
