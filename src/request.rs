//! In-memory request and its wire encoder.

use std::io;

use crate::error::ProtoError;
use crate::header::{Header, HeaderValue, CONTENT_LENGTH};
use crate::version::{VER_MAJOR, VER_MINOR, VER_PATCH};

/// The request's operation identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    /// "Is Singular": boolean predicate on a noun.
    Issing,
    /// "Find Opposite Form": singular/plural toggle for a noun.
    Fof,
    /// The constructed-but-unset initial value; never sent on the wire.
    Invalid,
}

impl Command {
    fn verb(self) -> Option<&'static str> {
        match self {
            Command::Issing => Some("ISSING"),
            Command::Fof => Some("FOF"),
            Command::Invalid => None,
        }
    }
}

/// A parsed or client-constructed request.
///
/// `headers` preserves insertion order; `noun` is the UTF-8 payload framed
/// by the `Content-Length` header. Its character class is not re-validated
/// here.
#[derive(Clone, Debug, Default)]
pub struct Request {
    pub command: Command,
    pub headers: Vec<Header>,
    pub noun: Vec<u8>,
    /// Backing storage for the request line and header lines produced by
    /// the most recent [`Request::to_buffers`] call; the returned
    /// `IoSlice`s borrow from here, so a later call invalidates buffers
    /// from an earlier one.
    encode_head: Vec<u8>,
}

impl Default for Command {
    fn default() -> Self {
        Command::Invalid
    }
}

impl Request {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            noun: Vec::new(),
            encode_head: Vec::new(),
        }
    }

    /// Sets `noun` and keeps a single `Content-Length` header in sync with
    /// its byte length, replacing any previous one. `Content-Length` is the
    /// only required request header.
    pub fn set_noun(&mut self, noun: Vec<u8>) {
        self.headers.retain(|h| h.name != CONTENT_LENGTH);
        self.headers.push(Header::content_length(noun.len() as u64));
        self.noun = noun;
    }

    pub fn issing(noun: Vec<u8>) -> Self {
        let mut req = Self::new(Command::Issing);
        req.set_noun(noun);
        req
    }

    pub fn fof(noun: Vec<u8>) -> Self {
        let mut req = Self::new(Command::Fof);
        req.set_noun(noun);
        req
    }

    /// Encodes the request line and headers into `encode_head`, then
    /// returns it and `noun` as an ordered, zero-copy list of buffers. No
    /// header value is copied twice: the request line and header lines are
    /// formatted once per call, and the noun is referenced, never
    /// duplicated.
    pub fn to_buffers(&mut self) -> Result<Vec<io::IoSlice<'_>>, ProtoError> {
        let verb = self.command.verb().ok_or(ProtoError::InvalidCommand)?;

        let mut head = String::new();
        head.push_str(&format!(
            "MPP/{VER_MAJOR}.{VER_MINOR}.{VER_PATCH} {verb} \r\n"
        ));
        for header in &self.headers {
            if !header.has_valid_variant() {
                return Err(ProtoError::BadHeaderValue {
                    name: header.name.clone(),
                });
            }
            head.push_str(&header.name);
            head.push_str(": ");
            match &header.value {
                HeaderValue::Integer(v) => head.push_str(&v.to_string()),
                HeaderValue::Text(v) => head.push_str(v),
            }
            head.push_str("\r\n");
        }
        head.push_str("\r\n");

        if crate::header::find_header_value(&self.headers, CONTENT_LENGTH)
            .and_then(HeaderValue::as_integer)
            .is_none()
        {
            return Err(ProtoError::MissingContentLength);
        }

        self.encode_head = head.into_bytes();
        Ok(vec![
            io::IoSlice::new(&self.encode_head),
            io::IoSlice::new(&self.noun),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issing_request_encodes_to_the_documented_wire_layout() {
        let noun = "പൂച്ച".as_bytes().to_vec();
        let noun_len = noun.len();
        let mut req = Request::issing(noun.clone());
        let buffers = req.to_buffers().unwrap();
        let mut out = Vec::new();
        for buf in &buffers {
            out.extend_from_slice(buf);
        }
        let expected_head = format!("MPP/1.3.5 ISSING \r\nContent-Length: {noun_len}\r\n\r\n");
        let mut expected = expected_head.into_bytes();
        expected.extend_from_slice(&noun);
        assert_eq!(out, expected);
    }

    #[test]
    fn missing_content_length_is_rejected_at_encode_time() {
        let mut req = Request::new(Command::Issing);
        assert!(matches!(
            req.to_buffers(),
            Err(ProtoError::MissingContentLength)
        ));
    }

    #[test]
    fn bad_header_variant_is_rejected_at_encode_time() {
        let mut req = Request::fof(b"x".to_vec());
        req.headers.push(Header::new(
            CONTENT_LENGTH,
            HeaderValue::Text("not-a-number".into()),
        ));
        assert!(matches!(
            req.to_buffers(),
            Err(ProtoError::BadHeaderValue { .. })
        ));
    }

    #[test]
    fn invalid_command_cannot_be_encoded() {
        let mut req = Request::new(Command::Invalid);
        assert!(matches!(req.to_buffers(), Err(ProtoError::InvalidCommand)));
    }
}
