//! Incremental request parser, grounded on
//! `original_source/server/cpp/ReqParser.cpp`'s state set, with version and
//! verb bytes classified as pure ASCII rather than via locale predicates.

use super::headers::{HeaderAccumulator, HeaderPhase, HeaderStep};
use super::Outcome;
use crate::error::FailureCode;
use crate::header::CONTENT_LENGTH;
use crate::request::{Command, Request};
use crate::version::{VER_MAJOR, VER_MINOR, VER_PATCH};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Phase {
    ProtocolM,
    ProtocolFirstP,
    ProtocolSecondP,
    Slash,
    Major,
    Minor,
    Patch,
    VerbStart,
    FofO,
    FofF,
    IssingFirstS,
    IssingSecondS,
    IssingSecondI,
    IssingN,
    IssingG,
    Space,
    RequestLineCr,
    RequestLineLf,
    Headers(HeaderPhase),
    Body,
}

/// Parses a `Request` incrementally from raw bytes.
///
/// A single `RequestParser` is meant to be fed once per request; reuse it
/// only after calling [`RequestParser::reset`].
#[derive(Debug)]
pub struct RequestParser {
    phase: Phase,
    major_acc: String,
    minor_acc: String,
    patch_acc: String,
    matched_command: Command,
    headers: HeaderAccumulator,
    remaining_body: u64,
    last_failure: Option<FailureCode>,
}

impl Default for RequestParser {
    fn default() -> Self {
        Self {
            phase: Phase::ProtocolM,
            major_acc: String::new(),
            minor_acc: String::new(),
            patch_acc: String::new(),
            matched_command: Command::Invalid,
            headers: HeaderAccumulator::default(),
            remaining_body: 0,
            last_failure: None,
        }
    }
}

impl RequestParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns this parser to its initial state, ready to parse a new
    /// request from scratch.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The failure code recorded by the most recent `rejected` outcome.
    pub fn failure_reason(&self) -> Option<FailureCode> {
        self.last_failure
    }

    fn reject(&mut self, code: FailureCode) -> Outcome {
        self.last_failure = Some(code);
        Outcome::Rejected(code)
    }

    /// Feeds `buf` to the parser, resuming wherever the previous call left
    /// off. Returns the outcome and the number of bytes of `buf` consumed.
    /// Splitting `buf` at any boundary across calls must not change the
    /// result.
    pub fn feed(&mut self, request: &mut Request, buf: &[u8]) -> (Outcome, usize) {
        for (i, &byte) in buf.iter().enumerate() {
            let outcome = self.step(request, byte);
            match outcome {
                Outcome::NeedMore => continue,
                Outcome::Accepted | Outcome::Rejected(_) => return (outcome, i + 1),
            }
        }
        (Outcome::NeedMore, buf.len())
    }

    fn step(&mut self, request: &mut Request, byte: u8) -> Outcome {
        log::trace!("request parser: {:?} + {:#04x}", self.phase, byte);
        match self.phase {
            Phase::ProtocolM => self.expect_literal(byte, b'M', Phase::ProtocolFirstP),
            Phase::ProtocolFirstP => self.expect_literal(byte, b'P', Phase::ProtocolSecondP),
            Phase::ProtocolSecondP => self.expect_literal(byte, b'P', Phase::Slash),
            Phase::Slash => self.expect_literal(byte, b'/', Phase::Major),

            Phase::Major => self.digit_component(byte, b'.', Phase::Minor, Component::Major),
            Phase::Minor => self.digit_component(byte, b'.', Phase::Patch, Component::Minor),
            Phase::Patch => self.digit_component(byte, b' ', Phase::VerbStart, Component::Patch),

            Phase::VerbStart => match byte.to_ascii_uppercase() {
                b'F' => {
                    self.phase = Phase::FofO;
                    Outcome::NeedMore
                }
                b'I' => {
                    self.phase = Phase::IssingFirstS;
                    Outcome::NeedMore
                }
                _ => self.reject(FailureCode::UnknownVerb),
            },
            Phase::FofO => self.verb_byte(byte, b'O', Phase::FofF),
            Phase::FofF => {
                if byte.to_ascii_uppercase() == b'F' {
                    self.matched_command = Command::Fof;
                    self.phase = Phase::Space;
                    Outcome::NeedMore
                } else {
                    self.reject(FailureCode::BadReq)
                }
            }
            Phase::IssingFirstS => self.verb_byte(byte, b'S', Phase::IssingSecondS),
            Phase::IssingSecondS => self.verb_byte(byte, b'S', Phase::IssingSecondI),
            Phase::IssingSecondI => self.verb_byte(byte, b'I', Phase::IssingN),
            Phase::IssingN => self.verb_byte(byte, b'N', Phase::IssingG),
            Phase::IssingG => {
                if byte.to_ascii_uppercase() == b'G' {
                    self.matched_command = Command::Issing;
                    self.phase = Phase::Space;
                    Outcome::NeedMore
                } else {
                    self.reject(FailureCode::BadReq)
                }
            }

            Phase::Space => {
                if byte == b' ' {
                    request.command = self.matched_command;
                    self.phase = Phase::RequestLineCr;
                    Outcome::NeedMore
                } else {
                    self.reject(FailureCode::BadReq)
                }
            }
            Phase::RequestLineCr => self.expect_literal(byte, b'\r', Phase::RequestLineLf),
            Phase::RequestLineLf => self.expect_literal(byte, b'\n', Phase::Headers(HeaderPhase::Name)),

            Phase::Headers(mut header_phase) => {
                match self.headers.step(&mut header_phase, byte) {
                    HeaderStep::Continue => {
                        self.phase = Phase::Headers(header_phase);
                        Outcome::NeedMore
                    }
                    HeaderStep::Reject => self.reject(FailureCode::BadReq),
                    HeaderStep::HeadersDone => {
                        let Some(len) = self.headers.content_length else {
                            return self.reject(FailureCode::BadReq);
                        };
                        request.headers = std::mem::take(&mut self.headers.headers);
                        if len == 0 {
                            Outcome::Accepted
                        } else {
                            self.remaining_body = len;
                            self.phase = Phase::Body;
                            Outcome::NeedMore
                        }
                    }
                }
            }

            Phase::Body => {
                request.noun.push(byte);
                self.remaining_body -= 1;
                if self.remaining_body == 0 {
                    Outcome::Accepted
                } else {
                    Outcome::NeedMore
                }
            }
        }
    }

    fn expect_literal(&mut self, byte: u8, expected: u8, next: Phase) -> Outcome {
        if byte == expected {
            self.phase = next;
            Outcome::NeedMore
        } else {
            self.reject(FailureCode::BadReq)
        }
    }

    fn verb_byte(&mut self, byte: u8, expected: u8, next: Phase) -> Outcome {
        if byte.to_ascii_uppercase() == expected {
            self.phase = next;
            Outcome::NeedMore
        } else {
            self.reject(FailureCode::BadReq)
        }
    }

    fn digit_component(
        &mut self,
        byte: u8,
        terminator: u8,
        next: Phase,
        component: Component,
    ) -> Outcome {
        if byte.is_ascii_digit() {
            component.acc(self).push(byte as char);
            return Outcome::NeedMore;
        }
        if byte != terminator {
            return self.reject(FailureCode::BadReq);
        }
        let acc = std::mem::take(component.acc(self));
        let (value, expected, code) = match component {
            Component::Major => (acc, VER_MAJOR, FailureCode::BadMajor),
            Component::Minor => (acc, VER_MINOR, FailureCode::BadMinor),
            Component::Patch => (acc, VER_PATCH, FailureCode::BadPatch),
        };
        let Ok(parsed) = value.parse::<u16>() else {
            return self.reject(FailureCode::BadReq);
        };
        if parsed != expected {
            return self.reject(code);
        }
        self.phase = next;
        Outcome::NeedMore
    }
}

#[derive(Clone, Copy)]
enum Component {
    Major,
    Minor,
    Patch,
}

impl Component {
    fn acc(self, parser: &mut RequestParser) -> &mut String {
        match self {
            Component::Major => &mut parser.major_acc,
            Component::Minor => &mut parser.minor_acc,
            Component::Patch => &mut parser.patch_acc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one_shot(bytes: &[u8]) -> (Outcome, Request) {
        let mut parser = RequestParser::new();
        let mut request = Request::new(Command::Invalid);
        let (outcome, _) = parser.feed(&mut request, bytes);
        (outcome, request)
    }

    fn parse_byte_at_a_time(bytes: &[u8]) -> (Outcome, Request) {
        let mut parser = RequestParser::new();
        let mut request = Request::new(Command::Invalid);
        let mut last = Outcome::NeedMore;
        for &b in bytes {
            let (outcome, _) = parser.feed(&mut request, &[b]);
            last = outcome;
            if !matches!(outcome, Outcome::NeedMore) {
                break;
            }
        }
        (last, request)
    }

    const WELL_FORMED: &[u8] =
        b"MPP/1.3.5 ISSING \r\nContent-Length: 3\r\n\r\nabc";

    #[test]
    fn well_formed_issing_request_is_accepted() {
        let (outcome, request) = parse_one_shot(WELL_FORMED);
        assert_eq!(outcome, Outcome::Accepted);
        assert_eq!(request.command, Command::Issing);
        assert_eq!(request.noun, b"abc");
        assert_eq!(
            crate::header::find_header_value(&request.headers, CONTENT_LENGTH)
                .and_then(crate::header::HeaderValue::as_integer),
            Some(3)
        );
    }

    #[test]
    fn byte_at_a_time_matches_one_shot() {
        let (one_shot, one_shot_req) = parse_one_shot(WELL_FORMED);
        let (split, split_req) = parse_byte_at_a_time(WELL_FORMED);
        assert_eq!(one_shot, split);
        assert_eq!(one_shot_req.command, split_req.command);
        assert_eq!(one_shot_req.noun, split_req.noun);
    }

    #[test]
    fn split_request_delivered_across_two_writes_matches_one_shot() {
        let whole = b"MPP/1.3.5 ISSING \r\nContent-Length: 3\r\n\r\nabc";
        let (first, second) = whole.split_at(8);
        assert_eq!(first, b"MPP/1.3.");

        let mut parser = RequestParser::new();
        let mut request = Request::new(Command::Invalid);
        let (outcome1, consumed1) = parser.feed(&mut request, first);
        assert_eq!(outcome1, Outcome::NeedMore);
        assert_eq!(consumed1, first.len());
        let (outcome2, _) = parser.feed(&mut request, second);
        assert_eq!(outcome2, Outcome::Accepted);
        assert_eq!(request.noun, b"abc");
    }

    #[test]
    fn empty_noun_with_zero_content_length_is_accepted() {
        let (outcome, request) =
            parse_one_shot(b"MPP/1.3.5 ISSING \r\nContent-Length: 0\r\n\r\n");
        assert_eq!(outcome, Outcome::Accepted);
        assert!(request.noun.is_empty());
    }

    #[test]
    fn incomplete_content_length_stays_need_more() {
        let mut parser = RequestParser::new();
        let mut request = Request::new(Command::Invalid);
        let (outcome, _) = parser.feed(
            &mut request,
            b"MPP/1.3.5 ISSING \r\nContent-Length: 10\r\n\r\nabc",
        );
        assert_eq!(outcome, Outcome::NeedMore);
    }

    #[test]
    fn version_major_mismatch_is_rejected() {
        let (outcome, _) =
            parse_one_shot(b"MPP/2.0.0 ISSING \r\nContent-Length: 0\r\n\r\n");
        assert_eq!(outcome, Outcome::Rejected(FailureCode::BadMajor));
    }

    #[test]
    fn unknown_verb_is_rejected() {
        let (outcome, _) =
            parse_one_shot(b"MPP/1.3.5 QUACK \r\nContent-Length: 0\r\n\r\n");
        assert_eq!(outcome, Outcome::Rejected(FailureCode::UnknownVerb));
    }

    #[test]
    fn missing_crlf_between_headers_and_body_is_rejected() {
        // A single LF where the blank line terminating the header block
        // should be `CRLF` is not a valid header-name byte either.
        let (outcome, _) =
            parse_one_shot(b"MPP/1.3.5 ISSING \r\nContent-Length: 0\r\n\nabc");
        assert_eq!(outcome, Outcome::Rejected(FailureCode::BadReq));
    }

    #[test]
    fn fof_verb_is_recognised() {
        let (outcome, request) =
            parse_one_shot(b"MPP/1.3.5 FOF \r\nContent-Length: 1\r\n\r\nx");
        assert_eq!(outcome, Outcome::Accepted);
        assert_eq!(request.command, Command::Fof);
    }

    #[test]
    fn missing_content_length_header_is_rejected() {
        let (outcome, _) = parse_one_shot(b"MPP/1.3.5 ISSING \r\n\r\n");
        assert_eq!(outcome, Outcome::Rejected(FailureCode::BadReq));
    }
}
