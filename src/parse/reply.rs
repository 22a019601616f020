//! Incremental reply parser, grounded on
//! `original_source/pluralisation/mpp/lib/hpp/mpp/RepParser.hpp`'s state set
//! (`initial_m` .. `header_val`), with the `dont_care` reason-phrase skip and
//! the `setState`/`set_state` surface carried over 1:1.

use super::headers::{HeaderAccumulator, HeaderPhase, HeaderStep};
use super::Outcome;
use crate::error::{FailureCode, StatusCode};
use crate::reply::Reply;
use crate::version::{VER_MAJOR, VER_MINOR, VER_PATCH};

/// Mirrors `RepParser::State` (`original_source`'s `RepParser.hpp`): the
/// states for `\r`/`\n` are folded into the byte-matching transitions that
/// already exist elsewhere in this parser, same as the request parser.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    ProtocolM,
    ProtocolFirstP,
    ProtocolSecondP,
    Slash,
    Major,
    Minor,
    Patch,
    FirstCodeDigit,
    SecondCodeDigit,
    ThirdCodeDigit,
    /// Ignoring the reason phrase: every byte after the three-digit code and
    /// before `CRLF` is skipped.
    DontCare,
    StatusLineCr,
    StatusLineLf,
    Headers(HeaderPhase),
    Body,
}

/// Parses a `Reply` incrementally from raw bytes.
///
/// Shares its shape with [`super::request::RequestParser`]: a single `feed`
/// operation with a tri-valued [`Outcome`], preserving state across calls so
/// that a byte sequence split at any boundary yields the same result as one
/// fed in a single call.
#[derive(Debug)]
pub struct ReplyParser {
    state: State,
    major_acc: String,
    minor_acc: String,
    patch_acc: String,
    code_acc: String,
    headers: HeaderAccumulator,
    remaining_body: u64,
    last_failure: Option<FailureCode>,
}

impl Default for ReplyParser {
    fn default() -> Self {
        Self {
            state: State::ProtocolM,
            major_acc: String::new(),
            minor_acc: String::new(),
            patch_acc: String::new(),
            code_acc: String::new(),
            headers: HeaderAccumulator::default(),
            remaining_body: 0,
            last_failure: None,
        }
    }
}

impl ReplyParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns this parser to its initial state, ready to parse a new reply
    /// from scratch.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The failure code recorded by the most recent `rejected` outcome.
    pub fn failure_reason(&self) -> Option<FailureCode> {
        self.last_failure
    }

    /// Current parser state, mirroring `RepParser::getState`.
    pub fn state(&self) -> State {
        self.state
    }

    /// Manually restates the parser, so a caller can skip over framing
    /// bytes it has already consumed out-of-band before feeding more data.
    /// Mirrors `RepParser::setState` 1:1 (DESIGN.md's Open Question
    /// resolution).
    pub fn set_state(&mut self, state: State) {
        self.state = state;
    }

    fn reject(&mut self, code: FailureCode) -> Outcome {
        self.last_failure = Some(code);
        Outcome::Rejected(code)
    }

    /// Feeds `buf` to the parser, resuming wherever the previous call left
    /// off. Returns the outcome and the number of bytes of `buf` consumed.
    pub fn feed(&mut self, reply: &mut Reply, buf: &[u8]) -> (Outcome, usize) {
        for (i, &byte) in buf.iter().enumerate() {
            let outcome = self.step(reply, byte);
            match outcome {
                Outcome::NeedMore => continue,
                Outcome::Accepted | Outcome::Rejected(_) => return (outcome, i + 1),
            }
        }
        (Outcome::NeedMore, buf.len())
    }

    fn step(&mut self, reply: &mut Reply, byte: u8) -> Outcome {
        log::trace!("reply parser: {:?} + {:#04x}", self.state, byte);
        match self.state {
            State::ProtocolM => self.expect_literal(byte, b'M', State::ProtocolFirstP),
            State::ProtocolFirstP => self.expect_literal(byte, b'P', State::ProtocolSecondP),
            State::ProtocolSecondP => self.expect_literal(byte, b'P', State::Slash),
            State::Slash => self.expect_literal(byte, b'/', State::Major),

            State::Major => self.digit_component(byte, b'.', State::Minor, Component::Major),
            State::Minor => self.digit_component(byte, b'.', State::Patch, Component::Minor),
            State::Patch => self.digit_component(byte, b' ', State::FirstCodeDigit, Component::Patch),

            State::FirstCodeDigit => self.code_digit(byte, State::SecondCodeDigit),
            State::SecondCodeDigit => self.code_digit(byte, State::ThirdCodeDigit),
            State::ThirdCodeDigit => {
                if !byte.is_ascii_digit() {
                    return self.reject(FailureCode::BadReq);
                }
                self.code_acc.push(byte as char);
                let Ok(code) = self.code_acc.parse::<u16>() else {
                    return self.reject(FailureCode::BadReq);
                };
                let Some(status) = StatusCode::from_code(code) else {
                    return self.reject(FailureCode::BadReq);
                };
                reply.status = status;
                self.state = State::DontCare;
                Outcome::NeedMore
            }

            State::DontCare => {
                if byte == b'\r' {
                    self.state = State::StatusLineLf;
                }
                Outcome::NeedMore
            }
            State::StatusLineLf => self.expect_literal(byte, b'\n', State::Headers(HeaderPhase::Name)),
            // Present for symmetry with the request parser's explicit CR
            // state; reachable only via a manual `set_state`.
            State::StatusLineCr => self.expect_literal(byte, b'\r', State::StatusLineLf),

            State::Headers(mut header_phase) => {
                match self.headers.step(&mut header_phase, byte) {
                    HeaderStep::Continue => {
                        self.state = State::Headers(header_phase);
                        Outcome::NeedMore
                    }
                    HeaderStep::Reject => self.reject(FailureCode::BadReq),
                    HeaderStep::HeadersDone => {
                        let len = self.headers.content_length.unwrap_or(0);
                        reply.headers = std::mem::take(&mut self.headers.headers);
                        if len == 0 {
                            Outcome::Accepted
                        } else {
                            self.remaining_body = len;
                            self.state = State::Body;
                            Outcome::NeedMore
                        }
                    }
                }
            }

            State::Body => {
                reply.content.push(byte);
                self.remaining_body -= 1;
                if self.remaining_body == 0 {
                    Outcome::Accepted
                } else {
                    Outcome::NeedMore
                }
            }
        }
    }

    fn expect_literal(&mut self, byte: u8, expected: u8, next: State) -> Outcome {
        if byte == expected {
            self.state = next;
            Outcome::NeedMore
        } else {
            self.reject(FailureCode::BadReq)
        }
    }

    fn code_digit(&mut self, byte: u8, next: State) -> Outcome {
        if !byte.is_ascii_digit() {
            return self.reject(FailureCode::BadReq);
        }
        self.code_acc.push(byte as char);
        self.state = next;
        Outcome::NeedMore
    }

    fn digit_component(&mut self, byte: u8, terminator: u8, next: State, component: Component) -> Outcome {
        if byte.is_ascii_digit() {
            component.acc(self).push(byte as char);
            return Outcome::NeedMore;
        }
        if byte != terminator {
            return self.reject(FailureCode::BadReq);
        }
        let acc = std::mem::take(component.acc(self));
        let (expected, code) = match component {
            Component::Major => (VER_MAJOR, FailureCode::BadMajor),
            Component::Minor => (VER_MINOR, FailureCode::BadMinor),
            Component::Patch => (VER_PATCH, FailureCode::BadPatch),
        };
        let Ok(parsed) = acc.parse::<u16>() else {
            return self.reject(FailureCode::BadReq);
        };
        if parsed != expected {
            return self.reject(code);
        }
        self.state = next;
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
    fn acc(self, parser: &mut ReplyParser) -> &mut String {
        match self {
            Component::Major => &mut parser.major_acc,
            Component::Minor => &mut parser.minor_acc,
            Component::Patch => &mut parser.patch_acc,
        }
    }
}
