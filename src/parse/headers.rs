//! The header-loop sub-automaton shared by [`super::request::RequestParser`]
//! and [`super::reply::ReplyParser`].
//!
//! Both parsers reach the same grammar once past their own preamble
//! (`(HEADER CRLF)* CRLF`), so the loop lives here once instead of twice.

use crate::header::{Header, HeaderValue, CONTENT_LENGTH};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum HeaderPhase {
    /// Reading a header name, or (with an empty accumulator) the `CR` that
    /// ends the header block.
    Name,
    /// Just consumed `:`; exactly one `SP` is mandatory next.
    Colon,
    /// Reading a header value until `CR`.
    Value,
    /// Just consumed the value's `CR`; `LF` is mandatory next.
    ValueCr,
    /// Just consumed the blank line's `CR`; `LF` is mandatory next.
    EndCr,
}

pub(crate) enum HeaderStep {
    Continue,
    /// The blank `CRLF` terminating the header block was just consumed.
    HeadersDone,
    Reject,
}

/// Accumulates headers and the distinguished `Content-Length` value as they
/// are parsed. Duplicate headers are kept in order; the last one wins when
/// looked up.
#[derive(Debug, Default)]
pub(crate) struct HeaderAccumulator {
    pub(crate) headers: Vec<Header>,
    pub(crate) content_length: Option<u64>,
    name_acc: String,
    value_acc: String,
}

impl HeaderAccumulator {
    pub(crate) fn step(&mut self, phase: &mut HeaderPhase, byte: u8) -> HeaderStep {
        match *phase {
            HeaderPhase::Name => match byte {
                b':' => {
                    *phase = HeaderPhase::Colon;
                    HeaderStep::Continue
                }
                b'\r' if self.name_acc.is_empty() => {
                    *phase = HeaderPhase::EndCr;
                    HeaderStep::Continue
                }
                b'\r' | b'\n' => HeaderStep::Reject,
                b => {
                    self.name_acc.push(b as char);
                    HeaderStep::Continue
                }
            },
            HeaderPhase::Colon => {
                if byte == b' ' {
                    *phase = HeaderPhase::Value;
                    HeaderStep::Continue
                } else {
                    HeaderStep::Reject
                }
            }
            HeaderPhase::Value => match byte {
                b'\r' => {
                    if !self.finish_header() {
                        return HeaderStep::Reject;
                    }
                    *phase = HeaderPhase::ValueCr;
                    HeaderStep::Continue
                }
                b'\n' => HeaderStep::Reject,
                b => {
                    self.value_acc.push(b as char);
                    HeaderStep::Continue
                }
            },
            HeaderPhase::ValueCr => {
                if byte == b'\n' {
                    *phase = HeaderPhase::Name;
                    HeaderStep::Continue
                } else {
                    HeaderStep::Reject
                }
            }
            HeaderPhase::EndCr => {
                if byte == b'\n' {
                    HeaderStep::HeadersDone
                } else {
                    HeaderStep::Reject
                }
            }
        }
    }

    /// Commits `name_acc`/`value_acc` into `headers`, special-casing
    /// `Content-Length`, which must parse as a non-negative decimal integer.
    /// Returns `false` on a bad `Content-Length` value.
    fn finish_header(&mut self) -> bool {
        let name = std::mem::take(&mut self.name_acc);
        let value = std::mem::take(&mut self.value_acc);
        if name == CONTENT_LENGTH {
            let Ok(len) = value.parse::<u64>() else {
                return false;
            };
            self.content_length = Some(len);
            self.headers.push(Header::content_length(len));
        } else {
            self.headers.push(Header::new(name, HeaderValue::Text(value)));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(bytes: &[u8]) -> (HeaderAccumulator, HeaderPhase, bool) {
        let mut acc = HeaderAccumulator::default();
        let mut phase = HeaderPhase::Name;
        for &b in bytes {
            match acc.step(&mut phase, b) {
                HeaderStep::Continue => {}
                HeaderStep::HeadersDone => return (acc, phase, true),
                HeaderStep::Reject => return (acc, phase, false),
            }
        }
        (acc, phase, false)
    }

    #[test]
    fn single_header_then_blank_line() {
        let (acc, _, done) = feed(b"Content-Length: 18\r\n\r\n");
        assert!(done);
        assert_eq!(acc.content_length, Some(18));
    }

    #[test]
    fn bad_content_length_value_is_rejected() {
        let (_, _, done) = feed(b"Content-Length: not-a-number\r\n\r\n");
        assert!(!done);
    }

    #[test]
    fn duplicate_content_length_last_wins() {
        let (acc, _, done) = feed(b"Content-Length: 1\r\nContent-Length: 2\r\n\r\n");
        assert!(done);
        assert_eq!(acc.content_length, Some(2));
    }

    #[test]
    fn missing_space_after_colon_is_rejected() {
        let (_, _, done) = feed(b"X-Foo:bar\r\n\r\n");
        assert!(!done);
    }

    #[test]
    fn no_headers_just_blank_line() {
        let (acc, _, done) = feed(b"\r\n");
        assert!(done);
        assert!(acc.headers.is_empty());
    }
}
