//! In-memory reply, its wire encoder, and the stock-reply factory.

use std::io;

use crate::error::{ProtoError, StatusCode};
use crate::header::{Header, HeaderValue, CONTENT_LENGTH};
use crate::version::{VER_MAJOR, VER_MINOR, VER_PATCH};

const CONTENT_TYPE: &str = "Content-Type";
const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// A server-built or parsed reply.
#[derive(Clone, Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: Vec<Header>,
    pub content: Vec<u8>,
    encode_head: Vec<u8>,
}

impl Reply {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            content: Vec::new(),
            encode_head: Vec::new(),
        }
    }

    /// Sets `content` and keeps `Content-Length`/`Content-Type` in sync.
    pub fn set_content(&mut self, content: Vec<u8>) {
        self.headers
            .retain(|h| h.name != CONTENT_LENGTH && h.name != CONTENT_TYPE);
        self.headers.push(Header::content_length(content.len() as u64));
        self.headers.push(Header::text(CONTENT_TYPE, TEXT_PLAIN_UTF8));
        self.content = content;
    }

    /// A canned reply with an empty body, used for protocol-layer failures
    /// that never reach [`crate::handler::ReqHandler`].
    pub fn stock_reply(status: StatusCode) -> Self {
        let mut reply = Self::new(status);
        reply.headers.push(Header::content_length(0));
        reply
    }

    /// Encodes the status line and headers into `encode_head`, then returns
    /// it and `content` as an ordered, zero-copy list of buffers, symmetric
    /// to [`crate::request::Request::to_buffers`].
    pub fn to_buffers(&mut self) -> Result<Vec<io::IoSlice<'_>>, ProtoError> {
        let mut head = String::new();
        head.push_str(&format!(
            "MPP/{VER_MAJOR}.{VER_MINOR}.{VER_PATCH} {} {}\r\n",
            self.status.code(),
            self.status.reason()
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
            io::IoSlice::new(&self.content),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_reply_encodes_to_the_documented_wire_layout() {
        let mut reply = Reply::new(StatusCode::Ok);
        reply.set_content(b"true".to_vec());
        let buffers = reply.to_buffers().unwrap();
        let mut out = Vec::new();
        for buf in &buffers {
            out.extend_from_slice(buf);
        }
        assert_eq!(
            out,
            b"MPP/1.3.5 200 OK\r\nContent-Length: 4\r\nContent-Type: text/plain; charset=utf-8\r\n\r\ntrue"
                .to_vec()
        );
    }

    #[test]
    fn stock_reply_has_an_empty_body_and_matching_content_length() {
        let mut reply = Reply::stock_reply(StatusCode::BadMajor);
        let buffers = reply.to_buffers().unwrap();
        let mut out = Vec::new();
        for buf in &buffers {
            out.extend_from_slice(buf);
        }
        assert!(out.starts_with(b"MPP/1.3.5 411 Bad Major Version\r\n"));
        assert!(out.ends_with(b"Content-Length: 0\r\n\r\n"));
    }

    #[test]
    fn missing_content_length_is_rejected_at_encode_time() {
        let mut reply = Reply::new(StatusCode::Ok);
        assert!(matches!(
            reply.to_buffers(),
            Err(ProtoError::MissingContentLength)
        ));
    }
}
