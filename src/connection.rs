//! Per-connection state machine, grounded on
//! `original_source/pluralisation/server/cmd/cpp/Connection.cpp`'s
//! `start`/`handleRead`/`handleWrite` transitions and
//! `original_source/hpp/Connection.hpp`'s fixed 8192-byte buffer and
//! single-owner socket.
//!
//! The source captures `shared_from_this()` in every pending
//! `async_read`/`async_write` callback so the `Connection` outlives its
//! in-flight I/O, destroying itself once no callback is pending and no new
//! op is scheduled. A tokio task that owns its `Connection` by value and
//! simply returns on every terminal path is the direct idiom for the same
//! lifetime contract: the task itself is the one "pending callback", and
//! dropping it (by returning) is the destruction DESIGN.md describes.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, trace, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{ConnectionError, StatusCode};
use crate::handler::ReqHandler;
use crate::parse::request::RequestParser;
use crate::parse::Outcome;
use crate::reply::Reply;
use crate::request::{Command, Request};

/// Fixed capacity of the per-connection read buffer. No per-message
/// allocation happens on the read path: every read lands in this same
/// buffer, overwriting whatever the parser already consumed.
pub const READ_BUFFER_CAPACITY: usize = 8192;

/// Owns a single accepted socket for its entire lifetime, together with the
/// embedded `RequestParser`/`Request`/`Reply` that drive it. Bound to
/// exactly one reactor: every await point here resumes on whichever tokio
/// runtime `start` was spawned on.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    read_buffer: Box<[u8; READ_BUFFER_CAPACITY]>,
    parser: RequestParser,
    request: Request,
    reply: Reply,
    handler: Arc<ReqHandler>,
}

impl Connection {
    /// Constructs a `Connection` for a freshly accepted socket, sharing the
    /// handler reference with every other connection on the server.
    pub fn new(stream: TcpStream, peer: SocketAddr, handler: Arc<ReqHandler>) -> Self {
        Self {
            stream,
            peer,
            read_buffer: Box::new([0u8; READ_BUFFER_CAPACITY]),
            parser: RequestParser::new(),
            request: Request::new(Command::Invalid),
            reply: Reply::new(StatusCode::Internal),
            handler,
        }
    }

    /// Drives this connection to completion: read → parse → dispatch or
    /// stock-reply → write → half-close → drop. Every exit path — a full
    /// reply sent, a read error, or a write error — ends the connection;
    /// there is no pipelining and no persistent connection.
    pub async fn start(mut self) {
        debug!("connection from {} starting", self.peer);
        loop {
            let n = match self.stream.read(self.read_buffer.as_mut_slice()).await {
                Ok(0) => {
                    debug!("{}: peer closed before a complete request arrived", self.peer);
                    return;
                }
                Ok(n) => n,
                Err(e) => {
                    warn!("{}: read failed: {}", self.peer, ConnectionError::Read(e));
                    return;
                }
            };

            let (outcome, _consumed) = self
                .parser
                .feed(&mut self.request, &self.read_buffer[..n]);

            match outcome {
                Outcome::NeedMore => {
                    trace!("{}: parser needs more data", self.peer);
                    continue;
                }
                Outcome::Accepted => {
                    debug!(
                        "{}: accepted {:?} request, dispatching to handler",
                        self.peer, self.request.command
                    );
                    self.handler.handle(&self.request, &mut self.reply);
                    let _ = self.write_reply_and_close().await;
                    return;
                }
                Outcome::Rejected(code) => {
                    debug!("{}: request rejected: {:?}", self.peer, code);
                    self.reply = Reply::stock_reply(code.into());
                    let _ = self.write_reply_and_close().await;
                    return;
                }
            }
        }
    }

    /// Encodes `self.reply` and writes it out, falling back to a `500`
    /// stock reply if encoding fails, then half-closes the socket, ignoring
    /// any error from the shutdown itself.
    async fn write_reply_and_close(&mut self) -> Result<(), ConnectionError> {
        if self.reply.to_buffers().is_err() {
            warn!(
                "{}: reply failed to encode, falling back to a 500 stock reply",
                self.peer
            );
            self.reply = Reply::stock_reply(StatusCode::Internal);
        }

        let result = {
            let mut buffers = self
                .reply
                .to_buffers()
                .expect("a stock reply always encodes");
            write_all_vectored(&mut self.stream, &mut buffers).await
        };

        match result {
            Ok(()) => {
                let _ = self.stream.shutdown().await;
                debug!("{}: reply written, connection shut down", self.peer);
                Ok(())
            }
            Err(e) => {
                warn!("{}: write failed: {}", self.peer, ConnectionError::Write(e));
                Err(ConnectionError::Write(e))
            }
        }
    }
}

/// Writes every buffer in `bufs` to `stream`, looping over partial vectored
/// writes. The encoder's ordered, zero-copy buffer list is written as-is,
/// with no intermediate copy into one contiguous buffer.
async fn write_all_vectored(
    stream: &mut TcpStream,
    bufs: &mut [io::IoSlice<'_>],
) -> io::Result<()> {
    let mut bufs = bufs;
    while !bufs.is_empty() {
        let n = stream.write_vectored(bufs).await?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned 0 bytes"));
        }
        io::IoSlice::advance_slices(&mut bufs, n);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn connected_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (accepted, connected) = tokio::join!(listener.accept(), TcpStream::connect(addr));
        (accepted.unwrap().0, connected.unwrap())
    }

    #[tokio::test]
    async fn well_formed_issing_request_gets_a_reply_and_the_socket_is_closed() {
        let (server_sock, mut client_sock) = connected_pair().await;

        let handler = Arc::new(ReqHandler::new(crate::handler::dictionary::Dictionary::seeded()));
        let conn = Connection::new(server_sock, "127.0.0.1:0".parse().unwrap(), handler);

        let noun = "പൂച്ച".as_bytes();
        let request = format!(
            "MPP/1.3.5 ISSING \r\nContent-Length: {}\r\n\r\n",
            noun.len()
        );

        let conn_task = tokio::spawn(conn.start());
        client_sock.write_all(request.as_bytes()).await.unwrap();
        client_sock.write_all(noun).await.unwrap();

        let mut response = Vec::new();
        client_sock.read_to_end(&mut response).await.unwrap();
        conn_task.await.unwrap();

        let response = String::from_utf8(response).unwrap();
        assert!(response.starts_with("MPP/1.3.5 200 OK\r\n"));
        assert!(response.ends_with("true"));
    }

    #[tokio::test]
    async fn malformed_request_gets_a_stock_reply() {
        let (server_sock, mut client_sock) = connected_pair().await;
        let handler = Arc::new(ReqHandler::new(crate::handler::dictionary::Dictionary::seeded()));
        let conn = Connection::new(server_sock, "127.0.0.1:0".parse().unwrap(), handler);

        let conn_task = tokio::spawn(conn.start());
        client_sock
            .write_all(b"MPP/1.3.5 ISSING \r\nContent-Length: 0\r\n\nabc")
            .await
            .unwrap();
        client_sock.shutdown().await.unwrap();

        let mut response = Vec::new();
        client_sock.read_to_end(&mut response).await.unwrap();
        conn_task.await.unwrap();

        let response = String::from_utf8(response).unwrap();
        assert!(response.starts_with("MPP/1.3.5 400 Bad Request\r\n"));
    }
}
