//! TCP acceptor, signal handling, and graceful shutdown, grounded on
//! `original_source/server/hpp/Server.hpp`'s `signal_set`, `acceptor`,
//! `IoContextPool`, and `ReqHandler` fields and its
//! `handleStop`/`startAccept`/`handleAccept` shape.
//!
//! The source's `Server` constructor binds the acceptor synchronously and
//! `run()` is the one call that blocks driving every `io_context` in the
//! pool. This crate keeps that shape: [`Server::new`] binds a plain
//! `std::net::TcpListener` right away (so the bound address is known before
//! the server ever starts accepting, and a caller can learn it via
//! [`Server::local_addr`] — handy for binding to an OS-assigned port in
//! tests), and `run()` hands that listener to tokio once a reactor is
//! actually driving, with no surrounding `#[tokio::main]` runtime of its own
//! (one would nest a second runtime inside the pool's first reactor, which
//! tokio forbids).

use std::io;
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::net::TcpListener;

use crate::connection::Connection;
use crate::handler::ReqHandler;
use crate::io_context_pool::IoContextPool;

/// Owns the bound listener, the shared [`ReqHandler`], and the
/// [`IoContextPool`] connections are dealt out from.
#[derive(Debug)]
pub struct Server {
    listener: StdTcpListener,
    handler: Arc<ReqHandler>,
    pool: IoContextPool,
}

impl Server {
    /// Binds `address:port` and builds a pool of `num_threads` reactors for
    /// a server that will later accept on that listener.
    pub fn new(
        address: impl Into<String>,
        port: u16,
        num_threads: usize,
        handler: ReqHandler,
    ) -> io::Result<Self> {
        let listener = StdTcpListener::bind((address.into().as_str(), port))?;
        listener.set_nonblocking(true)?;
        Ok(Self {
            listener,
            handler: Arc::new(handler),
            pool: IoContextPool::new(num_threads)?,
        })
    }

    /// The address the listener is bound to, including the actual port
    /// chosen by the OS when `port` was given as `0`.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the server: accepts connections, handing each one to the next
    /// reactor in the pool, until a termination signal is received, at
    /// which point the acceptor is cancelled and the pool is stopped.
    /// Blocks the calling thread for the server's entire lifetime.
    pub fn run(self) -> io::Result<()> {
        let Server {
            listener,
            handler,
            pool,
        } = self;

        // Borrows `pool` and `handler` rather than moving them, since both
        // the acceptor and the reactors it hands connections to are driven
        // from this same stack frame for the life of the server, and
        // `pool.stop()` below needs `pool` again afterward.
        let result = pool.run(async {
            let listener = TcpListener::from_std(listener)?;
            info!("listening on {}", listener.local_addr()?);

            let accept_loop = async {
                loop {
                    match listener.accept().await {
                        Ok((socket, peer)) => {
                            let reactor = pool.get_next();
                            let conn = Connection::new(socket, peer, handler.clone());
                            // Runs on the reactor the connection is now bound
                            // to for its whole lifetime.
                            reactor.spawn(conn.start());
                        }
                        Err(e) => {
                            warn!("accept failed: {e}");
                        }
                    }
                }
            };

            tokio::select! {
                _ = accept_loop => {}
                _ = wait_for_termination() => {
                    info!("termination signal received, shutting down");
                }
            }

            Ok::<(), io::Error>(())
        });

        pool.stop();
        debug!("server stopped");
        result
    }
}

/// Waits for `SIGINT`, `SIGTERM`, `SIGQUIT`, or (where the platform supports
/// it) `SIGHUP`. On non-Unix platforms only Ctrl-C is available.
#[cfg(unix)]
async fn wait_for_termination() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut sigquit = signal(SignalKind::quit()).expect("failed to install SIGQUIT handler");
    let mut sighup = signal(SignalKind::hangup()).expect("failed to install SIGHUP handler");

    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
        _ = sigquit.recv() => {}
        _ = sighup.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() {
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpStream;

    use super::*;
    use crate::handler::dictionary::Dictionary;

    #[test]
    fn new_binds_an_os_assigned_port_and_reports_it() {
        let server = Server::new("127.0.0.1", 0, 2, ReqHandler::new(Dictionary::seeded())).unwrap();
        assert_ne!(server.local_addr().unwrap().port(), 0);
    }

    #[test]
    fn booted_server_replies_to_a_real_client_connection() {
        let server = Server::new("127.0.0.1", 0, 1, ReqHandler::new(Dictionary::seeded())).unwrap();
        let addr = server.local_addr().unwrap();

        // The listener is already bound and accepting connections into its
        // backlog at this point (`Server::new` binds synchronously), so a
        // client can connect immediately; `run()`'s own accept loop just
        // hasn't picked the connection up off that backlog yet. `run()`
        // blocks for the server's entire lifetime, so it's driven on its own
        // thread; the test process exiting is what reclaims it.
        std::thread::spawn(move || server.run());

        let noun = "പൂച്ച".as_bytes();
        let request = format!(
            "MPP/1.3.5 ISSING \r\nContent-Length: {}\r\n\r\n",
            noun.len()
        );

        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(request.as_bytes()).unwrap();
        stream.write_all(noun).unwrap();
        stream.shutdown(std::net::Shutdown::Write).unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).unwrap();
        let response = String::from_utf8(response).unwrap();

        assert!(response.starts_with("MPP/1.3.5 200 OK\r\n"));
        assert!(response.ends_with("true"));
    }
}
