//! `mpp-server` binary entry point, wired to `mpp::config::ServerConfig` and
//! `mpp::server::Server`. Mirrors `original_source/server/cpp/main.cpp`'s
//! shape: a plain synchronous `main` that builds the server and makes one
//! blocking call to run it — `Server::run` itself owns the `IoContextPool`
//! that drives every reactor, so there is no outer async runtime here (an
//! outer `#[tokio::main]` would nest a second runtime inside the pool's
//! first reactor, which tokio forbids).

use anyhow::{Context, Result};
use mpp::config::ServerConfig;
use mpp::handler::{dictionary::Dictionary, ReqHandler};
use mpp::server::Server;

fn main() -> Result<()> {
    env_logger::init();

    let config = ServerConfig::from_args(std::env::args().skip(1))
        .map_err(|e| anyhow::anyhow!(e.to_string()))
        .context(
            "USAGE: mpp-server <listen-address> <port> <num-threads> <db-config-path>",
        )?;

    log::info!(
        "starting mpp-server on {}:{} with {} reactor(s), db config at {}",
        config.listen_address,
        config.port,
        config.num_threads,
        config.db_config_path.display(),
    );

    // `db_config_path` is carried but never opened here: DB-backed lookup
    // construction is an external collaborator. This binary runs the
    // in-memory dictionary so the server is runnable end-to-end without a
    // database.
    let handler = ReqHandler::new(Dictionary::seeded());

    let server = Server::new(
        config.listen_address,
        config.port,
        config.num_threads,
        handler,
    )
    .context("failed to build server")?;

    server.run().context("server loop failed")?;
    Ok(())
}
