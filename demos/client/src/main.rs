//! MPP CLI client: prompts for a noun, validates it as UTF-8 in the
//! Malayalam range, sends `ISSING` then `FOF`, and prints the result —
//! grounded on the teacher's own `assets/demos/client` (kept as its own
//! path-dependent package) and on
//! `original_source/pluralisation/client/cmd/cpp/main.cpp`'s
//! read-input/validate/`isSingular`-then-`findOppositeForm` loop.

use std::io::{stdin, stdout, Read, Write};
use std::net::TcpStream;

use anyhow::{Context, Error};
use mpp::{Reply, ReplyParser, Request, StatusCode};

const USAGE: &str = "USAGE: client <host> <port>";

/// Malayalam Unicode block: U+0D00 through U+0D7F.
const MALAYALAM_RANGE: std::ops::RangeInclusive<u32> = 0x0D00..=0x0D7F;

fn main() -> Result<(), Error> {
    let mut args = std::env::args().skip(1);
    let host = args.next().context(USAGE)?;
    let port = args
        .next()
        .context(USAGE)?
        .parse::<u16>()
        .context("could not parse port")?;

    println!("Connecting to MPP server at {host}:{port}. Type `quit` to exit.");

    loop {
        let noun = prompt("Enter a Malayalam noun (or `quit`)");

        if noun.eq_ignore_ascii_case("quit") {
            println!("Goodbye.");
            return Ok(());
        }

        if !is_valid_malayalam(&noun) {
            eprintln!("Your input contains code-points that are outside the Malayalam range!");
            continue;
        }

        match query(&host, port, &noun) {
            Ok(()) => {}
            Err(e) => eprintln!("Query failed: {e:#}"),
        }
    }
}

/// Sends `ISSING` then `FOF` for `noun`, printing both results. Each
/// request opens its own connection: the server closes after a single
/// reply, since persistent connections aren't supported.
fn query(host: &str, port: u16, noun: &str) -> Result<(), Error> {
    let issing_reply = send_request(host, port, Request::issing(noun.as_bytes().to_vec()))
        .context("ISSING request failed")?;

    let is_singular = match issing_reply.status {
        StatusCode::Ok => issing_reply.content == b"true",
        other => {
            eprintln!("ISSING returned unexpected status: {other}");
            return Ok(());
        }
    };
    println!(
        "The noun \"{noun}\" is {}.",
        if is_singular { "singular" } else { "plural" }
    );

    let fof_reply =
        send_request(host, port, Request::fof(noun.as_bytes().to_vec())).context("FOF request failed")?;

    match fof_reply.status {
        StatusCode::Ok => {
            let opposite = String::from_utf8_lossy(&fof_reply.content);
            println!(
                "The {} form of \"{noun}\" is \"{opposite}\".",
                if is_singular { "plural" } else { "singular" }
            );
        }
        StatusCode::NounNotFound => {
            println!("The server doesn't know the opposite form of \"{noun}\".");
        }
        other => eprintln!("FOF returned unexpected status: {other}"),
    }

    Ok(())
}

/// Opens a fresh connection, writes `request`'s encoded buffers, and reads
/// the reply incrementally until [`ReplyParser`] reports `Accepted`.
fn send_request(host: &str, port: u16, mut request: Request) -> Result<Reply, Error> {
    let mut stream =
        TcpStream::connect((host, port)).with_context(|| format!("could not connect to {host}:{port}"))?;

    let mut buffers = request
        .to_buffers()
        .context("could not encode request")?;
    write_all_vectored(&mut stream, &mut buffers).context("could not write request")?;

    let mut parser = ReplyParser::new();
    let mut reply = Reply::new(StatusCode::Internal);
    let mut buf = [0u8; 4096];

    loop {
        let n = stream.read(&mut buf).context("could not read reply")?;
        if n == 0 {
            anyhow::bail!("server closed the connection before sending a complete reply");
        }
        let (outcome, _) = parser.feed(&mut reply, &buf[..n]);
        match outcome {
            mpp::Outcome::Accepted => return Ok(reply),
            mpp::Outcome::Rejected(code) => {
                anyhow::bail!("server sent a malformed reply ({code:?})")
            }
            mpp::Outcome::NeedMore => continue,
        }
    }
}

/// Writes every buffer in `bufs` to `stream`, looping over partial
/// vectored writes, mirroring `mpp::connection`'s server-side write loop.
fn write_all_vectored(
    stream: &mut TcpStream,
    bufs: &mut [std::io::IoSlice<'_>],
) -> std::io::Result<()> {
    let mut bufs = bufs;
    while !bufs.is_empty() {
        let n = stream.write_vectored(bufs)?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "write returned 0 bytes",
            ));
        }
        std::io::IoSlice::advance_slices(&mut bufs, n);
    }
    Ok(())
}

fn prompt(msg: &str) -> String {
    print!("{msg}\n$ ");
    stdout().flush().unwrap();

    let mut line = String::new();
    stdin().read_line(&mut line).unwrap();
    line.trim().to_owned()
}

/// Validates that `input` is non-empty and every code point falls in the
/// Malayalam Unicode block.
fn is_valid_malayalam(input: &str) -> bool {
    !input.is_empty() && input.chars().all(|c| MALAYALAM_RANGE.contains(&(c as u32)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malayalam_noun_is_valid() {
        assert!(is_valid_malayalam("പൂച്ച"));
    }

    #[test]
    fn latin_text_is_rejected() {
        assert!(!is_valid_malayalam("cat"));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(!is_valid_malayalam(""));
    }

    #[test]
    fn mixed_script_input_is_rejected() {
        assert!(!is_valid_malayalam("പൂച്ച cat"));
    }
}
