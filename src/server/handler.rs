//! Handling of a single connection.
//!
//! A connection carries exactly one request. The request line is read and
//! tokenized, the header lines are collected raw, and the request is then
//! answered with an echo, a file, a directory listing, a redirect or an error
//! page before the connection is shut down.

use std::net::SocketAddr;

use log::debug;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::parser::{
    read_headers, read_line, Error as ParserError, Method, ParsedRequest, RequestLine,
    DEFAULT_VERSION,
};
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::listing::DirectoryListing;
use crate::server::request_log::RequestLog;
use crate::server::resolver::{resolve, ResolvedTarget, TargetKind};
use crate::server::response::{
    write_body, write_error, write_file, write_headers, write_status_line, Headers, StatusCode,
};

/// What arrived on a connection.
enum Incoming {
    /// The peer sent nothing.
    Nothing,
    /// The request line could not be tokenized.
    Malformed { line: String, error: ParserError },
    /// A request line followed by its headers.
    Request(ParsedRequest),
}

/// Read the request line and, if it is well formed, the headers after it.
async fn receive<S>(stream: &mut S, peer: SocketAddr, config: &ServerConfig, log: &dyn RequestLog) -> Incoming
where
    S: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);

    let raw_line = read_line(&mut reader, config.max_line_length).await;
    if raw_line.is_empty() {
        log.request(peer, None);
        return Incoming::Nothing;
    }
    // tokens and log lines are text; the echo keeps the raw bytes
    let line = String::from_utf8_lossy(&raw_line).into_owned();
    log.request(peer, Some(&line));

    let request_line = match RequestLine::parse(&line) {
        Ok(request_line) => request_line,
        Err(error) => return Incoming::Malformed { line, error },
    };

    let headers = read_headers(&mut reader, config.max_line_length).await;
    Incoming::Request(ParsedRequest::new(request_line, raw_line, headers))
}

/// Handle one connection from start to finish.
///
/// The connection is shut down on every path, including when writing the
/// response fails part way.
///
/// # Arguments
///
/// * `stream` - The connection
/// * `peer` - The remote address, for logging
/// * `config` - The server configuration
/// * `log` - Receives the request log line
pub async fn handle_connection<S>(
    stream: &mut S,
    peer: SocketAddr,
    config: &ServerConfig,
    log: &dyn RequestLog,
) -> Result<(), Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let result = match receive(&mut *stream, peer, config, log).await {
        Incoming::Nothing => Ok(()),
        Incoming::Malformed { line, error } => {
            debug!("Bad request from {peer}: {error}");
            write_error(stream, DEFAULT_VERSION, StatusCode::BAD_REQUEST, &line).await
        }
        Incoming::Request(request) => respond(stream, &request, config).await,
    };

    if let Err(e) = close(stream).await {
        debug!("Closing connection to {peer} failed: {e}");
    }

    result
}

async fn close<S>(stream: &mut S) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.flush().await?;
    stream.shutdown().await
}

/// Dispatch a parsed request and write the response.
async fn respond<W>(writer: &mut W, request: &ParsedRequest, config: &ServerConfig) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    let line = &request.line;

    if line.is_echo() {
        write_status_line(writer, &line.version, StatusCode::OK).await?;
        write_headers(writer, None).await?;
        return write_body(writer, &request.echo_body()).await;
    }

    if line.method != Method::GET {
        return write_error(writer, &line.version, StatusCode::NOT_IMPLEMENTED, &line.raw).await;
    }

    if !line.path.starts_with('/') {
        return write_error(writer, &line.version, StatusCode::BAD_REQUEST, &line.raw).await;
    }

    let target = resolve(&line.path, config).await;
    match &target.kind {
        TargetKind::Redirect { location } => {
            let headers: Headers = vec![("Location".to_string(), location.clone())];
            write_status_line(writer, &line.version, target.status).await?;
            write_headers(writer, Some(&headers)).await
        }
        TargetKind::Directory => send_directory(writer, &line.version, &target, config).await,
        TargetKind::File => send_file(writer, &line.version, &target, config).await,
        TargetKind::Error => write_error(writer, &line.version, target.status, &line.raw).await,
    }
}

async fn send_directory<W>(
    writer: &mut W,
    version: &str,
    target: &ResolvedTarget,
    config: &ServerConfig,
) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    let headers: Headers = vec![("Content-Type".to_string(), "text/html".to_string())];
    write_status_line(writer, version, target.status).await?;
    write_headers(writer, Some(&headers)).await?;

    let listing = DirectoryListing::read(&target.path, config.hide_dotfiles).await?;
    write_body(writer, listing.render(&target.request_path).as_bytes()).await
}

async fn send_file<W>(
    writer: &mut W,
    version: &str,
    target: &ResolvedTarget,
    config: &ServerConfig,
) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    let content_type = config.mime.content_type_for(&target.path);
    let mut headers: Headers = vec![("Content-Type".to_string(), content_type.mime)];
    if content_type.gzip {
        headers.push(("Content-Encoding".to_string(), "gzip".to_string()));
    }
    write_status_line(writer, version, target.status).await?;
    write_headers(writer, Some(&headers)).await?;

    // a file gone since it was resolved is a fault, not a 404
    let mut file = tokio::fs::File::open(&target.path).await?;
    let sent = write_file(writer, &mut file).await?;
    debug!("Sent {sent} bytes of {}", target.path.display());
    Ok(())
}
