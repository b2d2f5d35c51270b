//! Status codes and the response writer.
//!
//! Responses are written piecewise straight onto the connection: a status
//! line, a header block, then a body taken either from memory or streamed
//! from a file. No `Content-Length` is ever sent; the body ends when the
//! connection closes.

use std::fmt;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::server::error::Error;

/// Size of the chunks a file body is streamed in.
pub const FILE_CHUNK_SIZE: usize = 1024;

/// Content type sent when a response carries no explicit headers.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// An HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const MOVED_PERMANENTLY: StatusCode = StatusCode(301);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const UNAUTHORIZED: StatusCode = StatusCode(401);
    pub const FORBIDDEN: StatusCode = StatusCode(403);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    pub const IM_A_TEAPOT: StatusCode = StatusCode(418);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    pub const NOT_IMPLEMENTED: StatusCode = StatusCode(501);

    /// Get the numeric code.
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Get the reason phrase for this status code.
    ///
    /// Codes outside the server's table share a fixed fallback phrase.
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            301 => "Moved Permanently",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            418 => "I'm a teapot",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            _ => "Unknown Status",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

/// Response headers in the order they are written.
pub type Headers = Vec<(String, String)>;

/// Write `<version> <code> <reason>\r\n`.
pub async fn write_status_line<W>(writer: &mut W, version: &str, status: StatusCode) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    let line = format!("{version} {code} {reason}\r\n", code = status.as_u16(), reason = status.reason_phrase());
    writer.write_all(line.as_bytes()).await?;
    Ok(())
}

/// Write the header block and its terminating blank line.
///
/// Without explicit headers a single plain-text `Content-Type` is sent.
pub async fn write_headers<W>(writer: &mut W, headers: Option<&Headers>) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    let mut block = String::new();
    match headers {
        None => block.push_str(&format!("Content-Type: {DEFAULT_CONTENT_TYPE}\r\n")),
        Some(headers) => {
            for (name, value) in headers {
                block.push_str(&format!("{name}: {value}\r\n"));
            }
        }
    }
    block.push_str("\r\n");

    writer.write_all(block.as_bytes()).await?;
    Ok(())
}

/// Write an in-memory body.
pub async fn write_body<W>(writer: &mut W, body: &[u8]) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(body).await?;
    Ok(())
}

/// Stream a body from `source` in [`FILE_CHUNK_SIZE`] chunks.
///
/// A read that fails or yields nothing ends the transfer. Headers are already
/// on the wire by then, so a short read cannot be reported to the peer and is
/// not an error here; only failures to write are.
///
/// # Returns
///
/// The number of body bytes written.
pub async fn write_file<W, R>(writer: &mut W, source: &mut R) -> Result<u64, Error>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; FILE_CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = match source.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                log::debug!("Body read failed after {total} bytes: {e}");
                break;
            }
        };
        writer.write_all(&buf[..n]).await?;
        total += n as u64;
    }

    Ok(total)
}

/// Write a complete status line, default headers and diagnostic body for
/// `status`.
///
/// The body names the status and repeats the request line, as in
/// `Error: 404 Not Found\r\nRequest: GET /x HTTP/1.0\r\n`.
pub async fn write_error<W>(writer: &mut W, version: &str, status: StatusCode, request_line: &str) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    write_status_line(writer, version, status).await?;
    write_headers(writer, None).await?;
    let body = format!(
        "Error: {code} {reason}\r\nRequest: {request_line}\r\n",
        code = status.as_u16(),
        reason = status.reason_phrase()
    );
    write_body(writer, body.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_phrases() {
        assert_eq!(StatusCode::OK.reason_phrase(), "OK");
        assert_eq!(StatusCode::MOVED_PERMANENTLY.reason_phrase(), "Moved Permanently");
        assert_eq!(StatusCode::IM_A_TEAPOT.reason_phrase(), "I'm a teapot");
        assert_eq!(StatusCode(299).reason_phrase(), "Unknown Status");
        assert_eq!(StatusCode::NOT_FOUND.to_string(), "404 Not Found");
    }

    #[tokio::test]
    async fn test_default_headers() {
        let mut out = Vec::new();
        write_status_line(&mut out, "HTTP/1.0", StatusCode::OK).await.unwrap();
        write_headers(&mut out, None).await.unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "HTTP/1.0 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn test_headers_keep_insertion_order() {
        let headers: Headers = vec![
            ("Content-Type".to_string(), "text/css".to_string()),
            ("Content-Encoding".to_string(), "gzip".to_string()),
        ];
        let mut out = Vec::new();
        write_headers(&mut out, Some(&headers)).await.unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Content-Type: text/css\r\nContent-Encoding: gzip\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn test_write_file_streams_everything() {
        let data: Vec<u8> = (0..3000u32).map(|i| (i % 251) as u8).collect();
        let mut source: &[u8] = &data;
        let mut out = Vec::new();
        let written = write_file(&mut out, &mut source).await.unwrap();
        assert_eq!(written, 3000);
        assert_eq!(out, data);
    }

    #[tokio::test]
    async fn test_error_body() {
        let mut out = Vec::new();
        write_error(&mut out, "HTTP/1.1", StatusCode::NOT_IMPLEMENTED, "PUT / HTTP/1.1")
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "HTTP/1.1 501 Not Implemented\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\r\n\
             Error: 501 Not Implemented\r\nRequest: PUT / HTTP/1.1\r\n"
        );
    }
}
