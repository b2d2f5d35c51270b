//! Request line tokenizing and the parsed request.

use tokio::io::AsyncRead;

use crate::parser::error::Error;
use crate::parser::line::read_line;
use crate::parser::method::Method;

/// Protocol version assumed when the request line carries none.
pub const DEFAULT_VERSION: &str = "HTTP/1.0";

/// The first line of a request, split into its tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// The line as parsed, without its terminator.
    pub raw: String,
    /// The method token.
    pub method: Method,
    /// The request target, including any query string. Empty if missing.
    pub path: String,
    /// The protocol version token, `HTTP/1.0` when absent.
    pub version: String,
}

impl RequestLine {
    /// Parse a request line.
    ///
    /// Method and path are separated by runs of spaces. The version is
    /// everything after the single space that ends the path, so a version
    /// token that itself holds whitespace marks a line with too many
    /// components.
    ///
    /// # Returns
    ///
    /// The tokenized line, or an error if the line is empty, has extra
    /// components, or names a protocol other than HTTP.
    pub fn parse(line: &str) -> Result<Self, Error> {
        if line.is_empty() {
            return Err(Error::EmptyRequest);
        }

        let rest = line.trim_start_matches(' ');
        let (method, rest) = rest.split_once(' ').unwrap_or((rest, ""));
        let rest = rest.trim_start_matches(' ');
        let (path, version) = rest.split_once(' ').unwrap_or((rest, ""));

        let version = if version.is_empty() {
            DEFAULT_VERSION.to_string()
        } else if version.contains(char::is_whitespace) {
            return Err(Error::MalformedRequestLine(line.to_string()));
        } else if !version.starts_with("HTTP/") {
            return Err(Error::InvalidVersion(version.to_string()));
        } else {
            version.to_string()
        };

        Ok(Self {
            raw: line.to_string(),
            method: Method::from(method),
            path: path.to_string(),
            version,
        })
    }

    /// Whether the request asks for its own reflection.
    ///
    /// `TRACE` echoes whatever the path, and the literal path `/echo` echoes
    /// whatever the method.
    pub fn is_echo(&self) -> bool {
        self.method == Method::TRACE || self.path == "/echo"
    }
}

/// A request line together with its raw header lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    /// The tokenized request line.
    pub line: RequestLine,
    /// The request line bytes exactly as received.
    pub raw_line: Vec<u8>,
    /// Header lines in arrival order, never split into name and value.
    pub headers: Vec<Vec<u8>>,
}

impl ParsedRequest {
    /// Create a parsed request.
    pub fn new(line: RequestLine, raw_line: Vec<u8>, headers: Vec<Vec<u8>>) -> Self {
        Self {
            line,
            raw_line,
            headers,
        }
    }

    /// The body of a TRACE reply: the request line, then the header lines
    /// joined by CRLF, each part closed by CRLF. The received bytes are
    /// reflected as they are.
    pub fn echo_body(&self) -> Vec<u8> {
        let mut body = self.raw_line.clone();
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(&self.headers.join(&b"\r\n"[..]));
        body.extend_from_slice(b"\r\n");
        body
    }
}

/// Read header lines up to and excluding the first empty line.
pub async fn read_headers<R>(reader: &mut R, max_length: usize) -> Vec<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut headers = Vec::new();
    loop {
        let header = read_line(reader, max_length).await;
        if header.is_empty() {
            break;
        }
        headers.push(header);
    }
    headers
}
