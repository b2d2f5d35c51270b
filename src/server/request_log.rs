//! Request logging hook.

use std::net::SocketAddr;

use log::info;

/// Timestamp format of request and banner lines.
pub const LOG_DATE_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Receives the server's log lines.
///
/// The server calls [`request`](RequestLog::request) once per accepted
/// connection, as soon as the request line has been read, and
/// [`log_line`](RequestLog::log_line) for free-form lines such as the startup
/// banner.
pub trait RequestLog: Send + Sync {
    /// Record a free-form line.
    fn log_line(&self, line: &str);

    /// Record that `peer` sent `request_line`, or nothing at all.
    fn request(&self, peer: SocketAddr, request_line: Option<&str>);
}

/// Logs through the `log` facade at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRequests;

impl RequestLog for LogRequests {
    fn log_line(&self, line: &str) {
        info!("{line}");
    }

    fn request(&self, peer: SocketAddr, request_line: Option<&str>) {
        info!("{}", format_request(&timestamp(), peer, request_line));
    }
}

/// The current local time in [`LOG_DATE_FORMAT`].
pub fn timestamp() -> String {
    chrono::Local::now().format(LOG_DATE_FORMAT).to_string()
}

/// Format a request log line: `<timestamp> <ip>:<port> <request line>`.
///
/// A connection that sent nothing is logged as `(null)`.
pub fn format_request(timestamp: &str, peer: SocketAddr, request_line: Option<&str>) -> String {
    format!(
        "{timestamp} {ip}:{port} {line}",
        ip = peer.ip(),
        port = peer.port(),
        line = request_line.unwrap_or("(null)")
    )
}
