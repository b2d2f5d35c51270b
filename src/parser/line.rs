//! Bounded line reading from a byte stream.

use tokio::io::{AsyncRead, AsyncReadExt};

/// Default upper bound on the length of a single request or header line.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024;

/// Read one line from `reader`, consuming at most `max_length` bytes.
///
/// The line ends at a line feed; a carriage return directly before it is
/// dropped, as is the terminator itself. If `max_length` bytes arrive without
/// a line feed, they are returned as they are. A closed or failing stream ends
/// the line early and whatever was collected so far is returned, so an empty
/// line means nothing more could be read.
///
/// The bytes are returned unchanged; nothing assumes they are UTF-8.
///
/// Bytes are pulled one at a time; wrap raw sockets in a
/// [`tokio::io::BufReader`] to avoid a syscall per byte.
pub async fn read_line<R>(reader: &mut R, max_length: usize) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(max_length.min(DEFAULT_MAX_LINE_LENGTH));

    while buf.len() < max_length {
        let byte = match reader.read_u8().await {
            Ok(byte) => byte,
            // EOF and reset look the same to the caller
            Err(_) => break,
        };

        if byte == b'\n' {
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
            break;
        }

        buf.push(byte);
    }

    buf
}
