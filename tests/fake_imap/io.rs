//! Write helpers for the fake IMAP server.
//!
//! Every write is flushed immediately so responses never sit in a
//! buffer while the client waits.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Write one protocol line (caller supplies the CRLF).
pub async fn write_line<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut BufReader<S>,
    line: &str,
) -> std::io::Result<()> {
    write_bytes(stream, line.as_bytes()).await
}

/// Write raw bytes, e.g. a literal message body.
pub async fn write_bytes<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut BufReader<S>,
    data: &[u8],
) -> std::io::Result<()> {
    let inner = stream.get_mut();
    inner.write_all(data).await?;
    inner.flush().await
}
