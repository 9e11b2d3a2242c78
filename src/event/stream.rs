//! Line stream over the server's stdout.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Error type for stream operations.
#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    #[error("Failed to read server output: {0}")]
    Read(#[from] std::io::Error),
}

/// Read newline-terminated lines from any async reader.
///
/// The stream ends when the reader reaches EOF. Invalid UTF-8 is replaced
/// rather than treated as an error so a single bad byte cannot stop the
/// reader.
pub fn read_lines<R>(reader: R) -> impl futures_core::Stream<Item = Result<String, StreamError>>
where
    R: AsyncRead + Unpin,
{
    let reader = BufReader::new(reader);

    futures_util::stream::unfold(reader, |mut reader| async move {
        let mut buf = Vec::new();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => None,
            Ok(_) => {
                while matches!(buf.last(), Some(b'\n' | b'\r')) {
                    buf.pop();
                }
                let line = String::from_utf8_lossy(&buf).into_owned();
                Some((Ok(line), reader))
            }
            Err(e) => Some((Err(StreamError::Read(e)), reader)),
        }
    })
}
