//! `Content-Length` framing over async byte streams.
//!
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <payload>
//! ```

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::EnvelopeError;

const CONTENT_LENGTH: &str = "Content-Length:";

/// Largest content length a frame may declare.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Writes one framed payload and flushes.
///
/// # Errors
///
/// Returns any I/O error raised by the writer.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let header = format!("{CONTENT_LENGTH} {}\r\n\r\n", payload.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await
}

/// Reads one framed payload.
///
/// Returns `Ok(None)` when the stream ends cleanly between frames.
///
/// # Errors
///
/// Returns [`EnvelopeError::MissingContentLength`] or
/// [`EnvelopeError::InvalidHeader`] for malformed headers,
/// [`EnvelopeError::FrameTooLarge`] when the declared length exceeds
/// [`MAX_FRAME_LEN`], and [`EnvelopeError::Io`] when the stream fails or ends
/// mid-frame.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, EnvelopeError>
where
    R: AsyncBufRead + Unpin,
{
    let Some(length) = read_headers(reader).await? else {
        return Ok(None);
    };
    if length > MAX_FRAME_LEN {
        return Err(EnvelopeError::FrameTooLarge { length });
    }
    let mut content = vec![0u8; length];
    reader.read_exact(&mut content).await?;
    Ok(Some(content))
}

async fn read_headers<R>(reader: &mut R) -> Result<Option<usize>, EnvelopeError>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length = None;
    let mut seen_any = false;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            if !seen_any {
                return Ok(None);
            }
            return Err(EnvelopeError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream closed while reading frame headers",
            )));
        }
        seen_any = true;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        if let Some(value) = trimmed.strip_prefix(CONTENT_LENGTH) {
            let parsed = value
                .trim()
                .parse()
                .map_err(|_| EnvelopeError::InvalidHeader {
                    line: trimmed.to_owned(),
                })?;
            content_length = Some(parsed);
        }
    }

    content_length
        .map(Some)
        .ok_or(EnvelopeError::MissingContentLength)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tokio::io::BufReader;

    use super::*;

    async fn read_all(input: &[u8]) -> Result<Option<Vec<u8>>, EnvelopeError> {
        let mut reader = BufReader::new(input);
        read_frame(&mut reader).await
    }

    #[tokio::test]
    async fn writes_length_prefixed_frame() {
        let mut written = Vec::new();
        write_frame(&mut written, b"test payload")
            .await
            .expect("write");
        assert_eq!(written, b"Content-Length: 12\r\n\r\ntest payload");
    }

    #[tokio::test]
    async fn reads_consecutive_frames() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, b"one").await.expect("write");
        write_frame(&mut buffer, b"").await.expect("write");

        let mut reader = BufReader::new(buffer.as_slice());
        let first = read_frame(&mut reader).await.expect("first");
        let second = read_frame(&mut reader).await.expect("second");
        let end = read_frame(&mut reader).await.expect("end");

        assert_eq!(first.as_deref(), Some(b"one".as_slice()));
        assert_eq!(second.as_deref(), Some(b"".as_slice()));
        assert!(end.is_none());
    }

    #[tokio::test]
    async fn ignores_other_headers() {
        let frame = read_all(b"Content-Length: 4\r\nContent-Type: json\r\n\r\ntest")
            .await
            .expect("read");
        assert_eq!(frame.as_deref(), Some(b"test".as_slice()));
    }

    #[rstest]
    #[case::missing(b"Content-Type: json\r\n\r\ntest".as_slice())]
    #[case::invalid(b"Content-Length: lots\r\n\r\ntest".as_slice())]
    #[case::truncated_headers(b"Content-Length: 10".as_slice())]
    #[case::truncated_body(b"Content-Length: 10\r\n\r\nabc".as_slice())]
    #[tokio::test]
    async fn rejects_broken_frames(#[case] input: &[u8]) {
        assert!(read_all(input).await.is_err());
    }

    #[rstest]
    #[case::just_over(MAX_FRAME_LEN + 1)]
    #[case::huge(usize::MAX)]
    #[tokio::test]
    async fn refuses_oversized_frames_before_reading_them(#[case] length: usize) {
        let input = format!("Content-Length: {length}\r\n\r\nx");
        let result = read_all(input.as_bytes()).await;
        assert!(matches!(
            result,
            Err(EnvelopeError::FrameTooLarge { length: declared }) if declared == length
        ));
    }

    #[tokio::test]
    async fn reports_missing_length_precisely() {
        let result = read_all(b"\r\n").await;
        assert!(matches!(result, Err(EnvelopeError::MissingContentLength)));
    }
}
