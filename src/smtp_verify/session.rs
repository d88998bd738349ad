use std::io;

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};

use super::types::SmtpReply;

const MAX_LINE_BYTES: u64 = 4_096;
const MAX_REPLY_LINES: usize = 64;

/// Line framing over an SMTP byte stream.
pub(crate) struct SmtpSession<S> {
    stream: BufReader<S>,
}

impl<S: AsyncRead> SmtpSession<S> {
    pub(crate) fn new(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
        }
    }
}

impl<S: AsyncRead + Unpin> SmtpSession<S> {
    /// Reads one complete reply: every `NNN-` continuation line up to the
    /// final line.
    pub(crate) async fn read_reply(&mut self) -> io::Result<SmtpReply> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line().await?;
            let continuation = line.as_bytes().get(3) == Some(&b'-');
            lines.push(line);
            if !continuation {
                break;
            }
            if lines.len() >= MAX_REPLY_LINES {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("reply exceeds {MAX_REPLY_LINES} lines"),
                ));
            }
        }
        Ok(SmtpReply::new(lines.join("\n")))
    }

    async fn read_line(&mut self) -> io::Result<String> {
        let mut raw = Vec::new();
        let read = (&mut self.stream)
            .take(MAX_LINE_BYTES)
            .read_until(b'\n', &mut raw)
            .await?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed while reading reply",
            ));
        }
        if raw.last() != Some(&b'\n') {
            if read as u64 >= MAX_LINE_BYTES {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("reply line exceeds {MAX_LINE_BYTES} bytes"),
                ));
            }
            // EOF au milieu d'une ligne
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed in the middle of a reply",
            ));
        }
        raw.pop();
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> SmtpSession<S> {
    pub(crate) async fn send_command(&mut self, command: &str) -> io::Result<()> {
        let mut line = Vec::with_capacity(command.len() + 2);
        line.extend_from_slice(command.as_bytes());
        line.extend_from_slice(b"\r\n");
        self.stream.write_all(&line).await?;
        self.stream.flush().await
    }

    /// Best-effort `QUIT` (no reply awaited) followed by a write shutdown.
    pub(crate) async fn quit(mut self) {
        if self.send_command("QUIT").await.is_ok() {
            let _ = self.stream.shutdown().await;
        }
    }
}
