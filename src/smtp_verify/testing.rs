//! In-memory SMTP servers for probe tests.
//!
//! [`ScriptedConnector`] hands out one half of a `tokio::io::duplex` pipe per
//! connection and drives the other half from a per-host [`HostScript`].
//! Scripts that end in a transport fault get a canned stream instead.

use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream, ReadBuf,
    duplex,
};
use tokio::task::JoinHandle;

use super::transport::Connector;

#[derive(Debug, Clone)]
pub(crate) enum HostScript {
    /// `connect` fails with `ConnectionRefused`.
    Refuse,
    /// Accepts the connection and never writes.
    Silent,
    /// First entry is the greeting, then one entry per received line.
    /// Keeps reading until the client disconnects.
    Replies(Vec<&'static str>),
    /// Like `Replies`, but hangs up once the replies are exhausted.
    HangUpAfter(Vec<&'static str>),
    /// Like `Replies`, each reply delayed by `delay`.
    Slow {
        delay: Duration,
        replies: Vec<&'static str>,
    },
    /// Serves `replies` without waiting for commands, then every read fails
    /// with `error`.
    FailAfter {
        replies: Vec<&'static str>,
        error: io::ErrorKind,
    },
    /// Serves `replies`, accepts `writes` writes, then blocks every further
    /// read and write.
    StallWritesAfter {
        replies: Vec<&'static str>,
        writes: usize,
    },
}

/// Everything one scripted server saw.
#[derive(Debug, Clone, Default)]
pub(crate) struct ServerLog {
    pub host: String,
    /// Received lines without their line terminator.
    pub received: Vec<String>,
    /// The client closed the connection.
    pub saw_eof: bool,
}

pub(crate) fn accept_all() -> HostScript {
    HostScript::Replies(vec![
        "220-mx.example.com ESMTP\r\n220 ready\r\n",
        "250 mx.example.com\r\n",
        "250 2.1.0 sender ok\r\n",
        "250 2.1.5 recipient ok\r\n",
    ])
}

#[derive(Debug, Default)]
pub(crate) struct ScriptedConnector {
    scripts: HashMap<String, HostScript>,
    connects: Mutex<Vec<String>>,
    servers: Mutex<Vec<(String, JoinHandle<ServerLog>)>>,
}

impl ScriptedConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn host(mut self, host: &str, script: HostScript) -> Self {
        self.scripts.insert(host.to_string(), script);
        self
    }

    /// Hosts passed to `connect`, in call order.
    pub(crate) fn connects(&self) -> Vec<String> {
        self.connects.lock().unwrap().clone()
    }

    /// Waits for every server spawned so far and returns their logs in
    /// connection order.
    pub(crate) async fn finish(&self) -> Vec<ServerLog> {
        let servers = std::mem::take(&mut *self.servers.lock().unwrap());
        let mut logs = Vec::with_capacity(servers.len());
        for (host, handle) in servers {
            let mut log = handle.await.expect("scripted server panicked");
            log.host = host;
            logs.push(log);
        }
        logs
    }
}

impl Connector for ScriptedConnector {
    type Stream = ScriptedStream;

    async fn connect(&self, host: &str, _port: u16) -> io::Result<ScriptedStream> {
        self.connects.lock().unwrap().push(host.to_string());
        let script = match self.scripts.get(host).cloned() {
            None | Some(HostScript::Refuse) => {
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "connection refused",
                ));
            }
            Some(HostScript::FailAfter { replies, error }) => {
                return Ok(ScriptedStream::canned(&replies, Some(error), None));
            }
            Some(HostScript::StallWritesAfter { replies, writes }) => {
                return Ok(ScriptedStream::canned(&replies, None, Some(writes)));
            }
            Some(script) => script,
        };
        let (client, server) = duplex(4_096);
        let handle = tokio::spawn(serve(server, script));
        self.servers
            .lock()
            .unwrap()
            .push((host.to_string(), handle));
        Ok(ScriptedStream::Pipe(client))
    }
}

/// Client end of a scripted connection.
#[derive(Debug)]
pub(crate) enum ScriptedStream {
    Pipe(DuplexStream),
    Canned {
        input: Vec<u8>,
        /// `None` blocks once `input` is drained.
        read_error: Option<io::ErrorKind>,
        /// `None` accepts every write.
        writes_left: Option<usize>,
    },
}

impl ScriptedStream {
    fn canned(
        replies: &[&'static str],
        read_error: Option<io::ErrorKind>,
        writes_left: Option<usize>,
    ) -> Self {
        Self::Canned {
            input: replies.concat().into_bytes(),
            read_error,
            writes_left,
        }
    }
}

impl AsyncRead for ScriptedStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Pipe(pipe) => Pin::new(pipe).poll_read(cx, buf),
            Self::Canned {
                input, read_error, ..
            } => {
                if input.is_empty() {
                    return match read_error {
                        Some(kind) => Poll::Ready(Err(io::Error::new(*kind, "scripted failure"))),
                        None => Poll::Pending,
                    };
                }
                let n = input.len().min(buf.remaining());
                buf.put_slice(&input[..n]);
                input.drain(..n);
                Poll::Ready(Ok(()))
            }
        }
    }
}

impl AsyncWrite for ScriptedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Pipe(pipe) => Pin::new(pipe).poll_write(cx, buf),
            Self::Canned { writes_left, .. } => match writes_left {
                Some(0) => Poll::Pending,
                Some(left) => {
                    *left -= 1;
                    Poll::Ready(Ok(buf.len()))
                }
                None => Poll::Ready(Ok(buf.len())),
            },
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Pipe(pipe) => Pin::new(pipe).poll_flush(cx),
            Self::Canned { .. } => Poll::Ready(Ok(())),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Pipe(pipe) => Pin::new(pipe).poll_shutdown(cx),
            Self::Canned { .. } => Poll::Ready(Ok(())),
        }
    }
}

async fn serve(stream: DuplexStream, script: HostScript) -> ServerLog {
    let (replies, delay, hang_up) = match script {
        HostScript::Refuse
        | HostScript::Silent
        | HostScript::FailAfter { .. }
        | HostScript::StallWritesAfter { .. } => (Vec::new(), Duration::ZERO, false),
        HostScript::Replies(replies) => (replies, Duration::ZERO, false),
        HostScript::HangUpAfter(replies) => (replies, Duration::ZERO, true),
        HostScript::Slow { delay, replies } => (replies, delay, false),
    };
    let mut replies = replies.into_iter();
    let mut log = ServerLog::default();
    let mut stream = BufReader::new(stream);

    if let Some(greeting) = replies.next() {
        reply(&mut stream, greeting, delay).await;
    }
    loop {
        if hang_up && replies.len() == 0 {
            return log;
        }
        let mut line = String::new();
        match stream.read_line(&mut line).await {
            Ok(0) | Err(_) => {
                log.saw_eof = true;
                return log;
            }
            Ok(_) => log.received.push(line.trim_end().to_string()),
        }
        if let Some(next) = replies.next() {
            reply(&mut stream, next, delay).await;
        }
    }
}

async fn reply(stream: &mut BufReader<DuplexStream>, text: &str, delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    // le client a pu partir entre-temps
    let _ = stream.write_all(text.as_bytes()).await;
}
