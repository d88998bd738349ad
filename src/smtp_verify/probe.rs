use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;
use tracing::Instrument;

use crate::smtp_verify::error::ProbeError;
use crate::smtp_verify::options::ProbeOptions;
use crate::smtp_verify::session::SmtpSession;
use crate::smtp_verify::state::{Envelope, HandshakeState, Transition};
use crate::smtp_verify::transport::Connector;
use crate::smtp_verify::types::{ProbeOutcome, SmtpEvent, SmtpReply, Stage};
use crate::validator::Email;

/// Upper bound for the farewell `QUIT`, outside the probe budget.
const QUIT_GRACE: Duration = Duration::from_millis(500);

/// Runs the HELO / MAIL FROM / RCPT TO handshake for `target` against one
/// host.
///
/// Never fails: every transport, protocol or timeout problem is folded into
/// the returned [`ProbeOutcome`]. The connection is closed before this
/// function returns, whatever the outcome.
pub async fn probe_host<C: Connector>(
    host: &str,
    target: &Email,
    options: &ProbeOptions,
    connector: &C,
) -> ProbeOutcome {
    let envelope = Envelope::new(target, options);
    let mut progress = Progress::default();
    let mut session = None;

    let span = tracing::debug_span!("smtp_probe", host, port = options.port);
    let result = timeout(
        options.timeout,
        converse(host, options.port, &envelope, connector, &mut progress, &mut session),
    )
    .instrument(span.clone())
    .await;

    let result = result.unwrap_or_else(|_elapsed| {
        Err(ProbeError::Timeout {
            stage: progress.stage,
            budget: options.timeout,
        })
    });

    // le serveur répond encore: on le quitte proprement, hors budget
    if let Some(session) = session.take() {
        if matches!(result, Ok(_) | Err(ProbeError::Rejected { .. })) {
            progress.record(SmtpEvent::Sent {
                stage: Stage::Quit,
                command: "QUIT".to_string(),
            });
            if timeout(QUIT_GRACE, session.quit()).instrument(span).await.is_err() {
                tracing::debug!(host, "QUIT not flushed in time");
            }
        }
    }

    match result {
        Ok(reply) => {
            tracing::debug!(host, reply = %reply, "recipient accepted");
            ProbeOutcome::accepted(host, &reply, progress.transcript)
        }
        Err(err) => {
            tracing::debug!(host, kind = %err.kind(), %err, "probe failed");
            progress.record(SmtpEvent::Error {
                stage: err.stage(),
                message: err.to_string(),
            });
            ProbeOutcome::failed(host, &err, progress.transcript)
        }
    }
}

/// What survives the conversation future when the timeout drops it.
#[derive(Debug)]
struct Progress {
    stage: Stage,
    transcript: Vec<SmtpEvent>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            stage: Stage::Connect,
            transcript: Vec::new(),
        }
    }
}

impl Progress {
    fn record(&mut self, event: SmtpEvent) {
        self.transcript.push(event);
    }
}

/// Connects and runs the handshake. The session is parked in `slot` so the
/// caller can still say goodbye once the budget is spent.
async fn converse<C: Connector>(
    host: &str,
    port: u16,
    envelope: &Envelope,
    connector: &C,
    progress: &mut Progress,
    slot: &mut Option<SmtpSession<C::Stream>>,
) -> Result<SmtpReply, ProbeError> {
    let stream = connector
        .connect(host, port)
        .await
        .map_err(|source| ProbeError::connect(host, port, source))?;
    tracing::debug!("connected");

    let session = slot.insert(SmtpSession::new(stream));
    handshake(session, envelope, progress).await
}

async fn handshake<S>(
    session: &mut SmtpSession<S>,
    envelope: &Envelope,
    progress: &mut Progress,
) -> Result<SmtpReply, ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut state = HandshakeState::INITIAL;
    loop {
        let stage = state.stage();
        progress.stage = stage;

        let reply = session
            .read_reply()
            .await
            .map_err(|err| ProbeError::from_io(stage, err))?;
        tracing::trace!(%stage, reply = %reply, "received");
        progress.record(SmtpEvent::Received {
            stage,
            reply: reply.clone(),
        });

        match state.on_reply(&reply, envelope) {
            Transition::Send { command, next } => {
                let next_stage = next.stage();
                progress.stage = next_stage;
                tracing::trace!(stage = %next_stage, %command, "sending");
                progress.record(SmtpEvent::Sent {
                    stage: next_stage,
                    command: command.clone(),
                });
                session
                    .send_command(&command)
                    .await
                    .map_err(|err| ProbeError::from_io(next_stage, err))?;
                state = next;
            }
            Transition::Accepted => return Ok(reply),
            Transition::Rejected => {
                return Err(ProbeError::Rejected {
                    stage,
                    reply: reply.text,
                });
            }
        }
    }
}
