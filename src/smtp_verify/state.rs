//! Client side of the truncated handshake as an explicit state machine.
//!
//! Every state waits for exactly one reply. [`HandshakeState::on_reply`]
//! turns that reply into the next [`Transition`]; it does no I/O, so the
//! ordering rules can be exercised without a socket.

use crate::smtp_verify::options::ProbeOptions;
use crate::smtp_verify::types::{SmtpReply, Stage};
use crate::validator::Email;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HandshakeState {
    AwaitGreeting,
    AwaitHeloReply,
    AwaitMailReply,
    AwaitRcptReply,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Transition {
    /// Write `command`, then wait in `next`.
    Send {
        command: String,
        next: HandshakeState,
    },
    /// The recipient was accepted.
    Accepted,
    /// The reply to the current step was not a `2xx`.
    Rejected,
}

/// The three command lines of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Envelope {
    helo_host: String,
    mail_from: String,
    rcpt_to: String,
}

impl Envelope {
    pub(crate) fn new(target: &Email, options: &ProbeOptions) -> Self {
        Self {
            helo_host: options.helo_host.clone(),
            mail_from: options.from.to_string(),
            rcpt_to: target.to_string(),
        }
    }

    pub(crate) fn helo(&self) -> String {
        format!("HELO {}", self.helo_host)
    }

    pub(crate) fn mail_from(&self) -> String {
        format!("MAIL FROM:<{}>", self.mail_from)
    }

    pub(crate) fn rcpt_to(&self) -> String {
        format!("RCPT TO:<{}>", self.rcpt_to)
    }
}

impl HandshakeState {
    pub(crate) const INITIAL: Self = Self::AwaitGreeting;

    /// Stage whose reply this state is waiting for.
    pub(crate) fn stage(self) -> Stage {
        match self {
            Self::AwaitGreeting => Stage::Greeting,
            Self::AwaitHeloReply => Stage::Helo,
            Self::AwaitMailReply => Stage::MailFrom,
            Self::AwaitRcptReply => Stage::RcptTo,
        }
    }

    pub(crate) fn on_reply(self, reply: &SmtpReply, envelope: &Envelope) -> Transition {
        if !reply.is_positive() {
            return Transition::Rejected;
        }
        match self {
            Self::AwaitGreeting => greeted(envelope),
            Self::AwaitHeloReply => helo_accepted(envelope),
            Self::AwaitMailReply => sender_accepted(envelope),
            Self::AwaitRcptReply => recipient_accepted(),
        }
    }
}

fn greeted(envelope: &Envelope) -> Transition {
    Transition::Send {
        command: envelope.helo(),
        next: HandshakeState::AwaitHeloReply,
    }
}

fn helo_accepted(envelope: &Envelope) -> Transition {
    Transition::Send {
        command: envelope.mail_from(),
        next: HandshakeState::AwaitMailReply,
    }
}

fn sender_accepted(envelope: &Envelope) -> Transition {
    Transition::Send {
        command: envelope.rcpt_to(),
        next: HandshakeState::AwaitRcptReply,
    }
}

fn recipient_accepted() -> Transition {
    Transition::Accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smtp_verify::options::VerifyOptions;
    use crate::validator::validate_email;
    use insta::assert_snapshot;

    fn envelope() -> Envelope {
        let target = validate_email("bob@example.com").unwrap();
        let options = VerifyOptions {
            from: Some("alice@example.org".to_string()),
            ..VerifyOptions::default()
        }
        .probe_options(&target);
        Envelope::new(&target, &options)
    }

    fn ok() -> SmtpReply {
        SmtpReply::new("250 ok")
    }

    #[test]
    fn command_lines() {
        let envelope = envelope();
        assert_snapshot!(envelope.helo(), @"HELO example.org");
        assert_snapshot!(envelope.mail_from(), @"MAIL FROM:<alice@example.org>");
        assert_snapshot!(envelope.rcpt_to(), @"RCPT TO:<bob@example.com>");
    }

    #[test]
    fn positive_replies_walk_all_four_states() {
        let envelope = envelope();
        let mut state = HandshakeState::INITIAL;
        let mut sent = Vec::new();
        loop {
            match state.on_reply(&ok(), &envelope) {
                Transition::Send { command, next } => {
                    sent.push(command);
                    state = next;
                }
                Transition::Accepted => break,
                Transition::Rejected => panic!("unexpected rejection in {state:?}"),
            }
        }
        assert_eq!(state, HandshakeState::AwaitRcptReply);
        assert_eq!(
            sent,
            vec![
                "HELO example.org",
                "MAIL FROM:<alice@example.org>",
                "RCPT TO:<bob@example.com>",
            ]
        );
    }

    #[test]
    fn non_positive_reply_rejects_in_every_state() {
        let envelope = envelope();
        for state in [
            HandshakeState::AwaitGreeting,
            HandshakeState::AwaitHeloReply,
            HandshakeState::AwaitMailReply,
            HandshakeState::AwaitRcptReply,
        ] {
            for text in ["554 no service", "450 later", "354 intermediate"] {
                assert_eq!(
                    state.on_reply(&SmtpReply::new(text), &envelope),
                    Transition::Rejected,
                    "{state:?} / {text}"
                );
            }
        }
    }

    #[test]
    fn states_report_their_stage() {
        assert_eq!(HandshakeState::INITIAL.stage(), Stage::Greeting);
        assert_eq!(HandshakeState::AwaitRcptReply.stage(), Stage::RcptTo);
    }
}
