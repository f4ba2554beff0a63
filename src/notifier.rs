use anyhow::{Context, Result};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};

use crate::{
    config::{EmailCredentials, Settings},
    diff::Change,
    utils::today_ymd,
};

const SUBJECT_PREFIX: &str = "Badminton Price Alert";
const BODY_INTRO: &str = "The following changes were detected in shuttlecock prices:";

/// Delivers a run's changes to the user. Never fails the run.
pub trait Notifier {
    fn notify(&self, changes: &[Change]);
}

pub fn subject_for(date: &str) -> String {
    format!("{SUBJECT_PREFIX} - {date}")
}

pub fn render_body(changes: &[Change]) -> String {
    let lines: Vec<String> = changes.iter().map(ToString::to_string).collect();
    format!("{BODY_INTRO}\n\n{}", lines.join("\n"))
}

pub fn compose_message(creds: &EmailCredentials, date: &str, changes: &[Change]) -> Result<Message> {
    let from: Mailbox = creds
        .sender
        .parse()
        .with_context(|| format!("sender address {}", creds.sender))?;
    let to: Mailbox = creds
        .receiver
        .parse()
        .with_context(|| format!("receiver address {}", creds.receiver))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(subject_for(date))
        .header(ContentType::TEXT_PLAIN)
        .body(render_body(changes))
        .context("build email")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Skipped,
    Sent,
    Failed,
}

pub struct EmailNotifier {
    smtp_server: String,
    smtp_port: u16,
    credentials: Option<EmailCredentials>,
}

impl EmailNotifier {
    pub fn new(settings: &Settings) -> Self {
        Self {
            smtp_server: settings.smtp_server.clone(),
            smtp_port: settings.smtp_port,
            credentials: settings.email_credentials(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    fn send(&self, creds: &EmailCredentials, changes: &[Change]) -> Result<()> {
        let email = compose_message(creds, &today_ymd(), changes)?;

        let mailer = SmtpTransport::starttls_relay(&self.smtp_server)
            .with_context(|| format!("smtp relay {}", self.smtp_server))?
            .port(self.smtp_port)
            .credentials(Credentials::new(creds.sender.clone(), creds.password.clone()))
            .build();

        mailer
            .send(&email)
            .with_context(|| format!("smtp send via {}:{}", self.smtp_server, self.smtp_port))?;
        Ok(())
    }

    /// Attempts delivery and reports what happened; errors are logged here.
    pub fn deliver(&self, changes: &[Change]) -> Delivery {
        let Some(creds) = self.credentials.as_ref() else {
            log::warn!("notify.skipped reason=missing_credentials changes={}", changes.len());
            return Delivery::Skipped;
        };

        match self.send(creds, changes) {
            Ok(()) => {
                log::info!("notify.sent to={} changes={}", creds.receiver, changes.len());
                Delivery::Sent
            }
            Err(e) => {
                log::error!("notify.error to={} err={:#}", creds.receiver, e);
                Delivery::Failed
            }
        }
    }
}

impl Notifier for EmailNotifier {
    fn notify(&self, changes: &[Change]) {
        self.deliver(changes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{diff::Direction, product::dec};

    fn creds() -> EmailCredentials {
        EmailCredentials {
            sender: "alerts@example.com".into(),
            password: "app-secret".into(),
            receiver: "player@example.com".into(),
        }
    }

    fn changes() -> Vec<Change> {
        vec![
            Change::New { name: "Victor Gold".into(), price: Some(dec("15.00")) },
            Change::PriceChanged {
                name: "Yonex AS-50".into(),
                old: dec("25.00"),
                new: dec("20.00"),
                direction: Direction::Down,
            },
        ]
    }

    #[test]
    fn subject_carries_the_date() {
        assert_eq!(subject_for("2026-10-17"), "Badminton Price Alert - 2026-10-17");
    }

    #[test]
    fn body_lists_one_change_per_line() {
        assert_eq!(
            render_body(&changes()),
            "The following changes were detected in shuttlecock prices:\n\n\
             🆕 NEW: Victor Gold - $15.00\n\
             📉 DOWN: Yonex AS-50 changed from $25.00 to $20.00"
        );
    }

    #[test]
    fn message_has_headers_and_plain_body() {
        let msg = compose_message(&creds(), "2026-10-17", &changes()).unwrap();
        let raw = String::from_utf8(msg.formatted()).unwrap();
        assert!(raw.contains("From: alerts@example.com"));
        assert!(raw.contains("To: player@example.com"));
        assert!(raw.contains("Subject: Badminton Price Alert - 2026-10-17"));
        assert!(raw.contains("Content-Type: text/plain; charset=utf-8"));
    }

    #[test]
    fn bad_address_fails_composition() {
        let mut c = creds();
        c.receiver = "not an address".into();
        assert!(compose_message(&c, "2026-10-17", &changes()).is_err());
    }

    fn notifier_with(pairs: &'static [(&'static str, &'static str)]) -> EmailNotifier {
        let settings = Settings::from_lookup(|k| {
            pairs.iter().find(|(key, _)| *key == k).map(|(_, v)| v.to_string())
        })
        .unwrap();
        EmailNotifier::new(&settings)
    }

    #[test]
    fn partial_credentials_skip_delivery() {
        let notifier = notifier_with(&[
            ("SENDER_EMAIL", "alerts@example.com"),
            ("RECEIVER_EMAIL", "player@example.com"),
        ]);
        assert!(!notifier.is_configured());
        assert_eq!(notifier.deliver(&changes()), Delivery::Skipped);
    }

    #[test]
    fn unreachable_relay_is_reported_as_failed() {
        let notifier = notifier_with(&[
            ("SMTP_SERVER", "127.0.0.1"),
            ("SMTP_PORT", "9"),
            ("SENDER_EMAIL", "alerts@example.com"),
            ("SENDER_PASSWORD", "app-secret"),
            ("RECEIVER_EMAIL", "player@example.com"),
        ]);
        assert!(notifier.is_configured());
        assert_eq!(notifier.deliver(&changes()), Delivery::Failed);
    }
}
