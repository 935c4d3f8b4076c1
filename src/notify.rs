//! Best-effort account emails.
//!
//! Sends run on a detached task; a failure is logged and never reaches the
//! request that triggered it.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Serialize;

use crate::config::MailConfig;

#[derive(Debug, Clone, Serialize)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()>;
}

/// Posts each message as JSON to an HTTP mail relay.
pub struct RelayTransport {
    client: reqwest::Client,
    url: String,
    from: String,
}

#[derive(Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

impl RelayTransport {
    pub fn new(url: &str, from: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            from,
        })
    }
}

#[async_trait]
impl MailTransport for RelayTransport {
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        let payload = RelayPayload {
            from: &self.from,
            to: &mail.to,
            subject: &mail.subject,
            html: &mail.html,
        };
        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Used when no relay is configured: the message is only logged.
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        tracing::info!(to = %mail.to, subject = %mail.subject, "mail relay not configured, skipping send");
        Ok(())
    }
}

#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn MailTransport>,
}

impl Notifier {
    pub fn new(transport: Arc<dyn MailTransport>) -> Self {
        Self { transport }
    }

    pub fn from_config(config: &MailConfig) -> anyhow::Result<Self> {
        let transport: Arc<dyn MailTransport> = match config.relay_url.as_deref() {
            Some(url) => {
                let from = format!("{} <{}>", config.from_name, config.from_address);
                Arc::new(RelayTransport::new(url, from)?)
            }
            None => Arc::new(LogTransport),
        };
        Ok(Self::new(transport))
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(LogTransport))
    }

    /// Fire and forget.
    pub fn dispatch(&self, mail: OutgoingMail) -> tokio::task::JoinHandle<()> {
        let transport = self.transport.clone();
        tokio::spawn(async move {
            if let Err(err) = transport.send(&mail).await {
                tracing::warn!(to = %mail.to, subject = %mail.subject, error = %err, "mail delivery failed");
            }
        })
    }

    pub fn welcome(&self, email: &str, username: &str) {
        self.dispatch(welcome_mail(email, username));
    }

    pub fn approved(&self, email: &str, username: &str) {
        self.dispatch(approval_mail(email, username));
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub fn welcome_mail(email: &str, username: &str) -> OutgoingMail {
    let username = escape_html(username);
    OutgoingMail {
        to: email.to_string(),
        subject: "Bienvenue sur ManiocAgri !".to_string(),
        html: format!(
            "<p>Bonjour {username},</p>\
             <p>Votre compte sur <strong>ManiocAgri</strong> a été créé avec succès.</p>\
             <p>Cordialement,<br>L'équipe ManiocAgri</p>"
        ),
    }
}

pub fn approval_mail(email: &str, username: &str) -> OutgoingMail {
    let username = escape_html(username);
    OutgoingMail {
        to: email.to_string(),
        subject: "Votre compte ManiocAgri a été approuvé !".to_string(),
        html: format!(
            "<p>Félicitations {username} !</p>\
             <p>Votre compte a été approuvé. Vous pouvez maintenant vous connecter à votre tableau de bord.</p>\
             <p>À bientôt,<br>L'équipe ManiocAgri</p>"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct Recording(Mutex<Vec<String>>);

    #[async_trait]
    impl MailTransport for Recording {
        async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(mail.to.clone());
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl MailTransport for Failing {
        async fn send(&self, _mail: &OutgoingMail) -> anyhow::Result<()> {
            anyhow::bail!("smtp down")
        }
    }

    #[tokio::test]
    async fn dispatch_runs_detached() {
        let recording = Arc::new(Recording(Mutex::new(Vec::new())));
        let notifier = Notifier::new(recording.clone());
        notifier
            .dispatch(welcome_mail("a@b.c", "awa"))
            .await
            .unwrap();
        assert_eq!(*recording.0.lock().unwrap(), vec!["a@b.c".to_string()]);
    }

    #[test]
    fn usernames_are_escaped_in_mail_bodies() {
        let mail = welcome_mail("a@b.c", "<b>awa</b> & co");
        assert!(mail.html.contains("Bonjour &lt;b&gt;awa&lt;/b&gt; &amp; co,"));
        assert!(!mail.html.contains("<b>awa"));

        let mail = approval_mail("a@b.c", "o'neil\"");
        assert!(mail.html.contains("o&#39;neil&quot;"));
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let notifier = Notifier::new(Arc::new(Failing));
        let handle = notifier.dispatch(approval_mail("a@b.c", "awa"));
        assert!(handle.await.is_ok());
    }
}
