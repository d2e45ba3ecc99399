//! Mail delivery is an external collaborator: the core only needs "send this
//! message to this address". Transport settings live in `config::MailConfig`
//! for a real SMTP implementation to consume.

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct OutboundMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutboundMail) -> anyhow::Result<()>;
}

/// Default mailer: records outbound mail in the log. Used in development and
/// in tests; deployments substitute a transport-backed implementation.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutboundMail) -> anyhow::Result<()> {
        tracing::info!(to = %mail.to, subject = %mail.subject, "outbound mail");
        tracing::debug!("mail body: {}", mail.body);
        Ok(())
    }
}
