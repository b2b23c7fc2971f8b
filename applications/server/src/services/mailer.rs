/// Outbound mail for password-reset codes
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Mutex;

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a reset code to `email`
    async fn send_reset_code(&self, email: &str, code: &str, ttl_minutes: i64) -> Result<()>;
}

/// Mailer that only logs delivery
///
/// Stands in for an SMTP transport; the code is logged at debug level only.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_reset_code(&self, email: &str, code: &str, ttl_minutes: i64) -> Result<()> {
        tracing::info!(to = %email, ttl_minutes, "Sending password reset code");
        tracing::debug!(to = %email, code = %code, "Password reset code");
        Ok(())
    }
}

/// Mailer that keeps every message in memory
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent code sent to `email`
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send_reset_code(&self, email: &str, code: &str, _ttl_minutes: i64) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((email.to_string(), code.to_string()));
        Ok(())
    }
}
