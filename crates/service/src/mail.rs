//! Outbound mail: a bounded in-process queue drained by one background worker.
//!
//! Producers call [`MailQueue::enqueue`], which never waits. A full or closed
//! queue drops the message with a warning.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::metrics::MAIL_DROPPED_TOTAL;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutboundMail {
    pub fn payment_confirmation(from: &str, to: &str, course_title: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            subject: "Payment Confirmation".into(),
            body: format!("Thank you for enrolling in {course_title}!"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport failed: {0}")]
    Transport(String),
}

/// Delivery seam; the worker calls this for every queued message.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutboundMail) -> Result<(), MailError>;
}

/// Writes messages to the log instead of a mail server.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutboundMail) -> Result<(), MailError> {
        info!(to = %mail.to, from = %mail.from, subject = %mail.subject, event = "mail_sent");
        Ok(())
    }
}

#[derive(Clone)]
pub struct MailQueue {
    tx: mpsc::Sender<OutboundMail>,
    from_address: String,
}

impl MailQueue {
    pub fn channel(capacity: usize, from_address: impl Into<String>) -> (Self, mpsc::Receiver<OutboundMail>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, from_address: from_address.into() }, rx)
    }

    pub fn from_address(&self) -> &str { &self.from_address }

    /// Returns `false` when the message was dropped.
    pub fn enqueue(&self, mail: OutboundMail) -> bool {
        match self.tx.try_send(mail) {
            Ok(()) => true,
            Err(TrySendError::Full(mail)) => {
                MAIL_DROPPED_TOTAL.inc();
                warn!(to = %mail.to, subject = %mail.subject, "mail queue full, message dropped");
                false
            }
            Err(TrySendError::Closed(mail)) => {
                MAIL_DROPPED_TOTAL.inc();
                warn!(to = %mail.to, subject = %mail.subject, "mail worker gone, message dropped");
                false
            }
        }
    }
}

/// Drain the queue until every sender is gone.
pub fn spawn_worker(mut rx: mpsc::Receiver<OutboundMail>, mailer: Arc<dyn Mailer>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(mail) = rx.recv().await {
            match mailer.send(&mail).await {
                Ok(()) => debug!(to = %mail.to, "mail delivered"),
                Err(e) => error!(to = %mail.to, subject = %mail.subject, error = %e, "mail delivery failed"),
            }
        }
        debug!("mail worker stopped");
    })
}
