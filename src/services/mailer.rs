//! Outbound completion email.
//!
//! Senders are invoked from a background write task once completion gating succeeded; their
//! failures are logged by the task and never reach the player.

use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::state::stage::StarType;

/// Letter sent to the player once the quest is over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionEmail {
    /// Player who completed the quest.
    pub player_id: Uuid,
    /// Address given by the player.
    pub recipient: String,
    /// Address of the selected character.
    pub sender: String,
    /// Name of the selected character.
    pub npc_name: String,
    /// Star of the selected character.
    pub star: StarType,
    /// Request written by the player, if any.
    pub concern: Option<String>,
}

impl CompletionEmail {
    /// Subject line of the letter.
    pub fn subject(&self) -> String {
        format!("A letter from {} of B612", self.npc_name)
    }
}

/// Failures reported by an [`EmailSender`].
#[derive(Debug, Error)]
pub enum MailerError {
    /// The relay answered with a non-success status.
    #[error("mail relay rejected the message with status {status}")]
    Rejected {
        /// HTTP status returned by the relay.
        status: u16,
    },
    /// The relay could not be reached.
    #[cfg(feature = "http-mailer")]
    #[error("failed to reach the mail relay")]
    Transport {
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },
}

/// Delivery channel for completion emails.
pub trait EmailSender: Send + Sync {
    /// Send `email`, resolving once the channel accepted or refused it.
    fn send(&self, email: CompletionEmail) -> BoxFuture<'static, Result<(), MailerError>>;
}

/// Sender that only logs the letter; used when no relay is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, email: CompletionEmail) -> BoxFuture<'static, Result<(), MailerError>> {
        Box::pin(async move {
            info!(
                player_id = %email.player_id,
                recipient = %email.recipient,
                sender = %email.sender,
                subject = %email.subject(),
                "completion email (log only)"
            );
            Ok(())
        })
    }
}

#[cfg(feature = "http-mailer")]
pub use self::webhook::WebhookEmailSender;

#[cfg(feature = "http-mailer")]
mod webhook {
    use std::sync::Arc;

    use futures::future::BoxFuture;
    use reqwest::Client;
    use serde::Serialize;

    use super::{CompletionEmail, EmailSender, MailerError};

    /// Sender posting each letter as JSON to an HTTP mail relay.
    #[derive(Clone)]
    pub struct WebhookEmailSender {
        client: Client,
        url: Arc<str>,
    }

    #[derive(Serialize)]
    struct WebhookPayload<'a> {
        from: &'a str,
        reply_to: &'a str,
        to: &'a str,
        subject: String,
        #[serde(flatten)]
        email: &'a CompletionEmail,
    }

    impl WebhookEmailSender {
        /// Build a sender targeting `url`.
        pub fn new(url: impl Into<Arc<str>>) -> Result<Self, MailerError> {
            let client = Client::builder()
                .build()
                .map_err(|source| MailerError::Transport { source })?;
            Ok(Self {
                client,
                url: url.into(),
            })
        }
    }

    impl EmailSender for WebhookEmailSender {
        fn send(&self, email: CompletionEmail) -> BoxFuture<'static, Result<(), MailerError>> {
            let sender = self.clone();
            Box::pin(async move {
                let payload = WebhookPayload {
                    from: &email.sender,
                    reply_to: &email.sender,
                    to: &email.recipient,
                    subject: email.subject(),
                    email: &email,
                };

                let response = sender
                    .client
                    .post(sender.url.as_ref())
                    .json(&payload)
                    .send()
                    .await
                    .map_err(|source| MailerError::Transport { source })?;

                if response.status().is_success() {
                    Ok(())
                } else {
                    Err(MailerError::Rejected {
                        status: response.status().as_u16(),
                    })
                }
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_sender_always_accepts() {
        let email = CompletionEmail {
            player_id: Uuid::new_v4(),
            recipient: "player@example.com".into(),
            sender: "rose@b612.rose.com".into(),
            npc_name: "장미".into(),
            star: StarType::Envy,
            concern: None,
        };

        assert!(LogEmailSender.send(email.clone()).await.is_ok());
        assert_eq!(email.subject(), "A letter from 장미 of B612");
    }
}
