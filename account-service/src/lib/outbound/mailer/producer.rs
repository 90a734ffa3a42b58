use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rdkafka::config::ClientConfig;
use rdkafka::producer::FutureProducer;
use rdkafka::producer::FutureRecord;
use rdkafka::util::Timeout;
use thiserror::Error;

use crate::account::errors::MailerError;
use crate::account::models::AccountId;
use crate::account::models::EmailAddress;
use crate::account::ports::Mailer;
use crate::config::Config;
use crate::outbound::mailer::messages::PasswordResetNoticeMessage;

#[derive(Debug, Error)]
pub enum KafkaMailerError {
    #[error("Failed to send message to Kafka: {0}")]
    SendError(String),

    #[error("Failed to serialize message: {0}")]
    SerializationError(String),
}

impl From<KafkaMailerError> for MailerError {
    fn from(err: KafkaMailerError) -> Self {
        match err {
            KafkaMailerError::SerializationError(msg) => MailerError::SerializationFailed(msg),
            KafkaMailerError::SendError(msg) => MailerError::EnqueueFailed(msg),
        }
    }
}

/// Queues password-reset notices for the out-of-process mail worker.
///
/// The orchestrator already dispatches on a detached task, so delivery
/// latency and broker hiccups never reach the forgot-password caller.
pub struct KafkaResetMailer {
    producer: FutureProducer,
    topic: String,
    timeout: Duration,
}

impl KafkaResetMailer {
    /// Create a new reset-notice producer with "at least once" delivery semantics
    ///
    /// # Notes:
    /// - `acks=all`: Wait for all in-sync replicas to acknowledge
    /// - `enable.idempotence=true`: Prevents duplicate messages during retries
    /// - `retry.backoff.ms=100`: Backoff between retry attempts
    pub fn new(config: &Config) -> Result<Self, anyhow::Error> {
        tracing::info!(
            brokers = %config.kafka.brokers,
            topic = %config.kafka.mail_topic,
            "Initializing Kafka producer for reset notices"
        );

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka.brokers)
            .set("message.timeout.ms", "30000")
            .set("queue.buffering.max.messages", "10000")
            .set("compression.type", "gzip")
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("retries", "10")
            .set("retry.backoff.ms", "100")
            .create()?;

        Ok(Self {
            producer,
            topic: config.kafka.mail_topic.to_string(),
            timeout: Duration::from_secs(30),
        })
    }

    async fn publish(&self, message: &PasswordResetNoticeMessage) -> Result<(), KafkaMailerError> {
        let payload = serde_json::to_string(message)
            .map_err(|e| KafkaMailerError::SerializationError(e.to_string()))?;

        // Keyed by account id so retries for the same account stay ordered
        let record = FutureRecord::to(&self.topic)
            .key(&message.account_id)
            .payload(&payload);

        self.producer
            .send(record, Timeout::After(self.timeout))
            .await
            .map(|_| {
                tracing::debug!(
                    topic = %self.topic,
                    account_id = %message.account_id,
                    "Reset notice queued"
                );
            })
            .map_err(|(err, _)| KafkaMailerError::SendError(err.to_string()))
    }
}

#[async_trait]
impl Mailer for KafkaResetMailer {
    async fn send_password_reset_notice(
        &self,
        account_id: AccountId,
        email: &EmailAddress,
        reset_token: &str,
    ) -> Result<(), MailerError> {
        let message = PasswordResetNoticeMessage {
            account_id: account_id.to_string(),
            email: email.to_string(),
            reset_token: reset_token.to_string(),
            issued_at: Utc::now(),
        };

        self.publish(&message).await.map_err(|e| {
            tracing::error!(
                %account_id,
                error = %e,
                "Failed to queue password reset notice"
            );
            e.into()
        })
    }
}
