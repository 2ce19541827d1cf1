/// Bulk send dispatcher implementation
use crate::{
    config::OperatingMode,
    db::models::{EmailTemplate, SendStatus, SentEmail},
    error::{ApiError, ApiResult},
    mailer::MailSender,
    notify::{render_placeholder, BatchResult, Recipient},
};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::{sync::Arc, time::Duration};
use uuid::Uuid;

/// Bulk notifier service
///
/// Sends a rendered copy of a template to each recipient and writes one
/// durable outcome record per recipient. A failed send is recorded and the
/// batch continues; only storage errors abort.
pub struct BulkNotifier {
    db: SqlitePool,
    sender: Arc<dyn MailSender>,
    operating_mode: OperatingMode,
    send_timeout: Duration,
}

impl BulkNotifier {
    /// Create a new bulk notifier
    pub fn new(
        db: SqlitePool,
        sender: Arc<dyn MailSender>,
        operating_mode: OperatingMode,
        send_timeout: Duration,
    ) -> Self {
        Self {
            db,
            sender,
            operating_mode,
            send_timeout,
        }
    }

    /// Send a template to every recipient in the batch
    ///
    /// The caller is responsible for having resolved the template and checked
    /// location access. Every recipient gets an outcome row whether the send
    /// succeeded or not.
    pub async fn send_bulk(
        &self,
        template: &EmailTemplate,
        recipients: &[Recipient],
        sender_email: &str,
    ) -> ApiResult<BatchResult> {
        if recipients.is_empty() {
            return Err(ApiError::Validation(
                "Recipient list cannot be empty".to_string(),
            ));
        }

        let mut result = BatchResult::default();

        for recipient in recipients {
            let subject = render_placeholder(&template.subject, &recipient.name);
            let body = render_placeholder(&template.body, &recipient.name);

            let status = match self
                .attempt_send(&recipient.email, sender_email, &subject, &body)
                .await
            {
                Ok(()) => {
                    result.sent += 1;
                    SendStatus::Sent
                }
                Err(e) => {
                    tracing::warn!(
                        recipient = %recipient.email,
                        template_id = %template.id,
                        "Bulk send failed for recipient: {}",
                        e
                    );
                    result.failed += 1;
                    SendStatus::Failed
                }
            };

            self.record_outcome(
                recipient,
                Some(template.id),
                sender_email,
                &subject,
                &body,
                status,
                template.location_id,
            )
            .await?;
        }

        tracing::info!(
            template_id = %template.id,
            sent = result.sent,
            failed = result.failed,
            "Bulk send complete"
        );

        Ok(result)
    }

    /// Retry previously failed records by id
    ///
    /// Resends the stored subject/body verbatim. A success flips the record
    /// to `resent`; a failure leaves it `failed`. Missing records and records
    /// not in the `failed` state are skipped, never errors.
    pub async fn resend_failed(&self, record_ids: &[Uuid]) -> ApiResult<BatchResult> {
        let mut result = BatchResult::default();

        for record_id in record_ids {
            let record = match self.get_record(*record_id).await? {
                Some(record) => record,
                None => {
                    result.skipped += 1;
                    continue;
                }
            };

            if record.status != SendStatus::Failed {
                result.skipped += 1;
                continue;
            }

            match self
                .attempt_send(
                    &record.recipient_email,
                    &record.sender,
                    &record.subject,
                    &record.body,
                )
                .await
            {
                Ok(()) => {
                    sqlx::query("UPDATE sent_emails SET status = ?1 WHERE id = ?2")
                        .bind(SendStatus::Resent.as_str())
                        .bind(record.id)
                        .execute(&self.db)
                        .await
                        .map_err(ApiError::Database)?;
                    result.sent += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        record_id = %record.id,
                        recipient = %record.recipient_email,
                        "Resend failed: {}",
                        e
                    );
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }

    /// List outcome records for a location, newest first
    pub async fn list_sent_emails(&self, location_id: Uuid) -> ApiResult<Vec<SentEmail>> {
        let rows = sqlx::query(
            "SELECT id, recipient_email, recipient_name, template_id, sender, subject, body,
                    status, location_id, sent_at
             FROM sent_emails WHERE location_id = ?1 ORDER BY sent_at DESC",
        )
        .bind(location_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::Database)?;

        rows.iter().map(sent_email_from_row).collect()
    }

    /// Get a single outcome record
    pub async fn get_record(&self, id: Uuid) -> ApiResult<Option<SentEmail>> {
        let row = sqlx::query(
            "SELECT id, recipient_email, recipient_name, template_id, sender, subject, body,
                    status, location_id, sent_at
             FROM sent_emails WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::Database)?;

        row.as_ref().map(sent_email_from_row).transpose()
    }

    /// One delivery attempt, bounded by the configured timeout
    async fn attempt_send(
        &self,
        to: &str,
        from: &str,
        subject: &str,
        body: &str,
    ) -> ApiResult<()> {
        if self.operating_mode == OperatingMode::Degraded {
            return Err(ApiError::UpstreamSend(
                "Outbound mail disabled in degraded mode".to_string(),
            ));
        }

        match tokio::time::timeout(self.send_timeout, self.sender.send(to, from, subject, body))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ApiError::UpstreamSend(format!(
                "Send timed out after {}s",
                self.send_timeout.as_secs()
            ))),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn record_outcome(
        &self,
        recipient: &Recipient,
        template_id: Option<Uuid>,
        sender_email: &str,
        subject: &str,
        body: &str,
        status: SendStatus,
        location_id: Uuid,
    ) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO sent_emails
                (id, recipient_email, recipient_name, template_id, sender, subject, body,
                 status, location_id, sent_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(Uuid::new_v4())
        .bind(&recipient.email)
        .bind(&recipient.name)
        .bind(template_id)
        .bind(sender_email)
        .bind(subject)
        .bind(body)
        .bind(status.as_str())
        .bind(location_id)
        .bind(Utc::now())
        .execute(&self.db)
        .await
        .map_err(ApiError::Database)?;

        Ok(())
    }
}

fn sent_email_from_row(row: &sqlx::sqlite::SqliteRow) -> ApiResult<SentEmail> {
    let status: String = row.get("status");

    Ok(SentEmail {
        id: row.get("id"),
        recipient_email: row.get("recipient_email"),
        recipient_name: row.get("recipient_name"),
        template_id: row.get("template_id"),
        sender: row.get("sender"),
        subject: row.get("subject"),
        body: row.get("body"),
        status: SendStatus::from_str(&status)?,
        location_id: row.get("location_id"),
        sent_at: row.get("sent_at"),
    })
}
