use crate::application::engine::CardEngine;
use crate::domain::card::Card;
use crate::domain::error_record::ErrorRecord;
use crate::domain::ports::ErrorStore;
use crate::error::Result;
use serde::Deserialize;
use std::io::BufRead;
use uuid::Uuid;

/// Envelope carried by the card-request queue.
///
/// Unknown fields are rejected: the shape is validated here, at the boundary,
/// rather than trusting field presence downstream.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCardMessage {
    pub user_id: Uuid,
    #[serde(default)]
    pub request: Option<String>,
}

/// Outcome of draining a batch of queued messages.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DrainOutcome {
    pub processed: usize,
    pub dead_lettered: usize,
}

/// Deserializes one queue message body and runs the card-creation flow.
pub async fn process_create_request(engine: &CardEngine, body: &str) -> Result<Card> {
    let message: CreateCardMessage = serde_json::from_str(body)?;
    engine
        .create_card(message.user_id, message.request.as_deref())
        .await
}

/// Dead-letter handler: persists the raw message with a generic failure note.
pub async fn record_failed_request(errors: &dyn ErrorStore, body: &str) -> Result<()> {
    let record = ErrorRecord::new(
        None,
        "failed to process card request message",
        Some(body.to_string()),
    );
    errors.store(record).await
}

/// Drains newline-delimited JSON envelopes from `input`.
///
/// Each message is processed independently; a failed message is dead-lettered
/// and draining continues. Only an unreadable input line aborts the batch.
pub async fn drain(
    engine: &CardEngine,
    errors: &dyn ErrorStore,
    input: impl BufRead,
) -> Result<DrainOutcome> {
    let mut outcome = DrainOutcome::default();

    for line in input.lines() {
        let body = line?;
        if body.trim().is_empty() {
            continue;
        }
        match process_create_request(engine, &body).await {
            Ok(card) => {
                tracing::info!(card = %card.uuid, "created card from queued request");
                outcome.processed += 1;
            }
            Err(err) => {
                tracing::warn!(failure = %err, "dead-lettering card request");
                record_failed_request(errors, &body).await?;
                outcome.dead_lettered += 1;
            }
        }
    }

    Ok(outcome)
}
