use crate::domain::error_record::ErrorRecord;
use crate::domain::ports::{ErrorStore, ErrorStoreBox};
use crate::error::CardError;
use uuid::Uuid;

/// Best-effort persistence of failures from mutating operations.
///
/// `log` never propagates to the caller of the operation it protects: the
/// original error must reach the client unchanged. When the error-record
/// write itself fails, that failure is surfaced through the secondary
/// tracing log instead of being silently dropped.
pub struct ErrorRecorder {
    errors: ErrorStoreBox,
}

impl ErrorRecorder {
    pub fn new(errors: ErrorStoreBox) -> Self {
        Self { errors }
    }

    pub async fn log(
        &self,
        card_id: Option<Uuid>,
        error: &CardError,
        raw_message: Option<String>,
    ) {
        let record = ErrorRecord::new(card_id, error.to_string(), raw_message);
        if let Err(log_err) = self.errors.store(record).await {
            tracing::error!(
                original = %error,
                failure = %log_err,
                "failed to persist error record"
            );
        }
    }
}
