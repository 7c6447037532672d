use crate::domain::transaction::Transaction;
use crate::error::Result;

/// Column order of the activity report.
pub const REPORT_HEADER: [&str; 6] = ["uuid", "cardId", "amount", "merchant", "type", "createdAt"];

/// Serializes transactions as delimited text, one quoted row per transaction.
///
/// Rows are written in the order given; callers are responsible for sorting.
/// An empty slice yields a header-only document.
pub fn write_report(rows: &[Transaction]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(REPORT_HEADER)?;
    for tx in rows {
        writer.write_record([
            tx.uuid.to_string(),
            tx.card_id.to_string(),
            tx.amount.value().to_string(),
            tx.merchant.clone(),
            tx.kind.to_string(),
            tx.created_at.to_rfc3339(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| crate::error::CardError::IoError(e.into_error()))
}
