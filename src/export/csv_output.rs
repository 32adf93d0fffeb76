//! CSV serialization of flat rows.

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::AppError;
use crate::export::projector::{FlatRow, CSV_HEADER};

/// Serializes rows to CSV text with the fixed header.
///
/// Fields are quoted only when they contain the delimiter, a quote, or a
/// line break. Records end with `\n`. Identical input gives identical bytes.
pub fn write_csv(rows: &[FlatRow]) -> Result<String, AppError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::with_capacity((rows.len() + 1) * 96));

    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.write_record(row.as_record())?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush CSV writer: {}", e.error())))?;

    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV output is not UTF-8: {}", e)))
}
