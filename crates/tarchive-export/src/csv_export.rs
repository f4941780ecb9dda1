//! Flattened CSV view of one day's archive.
//!
//! One row per token: `name,mint,createdAt,latestPrice,checkCount`.
//! `name` is always wrapped in double quotes and never escaped; the other
//! columns are written raw. `latestPrice` reads a `price` key from the latest
//! snapshot, which the writer never produces, so it is empty for every file
//! this system writes.

use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde_json::Value;
use tarchive_core::TokenArchive;

use crate::error::ExportResult;

pub const CSV_HEADER: [&str; 5] = ["name", "mint", "createdAt", "latestPrice", "checkCount"];

/// Render tokens as CSV, one `\n`-terminated line per token after the header.
pub fn tokens_to_csv(tokens: &[TokenArchive]) -> ExportResult<String> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record(CSV_HEADER)?;

    for token in tokens {
        let name = format!("\"{}\"", token.name().unwrap_or_default());
        let latest_price = token
            .latest()
            .and_then(|snapshot| snapshot.get("price"))
            .map(cell)
            .unwrap_or_default();
        let check_count = token.check_count().to_string();

        wtr.write_record([
            name,
            token.mint().unwrap_or_default(),
            token.created_at().unwrap_or_default(),
            latest_price,
            check_count,
        ])?;
    }

    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
