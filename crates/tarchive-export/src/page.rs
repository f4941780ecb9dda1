//! Minimal HTML export page.

use std::fmt::Write;

use crate::types::ExportContext;

/// Render the export page for `ctx`.
///
/// Dates are validated `YYYY-MM-DD` strings, so they are interpolated as-is.
pub fn render_export_page(ctx: &ExportContext) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Token export</title></head>\n<body>\n<h1>Token export</h1>\n",
    );

    match &ctx.selected_date {
        Some(date) => {
            let _ = writeln!(
                html,
                "<p>{date}: {count} tokens. <a href=\"/export/json/{date}.zip\">JSON (zip)</a> | <a href=\"/export/csv/{date}.csv\">CSV</a></p>",
                count = ctx.token_count
            );
        }
        None => html.push_str("<p>No archived dates yet.</p>\n"),
    }

    html.push_str("<ul>\n");
    for date in &ctx.dates {
        let marker = if ctx.selected_date.as_deref() == Some(date.as_str()) {
            " (selected)"
        } else {
            ""
        };
        let _ = writeln!(html, "<li><a href=\"/export?date={date}\">{date}</a>{marker}</li>");
    }
    html.push_str("</ul>\n</body>\n</html>\n");

    html
}
