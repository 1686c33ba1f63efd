use anyhow::{Context, Result};
use console::{Alignment, pad_str, style};
use gitdocs_core::{DocumentRecord, SaveError, SaveOutcome, UploadForm};
use tracing::{error, info};

use crate::app::Gitdocs;
use crate::cli::{ListArgs, ShowArgs, UploadArgs};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";
const READ_INDEX_FAILED: &str = "Failed to read the document index. Check the token and repository settings";

// --- Handler Functions ---

pub async fn handle_list(args: ListArgs, app: &Gitdocs) -> Result<()> {
    let index = app.synchronizer().fetch().await.context(READ_INDEX_FAILED)?;
    let documents: Vec<&DocumentRecord> = index.filter(args.status, args.category.as_deref()).collect();

    if documents.is_empty() {
        println!("No documents found.");
        return Ok(());
    }
    print!("{}", format_table(&documents));
    Ok(())
}

pub async fn handle_show(args: ShowArgs, app: &Gitdocs) -> Result<()> {
    let index = app.synchronizer().fetch().await.context(READ_INDEX_FAILED)?;
    let Some(document) = index.get(args.title.trim()) else {
        anyhow::bail!("No document titled '{}'", args.title.trim());
    };
    print!("{}", format_record(document));
    Ok(())
}

pub async fn handle_categories(app: &Gitdocs) -> Result<()> {
    let index = app.synchronizer().fetch().await.context(READ_INDEX_FAILED)?;
    let categories = index.categories();
    if categories.is_empty() {
        println!("No categories in use.");
    }
    for category in categories {
        println!("{}", category);
    }
    Ok(())
}

pub async fn handle_upload(args: UploadArgs, app: &Gitdocs) -> Result<()> {
    let mut form = UploadForm::from_path(&args.file).await
        .with_context(|| format!("Failed to read {}", args.file.display()))?
        .with_status(args.status)
        .with_category(args.category)
        .with_meta(args.meta);
    if let Some(title) = args.title {
        form = form.with_title(title);
    }

    let session = app.session(args.yes);
    let count = session.load().await.context(READ_INDEX_FAILED)?;
    info!(count, "Loaded document index");

    match session.save(form).await {
        Ok(SaveOutcome::Saved { record, replaced }) => {
            let verb = if replaced { "Updated" } else { "Uploaded" };
            println!("{} {}", style(verb).green().bold(), record.title);
            if let Some(url) = &record.url {
                println!("  {}", url);
            }
            Ok(())
        }
        Ok(SaveOutcome::Cancelled) => {
            println!("Upload cancelled.");
            Ok(())
        }
        Err(SaveError::IndexUpdate { url, source }) => {
            error!(error = %source, "File stored but index update failed");
            eprintln!("{} the file was stored at {}", style("Warning:").yellow().bold(), url);
            Err(anyhow::Error::new(source).context("Failed to update the document index"))
        }
        Err(e) => Err(e.into()),
    }
}

// --- Output Formatting ---

/// Renders documents as an aligned table with a header row.
pub fn format_table(documents: &[&DocumentRecord]) -> String {
    let headers = ["Title", "Status", "Category", "Last updated"];
    let rows: Vec<[String; 4]> = documents.iter()
        .map(|doc| [
            doc.title.clone(),
            doc.status.to_string(),
            doc.category.clone(),
            doc.last_updated.format(TIMESTAMP_FORMAT).to_string(),
        ])
        .collect();

    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header_line = headers.iter().zip(widths)
        .map(|(h, w)| pad_str(h, w, Alignment::Left, None).into_owned())
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(&format!("{}\n", style(header_line.trim_end()).bold()));

    for row in &rows {
        let line = row.iter().zip(widths)
            .map(|(cell, w)| pad_str(cell, w, Alignment::Left, None).into_owned())
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Renders every field of one document.
pub fn format_record(document: &DocumentRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", style(&document.title).bold()));
    out.push_str(&format!("  Status:       {}\n", document.status));
    if !document.category.is_empty() {
        out.push_str(&format!("  Category:     {}\n", document.category));
    }
    if !document.filename.is_empty() {
        out.push_str(&format!("  File:         {}\n", document.filename));
    }
    if let Some(url) = &document.url {
        out.push_str(&format!("  URL:          {}\n", url));
    }
    out.push_str(&format!("  Created:      {}\n", document.created_at.format(TIMESTAMP_FORMAT)));
    out.push_str(&format!("  Last updated: {}\n", document.last_updated.format(TIMESTAMP_FORMAT)));
    if !document.meta.trim().is_empty() {
        out.push_str("  Notes:\n");
        out.push_str(&textwrap::indent(&textwrap::fill(document.meta.trim(), 72), "    "));
        if !out.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use gitdocs_core::DocumentStatus;

    fn record(title: &str) -> DocumentRecord {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        DocumentRecord::new(title, now)
    }

    #[test]
    fn table_aligns_columns() {
        let long = record("Quarterly report").with_status(DocumentStatus::UnderReview).with_category("finance");
        let short = record("Memo");
        let table = format_table(&[&long, &short]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        let status_column = lines[1].find("under review").unwrap();
        assert_eq!(lines[2].find("draft").unwrap(), status_column);
        assert!(lines[1].ends_with("2024-03-01 09:30"));
    }

    #[test]
    fn record_shows_optional_fields_only_when_set() {
        let bare = format_record(&record("Memo"));
        assert!(!bare.contains("URL:"));
        assert!(!bare.contains("Notes:"));

        let full = format_record(
            &record("Memo").with_url("https://example.com/memo").with_meta("Reviewed by legal"),
        );
        assert!(full.contains("URL:          https://example.com/memo"));
        assert!(full.contains("    Reviewed by legal"));
    }
}
