//! Serializers for extraction results
//!
//! Plain text exports the raw model output; every other format is rendered from
//! the coerced [`StructuredTable`].

use crate::output::{ExportError, ExportFormat, ExportResult};
use crate::table::StructuredTable;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

/// Words of the description kept in a file stem
const STEM_WORDS: usize = 4;

/// Stem used when the description has no usable words
const FALLBACK_STEM: &str = "extraction_result";

/// Returns the raw extraction text unchanged
pub fn to_text(raw_text: &str) -> String {
    raw_text.to_string()
}

/// Renders the table as CSV with a header row
pub fn to_csv(table: &StructuredTable) -> ExportResult<String> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

    if !table.columns().is_empty() {
        writer.write_record(table.columns())?;
    }
    for row in table.rows() {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Write(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Format(e.to_string()))
}

/// Renders the table as a JSON array of records, columns in header order
pub fn to_json(table: &StructuredTable) -> ExportResult<String> {
    Ok(serde_json::to_string_pretty(&table.records())?)
}

/// Renders the table as an HTML `<table>` with escaped cells
pub fn to_html(table: &StructuredTable) -> String {
    let mut html = String::from("<table border=\"1\" class=\"dataframe\">\n");

    html.push_str("  <thead>\n    <tr style=\"text-align: right;\">\n");
    for column in table.columns() {
        html.push_str(&format!(
            "      <th>{}</th>\n",
            html_escape::encode_text(column)
        ));
    }
    html.push_str("    </tr>\n  </thead>\n");

    html.push_str("  <tbody>\n");
    for row in table.rows() {
        html.push_str("    <tr>\n");
        for cell in row {
            html.push_str(&format!(
                "      <td>{}</td>\n",
                html_escape::encode_text(&cell.to_string())
            ));
        }
        html.push_str("    </tr>\n");
    }
    html.push_str("  </tbody>\n</table>\n");

    html
}

/// Renders an extraction result in the requested format
pub fn render(format: ExportFormat, table: &StructuredTable, raw_text: &str) -> ExportResult<String> {
    match format {
        ExportFormat::Text => Ok(to_text(raw_text)),
        ExportFormat::Csv => to_csv(table),
        ExportFormat::Json => to_json(table),
        ExportFormat::Html => Ok(to_html(table)),
    }
}

/// Builds a filesystem-safe file stem from the description and the current time
///
/// # Example
///
/// ```no_run
/// use scrapesmart::output::export_file_stem;
///
/// // e.g. "product_names_and_prices_20250101_120000"
/// let stem = export_file_stem("Product names and prices");
/// ```
pub fn export_file_stem(description: &str) -> String {
    file_stem_at(description, Local::now())
}

/// Builds a file stem for a fixed timestamp
pub fn file_stem_at(description: &str, timestamp: DateTime<Local>) -> String {
    let words: Vec<String> = description
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .take(STEM_WORDS)
        .collect();

    let base = if words.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        words.join("_")
    };

    format!("{}_{}", base, timestamp.format("%Y%m%d_%H%M%S"))
}

/// Writes an extraction result to `{directory}/{stem}.{extension}`
///
/// # Arguments
///
/// * `directory` - Output directory, created if missing
/// * `stem` - File name without extension
/// * `format` - Export format
/// * `table` - The coerced table
/// * `raw_text` - The raw model output
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(ExportError)` - Rendering or writing failed
pub fn write_export(
    directory: &Path,
    stem: &str,
    format: ExportFormat,
    table: &StructuredTable,
    raw_text: &str,
) -> ExportResult<PathBuf> {
    let contents = render(format, table, raw_text)?;

    fs::create_dir_all(directory)?;
    let path = directory.join(format!("{}.{}", stem, format.extension()));
    fs::write(&path, contents)?;

    tracing::info!("Wrote {} export to {}", format, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::to_table;
    use chrono::TimeZone;

    fn sample() -> StructuredTable {
        to_table("| name | price |\n|---|---|\n| Lamp, large | 12 |\n| <Desk> | 7.5 |")
    }

    #[test]
    fn test_to_csv_quotes_fields() {
        assert_eq!(
            to_csv(&sample()).unwrap(),
            "name,price\n\"Lamp, large\",12\n<Desk>,7.5\n"
        );
    }

    #[test]
    fn test_to_csv_empty_table() {
        assert_eq!(to_csv(&StructuredTable::default()).unwrap(), "");
    }

    #[test]
    fn test_to_json_records() {
        let json: serde_json::Value = serde_json::from_str(&to_json(&sample()).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"name": "Lamp, large", "price": 12.0},
                {"name": "<Desk>", "price": 7.5},
            ])
        );
    }

    #[test]
    fn test_to_json_preserves_column_order() {
        let table = to_table("|z|a|\n|-|-|\n|1|2|");
        let json = to_json(&table).unwrap();
        assert!(json.find("\"z\"").unwrap() < json.find("\"a\"").unwrap());
    }

    #[test]
    fn test_to_html_escapes_cells() {
        let html = to_html(&sample());
        assert!(html.contains("<th>name</th>"));
        assert!(html.contains("<td>&lt;Desk&gt;</td>"));
        assert_eq!(html.matches("<tr>").count(), 2);
    }

    #[test]
    fn test_render_text_uses_raw_output() {
        let raw = "| name | price |\nsome prose";
        assert_eq!(render(ExportFormat::Text, &sample(), raw).unwrap(), raw);
    }

    #[test]
    fn test_file_stem() {
        let timestamp = Local.with_ymd_and_hms(2025, 6, 15, 14, 5, 0).unwrap();
        assert_eq!(
            file_stem_at("Get ALL product names & prices!", timestamp),
            "get_all_product_names_20250615_140500"
        );
        assert_eq!(
            file_stem_at("  ?? ", timestamp),
            "extraction_result_20250615_140500"
        );
    }

    #[test]
    fn test_write_export_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("out");

        let path = write_export(&target, "result", ExportFormat::Csv, &sample(), "").unwrap();

        assert_eq!(path, target.join("result.csv"));
        assert!(fs::read_to_string(path).unwrap().starts_with("name,price\n"));
    }
}
