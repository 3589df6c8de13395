//! Lenient markdown table parsing
//!
//! Parsing never fails: text without a usable table becomes an empty table, and
//! rows that do not fit the header are dropped.

use crate::table::{CellValue, ColumnType, StructuredTable};

/// Marks a markdown header separator row
const SEPARATOR_MARKER: &str = "---";

/// Coerces the first markdown table in `text` into a [`StructuredTable`]
///
/// # Parsing Rules
///
/// 1. The header is the first non-blank line containing `|` but not `---`
/// 2. The line right after the header is skipped without inspection
/// 3. Every later non-blank line containing `|` is a candidate row
/// 4. Cells are split on `|` after trimming the line and one outer pipe per side;
///    each cell is trimmed
/// 5. Rows whose cell count differs from the header's are dropped
/// 6. Each column is typed from its non-empty cells: integer, then float,
///    otherwise text
///
/// # Examples
///
/// ```
/// use scrapesmart::table::to_table;
///
/// let table = to_table("a|b\n--|--\n1|2\n3|4");
/// assert_eq!(table.columns(), ["a", "b"]);
/// assert_eq!(table.len(), 2);
///
/// assert!(to_table("no pipes here").is_empty());
/// ```
pub fn to_table(text: &str) -> StructuredTable {
    let lines: Vec<&str> = text.trim().lines().collect();

    let header_index = match lines.iter().position(|line| is_header_candidate(line)) {
        Some(index) => index,
        None => return StructuredTable::default(),
    };

    let columns = split_cells(lines[header_index]);

    let raw_rows: Vec<Vec<String>> = lines
        .iter()
        .skip(header_index + 2)
        .filter(|line| !line.trim().is_empty() && line.contains('|'))
        .map(|line| split_cells(line))
        .filter(|cells| cells.len() == columns.len())
        .collect();

    if raw_rows.is_empty() {
        return StructuredTable::default();
    }

    let column_types: Vec<ColumnType> = (0..columns.len())
        .map(|col| infer_column_type(raw_rows.iter().map(|row| row[col].as_str())))
        .collect();

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&column_types)
                .map(|(cell, column_type)| typed_cell(cell, *column_type))
                .collect()
        })
        .collect();

    StructuredTable {
        columns,
        column_types,
        rows,
    }
}

fn is_header_candidate(line: &str) -> bool {
    !line.trim().is_empty() && line.contains('|') && !line.contains(SEPARATOR_MARKER)
}

fn split_cells(line: &str) -> Vec<String> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);

    line.split('|')
        .map(|cell| cell.trim().to_string())
        .collect()
}

fn infer_column_type<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut values = cells.filter(|cell| !cell.is_empty()).peekable();
    if values.peek().is_none() {
        return ColumnType::Text;
    }

    let values: Vec<&str> = values.collect();
    if values.iter().all(|v| v.parse::<i64>().is_ok()) {
        ColumnType::Integer
    } else if values.iter().all(|v| parse_finite(v).is_some()) {
        ColumnType::Float
    } else {
        ColumnType::Text
    }
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn typed_cell(cell: String, column_type: ColumnType) -> CellValue {
    if cell.is_empty() {
        return CellValue::Empty;
    }

    match column_type {
        ColumnType::Integer => cell
            .parse()
            .map(CellValue::Integer)
            .unwrap_or(CellValue::Text(cell)),
        ColumnType::Float => match parse_finite(&cell) {
            Some(value) => CellValue::Float(value),
            None => CellValue::Text(cell),
        },
        ColumnType::Text => CellValue::Text(cell),
    }
}
