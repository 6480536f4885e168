//! Printing a page of rows.

use kingtable_lib::Row;
use kingtable_lib::column::Column;
use kingtable_lib::pagination::PaginationState;
use serde_json::Value;

const ROW_COUNT: &str = "rowCount";

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Formats rows as tab-separated lines under a header of the visible
/// columns' display names.
pub fn render_table(columns: &[Column], rows: &[Row], row_count: bool) -> String {
    let visible: Vec<&Column> = columns.iter().filter(|c| c.is_visible()).collect();

    let mut header: Vec<&str> = Vec::with_capacity(visible.len() + 1);
    if row_count {
        header.push("#");
    }
    header.extend(visible.iter().map(|c| c.display_name.as_str()));

    let mut lines = vec![header.join("\t")];
    for row in rows {
        let mut cells = Vec::with_capacity(header.len());
        if row_count {
            cells.push(cell(row.get(ROW_COUNT)));
        }
        cells.extend(visible.iter().map(|c| cell(row.get(&c.name))));
        lines.push(cells.join("\t"));
    }
    lines.join("\n")
}

/// One-line summary of where the page sits in the results.
pub fn footer(pagination: &PaginationState) -> String {
    if pagination.total_rows_count == 0 {
        return "no results".to_string();
    }
    format!(
        "page {} of {}, rows {}-{} of {}",
        pagination.page,
        pagination.total_page_count,
        pagination.first_object_number,
        pagination.last_object_number.min(pagination.total_rows_count),
        pagination.total_rows_count
    )
}
