//! Plain-text table rendering for terminal output.

use checkio_core::CategoryWarning;
use checkio_shared::ProjectedAsset;
use tabled::{builder::Builder, settings::Style};

/// Flatten projected assets into table cells, matching the header order.
pub(crate) fn asset_cells(rows: &[ProjectedAsset]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            let assignee = match (&row.assigned_to_name, &row.assigned_to_type) {
                (Some(name), Some(kind)) => format!("{name} ({kind})"),
                (Some(name), None) => name.clone(),
                _ => String::new(),
            };
            let mut cells = vec![assignee, row.category_name.clone()];
            cells.extend(row.properties.iter().map(|p| p.value.clone()));
            cells
        })
        .collect()
}

/// Render a table whose columns are only known at runtime.
pub(crate) fn format_table(columns: &[String], rows: &[Vec<String>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(columns.iter().cloned());
    for row in rows {
        builder.push_record(row.iter().cloned());
    }

    let mut table = builder.build();
    table.with(Style::psql());
    table.to_string()
}

/// One stderr line per failed category.
pub(crate) fn warning_lines(warnings: &[CategoryWarning]) -> Vec<String> {
    warnings.iter().map(|w| format!("warning: {w}")).collect()
}
