pub mod columns;
pub mod controller;
pub mod html;
pub mod projector;
pub mod script;

use crate::error::Result;
use crate::inventory::ReconciledRow;
use columns::row_cells;
use controller::{RowCells, TableState};

/// Display text of every reconciled row, as the table controller sees it
pub fn table_rows(rows: &[ReconciledRow]) -> Vec<RowCells> {
    rows.iter().map(row_cells).collect()
}

/// All rows and all columns in declaration order, quoted the same way as the
/// in-report export
pub fn export_rows_csv(rows: &[ReconciledRow]) -> Result<String> {
    let cells = table_rows(rows);
    TableState::new(cells.len()).export_csv(&cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_rows_csv_covers_every_row() {
        let rows = vec![
            ReconciledRow {
                autopilot_id: "ap-1".into(),
                model: Some("Surface \"Laptop\"".into()),
                ..Default::default()
            },
            ReconciledRow {
                autopilot_id: "ap-2".into(),
                enrolled: true,
                ..Default::default()
            },
        ];
        let csv = export_rows_csv(&rows).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(r#""Enrollment Status","Intune Device Name""#));
        assert!(lines[1].contains(r#""Surface ""Laptop""""#));
        assert!(lines[2].starts_with(r#""Enrolled""#));
    }
}
