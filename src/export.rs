//! CSV export of a plan.
//!
//! One row per planned move, sorted by category and then destination, with
//! paths relative to the archive and destination roots.

use crate::executor::{MigrationError, MigrationResult};
use crate::planner::Plan;
use std::io;
use std::path::Path;

/// Column headers, in order.
pub const HEADERS: [&str; 5] = [
    "category",
    "source_dir",
    "destination_dir",
    "source_file",
    "destination_file",
];

/// Writes `plan` as CSV to `path`, returning the number of rows.
pub fn export_csv(plan: &Plan, path: &Path) -> MigrationResult<usize> {
    let to_error = |reason: String| MigrationError::CsvWriteFailed {
        path: path.to_path_buf(),
        reason,
    };

    let mut writer = csv::Writer::from_path(path).map_err(|e| to_error(e.to_string()))?;
    write_csv(plan, &mut writer).map_err(|e| to_error(e.to_string()))
}

/// Writes `plan` as CSV to any writer.
pub fn write_csv<W: io::Write>(plan: &Plan, writer: &mut csv::Writer<W>) -> csv::Result<usize> {
    writer.write_record(HEADERS)?;

    let moves = plan.sorted_moves();
    for mv in &moves {
        let source = plan.relative_source(mv);
        let row = [
            mv.category.clone(),
            parent_of(source),
            parent_of(&mv.destination),
            file_name_of(source),
            file_name_of(&mv.destination),
        ];
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(moves.len())
}

fn parent_of(path: &Path) -> String {
    path.parent()
        .map(|parent| parent.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::Move;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn plan() -> Plan {
        Plan {
            archive_root: PathBuf::from("/arkiv"),
            destination_root: PathBuf::from("/vel"),
            moves: vec![
                Move::new(
                    PathBuf::from("/arkiv/Referat/Styrereferat 2024.pdf"),
                    PathBuf::from("021 Styremøter/_usortert/2024 Styrereferat 2024.pdf"),
                    "Styrereferat",
                ),
                Move::new(
                    PathBuf::from("/arkiv/Avtaler og instruks/Kontrakt, vaktmester.pdf"),
                    PathBuf::from("070 Avtaler og instruks/Kontrakt, vaktmester.pdf"),
                    "Avtaler",
                ),
            ],
            ..Plan::default()
        }
    }

    #[test]
    fn test_rows_sorted_and_relative() {
        let mut buffer = Vec::new();
        {
            let mut writer = csv::Writer::from_writer(&mut buffer);
            let rows = write_csv(&plan(), &mut writer).expect("Failed to write CSV");
            assert_eq!(rows, 2);
        }

        let text = String::from_utf8(buffer).expect("CSV is not UTF-8");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "category,source_dir,destination_dir,source_file,destination_file",
                "Avtaler,Avtaler og instruks,070 Avtaler og instruks,\"Kontrakt, vaktmester.pdf\",\"Kontrakt, vaktmester.pdf\"",
                "Styrereferat,Referat,021 Styremøter/_usortert,Styrereferat 2024.pdf,2024 Styrereferat 2024.pdf",
            ]
        );
    }

    #[test]
    fn test_export_to_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("plan.csv");

        let rows = export_csv(&plan(), &path).expect("Failed to export CSV");
        assert_eq!(rows, 2);

        let mut reader = csv::Reader::from_path(&path).expect("Failed to open CSV");
        let headers = reader.headers().expect("Failed to read headers").clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), HEADERS);

        let records: Vec<csv::StringRecord> = reader
            .records()
            .collect::<Result<_, _>>()
            .expect("Failed to read records");
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].iter().collect::<Vec<_>>(),
            vec![
                "Avtaler",
                "Avtaler og instruks",
                "070 Avtaler og instruks",
                "Kontrakt, vaktmester.pdf",
                "Kontrakt, vaktmester.pdf",
            ]
        );
        assert_eq!(&records[1][0], "Styrereferat");
        assert_eq!(&records[1][2], "021 Styremøter/_usortert");
    }

    #[test]
    fn test_unwritable_path_is_reported() {
        let result = export_csv(&plan(), Path::new("/non/existent/dir/plan.csv"));
        assert!(matches!(result, Err(MigrationError::CsvWriteFailed { .. })));
    }
}
