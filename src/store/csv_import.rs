//! CSV import
//!
//! Reads `lastname,firstname,faculty,course,result` rows. The whole file is
//! parsed and validated before anything is handed to the store.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use super::StoreError;
use crate::models::NewStudent;

/// Reads and validates every row of the CSV file at `path`.
pub fn read_students(path: &Path) -> Result<Vec<NewStudent>, StoreError> {
    let file = File::open(path)?;
    read_students_from(file)
}

/// Reads and validates every row from `source`.
///
/// The first malformed or invalid row aborts the read with its line number.
pub fn read_students_from<R: Read>(source: R) -> Result<Vec<NewStudent>, StoreError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(source);

    let headers = reader.headers().map_err(import_error)?.clone();
    let mut record = StringRecord::new();
    let mut students = Vec::new();

    while reader.read_record(&mut record).map_err(import_error)? {
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let student: NewStudent =
            record
                .deserialize(Some(&headers))
                .map_err(|e| StoreError::Import {
                    line,
                    message: e.to_string(),
                })?;

        if let Some(message) = student.validate() {
            return Err(StoreError::Import { line, message });
        }

        students.push(student);
    }

    Ok(students)
}

fn import_error(err: csv::Error) -> StoreError {
    StoreError::Import {
        line: err.position().map(|p| p.line()).unwrap_or(0),
        message: err.to_string(),
    }
}
