//! Struct archiving functionality
//!
//! To add archiving functionality to a struct implement the `Archived` trait. Archives are CSV
//! files inside the session's archive directory, one row per call to `serialise`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use csv::WriterBuilder;
pub use csv::Writer;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::path::Path;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
#[derive(Default)]
pub struct Archiver {
    writer: Option<Writer<File>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while archiving.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Cannot open the archive file: {0}")]
    FileError(std::io::Error),

    #[error("Cannot serialise the record: {0}")]
    CsvError(csv::Error),

    #[error("The archiver has not been initialised")]
    NotInit,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A trait which enables a struct to be archived as a timestamped csv.
///
/// To implement this trait, the struct shall have an `Archiver` member which shall be setup in
/// the struct's `init` or `new` functions.
pub trait Archived {
    /// Write the archives for this struct
    fn write(&mut self) -> Result<(), ArchiveError>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    pub fn from_path<P: AsRef<Path>>(session: &Session, path: P) -> Result<Self, ArchiveError> {
        Self::from_abs_path(session.arch_root.join(path))
    }

    /// Create a new archiver writing to the given file. Any existing file is truncated.
    pub fn from_abs_path<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(ArchiveError::FileError)?;

        let w = WriterBuilder::new().has_headers(true).from_writer(file);

        Ok(Self { writer: Some(w) })
    }

    /// Serialise a record into the archive.
    ///
    /// Records must be flat structs (no nested structs or sequences) for CSV serialisation.
    pub fn serialise<T: Serialize>(&mut self, record: T) -> Result<(), ArchiveError> {
        match self.writer {
            Some(ref mut w) => {
                w.serialize(record).map_err(ArchiveError::CsvError)?;
                w.flush()
                    .map_err(|e| ArchiveError::CsvError(csv::Error::from(e)))
            }
            None => Err(ArchiveError::NotInit),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        time_s: f64,
        angle_deg: f64,
    }

    #[test]
    fn test_uninitialised_archiver() {
        let mut a = Archiver::default();
        assert!(matches!(
            a.serialise(Row { time_s: 0.0, angle_deg: 1.0 }),
            Err(ArchiveError::NotInit)
        ));
    }

    #[test]
    fn test_write_rows() {
        let path = std::env::temp_dir().join("util_archive_test_write_rows.csv");
        let mut a = Archiver::from_abs_path(&path).unwrap();
        a.serialise(Row { time_s: 0.0, angle_deg: 90.0 }).unwrap();
        a.serialise(Row { time_s: 0.02, angle_deg: 91.5 }).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "time_s,angle_deg");
        assert_eq!(lines.len(), 3);
    }
}
