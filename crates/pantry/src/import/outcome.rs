use crate::history::RecordCounters;
use crate::record::ProductRecord;

use super::FileError;

/// Records stored from one file.
#[derive(Debug, Default)]
pub struct ImportedFile {
    pub counters: RecordCounters,
    /// Records written by this file, in stream order, for republishing.
    pub records: Vec<ProductRecord>,
}

/// What happened to one file after its history entry was opened.
#[derive(Debug)]
pub enum FileOutcome {
    /// Extraction ran to its end. Individual records may still have failed.
    Imported(ImportedFile),
    /// The file was abandoned. Its attempt is marked failed.
    Aborted(FileError),
}

impl FileOutcome {
    pub fn is_imported(&self) -> bool {
        matches!(self, FileOutcome::Imported(_))
    }
}
