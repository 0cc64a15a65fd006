use thiserror::Error;

/// Failures that abort extraction of a whole file.
///
/// An object that is balanced but fails to decode is not an error; it is
/// skipped silently by the extractor.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Source unavailable: failed to read stream: {0}")]
    SourceUnavailable(#[source] std::io::Error),

    #[error("No valid records found in file")]
    NoRecordsExtracted,
}
