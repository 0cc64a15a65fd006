//! Streaming extraction of records from concatenated-object byte streams.

pub mod error;
pub mod reader;
pub mod scanner;

pub use error::ExtractError;
pub use reader::{ExtractBudget, RawRecord, RecordExtractor};
pub use scanner::{ObjectScanner, ScanState};
