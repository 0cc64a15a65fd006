pub mod alert;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod history;
pub mod import;
pub mod logging;
pub mod record;
pub mod sanitize;
pub mod search;
pub mod secrets;
pub mod source;
pub mod status;
pub mod store;

pub use alert::{AlertDispatcher, AlertError, AlertFanout};
pub use config::{load_config, load_or_default, Config};
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, PantryError, Result, SourceError};
pub use extract::{ExtractBudget, ExtractError, RawRecord, RecordExtractor};
pub use history::{ImportAttempt, ImportHistoryTracker, ImportStatus, RecordCounters};
pub use import::{BatchReport, BatchResult, ImportOrchestrator};
pub use record::{ProductRecord, ProductStatus};
pub use search::{ElasticsearchIndexer, NoopIndexer, SearchIndexer};
pub use source::{HttpFileSource, RemoteFileSource, StagedFile};
pub use status::StatusReport;
pub use store::{RecordStore, SqliteRecordStore};
