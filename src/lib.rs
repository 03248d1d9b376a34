// taskquest - Timed task tracker persisted as a single JSON blob

pub mod blob;
pub mod config;
pub mod error;
pub mod filter;
pub mod form;
pub mod models;
pub mod record;
pub mod session;
pub mod storage;
pub mod store;
pub mod ticker;
pub mod timer;

// Re-export main types for convenience
pub use config::{Config, StorageKind};
pub use error::{BlobError, ConfigError};
pub use filter::Filter;
pub use form::{FormErrors, FormState};
pub use models::{NewTask, Priority, TASKS_KEY, Task, TaskDraft, TaskPatch};
pub use record::Record;
pub use session::{Action, DraftEdit, Outcome, Session, SessionView, TaskStats};
pub use storage::{BlobStorage, FileStorage, MemoryStorage};
pub use store::TaskStore;
pub use ticker::Ticker;
pub use timer::{Countdown, Urgency, format_time};
