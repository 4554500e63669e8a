//! # ChartQ Core
//!
//! UI-independent logic behind the ChartQ admin console.
//!
//! Study articles are kept in a user-chosen order with fractional sort keys,
//! so a drag-and-drop move rewrites a single record. Destructive actions ask
//! for confirmation through one shared dialog that callers simply await.

pub mod config;
pub mod console;
pub mod dialog;
pub mod domain;
pub mod error;
pub mod notify;
pub mod storage;
pub mod telemetry;

// Re-export commonly used types
pub use config::{ConsoleConfig, DialogConfig, OrderingConfig};
pub use console::{ReorderOutcome, StudyConsole};
pub use dialog::{DialogHandle, DialogProvider, DialogState, DialogView, DismissReason};
pub use domain::{
    ordering::{OrderedCollection, OrderedItem, ReorderRequest},
    study::{Study, StudyId, Tag},
};
pub use error::{ConsoleError, Result};
pub use notify::{Notification, Notifier};
pub use storage::{OrderKeyStore, Storage};
