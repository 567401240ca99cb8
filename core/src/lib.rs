//! Request forwarding and JSON-file persistence behind the restdesk server.

pub mod forwarder;
pub mod history;
pub mod models;
pub mod saved;
pub mod store;

pub use forwarder::{Forwarder, FORWARD_TIMEOUT};
pub use history::{timestamp_now, HistoryRecorder};
pub use models::{
    ForwardOutcome, ForwardRequest, ForwardResult, HistoryEntry, RequestDefinition,
    MAX_HISTORY_SIZE,
};
pub use saved::{SavedRequestMap, SavedRequests};
pub use store::{DocumentKey, JsonStore};
