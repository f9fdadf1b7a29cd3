//! Output sinks for finished graphs
//!
//! A build hands its graph to every configured `GraphSink`. `SqliteSink` is
//! the persistent store; `JsonExport` writes a node-link document.

mod json;
mod sqlite;
mod traits;

pub use json::{render_tree, ExportDocument, ExportLink, ExportNode, JsonExport};
pub use sqlite::SqliteSink;
pub use traits::{GraphSink, StorageError, StorageResult};
