//! Adapter layer
//!
//! Source adapters expand nodes along named operations, support adapters
//! look for evidence between node pairs, and a synonymizer widens each
//! node's identifier set. The registry resolves plan operations to
//! adapters at run time.

mod cache;
pub mod fixture;
mod policy;
mod registry;
mod table;
mod traits;

pub use cache::CachedAdapter;
pub use fixture::AdapterFixture;
pub use policy::CallPolicy;
pub use registry::AdapterRegistry;
pub use table::{TableAdapter, TableRow, TableSupport, TableSynonymizer};
pub use traits::{AdapterError, Expansion, NoopSynonymizer, SourceAdapter, SupportAdapter, Synonymizer};
