//! Frontdesk Policy - the central authorization decision point
//!
//! Every data access runs through [`AuthorizationEngine::authorize`]
//! before touching directory-governed storage. The engine is a pure
//! function of the resolved tenant context and a static policy table:
//! no I/O, no hidden state, safe for unsynchronized concurrent use.
//!
//! The tenant-match check comes first and is absolute. Role minimums come
//! from the [`PolicyTable`]; the distinguished service principal skips the
//! role check but never the tenant match. Anything the table does not
//! cover is denied.

#![warn(missing_docs)]

pub mod audit;
pub mod engine;
pub mod table;

pub use audit::{AuditRecord, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use engine::{AuthorizationEngine, EngineStats};
pub use table::PolicyTable;
