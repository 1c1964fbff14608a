//! `ledgermatch-recon`: two-ledger transaction reconciliation engine.
//!
//! Joins two tabular datasets by an identifier column (auto mode) or a
//! normalized composite key (custom mode), compares amount and date on each
//! joined pair, and classifies every row as MATCHED, MISMATCH, MISSING_IN_A
//! or MISSING_IN_B. The engine is pure; sessions live in an explicit
//! [`SessionStore`] owned by the caller.

pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod export;
pub mod key;
mod lenient;
pub mod load;
pub mod mapping;
pub mod model;
pub mod normalize;
pub mod profile;
pub mod rules;
pub mod session;

pub use config::ReconRequest;
pub use engine::{reconcile, run};
pub use error::ReconError;
pub use mapping::{FieldMapping, FieldPair, LogicalField, Side};
pub use model::{Dataset, ReconOutput, ReconRecord, ReconSummary, Row, Status};
pub use rules::{FieldType, MatchMode, ModeName, Rules};
pub use session::{SessionId, SessionStore};
