//! Rule dispatch, reporting and suppression.

mod context;
mod dispatcher;
pub mod obsolete;
pub mod suppress;
mod types;

pub use context::RuleContext;
pub use dispatcher::Dispatcher;
pub use suppress::{Pragma, PragmaAction};
pub use types::{AnalysisResult, Diagnostic, RuleFault, SuppressedDiagnostic};

use thiserror::Error;

use crate::catalog::CatalogError;

/// Errors raised while wiring rules to the catalog. All are fatal.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("rule {rule} declares descriptor {id} which is not in the catalog")]
    UnknownDescriptor { rule: String, id: String },
    #[error("rule {0} is registered twice")]
    DuplicateRule(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
