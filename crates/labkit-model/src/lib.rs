//! labkit Model - Guided lab content
//!
//! The static side of a guided lab:
//! - [`Procedure`]s: ordered, validated lists of [`Step`]s with [`Criteria`]
//! - [`Assessment`]s: multiple choice question banks tied to a procedure
//! - [`Catalog`]: tool and resource metadata the UI offers
//! - [`LabDocument`]: all of the above loaded from JSON, YAML or TOML
//!
//! Everything here is immutable once built. Configuration errors are
//! reported as [`ModelError`] at load time, never during a run.
//!
//! # Example
//!
//! ```rust,ignore
//! use labkit_model::{Procedure, Step};
//!
//! let procedure = Procedure::builder("iron-hcl", "Iron and Hydrochloric Acid")
//!     .step(Step::select_tool("Select a test tube", "test_tube"))
//!     .step(Step::add_resource("Add iron filings", "fe"))
//!     .step(Step::add_resource("Add hydrochloric acid", "hcl"))
//!     .step(Step::observe("Observe the reaction"))
//!     .build()?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod assessment;
pub mod catalog;
pub mod document;
pub mod error;
pub mod ids;
mod library;
pub mod procedure;

pub use assessment::{Assessment, AssessmentDef, Question};
pub use catalog::{
    Catalog, CatalogDef, CatalogEntry, ItemCategory, OfferedItems, ResourceEntry, ToolEntry,
};
pub use document::{DocumentDef, DocumentFormat, LabDocument};
pub use error::ModelError;
pub use ids::{ProcedureId, ResourceId, ToolId};
pub use procedure::{Criteria, Difficulty, Procedure, ProcedureBuilder, ProcedureDef, Step};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
