#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Pipeline error types (`AuditError`, `EvaluatorError`)
//! - [`discovery`]: Project root discovery (`discover_projects`, `ProjectWalker`)
//! - [`resolver`]: Dependency resolution (`Resolver`, `DependencySource`, three sources)
//! - [`fetch`]: Transport abstraction (`Fetcher`, `HttpFetcher`)
//! - [`anchors`]: Trust anchor clients (`OsvClient`, `RegistryClient`)
//! - [`evaluate`]: Risk evaluators
//! - [`pipeline`]: Main orchestrator (`Auditor`, `AuditorBuilder`)

pub mod anchors;
pub mod discovery;
pub mod error;
pub mod evaluate;
pub mod fetch;
pub mod pipeline;
pub mod resolver;

// --- Public API Re-exports ---

// Orchestrator
pub use pipeline::{Auditor, AuditorBuilder};

// Error
pub use error::{AuditError, EvaluatorError};

// Discovery
pub use discovery::{ProjectWalker, discover_projects};

// Resolver
pub use resolver::{DependencySource, Resolution, Resolver};

// Transport
pub use fetch::{Fetcher, HttpFetcher};

// Evaluators
pub use evaluate::{
    ForensicsEvaluator, IntegrityEvaluator, ScriptEvaluator, VulnerabilityEvaluator,
};
#[cfg(feature = "typosquat")]
pub use evaluate::{SeedList, TyposquatEvaluator};
