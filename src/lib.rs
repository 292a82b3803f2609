//! restprobe - static failure-response analysis for Spring-style REST handlers
//!
//! Loads compiled JVM class files, finds request handler methods and derives,
//! for every endpoint, the success response and each failure response it can
//! produce: which exception, which HTTP status, which layer it came from and
//! how sure the analysis is.
//!
//! ```no_run
//! use restprobe::{analyze, AnalysisConfig};
//!
//! let bytes = std::fs::read("UserController.class")?;
//! let report = analyze(&[bytes], AnalysisConfig::default());
//! for endpoint in &report.endpoints {
//!     println!("{} {}", endpoint.http_method, endpoint.path);
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod advice;
pub mod artifacts;
pub mod classfile;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod http_status;
pub mod index;
pub mod knowledge;
pub mod logging;
pub mod model;
pub mod resolver;
pub mod scanner;
pub mod walker;

#[cfg(test)]
pub(crate) mod fixtures;

pub use advice::{AdviceMapping, AdviceRegistry};
pub use artifacts::Artifacts;
pub use classfile::{decode_class, ClassDecoder, JvmClassDecoder, MalformedClassError};
pub use config::{AnalysisConfig, ConfigError};
pub use context::AnalysisContext;
pub use error::{AnalysisError, AnalysisResult};
pub use index::{ClassIndex, SkippedArtifact, UnresolvedCalleeError};
pub use knowledge::{KnowledgeEntry, StatusKnowledgeBase};
pub use model::{EndpointResponseModel, FailureRecord, OriginLayer};
pub use resolver::{analyze, AnalysisReport, ResponseResolver};
pub use scanner::ExceptionProvenanceScanner;
pub use walker::CallGraphWalker;
