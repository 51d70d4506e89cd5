//! Compose orchestration and marketplace installation for Moorage.
//!
//! [`ComposeService`] deploys multi-service manifests onto one engine and keeps
//! the persisted project record in step with the containers it created.
//! [`Marketplace`] is the single-container analog for catalog apps.

pub mod error;
pub mod lock;
pub mod marketplace;
pub mod options;
pub mod orchestrator;

pub use error::{Result, ServiceError};
pub use marketplace::{InstallRequest, Marketplace};
pub use options::RuntimeOptions;
pub use orchestrator::{ComposeService, ValidationReport, validate_manifest};
