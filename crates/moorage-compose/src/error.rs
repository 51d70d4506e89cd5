//! Service error taxonomy

use moorage_container::ContainerError;
use moorage_core::{CatalogError, ManifestError, TemplateError};
use moorage_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the orchestrator and the installer.
///
/// [`ServiceError::is_client_error`] separates caller faults from
/// engine/persistence faults.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid manifest: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Engine error: {context}: {source}")]
    Engine {
        context: String,
        #[source]
        source: ContainerError,
    },

    #[error("Persistence error: {0}")]
    Persistence(StoreError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Template error: {0}")]
    Template(TemplateError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl ServiceError {
    pub fn engine(context: impl Into<String>, source: ContainerError) -> Self {
        Self::Engine {
            context: context.into(),
            source,
        }
    }

    /// Caller fault (4xx-equivalent) as opposed to a server fault (5xx-equivalent).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Manifest(_) | Self::NotFound(_) | Self::Validation(_)
        )
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, id } => Self::NotFound(format!("{} {}", kind, id)),
            StoreError::Duplicate { kind, name } => {
                Self::Validation(format!("{} '{}' already exists", kind, name))
            }
            other => Self::Persistence(other),
        }
    }
}

impl From<TemplateError> for ServiceError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::NotFound(name) => Self::NotFound(format!("template '{}'", name)),
            TemplateError::InvalidName(name) => {
                Self::Validation(format!("invalid template name '{}'", name))
            }
            other => Self::Template(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
