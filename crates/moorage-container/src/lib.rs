pub mod converter;
pub mod docker;
pub mod engine;
pub mod error;

pub use converter::*;
pub use docker::*;
pub use engine::*;
pub use error::*;
