//! モデル定義
//!
//! Moorageで使用されるデータモデルを定義します。

mod app;
mod manifest;
mod project;

// Re-exports
pub use app::*;
pub use manifest::*;
pub use project::*;
