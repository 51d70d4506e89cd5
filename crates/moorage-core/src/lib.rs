//! Moorage のコア機能
//!
//! マニフェスト（docker-compose 互換 YAML）のモデル・パーサー・
//! フィールド変換・依存関係解決と、テンプレート／カタログの読み込みを提供します。
//! コンテナエンジンや永続化には依存しません。

pub mod catalog;
pub mod error;
pub mod model;
pub mod parser;
pub mod resolver;
pub mod template;
pub mod translate;

pub use catalog::*;
pub use error::*;
pub use model::*;
pub use parser::*;
pub use resolver::*;
pub use template::*;
