//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Parse error: {0}")]
    Parse(String),

    /// バンドル内に visit.json が無い
    #[error("Manifest not found in bundle: {0}")]
    MissingManifest(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Marker index out of range: {0}")]
    MarkerNotFound(usize),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
