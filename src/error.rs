use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoiVisitError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("位置情報付きの写真が見つかりません: {0}")]
    NoGeotaggedPhotos(String),

    #[error("未対応のファイル形式: {0}")]
    UnsupportedFormat(String),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("中継サーバーエラー: {0}")]
    Relay(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] poi_visit_common::Error),
}

pub type Result<T> = std::result::Result<T, PoiVisitError>;
