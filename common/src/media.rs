//! オブジェクトURLとメディアマップ
//!
//! ブラウザの `URL.createObjectURL` / `revokeObjectURL` に相当する。
//! URLはセッション中だけ有効で、クローズ時にすべて失効させる。

use crate::bundle::{ResolvedMedia, VisitBundle};
use crate::error::Result;
use crate::types::mime_type;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// オブジェクトURLの接頭辞
pub const OBJECT_URL_PREFIX: &str = "blob:poi-visit/";

/// メモリ上のバイナリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl Blob {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    /// base64 の data: URL に変換
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// オブジェクトURLの発行・解決・失効
#[derive(Debug, Default)]
pub struct ObjectUrlStore {
    blobs: HashMap<String, Blob>,
}

impl ObjectUrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blobを登録してURLを発行
    pub fn create(&mut self, blob: Blob) -> String {
        let url = format!("{}{}", OBJECT_URL_PREFIX, uuid::Uuid::new_v4());
        self.blobs.insert(url.clone(), blob);
        url
    }

    pub fn resolve(&self, url: &str) -> Option<&Blob> {
        self.blobs.get(url)
    }

    /// URLを失効させる（未登録・失効済みなら false）
    pub fn revoke(&mut self, url: &str) -> bool {
        self.blobs.remove(url).is_some()
    }

    /// 全URLを失効させ、失効した件数を返す
    pub fn revoke_all(&mut self) -> usize {
        let count = self.blobs.len();
        self.blobs.clear();
        count
    }

    /// 有効なURLの件数
    pub fn live_count(&self) -> usize {
        self.blobs.len()
    }
}

/// メディアの展開方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaMode {
    /// ポップアップを開いた時に展開（デフォルト）
    #[default]
    Lazy,
    /// 読み込み時に全件展開
    Eager,
    /// data: URL として埋め込む（オブジェクトURLを使わない）
    Inline,
}

impl std::str::FromStr for MediaMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lazy" => Ok(MediaMode::Lazy),
            "eager" => Ok(MediaMode::Eager),
            "inline" => Ok(MediaMode::Inline),
            _ => Err(format!("Unknown media mode: {}. Use lazy, eager, or inline", s)),
        }
    }
}

impl std::fmt::Display for MediaMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaMode::Lazy => write!(f, "lazy"),
            MediaMode::Eager => write!(f, "eager"),
            MediaMode::Inline => write!(f, "inline"),
        }
    }
}

/// アーカイブ内パス → URL
#[derive(Debug, Default)]
pub struct MediaMap {
    mode: MediaMode,
    urls: HashMap<String, String>,
}

impl MediaMap {
    pub fn new(mode: MediaMode) -> Self {
        Self {
            mode,
            urls: HashMap::new(),
        }
    }

    pub fn mode(&self) -> MediaMode {
        self.mode
    }

    /// 展開済みのURL
    pub fn get(&self, path: &str) -> Option<&str> {
        self.urls.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// メディアを展開してURLを返す（展開済みなら再利用）
    ///
    /// エントリが読めなければ `None`。
    pub fn materialize(
        &mut self,
        bundle: &mut VisitBundle,
        store: &mut ObjectUrlStore,
        media: &ResolvedMedia,
    ) -> Result<Option<String>> {
        if let Some(url) = self.urls.get(&media.path) {
            return Ok(Some(url.clone()));
        }

        let bytes = match bundle.read_entry(&media.path)? {
            Some(b) => b,
            None => return Ok(None),
        };
        let blob = Blob::new(bytes, mime_type(&media.media.file_name));

        let url = match self.mode {
            MediaMode::Inline => blob.to_data_url(),
            MediaMode::Lazy | MediaMode::Eager => store.create(blob),
        };
        self.urls.insert(media.path.clone(), url.clone());
        Ok(Some(url))
    }

    /// バンドル内の全メディアを展開（Eager用）
    pub fn materialize_all(
        &mut self,
        bundle: &mut VisitBundle,
        store: &mut ObjectUrlStore,
    ) -> Result<usize> {
        let resolved: Vec<ResolvedMedia> = bundle
            .pois()
            .iter()
            .flat_map(|poi| bundle.resolve_media(poi))
            .collect();

        for media in &resolved {
            self.materialize(bundle, store, media)?;
        }
        Ok(self.urls.len())
    }

    /// 全URLを失効させてマップを空にする
    pub fn revoke_all(&mut self, store: &mut ObjectUrlStore) -> usize {
        let mut revoked = 0;
        for (_, url) in self.urls.drain() {
            if store.revoke(&url) {
                revoked += 1;
            }
        }
        revoked
    }
}
