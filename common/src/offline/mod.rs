//! サービスワーカーのキャッシュ契約
//!
//! - install: 宣言されたアセットをすべて取得してキャッシュに格納（1件でも失敗したら中断）
//! - activate: 現在の CACHE_NAME 以外のキャッシュを削除
//! - fetch: cache-first / network-first / stale-while-revalidate
//!
//! 同じ契約から `sw.js` を生成する（script.rs）。

mod script;

pub use script::render_sw_js;

use crate::error::{Error, Result};
use crate::types::mime_type;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// キャッシュに保存されるレスポンス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub content_type: String,
}

impl CachedResponse {
    pub fn ok(body: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            content_type: content_type.into(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: 404,
            body: b"Not Found".to_vec(),
            content_type: "text/plain".to_string(),
        }
    }

    /// オフライン時の汎用レスポンス
    pub fn offline() -> Self {
        Self {
            status: 503,
            body: b"Offline".to_vec(),
            content_type: "text/plain".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// ネットワーク取得の抽象
pub trait Network {
    /// 接続できなければ `Err`。HTTPエラーはレスポンスとして返す
    fn fetch(&self, url: &str) -> Result<CachedResponse>;
}

/// 名前付きキャッシュの集合（CacheStorage 相当）
#[derive(Debug, Default, Clone)]
pub struct CacheStorage {
    caches: BTreeMap<String, BTreeMap<String, CachedResponse>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.caches.keys().cloned().collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.caches.contains_key(name)
    }

    pub fn delete(&mut self, name: &str) -> bool {
        self.caches.remove(name).is_some()
    }

    pub fn put(&mut self, name: &str, url: &str, response: CachedResponse) {
        self.caches
            .entry(name.to_string())
            .or_default()
            .insert(url.to_string(), response);
    }

    pub fn match_url(&self, name: &str, url: &str) -> Option<&CachedResponse> {
        self.caches.get(name)?.get(url)
    }

    /// キャッシュ内のURL一覧
    pub fn urls(&self, name: &str) -> Vec<String> {
        self.caches
            .get(name)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// キャッシュ戦略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cache-first" | "cache" => Ok(Strategy::CacheFirst),
            "network-first" | "network" => Ok(Strategy::NetworkFirst),
            "stale-while-revalidate" | "swr" => Ok(Strategy::StaleWhileRevalidate),
            _ => Err(format!(
                "Unknown strategy: {}. Use cache-first, network-first, or stale-while-revalidate",
                s
            )),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::CacheFirst => write!(f, "cache-first"),
            Strategy::NetworkFirst => write!(f, "network-first"),
            Strategy::StaleWhileRevalidate => write!(f, "stale-while-revalidate"),
        }
    }
}

/// レスポンスの出どころ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Cache,
    Network,
    Offline,
}

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub response: CachedResponse,
    pub source: FetchSource,
}

/// 1アプリ分のサービスワーカー設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceWorkerPlan {
    pub cache_name: String,
    pub assets: Vec<String>,
    #[serde(default)]
    pub strategy: Strategy,
    /// オフライン時に返すキャッシュ済みアセット
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline_fallback: Option<String>,
}

impl ServiceWorkerPlan {
    pub fn new(cache_name: impl Into<String>, assets: Vec<String>, strategy: Strategy) -> Self {
        Self {
            cache_name: cache_name.into(),
            assets,
            strategy,
            offline_fallback: None,
        }
    }

    /// 全アセットを取得してキャッシュを作り直す
    ///
    /// 1件でも取得に失敗したらキャッシュには何も書き込まない。
    pub fn install(&self, storage: &mut CacheStorage, network: &dyn Network) -> Result<usize> {
        let mut fetched = Vec::with_capacity(self.assets.len());
        for asset in &self.assets {
            let response = network.fetch(asset)?;
            if !response.is_success() {
                return Err(Error::Network(format!(
                    "install: {} returned {}",
                    asset, response.status
                )));
            }
            fetched.push((asset, response));
        }

        storage.delete(&self.cache_name);
        for (asset, response) in fetched {
            storage.put(&self.cache_name, asset, response);
        }

        let count = storage.urls(&self.cache_name).len();
        log::debug!("install: {} assets cached in {}", count, self.cache_name);
        Ok(count)
    }

    /// 現在のキャッシュ以外を削除し、削除した名前を返す
    pub fn activate(&self, storage: &mut CacheStorage) -> Vec<String> {
        let stale: Vec<String> = storage
            .keys()
            .into_iter()
            .filter(|name| *name != self.cache_name)
            .collect();
        for name in &stale {
            storage.delete(name);
            log::debug!("activate: deleted cache {}", name);
        }
        stale
    }

    /// 戦略に従ってリクエストを処理
    pub fn handle_fetch(
        &self,
        storage: &mut CacheStorage,
        network: &dyn Network,
        url: &str,
    ) -> FetchResult {
        let cached = storage.match_url(&self.cache_name, url).cloned();

        match self.strategy {
            Strategy::CacheFirst => {
                if let Some(response) = cached {
                    return from(response, FetchSource::Cache);
                }
                match network.fetch(url) {
                    Ok(response) => from(response, FetchSource::Network),
                    Err(e) => {
                        log::debug!("cache-first: {} unreachable: {}", url, e);
                        self.offline_response(storage)
                    }
                }
            }
            Strategy::NetworkFirst => match network.fetch(url) {
                Ok(response) => {
                    if response.is_success() {
                        storage.put(&self.cache_name, url, response.clone());
                    }
                    from(response, FetchSource::Network)
                }
                Err(e) => {
                    log::debug!("network-first: {} unreachable: {}", url, e);
                    match cached {
                        Some(response) => from(response, FetchSource::Cache),
                        None => self.offline_response(storage),
                    }
                }
            },
            Strategy::StaleWhileRevalidate => {
                let fresh = match network.fetch(url) {
                    Ok(response) => {
                        if response.is_success() {
                            storage.put(&self.cache_name, url, response.clone());
                        }
                        Some(response)
                    }
                    Err(e) => {
                        log::debug!("stale-while-revalidate: {} unreachable: {}", url, e);
                        None
                    }
                };
                match (cached, fresh) {
                    (Some(response), _) => from(response, FetchSource::Cache),
                    (None, Some(response)) => from(response, FetchSource::Network),
                    (None, None) => self.offline_response(storage),
                }
            }
        }
    }

    fn offline_response(&self, storage: &CacheStorage) -> FetchResult {
        let fallback = self
            .offline_fallback
            .as_deref()
            .and_then(|url| storage.match_url(&self.cache_name, url))
            .cloned();
        from(fallback.unwrap_or_else(CachedResponse::offline), FetchSource::Offline)
    }
}

fn from(response: CachedResponse, source: FetchSource) -> FetchResult {
    FetchResult { response, source }
}

/// 静的サイトのディレクトリをネットワークとして扱う
///
/// install が通るか（全アセットが揃っているか）の確認に使う。
#[derive(Debug, Clone)]
pub struct DirectoryNetwork {
    root: PathBuf,
}

impl DirectoryNetwork {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Network for DirectoryNetwork {
    fn fetch(&self, url: &str) -> Result<CachedResponse> {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_start_matches("./").trim_start_matches('/');
        let path = if path.is_empty() || path.ends_with('/') {
            format!("{}index.html", path)
        } else {
            path.to_string()
        };

        if path.split('/').any(|part| part == "..") {
            return Ok(CachedResponse::not_found());
        }

        match std::fs::read(self.root.join(&path)) {
            Ok(body) => Ok(CachedResponse::ok(body, mime_type(&path))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CachedResponse::not_found()),
            Err(e) => Err(e.into()),
        }
    }
}
