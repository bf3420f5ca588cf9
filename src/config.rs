use crate::error::{PoiVisitError, Result};
use poi_visit_common::{Grouping, MediaMode, Strategy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 中継サーバーの待ち受けアドレスを上書きする環境変数
pub const BIND_ENV: &str = "POI_VISIT_BIND";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 中継サーバーの待ち受けアドレス
    pub relay_bind: String,
    /// sw.js 生成時のキャッシュ名
    pub default_cache_name: String,
    pub default_strategy: Strategy,
    pub media_mode: MediaMode,
    pub group_markers: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay_bind: "0.0.0.0:8080".into(),
            default_cache_name: "poi-visit-v1".into(),
            default_strategy: Strategy::CacheFirst,
            media_mode: MediaMode::Lazy,
            group_markers: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// 指定パスから読み込む（無ければデフォルト）
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PoiVisitError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("poi-visit").join("config.json"))
    }

    /// 待ち受けアドレス（環境変数を優先）
    pub fn relay_bind(&self) -> String {
        match std::env::var(BIND_ENV) {
            Ok(bind) if !bind.trim().is_empty() => bind,
            _ => self.relay_bind.clone(),
        }
    }

    pub fn grouping(&self) -> Grouping {
        if self.group_markers {
            Grouping::SharedLocation
        } else {
            Grouping::None
        }
    }

    pub fn set_relay_bind(&mut self, bind: String) -> Result<()> {
        if bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(PoiVisitError::Config(format!("不正なアドレス: {}", bind)));
        }
        self.relay_bind = bind;
        self.save()
    }
}
