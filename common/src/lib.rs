//! POI Visit Common Library
//!
//! CLIと各フロントエンドで共有される型とロジック:
//! 訪問バンドル(ZIP)の取り込み、マーカー生成、オブジェクトURL管理、
//! GPX/KML、サービスワーカーのキャッシュ契約

pub mod types;
pub mod geo;
pub mod error;
pub mod bundle;
pub mod media;
pub mod markers;
pub mod session;
pub mod track;
pub mod offline;
pub mod xml;

pub use types::{MediaKind, MediaRef, Poi, Visit};
pub use geo::{format_coord, haversine_m, LatLon};
pub use error::{Error, Result};
pub use bundle::{rewrite_manifest, BundleWriter, ResolvedMedia, VisitBundle, MANIFEST_NAME};
pub use media::{Blob, MediaMap, MediaMode, ObjectUrlStore};
pub use markers::{build_markers, render_popup_html, Grouping, Marker, Popup, PopupEntry};
pub use session::{ImportOptions, ImportSession};
pub use track::{Track, TrackFormat, TrackPoint};
pub use offline::{CacheStorage, CachedResponse, Network, ServiceWorkerPlan, Strategy};
