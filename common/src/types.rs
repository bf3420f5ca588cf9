//! 訪問データの型定義
//!
//! visit.json の構造:
//! - Visit: `pois` 配列を持つマニフェスト
//! - Poi: 地点1件（タイトル・座標・コメント・メディア）
//! - MediaRef: `data/<id>/` 配下のメディアファイル参照

use crate::error::{Error, Result};
use crate::geo::LatLon;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// visit.json 全体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub pois: Vec<Poi>,
}

impl Visit {
    /// 全POIの座標を検証（最初の不正POIを報告）
    pub fn validate(&self) -> Result<()> {
        for poi in &self.pois {
            LatLon::new(poi.location.lat, poi.location.lon)
                .map_err(|e| Error::InvalidCoordinate(format!("POI {}: {}", poi.id, e)))?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }
}

/// 地点（Point of Interest）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawPoi")]
pub struct Poi {
    pub id: String,
    pub title: String,
    pub location: LatLon,
    pub comment: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
}

impl Poi {
    pub fn new(id: impl Into<String>, title: impl Into<String>, location: LatLon) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            location,
            comment: String::new(),
            image: None,
            audio: None,
            video: None,
        }
    }

    /// 宣言されたメディア参照（image → audio → video の順）
    pub fn media_refs(&self) -> Vec<MediaRef> {
        [
            (MediaKind::Image, &self.image),
            (MediaKind::Audio, &self.audio),
            (MediaKind::Video, &self.video),
        ]
        .into_iter()
        .filter_map(|(kind, name)| {
            let name = name.as_deref()?.trim();
            if name.is_empty() {
                return None;
            }
            Some(MediaRef {
                kind,
                file_name: name.to_string(),
            })
        })
        .collect()
    }
}

/// visit.json 上の表記揺れを吸収する中間表現
///
/// 座標は次のいずれでも受け付ける:
/// - `"location": "48.85,2.35"`
/// - `"location": {"lat": .., "lon"|"lng": ..}`
/// - `"location": [lat, lon]`
/// - トップレベルの `"lat"` / `"lon"`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPoi {
    id: Value,
    #[serde(default)]
    title: String,
    #[serde(default)]
    location: Option<Value>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default, alias = "lng")]
    lon: Option<f64>,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    audio: Option<String>,
    #[serde(default)]
    video: Option<String>,
}

impl TryFrom<RawPoi> for Poi {
    type Error = String;

    fn try_from(raw: RawPoi) -> std::result::Result<Self, Self::Error> {
        let id = match raw.id {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            other => return Err(format!("POI id must be a string or number, got {}", other)),
        };

        let location = match (raw.location, raw.lat, raw.lon) {
            (Some(value), _, _) => location_from_value(&value),
            (None, Some(lat), Some(lon)) => LatLon::new(lat, lon).map_err(|e| e.to_string()),
            _ => Err("missing location".to_string()),
        }
        .map_err(|e| format!("POI {}: {}", id, e))?;

        Ok(Poi {
            id,
            title: raw.title,
            location,
            comment: raw.comment.unwrap_or_default(),
            image: raw.image,
            audio: raw.audio,
            video: raw.video,
        })
    }
}

fn location_from_value(value: &Value) -> std::result::Result<LatLon, String> {
    let number = |v: Option<&Value>| -> Option<f64> {
        match v? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    };

    let latlon = match value {
        Value::String(s) => return LatLon::parse(s).map_err(|e| e.to_string()),
        Value::Object(map) => {
            let lat = number(map.get("lat").or_else(|| map.get("latitude")));
            let lon = number(
                map.get("lon")
                    .or_else(|| map.get("lng"))
                    .or_else(|| map.get("longitude")),
            );
            lat.zip(lon)
        }
        Value::Array(items) if items.len() >= 2 => number(items.first()).zip(number(items.get(1))),
        _ => None,
    };

    let (lat, lon) = latlon.ok_or_else(|| format!("unreadable location {}", value))?;
    LatLon::new(lat, lon).map_err(|e| e.to_string())
}

/// メディア種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
}

impl MediaKind {
    /// 拡張子から種別を推定
    pub fn from_extension(file_name: &str) -> Option<Self> {
        let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "heic" => Some(MediaKind::Image),
            "mp3" | "wav" | "ogg" | "m4a" | "aac" => Some(MediaKind::Audio),
            "mp4" | "webm" | "mov" | "m4v" => Some(MediaKind::Video),
            _ => None,
        }
    }

    /// HTML要素名
    pub fn tag(&self) -> &'static str {
        match self {
            MediaKind::Image => "img",
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

/// ファイル名からMIMEタイプを推定
pub fn mime_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" | "aac" => "audio/mp4",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript; charset=utf-8",
        "json" => "application/json",
        "webmanifest" => "application/manifest+json",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "gpx" => "application/gpx+xml",
        "kml" => "application/vnd.google-earth.kml+xml",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// POIが参照するメディア1件
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub kind: MediaKind,
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poi_location_string() {
        let json = r#"{"id": "a", "title": "Tour", "location": "48.8584, 2.2945"}"#;
        let poi: Poi = serde_json::from_str(json).unwrap();
        assert_eq!(poi.location.lat, 48.8584);
        assert_eq!(poi.location.lon, 2.2945);
        assert_eq!(poi.comment, "");
    }

    #[test]
    fn test_poi_location_object_variants() {
        let a: Poi = serde_json::from_str(r#"{"id": "a", "location": {"lat": 1, "lon": 2}}"#).unwrap();
        let b: Poi = serde_json::from_str(r#"{"id": "b", "location": {"lat": "1", "lng": "2"}}"#).unwrap();
        let c: Poi = serde_json::from_str(r#"{"id": "c", "location": [1.0, 2.0]}"#).unwrap();
        let d: Poi = serde_json::from_str(r#"{"id": "d", "lat": 1.0, "lon": 2.0}"#).unwrap();
        for poi in [a, b, c, d] {
            assert_eq!(poi.location, LatLon { lat: 1.0, lon: 2.0 });
        }
    }

    #[test]
    fn test_poi_numeric_id() {
        let poi: Poi = serde_json::from_str(r#"{"id": 7, "location": "0,0"}"#).unwrap();
        assert_eq!(poi.id, "7");
    }

    #[test]
    fn test_poi_invalid_location_rejected() {
        let result = serde_json::from_str::<Poi>(r#"{"id": "x", "location": "95,0"}"#);
        assert!(result.is_err());

        let result = serde_json::from_str::<Poi>(r#"{"id": "x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_poi_serialize_as_object() {
        let mut poi = Poi::new("p1", "Title", LatLon { lat: 1.0, lon: 2.0 });
        poi.image = Some("photo.jpg".to_string());
        let json = serde_json::to_string(&poi).unwrap();
        assert!(json.contains("\"location\":{\"lat\":1.0,\"lon\":2.0}"));
        assert!(json.contains("\"image\":\"photo.jpg\""));
        assert!(!json.contains("audio"));

        let back: Poi = serde_json::from_str(&json).unwrap();
        assert_eq!(back.image.as_deref(), Some("photo.jpg"));
    }

    #[test]
    fn test_media_refs_order_and_blank() {
        let mut poi = Poi::new("p1", "t", LatLon { lat: 0.0, lon: 0.0 });
        poi.video = Some("v.mp4".to_string());
        poi.image = Some("i.jpg".to_string());
        poi.audio = Some("  ".to_string());
        let refs = poi.media_refs();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].kind, MediaKind::Image);
        assert_eq!(refs[1].kind, MediaKind::Video);
    }

    #[test]
    fn test_media_kind_from_extension() {
        assert_eq!(MediaKind::from_extension("a.JPG"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_extension("a.mp3"), Some(MediaKind::Audio));
        assert_eq!(MediaKind::from_extension("a.mp4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_extension("a.txt"), None);
        assert_eq!(MediaKind::from_extension("noext"), None);
    }

    #[test]
    fn test_mime_type() {
        assert_eq!(mime_type("x.jpeg"), "image/jpeg");
        assert_eq!(mime_type("x.mp4"), "video/mp4");
        assert_eq!(mime_type("x.bin"), "application/octet-stream");
        assert_eq!(mime_type("sw.js"), "application/javascript; charset=utf-8");
        assert_eq!(mime_type("manifest.webmanifest"), "application/manifest+json");
    }

    #[test]
    fn test_visit_defaults() {
        let visit: Visit = serde_json::from_str(r#"{}"#).unwrap();
        assert!(visit.is_empty());
        assert!(visit.validate().is_ok());
    }
}
