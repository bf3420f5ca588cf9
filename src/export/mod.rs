//! 訪問データ・トラックの書き出し
//!
//! - 訪問 → GPXウェイポイント / KMLプレースマーク / GeoJSON
//! - トラック GPX ⇔ KML（拡張子で判定）

use crate::error::{PoiVisitError, Result};
use poi_visit_common::track::{gpx, kml};
use poi_visit_common::{Track, TrackFormat, Visit};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Gpx,
    Kml,
    GeoJson,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Gpx => "gpx",
            ExportFormat::Kml => "kml",
            ExportFormat::GeoJson => "geojson",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gpx" => Ok(ExportFormat::Gpx),
            "kml" => Ok(ExportFormat::Kml),
            "geojson" | "json" => Ok(ExportFormat::GeoJson),
            _ => Err(format!("Unknown format: {}. Use gpx, kml, or geojson", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// ファイル名に使えない文字（パス区切りなど）を `_` に置き換える
pub fn sanitize_file_name(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "visit".to_string()
    } else {
        cleaned
    }
}

/// 出力先がディレクトリなら `<title>.<ext>` を付ける
pub fn output_path_for_format(output: &Path, title: &str, format: ExportFormat) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", sanitize_file_name(title), format.extension()))
    } else {
        output.to_path_buf()
    }
}

/// 訪問をGeoJSON（Point の FeatureCollection）に変換
///
/// GeoJSON の座標順は `[lon, lat]`。
pub fn visit_to_geojson(visit: &Visit) -> Value {
    let features: Vec<Value> = visit
        .pois
        .iter()
        .map(|poi| {
            let mut properties = json!({
                "id": poi.id,
                "title": poi.title,
                "comment": poi.comment,
            });
            for media in poi.media_refs() {
                properties[media.kind.tag()] = json!(media.file_name);
            }
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [poi.location.lon, poi.location.lat],
                },
                "properties": properties,
            })
        })
        .collect();

    let mut collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    if let Some(name) = &visit.name {
        collection["name"] = json!(name);
    }
    collection
}

/// 訪問を指定形式の文字列にする
pub fn render_visit(visit: &Visit, format: ExportFormat) -> Result<String> {
    let content = match format {
        ExportFormat::Gpx => gpx::waypoints(visit),
        ExportFormat::Kml => kml::waypoints(visit),
        ExportFormat::GeoJson => serde_json::to_string_pretty(&visit_to_geojson(visit))?,
    };
    Ok(content)
}

/// 訪問をファイルに書き出す
pub fn export_visit(visit: &Visit, format: ExportFormat, output: &Path) -> Result<()> {
    let content = render_visit(visit, format)?;
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output, content)?;
    log::debug!("{} POI を {} 形式で出力: {}", visit.len(), format, output.display());
    Ok(())
}

fn track_format(path: &Path) -> Result<TrackFormat> {
    TrackFormat::from_path(path)
        .ok_or_else(|| PoiVisitError::UnsupportedFormat(path.display().to_string()))
}

/// トラックを読み込む（形式は拡張子で判定）
pub fn read_track(path: &Path) -> Result<Track> {
    let format = track_format(path)?;
    if !path.exists() {
        return Err(PoiVisitError::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(format.parse(&content)?)
}

/// GPX ⇔ KML 変換（同じ形式同士なら正規化して書き直す）
pub fn convert_track(input: &Path, output: &Path) -> Result<Track> {
    let output_format = track_format(output)?;
    let track = read_track(input)?;
    std::fs::write(output, output_format.write(&track))?;
    Ok(track)
}
