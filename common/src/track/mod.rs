//! トラック（GPX/KML）
//!
//! 出力はトラックポイントのみの最小構成。拡張要素は扱わない。

pub mod gpx;
pub mod kml;

use crate::geo::LatLon;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ele: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
}

impl TrackPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            ele: None,
            time: None,
        }
    }

    pub fn position(&self) -> LatLon {
        LatLon {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub points: Vec<TrackPoint>,
}

impl Track {
    pub fn new(name: Option<String>, points: Vec<TrackPoint>) -> Self {
        Self { name, points }
    }

    /// 総距離（メートル）
    pub fn length_m(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| pair[0].position().distance_to(&pair[1].position()))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// ファイル形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackFormat {
    Gpx,
    Kml,
}

impl TrackFormat {
    /// 拡張子から判定
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "gpx" => Some(TrackFormat::Gpx),
            "kml" => Some(TrackFormat::Kml),
            _ => None,
        }
    }

    pub fn parse(&self, content: &str) -> crate::Result<Track> {
        match self {
            TrackFormat::Gpx => gpx::parse(content),
            TrackFormat::Kml => kml::parse(content),
        }
    }

    pub fn write(&self, track: &Track) -> String {
        match self {
            TrackFormat::Gpx => gpx::write(track),
            TrackFormat::Kml => kml::write(track),
        }
    }
}
