//! 座標（緯度・経度）
//!
//! - 範囲チェック付きの LatLon
//! - "lat,lon" 文字列のパース
//! - GPX/KML と同じ小数6桁での書式化

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// 地球半径（メートル）
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// 出力精度（小数桁数）
pub const COORD_DECIMALS: usize = 6;

/// 検証済みの緯度経度
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    /// 範囲チェックして生成
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(Error::InvalidCoordinate(format!("latitude {}", lat)));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(Error::InvalidCoordinate(format!("longitude {}", lon)));
        }
        Ok(Self { lat, lon })
    }

    /// "lat,lon" 形式（区切りは `,` または `;`）をパース
    ///
    /// # Examples
    /// ```
    /// use poi_visit_common::LatLon;
    ///
    /// let p = LatLon::parse(" 48.8566, 2.3522 ").unwrap();
    /// assert_eq!(p.lat, 48.8566);
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let mut parts = text.split([',', ';']).map(str::trim);
        let (lat, lon) = match (parts.next(), parts.next(), parts.next()) {
            (Some(lat), Some(lon), None) => (lat, lon),
            _ => return Err(Error::InvalidCoordinate(text.to_string())),
        };

        let lat: f64 = lat
            .parse()
            .map_err(|_| Error::InvalidCoordinate(text.to_string()))?;
        let lon: f64 = lon
            .parse()
            .map_err(|_| Error::InvalidCoordinate(text.to_string()))?;

        Self::new(lat, lon)
    }

    /// 同一地点判定用のキー（小数6桁）
    pub fn key(&self) -> String {
        format!("{},{}", format_coord(self.lat), format_coord(self.lon))
    }

    /// この地点から `other` までの大円距離（メートル）
    pub fn distance_to(&self, other: &LatLon) -> f64 {
        haversine_m(self, other)
    }
}

impl std::fmt::Display for LatLon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", format_coord(self.lat), format_coord(self.lon))
    }
}

/// 座標値を小数6桁で書式化
pub fn format_coord(value: f64) -> String {
    format!("{:.*}", COORD_DECIMALS, value)
}

/// ハバーサイン距離（メートル）
pub fn haversine_m(a: &LatLon, b: &LatLon) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}
