//! KML 2.2 の読み書き
//!
//! 座標は `lon,lat[,ele]` をスペース区切りで並べる。

use super::{Track, TrackPoint};
use crate::error::{Error, Result};
use crate::geo::{format_coord, LatLon};
use crate::types::Visit;
use crate::xml::{escape_xml, unescape_xml};
use regex::Regex;

const KML_HEADER: &str = r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#;

lazy_static::lazy_static! {
    static ref COORDS_RE: Regex = Regex::new(r"(?s)<coordinates>(.*?)</coordinates>").unwrap();
    static ref NAME_RE: Regex = Regex::new(r"(?s)<name>(.*?)</name>").unwrap();
}

fn coordinate(lat: f64, lon: f64, ele: Option<f64>) -> String {
    match ele {
        Some(ele) => format!("{},{},{:.1}", format_coord(lon), format_coord(lat), ele),
        None => format!("{},{}", format_coord(lon), format_coord(lat)),
    }
}

/// トラックをKML（LineString）に変換
pub fn write(track: &Track) -> String {
    let name = escape_xml(track.name.as_deref().unwrap_or("Track"));
    let coords: Vec<String> = track
        .points
        .iter()
        .map(|p| coordinate(p.lat, p.lon, p.ele))
        .collect();

    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(KML_HEADER);
    xml.push('\n');
    xml.push_str("  <Document>\n");
    xml.push_str(&format!("    <name>{}</name>\n", name));
    xml.push_str("    <Placemark>\n");
    xml.push_str(&format!("      <name>{}</name>\n", name));
    xml.push_str("      <LineString>\n");
    xml.push_str("        <tessellate>1</tessellate>\n");
    xml.push_str(&format!("        <coordinates>{}</coordinates>\n", coords.join(" ")));
    xml.push_str("      </LineString>\n");
    xml.push_str("    </Placemark>\n");
    xml.push_str("  </Document>\n");
    xml.push_str("</kml>\n");
    xml
}

/// KMLの全 `<coordinates>` を順に読み込む
pub fn parse(content: &str) -> Result<Track> {
    let mut points = Vec::new();
    let mut blocks = 0;

    for caps in COORDS_RE.captures_iter(content) {
        blocks += 1;
        for tuple in caps[1].split_whitespace() {
            let mut parts = tuple.split(',');
            let lon = parse_number(parts.next(), "lon", tuple)?;
            let lat = parse_number(parts.next(), "lat", tuple)?;
            let ele = parts.next().and_then(|e| e.trim().parse().ok());
            let position = LatLon::new(lat, lon)?;

            let mut point = TrackPoint::new(position.lat, position.lon);
            point.ele = ele;
            points.push(point);
        }
    }

    // <coordinates> が空なら空のトラック、要素自体が無ければエラー
    if blocks == 0 {
        return Err(Error::Parse("KML: no coordinates found".into()));
    }

    let name = NAME_RE.captures(content).map(|c| unescape_xml(c[1].trim()));
    Ok(Track { name, points })
}

fn parse_number(value: Option<&str>, label: &str, tuple: &str) -> Result<f64> {
    value
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| Error::Parse(format!("KML: invalid {} in '{}'", label, tuple)))
}

/// 訪問のPOIをKMLのPointプレースマークとして出力
pub fn waypoints(visit: &Visit) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(KML_HEADER);
    xml.push('\n');
    xml.push_str("  <Document>\n");
    xml.push_str(&format!(
        "    <name>{}</name>\n",
        escape_xml(visit.name.as_deref().unwrap_or("Visit"))
    ));

    for poi in &visit.pois {
        xml.push_str("    <Placemark>\n");
        xml.push_str(&format!("      <name>{}</name>\n", escape_xml(&poi.title)));
        if !poi.comment.is_empty() {
            xml.push_str(&format!(
                "      <description>{}</description>\n",
                escape_xml(&poi.comment)
            ));
        }
        xml.push_str(&format!(
            "      <Point><coordinates>{}</coordinates></Point>\n",
            coordinate(poi.location.lat, poi.location.lon, None)
        ));
        xml.push_str("    </Placemark>\n");
    }

    xml.push_str("  </Document>\n");
    xml.push_str("</kml>\n");
    xml
}
