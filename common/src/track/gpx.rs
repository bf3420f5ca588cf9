//! GPX 1.1 の読み書き
//!
//! 座標は小数6桁で出力する。読み込みは trkpt → rtept → wpt の順に探す。

use super::{Track, TrackPoint};
use crate::error::{Error, Result};
use crate::geo::{format_coord, LatLon};
use crate::types::Visit;
use crate::xml::{escape_xml, unescape_xml};
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;

const GPX_HEADER: &str = r#"<gpx version="1.1" creator="poi-visit" xmlns="http://www.topografix.com/GPX/1/1">"#;

lazy_static::lazy_static! {
    static ref TRKPT_RE: Regex = Regex::new(r"(?s)<trkpt\b([^>]*?)(?:/>|>(.*?)</trkpt>)").unwrap();
    static ref RTEPT_RE: Regex = Regex::new(r"(?s)<rtept\b([^>]*?)(?:/>|>(.*?)</rtept>)").unwrap();
    static ref WPT_RE: Regex = Regex::new(r"(?s)<wpt\b([^>]*?)(?:/>|>(.*?)</wpt>)").unwrap();
    static ref LAT_RE: Regex = Regex::new(r#"\blat\s*=\s*["']([^"']*)["']"#).unwrap();
    static ref LON_RE: Regex = Regex::new(r#"\blon\s*=\s*["']([^"']*)["']"#).unwrap();
    static ref ELE_RE: Regex = Regex::new(r"(?s)<ele>\s*(.*?)\s*</ele>").unwrap();
    static ref TIME_RE: Regex = Regex::new(r"(?s)<time>\s*(.*?)\s*</time>").unwrap();
    static ref TRK_NAME_RE: Regex = Regex::new(r"(?s)<trk\b[^>]*>\s*<name>(.*?)</name>").unwrap();
    static ref META_NAME_RE: Regex = Regex::new(r"(?s)<metadata\b[^>]*>.*?<name>(.*?)</name>").unwrap();
    static ref TRK_RE: Regex = Regex::new(r"<(?:trk|trkseg)\b").unwrap();
}

/// トラックをGPX文字列に変換
pub fn write(track: &Track) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(GPX_HEADER);
    xml.push('\n');
    xml.push_str("  <trk>\n");
    if let Some(name) = &track.name {
        xml.push_str(&format!("    <name>{}</name>\n", escape_xml(name)));
    }
    xml.push_str("    <trkseg>\n");

    for point in &track.points {
        let open = format!(
            "      <trkpt lat=\"{}\" lon=\"{}\"",
            format_coord(point.lat),
            format_coord(point.lon)
        );
        if point.ele.is_none() && point.time.is_none() {
            xml.push_str(&open);
            xml.push_str("/>\n");
            continue;
        }
        xml.push_str(&open);
        xml.push_str(">\n");
        if let Some(ele) = point.ele {
            xml.push_str(&format!("        <ele>{:.1}</ele>\n", ele));
        }
        if let Some(time) = point.time {
            xml.push_str(&format!(
                "        <time>{}</time>\n",
                time.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }
        xml.push_str("      </trkpt>\n");
    }

    xml.push_str("    </trkseg>\n");
    xml.push_str("  </trk>\n");
    xml.push_str("</gpx>\n");
    xml
}

/// GPX文字列からトラックを読み込む
pub fn parse(content: &str) -> Result<Track> {
    let mut points = Vec::new();
    for re in [&*TRKPT_RE, &*RTEPT_RE, &*WPT_RE] {
        for caps in re.captures_iter(content) {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let body = caps.get(2).map_or("", |m| m.as_str());
            points.push(parse_point(attrs, body)?);
        }
        if !points.is_empty() {
            break;
        }
    }

    // 点の無い <trk>/<trkseg> は空のトラック
    if points.is_empty() && !TRK_RE.is_match(content) {
        return Err(Error::Parse("GPX: no track, route or waypoint found".into()));
    }

    let name = TRK_NAME_RE
        .captures(content)
        .or_else(|| META_NAME_RE.captures(content))
        .map(|c| unescape_xml(c[1].trim()));

    Ok(Track { name, points })
}

fn parse_point(attrs: &str, body: &str) -> Result<TrackPoint> {
    let attr = |re: &Regex, label: &str| -> Result<f64> {
        let raw = re
            .captures(attrs)
            .map(|c| c[1].trim().to_string())
            .ok_or_else(|| Error::Parse(format!("GPX: point without {}", label)))?;
        raw.parse()
            .map_err(|_| Error::Parse(format!("GPX: invalid {} '{}'", label, raw)))
    };

    let position = LatLon::new(attr(&LAT_RE, "lat")?, attr(&LON_RE, "lon")?)?;

    let ele = ELE_RE.captures(body).and_then(|c| c[1].parse().ok());
    let time = TIME_RE
        .captures(body)
        .and_then(|c| DateTime::parse_from_rfc3339(&c[1]).ok())
        .map(|t| t.with_timezone(&Utc));

    Ok(TrackPoint {
        lat: position.lat,
        lon: position.lon,
        ele,
        time,
    })
}

/// 訪問のPOIをGPXウェイポイントとして出力
pub fn waypoints(visit: &Visit) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(GPX_HEADER);
    xml.push('\n');
    if let Some(name) = &visit.name {
        xml.push_str(&format!(
            "  <metadata>\n    <name>{}</name>\n  </metadata>\n",
            escape_xml(name)
        ));
    }

    for poi in &visit.pois {
        xml.push_str(&format!(
            "  <wpt lat=\"{}\" lon=\"{}\">\n",
            format_coord(poi.location.lat),
            format_coord(poi.location.lon)
        ));
        xml.push_str(&format!("    <name>{}</name>\n", escape_xml(&poi.title)));
        if !poi.comment.is_empty() {
            xml.push_str(&format!("    <desc>{}</desc>\n", escape_xml(&poi.comment)));
        }
        xml.push_str("  </wpt>\n");
    }

    xml.push_str("</gpx>\n");
    xml
}
