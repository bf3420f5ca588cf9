use poi_visit_common::LatLon;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// 写真から読み取ったEXIF情報
#[derive(Debug, Clone, Default)]
pub struct PhotoMeta {
    pub date: Option<String>,
    pub location: Option<LatLon>,
}

pub fn read_meta(path: &Path) -> Result<PhotoMeta, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let mut bufreader = BufReader::new(file);
    let exif_reader = exif::Reader::new();
    let exif = exif_reader.read_from_container(&mut bufreader)?;

    Ok(PhotoMeta {
        date: extract_date(&exif),
        location: extract_gps(&exif),
    })
}

fn extract_date(exif: &exif::Exif) -> Option<String> {
    // DateTimeOriginal を優先し、無ければ DateTime
    [exif::Tag::DateTimeOriginal, exif::Tag::DateTime]
        .into_iter()
        .find_map(|tag| exif.get_field(tag, exif::In::PRIMARY))
        .map(|field| field.display_value().to_string())
}

fn extract_gps(exif: &exif::Exif) -> Option<LatLon> {
    let lat = gps_degrees(exif, exif::Tag::GPSLatitude, exif::Tag::GPSLatitudeRef, b'S')?;
    let lon = gps_degrees(exif, exif::Tag::GPSLongitude, exif::Tag::GPSLongitudeRef, b'W')?;
    LatLon::new(lat, lon).ok()
}

/// 度分秒の有理数3つ + 方位参照 → 十進度
fn gps_degrees(
    exif: &exif::Exif,
    tag: exif::Tag,
    ref_tag: exif::Tag,
    negative_ref: u8,
) -> Option<f64> {
    let field = exif.get_field(tag, exif::In::PRIMARY)?;
    let dms: Vec<f64> = match &field.value {
        exif::Value::Rational(values) if !values.is_empty() => {
            values.iter().take(3).map(|r| r.to_f64()).collect()
        }
        _ => return None,
    };

    let negative = match exif.get_field(ref_tag, exif::In::PRIMARY).map(|f| &f.value) {
        Some(exif::Value::Ascii(parts)) => parts
            .first()
            .and_then(|p| p.first())
            .map(|c| c.to_ascii_uppercase() == negative_ref)
            .unwrap_or(false),
        _ => false,
    };

    Some(dms_to_degrees(&dms, negative))
}

/// 度・分・秒（欠けた要素は0）を十進度に変換
pub fn dms_to_degrees(dms: &[f64], negative: bool) -> f64 {
    let part = |i: usize| dms.get(i).copied().filter(|v| v.is_finite()).unwrap_or(0.0);
    let degrees = part(0) + part(1) / 60.0 + part(2) / 3600.0;
    if negative {
        -degrees
    } else {
        degrees
    }
}
