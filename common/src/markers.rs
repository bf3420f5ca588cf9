//! 地図マーカーとポップアップ
//!
//! - 通常は1POI = 1マーカー
//! - `Grouping::SharedLocation` では同一座標のPOIを1つのポップアップにまとめる
//! - ポップアップHTMLは展開済みURLのあるメディアだけを描画する

use crate::bundle::{ResolvedMedia, VisitBundle};
use crate::geo::LatLon;
use crate::media::MediaMap;
use crate::types::MediaKind;
use crate::xml::escape_xml;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// マーカーのまとめ方
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Grouping {
    #[default]
    None,
    SharedLocation,
}

/// ポップアップ内の1エントリ（POI 1件分）
#[derive(Debug, Clone)]
pub struct PopupEntry {
    pub poi_id: String,
    pub title: String,
    pub comment: String,
    /// バンドル内に実在するメディアのみ
    pub media: Vec<ResolvedMedia>,
}

#[derive(Debug, Clone, Default)]
pub struct Popup {
    pub entries: Vec<PopupEntry>,
}

impl Popup {
    pub fn media(&self) -> impl Iterator<Item = &ResolvedMedia> {
        self.entries.iter().flat_map(|e| e.media.iter())
    }
}

#[derive(Debug, Clone)]
pub struct Marker {
    pub position: LatLon,
    pub popup: Popup,
}

/// バンドルからマーカーを生成
pub fn build_markers(bundle: &VisitBundle, grouping: Grouping) -> Vec<Marker> {
    let mut markers: Vec<Marker> = Vec::with_capacity(bundle.pois().len());
    let mut by_location: HashMap<String, usize> = HashMap::new();

    for poi in bundle.pois() {
        let entry = PopupEntry {
            poi_id: poi.id.clone(),
            title: poi.title.clone(),
            comment: poi.comment.clone(),
            media: bundle.resolve_media(poi),
        };

        if grouping == Grouping::SharedLocation {
            if let Some(&index) = by_location.get(&poi.location.key()) {
                markers[index].popup.entries.push(entry);
                continue;
            }
            by_location.insert(poi.location.key(), markers.len());
        }

        markers.push(Marker {
            position: poi.location,
            popup: Popup {
                entries: vec![entry],
            },
        });
    }

    markers
}

/// ポップアップをHTMLに描画
///
/// URLが未展開のメディアは出力しない。
pub fn render_popup_html(popup: &Popup, media_map: &MediaMap) -> String {
    let mut html = String::new();
    html.push_str("<div class=\"poi-popup\">\n");

    for entry in &popup.entries {
        html.push_str(&format!(
            "  <div class=\"poi-entry\" data-poi=\"{}\">\n",
            escape_xml(&entry.poi_id)
        ));
        html.push_str(&format!("    <h3>{}</h3>\n", escape_xml(&entry.title)));
        if !entry.comment.is_empty() {
            html.push_str(&format!("    <p>{}</p>\n", escape_xml(&entry.comment)));
        }

        for media in &entry.media {
            let Some(url) = media_map.get(&media.path) else {
                continue;
            };
            let url = escape_xml(url);
            match media.media.kind {
                MediaKind::Image => html.push_str(&format!(
                    "    <img src=\"{}\" alt=\"{}\">\n",
                    url,
                    escape_xml(&entry.title)
                )),
                MediaKind::Audio => {
                    html.push_str(&format!("    <audio controls src=\"{}\"></audio>\n", url))
                }
                MediaKind::Video => {
                    html.push_str(&format!("    <video controls src=\"{}\"></video>\n", url))
                }
            }
        }

        html.push_str("  </div>\n");
    }

    html.push_str("</div>");
    html
}
