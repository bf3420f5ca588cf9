//! 訪問バンドル取り込みの統合テスト
//!
//! ZIP作成 → 取り込み → マーカー → ポップアップ → クローズ

use poi_visit_common::{
    BundleWriter, Grouping, ImportOptions, ImportSession, LatLon, MediaMode, Poi, Visit,
    VisitBundle,
};
use poi_visit_rust::editor;
use std::io::Cursor;

fn build_bundle(visit: &Visit, media: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut writer = BundleWriter::new(Cursor::new(Vec::new()));
    writer.write_manifest(visit).unwrap();
    for (poi_id, file_name, bytes) in media {
        writer.add_media(poi_id, file_name, bytes).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn poi(id: &str, lat: f64, lon: f64) -> Poi {
    Poi::new(id, format!("Lieu {}", id), LatLon { lat, lon })
}

/// N件のPOI → N件のマーカー
#[test]
fn test_marker_count_matches_pois() {
    let visit = Visit {
        name: Some("Vieux quartier".to_string()),
        pois: vec![poi("1", 45.0, 5.0), poi("2", 45.0, 5.0), poi("3", 45.1, 5.1)],
    };
    let bytes = build_bundle(&visit, &[]);

    let session = ImportSession::open(bytes.clone(), ImportOptions::default()).unwrap();
    assert_eq!(session.markers().len(), 3);

    // まとめると同じ座標の2件が1マーカーになる
    let grouped = ImportSession::open(
        bytes,
        ImportOptions {
            grouping: Grouping::SharedLocation,
            media_mode: MediaMode::Lazy,
        },
    )
    .unwrap();
    assert_eq!(grouped.markers().len(), 2);
    assert_eq!(grouped.markers()[0].popup.entries.len(), 2);
}

/// バンドルに無いメディアはポップアップから省かれる
#[test]
fn test_missing_media_is_omitted_from_popup() {
    let mut with_audio = poi("a", 43.3, 5.4);
    with_audio.image = Some("photo.jpg".to_string());
    with_audio.audio = Some("absent.mp3".to_string());
    let visit = Visit {
        name: None,
        pois: vec![with_audio],
    };
    let bytes = build_bundle(&visit, &[("a", "photo.jpg", b"\xff\xd8\xff")]);

    let mut session = ImportSession::open(bytes, ImportOptions::default()).unwrap();
    let html = session.open_popup(0).unwrap();
    assert!(html.contains("<img"));
    assert!(!html.contains("<audio"));

    let missing = session.bundle().missing_media(&session.bundle().pois()[0]);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].file_name, "absent.mp3");
}

/// クローズ後はどのURLも解決できない
#[test]
fn test_close_revokes_all_urls() {
    let mut p = poi("x", 48.0, 2.0);
    p.image = Some("x.png".to_string());
    let visit = Visit {
        name: None,
        pois: vec![p],
    };
    let bytes = build_bundle(&visit, &[("x", "x.png", b"png")]);

    let mut session = ImportSession::open(
        bytes,
        ImportOptions {
            grouping: Grouping::None,
            media_mode: MediaMode::Eager,
        },
    )
    .unwrap();
    let url = session
        .media_map()
        .get("data/x/x.png")
        .map(str::to_string)
        .unwrap();
    assert!(session.store().resolve(&url).is_some());

    assert_eq!(session.close(), 1);
    assert!(session.store().resolve(&url).is_none());
    assert_eq!(session.store().live_count(), 0);
    // 2回目のクローズも失敗しない
    assert_eq!(session.close(), 0);
}

/// 書き換え後もメディアは残る
#[test]
fn test_comment_rewrite_keeps_media() {
    let mut p = poi("m", 47.0, 1.0);
    p.image = Some("m.jpg".to_string());
    let visit = Visit {
        name: None,
        pois: vec![p],
    };
    let bytes = build_bundle(&visit, &[("m", "m.jpg", b"jpeg")]);

    let mut edited = VisitBundle::from_bytes(bytes.clone()).unwrap().visit().clone();
    assert_eq!(editor::extract_uncommented(&edited), vec![0]);
    assert!(editor::apply_comment(&mut edited, 0, "Fontaine"));

    let rewritten = poi_visit_common::rewrite_manifest(&bytes, &edited).unwrap();
    let mut reopened = VisitBundle::from_bytes(rewritten).unwrap();
    assert_eq!(reopened.pois()[0].comment, "Fontaine");
    assert_eq!(
        reopened.read_entry("data/m/m.jpg").unwrap().as_deref(),
        Some(&b"jpeg"[..])
    );
}
