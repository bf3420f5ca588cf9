//! 取り込みセッション
//!
//! ZIP選択 → マーカー生成 → ポップアップ表示時のメディア展開 → クローズ時の失効、
//! という1回分の取り込みを保持する。新しいZIPを選んだら古いセッションは破棄する。

use crate::bundle::VisitBundle;
use crate::error::{Error, Result};
use crate::markers::{build_markers, render_popup_html, Grouping, Marker};
use crate::media::{MediaMap, MediaMode, ObjectUrlStore};

/// 取り込みオプション
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub grouping: Grouping,
    pub media_mode: MediaMode,
}

pub struct ImportSession {
    bundle: VisitBundle,
    markers: Vec<Marker>,
    media_map: MediaMap,
    store: ObjectUrlStore,
    closed: bool,
}

impl ImportSession {
    /// ZIPを取り込んでマーカーを生成
    pub fn open(bytes: Vec<u8>, options: ImportOptions) -> Result<Self> {
        let bundle = VisitBundle::from_bytes(bytes)?;
        Self::from_bundle(bundle, options)
    }

    pub fn from_bundle(mut bundle: VisitBundle, options: ImportOptions) -> Result<Self> {
        let markers = build_markers(&bundle, options.grouping);
        let mut media_map = MediaMap::new(options.media_mode);
        let mut store = ObjectUrlStore::new();

        if options.media_mode == MediaMode::Eager {
            let count = media_map.materialize_all(&mut bundle, &mut store)?;
            log::debug!("eager media: {} URLs created", count);
        }

        Ok(Self {
            bundle,
            markers,
            media_map,
            store,
            closed: false,
        })
    }

    pub fn bundle(&self) -> &VisitBundle {
        &self.bundle
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn media_map(&self) -> &MediaMap {
        &self.media_map
    }

    pub fn store(&self) -> &ObjectUrlStore {
        &self.store
    }

    /// ポップアップを開く（未展開メディアをここで展開）
    pub fn open_popup(&mut self, index: usize) -> Result<String> {
        let marker = self.markers.get(index).ok_or(Error::MarkerNotFound(index))?;

        for media in marker.popup.media() {
            if self
                .media_map
                .materialize(&mut self.bundle, &mut self.store, media)?
                .is_none()
            {
                log::warn!("media entry unreadable: {}", media.path);
            }
        }

        Ok(render_popup_html(&marker.popup, &self.media_map))
    }

    /// 全URLを失効させる（何度呼んでもよい）
    pub fn close(&mut self) -> usize {
        let revoked = self.media_map.revoke_all(&mut self.store);
        // マップ経由でない残りも失効させる
        let rest = self.store.revoke_all();
        if !self.closed {
            log::debug!("session closed: {} URLs revoked", revoked + rest);
        }
        self.closed = true;
        revoked + rest
    }
}

impl Drop for ImportSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::BundleWriter;
    use crate::geo::LatLon;
    use crate::types::{Poi, Visit};
    use std::io::Cursor;

    fn bundle_bytes() -> Vec<u8> {
        let mut a = Poi::new("a", "A", LatLon { lat: 1.0, lon: 1.0 });
        a.image = Some("a.jpg".to_string());
        a.audio = Some("a.mp3".to_string());
        let mut b = Poi::new("b", "B", LatLon { lat: 2.0, lon: 2.0 });
        b.image = Some("b.png".to_string());

        let mut writer = BundleWriter::new(Cursor::new(Vec::new()));
        writer.write_manifest(&Visit { name: None, pois: vec![a, b] }).unwrap();
        writer.add_media("a", "a.jpg", b"a-img").unwrap();
        writer.add_media("a", "a.mp3", b"a-snd").unwrap();
        writer.add_media("b", "b.png", b"b-img").unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_lazy_materializes_on_open() {
        let mut session = ImportSession::open(bundle_bytes(), ImportOptions::default()).unwrap();
        assert_eq!(session.store().live_count(), 0);

        let html = session.open_popup(0).unwrap();
        assert!(html.contains("<img"));
        assert!(html.contains("<audio controls"));
        assert_eq!(session.store().live_count(), 2);

        // 2回目は再利用
        session.open_popup(0).unwrap();
        assert_eq!(session.store().live_count(), 2);
    }

    #[test]
    fn test_eager_materializes_all() {
        let options = ImportOptions {
            media_mode: MediaMode::Eager,
            ..Default::default()
        };
        let session = ImportSession::open(bundle_bytes(), options).unwrap();
        assert_eq!(session.store().live_count(), 3);
        assert_eq!(session.media_map().len(), 3);
    }

    #[test]
    fn test_inline_uses_data_urls() {
        let options = ImportOptions {
            media_mode: MediaMode::Inline,
            ..Default::default()
        };
        let mut session = ImportSession::open(bundle_bytes(), options).unwrap();
        let html = session.open_popup(1).unwrap();
        assert!(html.contains("src=\"data:image/png;base64,"));
        assert_eq!(session.store().live_count(), 0);
    }

    #[test]
    fn test_close_revokes_everything() {
        let mut session = ImportSession::open(bundle_bytes(), ImportOptions::default()).unwrap();
        session.open_popup(0).unwrap();
        session.open_popup(1).unwrap();
        let urls: Vec<String> = session
            .markers()
            .iter()
            .flat_map(|m| m.popup.media())
            .filter_map(|m| session.media_map().get(&m.path).map(str::to_string))
            .collect();
        assert_eq!(urls.len(), 3);

        assert_eq!(session.close(), 3);
        for url in &urls {
            assert!(session.store().resolve(url).is_none());
        }
        assert!(session.media_map().is_empty());
        assert_eq!(session.close(), 0);
    }

    #[test]
    fn test_open_popup_out_of_range() {
        let mut session = ImportSession::open(bundle_bytes(), ImportOptions::default()).unwrap();
        assert!(matches!(session.open_popup(9), Err(Error::MarkerNotFound(9))));
    }
}
