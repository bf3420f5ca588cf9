//! 訪問バンドル（ZIP）の読み書き
//!
//! バンドル構成:
//! - ルートの `visit.json`（マニフェスト）
//! - `data/<poi-id>/` 配下のメディアファイル
//!
//! フォルダごと圧縮された ZIP（`<dir>/visit.json`）も受け付ける。

use crate::error::{Error, Result};
use crate::types::{MediaRef, Poi, Visit};
use std::collections::BTreeSet;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// マニフェストのエントリ名
pub const MANIFEST_NAME: &str = "visit.json";

/// メディアを格納するフォルダ名
pub const DATA_DIR: &str = "data";

/// エントリ読み込み時に事前確保する上限
const MAX_PREALLOC: u64 = 64 << 20;

/// 存在が確認できたメディア
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub media: MediaRef,
    /// アーカイブ内のパス
    pub path: String,
}

/// 読み込み済みの訪問バンドル
pub struct VisitBundle {
    visit: Visit,
    archive: ZipArchive<Cursor<Vec<u8>>>,
    /// マニフェストのあるフォルダ（"" または "dir/"）
    root: String,
    entries: BTreeSet<String>,
}

impl std::fmt::Debug for VisitBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisitBundle")
            .field("root", &self.root)
            .field("pois", &self.visit.pois.len())
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl VisitBundle {
    /// ZIPファイルを開く
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    /// メモリ上のZIPから読み込む
    ///
    /// マニフェストが無い、またはJSONが不正な場合はエラーで中断する。
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let entries: BTreeSet<String> = archive.file_names().map(str::to_string).collect();

        let manifest_path = locate_manifest(&entries)?;
        let root = manifest_path
            .strip_suffix(MANIFEST_NAME)
            .unwrap_or_default()
            .to_string();

        let mut content = String::new();
        archive.by_name(&manifest_path)?.read_to_string(&mut content)?;
        // BOM付きで保存されたマニフェストも受け付ける
        let visit: Visit = serde_json::from_str(content.trim_start_matches('\u{feff}'))?;

        log::debug!(
            "bundle opened: manifest={} pois={} entries={}",
            manifest_path,
            visit.pois.len(),
            entries.len()
        );

        Ok(Self {
            visit,
            archive,
            root,
            entries,
        })
    }

    pub fn visit(&self) -> &Visit {
        &self.visit
    }

    pub fn pois(&self) -> &[Poi] {
        &self.visit.pois
    }

    /// POIのメディアのアーカイブ内パス
    ///
    /// ファイル名が既に `data/` で始まる場合はそのまま使う。
    pub fn media_path(&self, poi: &Poi, file_name: &str) -> String {
        let file_name = file_name.trim_start_matches("./");
        if file_name.starts_with(&format!("{}/", DATA_DIR)) {
            format!("{}{}", self.root, file_name)
        } else {
            format!("{}{}/{}/{}", self.root, DATA_DIR, poi.id, file_name)
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains(path)
    }

    /// 実在するメディアだけを返す（欠落は黙って除外）
    pub fn resolve_media(&self, poi: &Poi) -> Vec<ResolvedMedia> {
        poi.media_refs()
            .into_iter()
            .filter_map(|media| {
                let path = self.media_path(poi, &media.file_name);
                if self.contains(&path) {
                    Some(ResolvedMedia { media, path })
                } else {
                    log::debug!("media not in bundle: {}", path);
                    None
                }
            })
            .collect()
    }

    /// 参照されているが存在しないメディア
    pub fn missing_media(&self, poi: &Poi) -> Vec<MediaRef> {
        poi.media_refs()
            .into_iter()
            .filter(|media| !self.contains(&self.media_path(poi, &media.file_name)))
            .collect()
    }

    /// エントリを読み込む（存在しなければ `None`）
    pub fn read_entry(&mut self, path: &str) -> Result<Option<Vec<u8>>> {
        let mut file = match self.archive.by_name(path) {
            Ok(f) => f,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        // ヘッダーの申告サイズは信用しきらない
        let mut buffer = Vec::with_capacity(file.size().min(MAX_PREALLOC) as usize);
        file.read_to_end(&mut buffer)?;
        Ok(Some(buffer))
    }
}

/// マニフェストの位置を探す
///
/// 1. ルートの visit.json
/// 2. 単一のトップレベルフォルダ内の visit.json
fn locate_manifest(entries: &BTreeSet<String>) -> Result<String> {
    if entries.contains(MANIFEST_NAME) {
        return Ok(MANIFEST_NAME.to_string());
    }

    let nested: Vec<&String> = entries
        .iter()
        .filter(|name| {
            name.strip_suffix(MANIFEST_NAME)
                .and_then(|dir| dir.strip_suffix('/'))
                .map(|dir| !dir.is_empty() && !dir.contains('/'))
                .unwrap_or(false)
        })
        .collect();

    match nested.as_slice() {
        [only] => Ok((*only).clone()),
        _ => Err(Error::MissingManifest(MANIFEST_NAME.to_string())),
    }
}

fn file_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// バンドル書き出し
pub struct BundleWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
}

impl<W: Write + Seek> BundleWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            zip: ZipWriter::new(writer),
        }
    }

    /// visit.json を書き込む
    pub fn write_manifest(&mut self, visit: &Visit) -> Result<()> {
        let json = serde_json::to_vec_pretty(visit)?;
        self.write_entry(MANIFEST_NAME, &json)
    }

    /// `data/<poi-id>/<file_name>` にメディアを書き込む
    pub fn add_media(&mut self, poi_id: &str, file_name: &str, bytes: &[u8]) -> Result<()> {
        let path = format!("{}/{}/{}", DATA_DIR, poi_id, file_name);
        self.write_entry(&path, bytes)
    }

    pub fn write_entry(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        self.zip.start_file(path, file_options())?;
        self.zip.write_all(bytes)?;
        Ok(())
    }

    pub fn finish(self) -> Result<W> {
        Ok(self.zip.finish()?)
    }
}

/// マニフェストだけを差し替えたバンドルを作る
///
/// メディアなど他のエントリはそのままコピーする。
pub fn rewrite_manifest(bundle: &[u8], visit: &Visit) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(bundle))?;
    let entries: BTreeSet<String> = archive.file_names().map(str::to_string).collect();
    let manifest_path = locate_manifest(&entries)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        let name = file.name().to_string();

        if file.is_dir() {
            zip.add_directory(name, file_options())?;
            continue;
        }
        if name == manifest_path {
            continue;
        }

        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        zip.start_file(name, file_options())?;
        zip.write_all(&buffer)?;
    }

    zip.start_file(manifest_path, file_options())?;
    zip.write_all(&serde_json::to_vec_pretty(visit)?)?;

    Ok(zip.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLon;

    fn sample_visit() -> Visit {
        let mut a = Poi::new("a", "Alpha", LatLon { lat: 1.0, lon: 2.0 });
        a.image = Some("a.jpg".to_string());
        a.audio = Some("missing.mp3".to_string());
        let b = Poi::new("b", "Beta", LatLon { lat: 3.0, lon: 4.0 });
        Visit {
            name: Some("test".to_string()),
            pois: vec![a, b],
        }
    }

    fn build(visit: &Visit, prefix: &str) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(format!("{}{}", prefix, MANIFEST_NAME), file_options()).unwrap();
        zip.write_all(&serde_json::to_vec(visit).unwrap()).unwrap();
        zip.start_file(format!("{}data/a/a.jpg", prefix), file_options()).unwrap();
        zip.write_all(b"jpeg-bytes").unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_open_root_manifest() {
        let bundle = VisitBundle::from_bytes(build(&sample_visit(), "")).unwrap();
        assert_eq!(bundle.pois().len(), 2);
        assert_eq!(bundle.visit().name.as_deref(), Some("test"));
    }

    #[test]
    fn test_open_nested_manifest() {
        let mut bundle = VisitBundle::from_bytes(build(&sample_visit(), "trip/")).unwrap();
        let poi = bundle.pois()[0].clone();
        assert_eq!(bundle.media_path(&poi, "a.jpg"), "trip/data/a/a.jpg");
        assert_eq!(bundle.read_entry("trip/data/a/a.jpg").unwrap().unwrap(), b"jpeg-bytes");
    }

    #[test]
    fn test_missing_manifest() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("readme.txt", file_options()).unwrap();
        zip.write_all(b"hello").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let err = VisitBundle::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, Error::MissingManifest(_)));
    }

    #[test]
    fn test_ambiguous_nested_manifest() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for dir in ["a/", "b/"] {
            zip.start_file(format!("{}{}", dir, MANIFEST_NAME), file_options()).unwrap();
            zip.write_all(b"{}").unwrap();
        }
        let bytes = zip.finish().unwrap().into_inner();

        assert!(matches!(
            VisitBundle::from_bytes(bytes).unwrap_err(),
            Error::MissingManifest(_)
        ));
    }

    #[test]
    fn test_malformed_manifest() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(MANIFEST_NAME, file_options()).unwrap();
        zip.write_all(b"{ not json").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        assert!(matches!(VisitBundle::from_bytes(bytes).unwrap_err(), Error::Json(_)));
    }

    #[test]
    fn test_manifest_with_bom() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(MANIFEST_NAME, file_options()).unwrap();
        zip.write_all("\u{feff}{\"pois\":[]}".as_bytes()).unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let bundle = VisitBundle::from_bytes(bytes).unwrap();
        assert!(bundle.visit().is_empty());
    }

    #[test]
    fn test_read_entry_larger_than_prealloc_hint() {
        let big = vec![7u8; (1 << 20) + 3];
        let mut writer = BundleWriter::new(Cursor::new(Vec::new()));
        writer.write_manifest(&sample_visit()).unwrap();
        writer.write_entry("data/a/big.bin", &big).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let mut bundle = VisitBundle::from_bytes(bytes).unwrap();
        assert_eq!(bundle.read_entry("data/a/big.bin").unwrap(), Some(big));
    }

    #[test]
    fn test_not_a_zip() {
        let err = VisitBundle::from_bytes(b"plain text".to_vec()).unwrap_err();
        assert!(matches!(err, Error::Zip(_)));
    }

    #[test]
    fn test_resolve_media_omits_missing() {
        let bundle = VisitBundle::from_bytes(build(&sample_visit(), "")).unwrap();
        let poi = &bundle.pois()[0];

        let resolved = bundle.resolve_media(poi);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].path, "data/a/a.jpg");

        let missing = bundle.missing_media(poi);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].file_name, "missing.mp3");
    }

    #[test]
    fn test_media_path_with_data_prefix() {
        let bundle = VisitBundle::from_bytes(build(&sample_visit(), "")).unwrap();
        let poi = &bundle.pois()[0];
        assert_eq!(bundle.media_path(poi, "data/a/a.jpg"), "data/a/a.jpg");
        assert_eq!(bundle.media_path(poi, "./a.jpg"), "data/a/a.jpg");
    }

    #[test]
    fn test_read_entry_missing_is_none() {
        let mut bundle = VisitBundle::from_bytes(build(&sample_visit(), "")).unwrap();
        assert!(bundle.read_entry("data/zzz/none.jpg").unwrap().is_none());
    }

    #[test]
    fn test_writer_and_rewrite_manifest() {
        let mut writer = BundleWriter::new(Cursor::new(Vec::new()));
        let mut visit = sample_visit();
        writer.write_manifest(&visit).unwrap();
        writer.add_media("a", "a.jpg", b"img").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        visit.pois[1].comment = "updated".to_string();
        let rewritten = rewrite_manifest(&bytes, &visit).unwrap();

        let mut bundle = VisitBundle::from_bytes(rewritten).unwrap();
        assert_eq!(bundle.pois()[1].comment, "updated");
        assert_eq!(bundle.read_entry("data/a/a.jpg").unwrap().unwrap(), b"img");
    }
}
