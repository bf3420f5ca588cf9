//! 写真フォルダから訪問バンドルを作成
//!
//! 位置情報付きの写真1枚 = POI 1件。
//! POI ID はファイル内容の SHA-256 先頭12桁（同じ写真なら同じID）。

use crate::error::{PoiVisitError, Result};
use crate::scanner::{self, PhotoInfo};
use indicatif::{ProgressBar, ProgressStyle};
use poi_visit_common::{BundleWriter, Poi, Visit};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

const POI_ID_LEN: usize = 12;

/// 作成結果
#[derive(Debug, Clone)]
pub struct PackReport {
    pub output: PathBuf,
    pub packed: usize,
    /// 位置情報なし・重複で除外した写真
    pub skipped: Vec<String>,
}

/// 読み込み済みの写真
struct LoadedPhoto<'a> {
    info: &'a PhotoInfo,
    id: String,
    bytes: Vec<u8>,
}

/// ファイル内容からPOI IDを作る
pub fn poi_id_for(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)[..POI_ID_LEN].to_string()
}

/// フォルダをスキャンしてバンドルを作る
pub fn pack_folder(folder: &Path, output: &Path, name: Option<String>) -> Result<PackReport> {
    let photos = scanner::scan_folder(folder)?;
    if !photos.iter().any(|p| p.location.is_some()) {
        return Err(PoiVisitError::NoGeotaggedPhotos(folder.display().to_string()));
    }
    pack_photos(&photos, output, name)
}

/// 写真リストからバンドルを作る（位置情報なしは除外）
pub fn pack_photos(photos: &[PhotoInfo], output: &Path, name: Option<String>) -> Result<PackReport> {
    let (geotagged, untagged): (Vec<&PhotoInfo>, Vec<&PhotoInfo>) =
        photos.iter().partition(|p| p.location.is_some());

    for photo in &untagged {
        log::info!("位置情報なしのため除外: {}", photo.file_name);
    }

    // 読み込みとハッシュ計算は並列
    let mut loaded: Vec<LoadedPhoto> = geotagged
        .par_iter()
        .map(|info| -> Result<LoadedPhoto> {
            let bytes = std::fs::read(&info.path)?;
            Ok(LoadedPhoto {
                info: *info,
                id: poi_id_for(&bytes),
                bytes,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // 同じ内容の写真は1件だけ（IDがZIPのフォルダ名になるため）
    let mut skipped: Vec<String> = untagged.iter().map(|p| p.file_name.clone()).collect();
    let mut seen = HashSet::new();
    loaded.retain(|photo| {
        if seen.insert(photo.id.clone()) {
            return true;
        }
        log::info!("重複する写真を除外: {}", photo.info.file_name);
        skipped.push(photo.info.file_name.clone());
        false
    });

    let visit = build_visit(&loaded, name);

    let progress = ProgressBar::new(loaded.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let file = File::create(output)?;
    let mut writer = BundleWriter::new(BufWriter::new(file));
    writer.write_manifest(&visit)?;
    for photo in &loaded {
        progress.set_message(photo.info.file_name.clone());
        writer.add_media(&photo.id, &photo.info.file_name, &photo.bytes)?;
        progress.inc(1);
    }
    writer.finish()?;
    progress.finish_and_clear();

    Ok(PackReport {
        output: output.to_path_buf(),
        packed: loaded.len(),
        skipped,
    })
}

fn build_visit(photos: &[LoadedPhoto], name: Option<String>) -> Visit {
    let pois = photos
        .iter()
        .filter_map(|photo| {
            let location = photo.info.location?;
            let title = Path::new(&photo.info.file_name)
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| photo.info.file_name.clone());

            let mut poi = Poi::new(photo.id.clone(), title, location);
            poi.image = Some(photo.info.file_name.clone());
            Some(poi)
        })
        .collect();

    Visit { name, pois }
}
