pub mod exif;

use crate::error::{PoiVisitError, Result};
use poi_visit_common::LatLon;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct PhotoInfo {
    pub path: PathBuf,
    pub file_name: String,
    pub date: Option<String>,
    pub location: Option<LatLon>,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "JPG", "JPEG", "PNG"];

pub fn scan_folder(folder: &Path) -> Result<Vec<PhotoInfo>> {
    if !folder.exists() {
        return Err(PoiVisitError::FolderNotFound(folder.display().to_string()));
    }

    let mut photos = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        if let Some(ext) = path.extension() {
            let ext_str = ext.to_string_lossy();
            if is_image_extension(&ext_str) {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();

                let meta = match exif::read_meta(path) {
                    Ok(meta) => meta,
                    Err(e) => {
                        log::debug!("EXIF読み込み失敗 {}: {}", file_name, e);
                        exif::PhotoMeta::default()
                    }
                };

                photos.push(PhotoInfo {
                    path: path.to_path_buf(),
                    file_name,
                    date: meta.date,
                    location: meta.location,
                });
            }
        }
    }

    // ファイル名でソート
    photos.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(photos)
}

/// Check if a file extension is a supported image format
fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext)
}
