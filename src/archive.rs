//! Packaging of generated scene assets into a downloadable zip archive.

use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::content::SceneAssets;
use crate::error::{Result, StudioError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Video,
}

impl AssetKind {
    fn folder(&self) -> &'static str {
        match self {
            AssetKind::Image => "images",
            AssetKind::Video => "videos",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            AssetKind::Image => "png",
            AssetKind::Video => "mp4",
        }
    }

    pub fn archive_name(&self, at: DateTime<Utc>) -> String {
        format!("{}_{}.zip", self.folder(), at.format("%Y%m%d_%H%M%S"))
    }
}

/// Write one archive entry per present scene, ascending, named by 1-based
/// scene number under a single top-level folder. An empty asset map yields
/// `ArchiveEmpty` and nothing is written.
pub fn pack_assets<W: Write + Seek>(
    assets: &SceneAssets,
    kind: AssetKind,
    writer: W,
) -> Result<W> {
    if assets.is_empty() {
        return Err(StudioError::ArchiveEmpty(format!(
            "no generated {} to package",
            kind.folder()
        )));
    }

    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (scene, bytes) in assets.iter() {
        let entry = format!("{}/scene_{}.{}", kind.folder(), scene + 1, kind.extension());
        zip.start_file(entry, options)?;
        zip.write_all(bytes)?;
    }
    Ok(zip.finish()?)
}

/// Package into `<dir>/<kind>_<timestamp>.zip`. The emptiness check runs
/// before the file is created, so an empty map leaves no file behind.
pub fn write_archive(
    assets: &SceneAssets,
    kind: AssetKind,
    dir: &Path,
    at: DateTime<Utc>,
) -> Result<PathBuf> {
    if assets.is_empty() {
        return Err(StudioError::ArchiveEmpty(format!(
            "no generated {} to package",
            kind.folder()
        )));
    }
    let path = dir.join(kind.archive_name(at));
    let file = File::create(&path)?;
    pack_assets(assets, kind, file)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    #[test]
    fn empty_map_reports_archive_empty() {
        let assets = SceneAssets::new(4);
        let err = pack_assets(&assets, AssetKind::Image, Cursor::new(Vec::new())).unwrap_err();
        assert!(matches!(err, StudioError::ArchiveEmpty(_)));
    }

    #[test]
    fn sparse_map_packs_one_based_entries_in_order() {
        let mut assets = SceneAssets::new(4);
        assets.insert(2, b"beta".to_vec()).unwrap();
        assets.insert(0, b"alpha".to_vec()).unwrap();

        let cursor = pack_assets(&assets, AssetKind::Image, Cursor::new(Vec::new())).unwrap();
        let mut archive = ZipArchive::new(cursor).unwrap();
        assert_eq!(archive.len(), 2);

        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["images/scene_1.png", "images/scene_3.png"]);

        let mut contents = String::new();
        archive
            .by_name("images/scene_3.png")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "beta");
    }

    #[test]
    fn video_archives_use_their_own_folder_and_extension() {
        let mut assets = SceneAssets::new(2);
        assets.insert(1, vec![0, 1, 2]).unwrap();
        let cursor = pack_assets(&assets, AssetKind::Video, Cursor::new(Vec::new())).unwrap();
        let mut archive = ZipArchive::new(cursor).unwrap();
        assert_eq!(archive.by_index(0).unwrap().name(), "videos/scene_2.mp4");
    }

    #[test]
    fn archive_names_carry_kind_and_timestamp() {
        let at = DateTime::parse_from_rfc3339("2026-08-24T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(AssetKind::Image.archive_name(at), "images_20260824_103000.zip");
        assert_eq!(AssetKind::Video.archive_name(at), "videos_20260824_103000.zip");
    }

    #[test]
    fn empty_map_leaves_no_file_on_disk() {
        let assets = SceneAssets::new(1);
        let dir = std::env::temp_dir().join("shorts-studio-archive-test");
        std::fs::create_dir_all(&dir).unwrap();
        let err = write_archive(&assets, AssetKind::Video, &dir, Utc::now()).unwrap_err();
        assert!(matches!(err, StudioError::ArchiveEmpty(_)));
        let leftovers: Vec<_> = std::fs::read_dir(&dir).unwrap().collect();
        assert!(leftovers.is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }
}
