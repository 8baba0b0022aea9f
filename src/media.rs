//! Media library
//!
//! Loose images live in `{root}/images/`, galleries are sub-directories of
//! `{root}/gallery/`. Every listed image has a `thumb_` prefixed sibling used
//! as its thumbnail.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const THUMB_PREFIX: &str = "thumb_";
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Top-level media collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Images,
    Gallery,
}

impl MediaKind {
    pub fn dir_name(self) -> &'static str {
        match self {
            MediaKind::Images => "images",
            MediaKind::Gallery => "gallery",
        }
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "images" => Ok(MediaKind::Images),
            "gallery" => Ok(MediaKind::Gallery),
            other => Err(format!(
                "unknown media kind '{}' (must be 'images' or 'gallery')",
                other
            )),
        }
    }
}

/// An image (with thumbnail) or a gallery (bare name)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb_name: Option<String>,
}

impl MediaEntry {
    pub fn image(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            thumb_name: Some(format!("{}{}", THUMB_PREFIX, name)),
            name,
        }
    }

    pub fn gallery(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            thumb_name: None,
        }
    }
}

/// What a delete-media request removes
///
/// `{kind: images, name}` is a loose image, `{kind: gallery, name, deep}` an
/// image inside gallery `name`, `{kind: gallery, name}` the whole gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaTarget {
    #[serde(rename = "mediaType")]
    pub kind: MediaKind,
    #[serde(rename = "mediaName")]
    pub name: String,
    #[serde(rename = "deepMediaName", default, skip_serializing_if = "Option::is_none")]
    pub deep: Option<String>,
}

/// Media scanning and mutation collaborator
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// List images of `kind` (a gallery's images when `name` is given), or
    /// the galleries themselves for `Gallery` without a name
    async fn scan(&self, kind: MediaKind, name: Option<&str>) -> io::Result<Vec<MediaEntry>>;

    async fn create_gallery(&self, name: &str) -> io::Result<()>;

    async fn remove(&self, target: &MediaTarget) -> io::Result<()>;
}

/// Media names are single, non-hidden path segments
pub fn validate_name(name: &str) -> Result<(), String> {
    let ok = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.starts_with('.')
        && !name.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
    if ok {
        Ok(())
    } else {
        Err(format!("invalid media name '{}'", name))
    }
}

/// Filesystem-backed media library
#[derive(Debug, Clone)]
pub struct FsMediaLibrary {
    root: PathBuf,
}

impl FsMediaLibrary {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(&self, kind: MediaKind, name: Option<&str>) -> PathBuf {
        let base = self.root.join(kind.dir_name());
        match name {
            Some(name) => base.join(name),
            None => base,
        }
    }
}

#[async_trait]
impl MediaLibrary for FsMediaLibrary {
    async fn scan(&self, kind: MediaKind, name: Option<&str>) -> io::Result<Vec<MediaEntry>> {
        let dir = self.dir(kind, name);
        let list_galleries = kind == MediaKind::Gallery && name.is_none();
        tokio::task::spawn_blocking(move || {
            if list_galleries {
                scan_galleries(&dir)
            } else {
                scan_images(&dir)
            }
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("media scan aborted: {}", e)))?
    }

    async fn create_gallery(&self, name: &str) -> io::Result<()> {
        tokio::fs::create_dir_all(self.dir(MediaKind::Gallery, Some(name))).await
    }

    async fn remove(&self, target: &MediaTarget) -> io::Result<()> {
        match (target.kind, target.deep.as_deref()) {
            (MediaKind::Images, _) => remove_image(&self.dir(MediaKind::Images, None), &target.name).await,
            (MediaKind::Gallery, Some(image)) => {
                remove_image(&self.dir(MediaKind::Gallery, Some(&target.name)), image).await
            }
            (MediaKind::Gallery, None) => {
                tokio::fs::remove_dir_all(self.dir(MediaKind::Gallery, Some(&target.name))).await
            }
        }
    }
}

async fn remove_image(dir: &Path, name: &str) -> io::Result<()> {
    tokio::fs::remove_file(dir.join(name)).await?;
    match tokio::fs::remove_file(dir.join(format!("{}{}", THUMB_PREFIX, name))).await {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn scan_images(dir: &Path) -> io::Result<Vec<MediaEntry>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if is_image(&name) && !name.starts_with(THUMB_PREFIX) {
            entries.push(MediaEntry::image(name));
        }
    }
    Ok(entries)
}

fn scan_galleries(dir: &Path) -> io::Result<Vec<MediaEntry>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_dir() {
            entries.push(MediaEntry::gallery(entry.file_name().to_string_lossy()));
        }
    }
    Ok(entries)
}

fn is_image(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}
