//! Intents and the workflows that handle them

use crate::content::{ContentData, ContentId, TemplateId};
use crate::media::MediaTarget;
use crate::schema::{PageSchema, Path};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned to every workflow run, follow-ups included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentId(u64);

impl IntentId {
    pub fn new(raw: u64) -> Self {
        IntentId(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Event channel a workflow reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Media,
    Pages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    LoadSchema,
    SaveSchema,
    LoadContent,
    CreateContent,
    DeleteContent,
    SaveContent,
    LoadImages,
    LoadGalleryImages,
    LoadGalleries,
    CreateGallery,
    DeleteMedia,
}

impl Workflow {
    pub fn family(self) -> Family {
        match self {
            Workflow::LoadSchema
            | Workflow::SaveSchema
            | Workflow::LoadContent
            | Workflow::CreateContent
            | Workflow::DeleteContent
            | Workflow::SaveContent => Family::Pages,
            Workflow::LoadImages
            | Workflow::LoadGalleryImages
            | Workflow::LoadGalleries
            | Workflow::CreateGallery
            | Workflow::DeleteMedia => Family::Media,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Workflow::LoadSchema => "load_schema",
            Workflow::SaveSchema => "save_schema",
            Workflow::LoadContent => "load_content",
            Workflow::CreateContent => "create_content",
            Workflow::DeleteContent => "delete_content",
            Workflow::SaveContent => "save_content",
            Workflow::LoadImages => "load_images",
            Workflow::LoadGalleryImages => "load_gallery_images",
            Workflow::LoadGalleries => "load_galleries",
            Workflow::CreateGallery => "create_gallery",
            Workflow::DeleteMedia => "delete_media",
        }
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A high-level request from the editor UI
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    LoadSchema,
    SaveSchema {
        schema: PageSchema,
    },
    LoadContent {
        data_id: ContentId,
        template_id: TemplateId,
    },
    /// Create an item and link it at `path` of `schema`
    CreateContent {
        template_id: TemplateId,
        path: Path,
        schema: PageSchema,
    },
    /// Delete an item and unlink it at `path` of `schema`
    DeleteContent {
        data_id: ContentId,
        path: Path,
        schema: PageSchema,
    },
    SaveContent {
        data_id: ContentId,
        content: ContentData,
    },
    LoadImages,
    LoadGalleryImages {
        gallery: String,
    },
    LoadGalleries,
    CreateGallery {
        name: String,
    },
    DeleteMedia {
        target: MediaTarget,
    },
}

impl Intent {
    pub fn workflow(&self) -> Workflow {
        match self {
            Intent::LoadSchema => Workflow::LoadSchema,
            Intent::SaveSchema { .. } => Workflow::SaveSchema,
            Intent::LoadContent { .. } => Workflow::LoadContent,
            Intent::CreateContent { .. } => Workflow::CreateContent,
            Intent::DeleteContent { .. } => Workflow::DeleteContent,
            Intent::SaveContent { .. } => Workflow::SaveContent,
            Intent::LoadImages => Workflow::LoadImages,
            Intent::LoadGalleryImages { .. } => Workflow::LoadGalleryImages,
            Intent::LoadGalleries => Workflow::LoadGalleries,
            Intent::CreateGallery { .. } => Workflow::CreateGallery,
            Intent::DeleteMedia { .. } => Workflow::DeleteMedia,
        }
    }

    /// The identifier a failure should be reported against
    pub fn subject(&self) -> Option<String> {
        match self {
            Intent::LoadContent { data_id, .. }
            | Intent::DeleteContent { data_id, .. }
            | Intent::SaveContent { data_id, .. } => Some(data_id.to_string()),
            Intent::CreateContent { template_id, path, .. } => {
                Some(format!("{} at {}", template_id, path))
            }
            Intent::LoadGalleryImages { gallery } => Some(gallery.clone()),
            Intent::CreateGallery { name } => Some(name.clone()),
            Intent::DeleteMedia { target } => Some(match &target.deep {
                Some(deep) => format!("{}/{}", target.name, deep),
                None => target.name.clone(),
            }),
            Intent::LoadSchema | Intent::SaveSchema { .. } | Intent::LoadImages | Intent::LoadGalleries => {
                None
            }
        }
    }
}

/// The listing to reload after a successful media delete
pub fn reload_after_delete(target: &MediaTarget) -> Intent {
    use crate::media::MediaKind;
    match (target.kind, &target.deep) {
        (MediaKind::Images, _) => Intent::LoadImages,
        (MediaKind::Gallery, Some(_)) => Intent::LoadGalleryImages {
            gallery: target.name.clone(),
        },
        (MediaKind::Gallery, None) => Intent::LoadGalleries,
    }
}
