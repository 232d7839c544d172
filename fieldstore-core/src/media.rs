//! Media kinds that receive their own shard tree, and the derived image
//! variants produced after upload.

use crate::keys;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of uploaded media. Each kind is sharded under its own root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
    Document,
    File,
}

impl MediaKind {
    pub const ALL: [MediaKind; 5] = [
        MediaKind::Image,
        MediaKind::Audio,
        MediaKind::Video,
        MediaKind::Document,
        MediaKind::File,
    ];

    /// Preference key holding this kind's root directory.
    pub fn root_key(self) -> &'static str {
        match self {
            MediaKind::Image => keys::IMAGE_DIRECTORY,
            MediaKind::Audio => keys::AUDIO_DIRECTORY,
            MediaKind::Video => keys::VIDEO_DIRECTORY,
            MediaKind::Document => keys::DOCUMENT_DIRECTORY,
            MediaKind::File => keys::FILE_DIRECTORY,
        }
    }

    /// Preference key holding this kind's tree depth.
    pub fn depth_key(self) -> &'static str {
        match self {
            MediaKind::Document => keys::DOCUMENT_DEPTH,
            _ => keys::FILE_HIERARCHY_DEPTH,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::Document => "document",
            MediaKind::File => "file",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived variant of an uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSize {
    Icon,
    Small,
}

impl ImageSize {
    pub const ALL: [ImageSize; 2] = [ImageSize::Icon, ImageSize::Small];

    /// Longest edge in pixels.
    pub fn max_edge(self) -> u32 {
        match self {
            ImageSize::Icon => 64,
            ImageSize::Small => 512,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImageSize::Icon => "icon",
            ImageSize::Small => "small",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
