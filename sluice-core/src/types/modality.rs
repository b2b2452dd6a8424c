//! Modality tags used to route nodes to their destination stores.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::SluiceError;

/// Content modality of a node.
///
/// The set is closed so that every lookup against a
/// [`VectorStoreMap`](crate::traits::VectorStoreMap) is an exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModalityType {
    /// Plain text content
    Text,

    /// Image content (photos, diagrams, charts, etc.)
    Image,

    /// Audio content (speech, music, etc.)
    Audio,

    /// Video content
    Video,
}

impl ModalityType {
    /// All modalities, in fan-out order.
    pub fn all() -> [Self; 4] {
        [Self::Text, Self::Image, Self::Audio, Self::Video]
    }

    /// Best-effort modality for a MIME type.
    pub fn from_mimetype(mimetype: &str) -> Self {
        match mimetype.split('/').next().unwrap_or_default() {
            "image" => Self::Image,
            "audio" => Self::Audio,
            "video" => Self::Video,
            _ => Self::Text,
        }
    }
}

impl Default for ModalityType {
    fn default() -> Self {
        Self::Text
    }
}

impl fmt::Display for ModalityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Image => write!(f, "image"),
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
        }
    }
}

impl std::str::FromStr for ModalityType {
    type Err = SluiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            _ => Err(SluiceError::validation(format!("Unknown modality type: {s}"))),
        }
    }
}
