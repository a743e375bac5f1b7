// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File records as captured in a scan snapshot.

use crate::FileId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse content category derived from the remote mime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MimeCategory {
    Document,
    Spreadsheet,
    Presentation,
    Image,
    Video,
    Pdf,
    Folder,
    Other,
}

impl MimeCategory {
    /// Classify a raw mime-type string from the remote service.
    pub fn from_mime(mime: &str) -> Self {
        match mime {
            m if m.ends_with("folder") => MimeCategory::Folder,
            "application/pdf" => MimeCategory::Pdf,
            m if m.contains("spreadsheet") || m.contains("excel") || m == "text/csv" => {
                MimeCategory::Spreadsheet
            }
            m if m.contains("presentation") || m.contains("powerpoint") => {
                MimeCategory::Presentation
            }
            m if m.contains("document") || m.starts_with("text/") || m.contains("msword") => {
                MimeCategory::Document
            }
            m if m.starts_with("image/") => MimeCategory::Image,
            m if m.starts_with("video/") => MimeCategory::Video,
            _ => MimeCategory::Other,
        }
    }

    pub fn is_folder(self) -> bool {
        self == MimeCategory::Folder
    }

    /// Google-style cloud-native documents can't be handled as plain blobs.
    pub fn is_cloud_native(self) -> bool {
        matches!(
            self,
            MimeCategory::Document | MimeCategory::Spreadsheet | MimeCategory::Presentation
        )
    }
}

impl fmt::Display for MimeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MimeCategory::Document => "document",
            MimeCategory::Spreadsheet => "spreadsheet",
            MimeCategory::Presentation => "presentation",
            MimeCategory::Image => "image",
            MimeCategory::Video => "video",
            MimeCategory::Pdf => "pdf",
            MimeCategory::Folder => "folder",
            MimeCategory::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// What the current credential may do to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub can_edit: bool,
    pub can_trash: bool,
    pub can_move: bool,
}

impl Capabilities {
    pub const ALL: Capabilities = Capabilities {
        can_edit: true,
        can_trash: true,
        can_move: true,
    };
}

/// One file (or folder) as observed during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: FileId,
    pub name: String,
    pub mime: MimeCategory,
    pub size_bytes: u64,
    pub modified_at_ms: u64,
    pub created_at_ms: u64,
    /// Parents in remote order. Empty for a root.
    pub parent_ids: Vec<FileId>,
    pub shared: bool,
    /// How many principals besides the owner can see the file.
    #[serde(default)]
    pub collaborator_count: u32,
    #[serde(default)]
    pub trashed: bool,
    /// Remote-supplied content checksum, when the service exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default)]
    pub capabilities: Capabilities,
}

impl FileRecord {
    pub fn is_folder(&self) -> bool {
        self.mime.is_folder()
    }

    /// Lowercased extension without the dot, if the name has one.
    pub fn extension(&self) -> Option<String> {
        let idx = self.name.rfind('.')?;
        let ext = &self.name[idx + 1..];
        if ext.is_empty() || idx == 0 {
            None
        } else {
            Some(ext.to_ascii_lowercase())
        }
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod file_tests;
