// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/media.rs
//
// Records supplied by the media-query layer.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use super::orientation::Orientation;
use super::source::{ImageSource, SourceResolver};

/// Folder label used when the store reports no name (or the volume root "0").
pub const ROOT_FOLDER_NAME: &str = "/";

/// One row from the media store.
///
/// Two items are equal when they point at the same content reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: u64,
    pub display_name: String,
    pub mime_type: String,
    /// Encoded size in bytes.
    pub size: u64,
    pub width: u32,
    pub height: u32,
    /// Store orientation column, clockwise degrees.
    #[serde(default)]
    pub orientation: i32,
    /// Seconds since the epoch.
    pub date_modified: i64,
    pub folder_id: u64,
    #[serde(default = "root_folder_name", deserialize_with = "deserialize_folder_name")]
    pub folder_name: String,
    pub content_ref: String,
}

impl PartialEq for MediaItem {
    fn eq(&self, other: &Self) -> bool {
        self.content_ref == other.content_ref
    }
}

impl Eq for MediaItem {}

/// Normalise a store folder name: missing, empty and `"0"` all mean the root.
pub fn folder_display_name(raw: Option<&str>) -> String {
    match raw {
        None | Some("" | "0") => ROOT_FOLDER_NAME.to_string(),
        Some(name) => name.to_string(),
    }
}

fn root_folder_name() -> String {
    ROOT_FOLDER_NAME.to_string()
}

fn deserialize_folder_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(folder_display_name(raw.as_deref()))
}

impl MediaItem {
    /// Orientation hint from the store column.
    pub fn orientation_hint(&self) -> Orientation {
        Orientation::from_degrees(self.orientation)
    }

    /// Pixel dimensions as the picture is shown (store width/height are pre-rotation).
    pub fn display_dimensions(&self) -> (u32, u32) {
        self.orientation_hint()
            .display_dimensions(self.width, self.height)
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Image source reading this item through its content reference.
    pub fn image_source(&self, resolver: Arc<dyn SourceResolver>) -> ImageSource {
        ImageSource::content(self.content_ref.clone(), resolver)
    }
}

/// Aggregate over the items of one folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFolder {
    pub id: u64,
    pub name: String,
    /// Latest modification among the folder's items.
    pub date_modified: i64,
    pub count: usize,
}

impl MediaFolder {
    /// Group items by folder, newest folder first.
    pub fn group(items: &[MediaItem]) -> Vec<MediaFolder> {
        let mut folders: BTreeMap<u64, MediaFolder> = BTreeMap::new();

        for item in items {
            folders
                .entry(item.folder_id)
                .and_modify(|folder| {
                    folder.count += 1;
                    folder.date_modified = folder.date_modified.max(item.date_modified);
                })
                .or_insert_with(|| MediaFolder {
                    id: item.folder_id,
                    name: item.folder_name.clone(),
                    date_modified: item.date_modified,
                    count: 1,
                });
        }

        let mut folders: Vec<_> = folders.into_values().collect();
        folders.sort_by(|a, b| {
            b.date_modified
                .cmp(&a.date_modified)
                .then_with(|| a.id.cmp(&b.id))
        });
        folders
    }
}
