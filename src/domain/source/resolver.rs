// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/source/resolver.rs
//
// Host boundary: opens fresh byte streams for assets, content URIs and resources.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Seek};
use std::path::{Component, Path, PathBuf};

use crate::domain::orientation::Orientation;

/// Buffered, seekable byte stream. A new one is opened for every decode pass.
pub trait ReadSeek: BufRead + Seek + Send {}

impl<T: BufRead + Seek + Send> ReadSeek for T {}

pub type SourceStream = Box<dyn ReadSeek>;

/// Opens image streams on behalf of [`super::ImageSource`].
///
/// Implemented by the host: an asset manager, a content provider, a resource
/// table. Streams are not reused across calls.
pub trait SourceResolver: Send + Sync {
    /// Open a bundled asset by file name.
    fn open_asset(&self, name: &str) -> io::Result<SourceStream>;

    /// Open an opaque content reference (URI).
    fn open_content(&self, uri: &str) -> io::Result<SourceStream>;

    /// Open an embedded resource by identifier.
    fn open_resource(&self, id: u32) -> io::Result<SourceStream>;

    /// Orientation recorded by the media store for a content reference.
    /// `None` when the store has no row or no orientation column.
    fn content_orientation(&self, _uri: &str) -> Option<Orientation> {
        None
    }
}

#[derive(Debug, Clone)]
enum Resource {
    File(PathBuf),
    Embedded(&'static [u8]),
}

/// File-system backed resolver.
///
/// - assets resolve relative to `asset_root`
/// - content references are `file://` URIs or plain paths
/// - resources come from a registered id table (files or embedded bytes)
#[derive(Debug, Clone, Default)]
pub struct FsResolver {
    asset_root: PathBuf,
    resources: HashMap<u32, Resource>,
    orientations: HashMap<String, Orientation>,
}

impl FsResolver {
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_resource(mut self, id: u32, path: impl Into<PathBuf>) -> Self {
        self.resources.insert(id, Resource::File(path.into()));
        self
    }

    #[must_use]
    pub fn with_embedded_resource(mut self, id: u32, bytes: &'static [u8]) -> Self {
        self.resources.insert(id, Resource::Embedded(bytes));
        self
    }

    /// Record a store orientation column (clockwise degrees) for a content URI.
    #[must_use]
    pub fn with_content_orientation(mut self, uri: impl Into<String>, degrees: i32) -> Self {
        self.orientations
            .insert(uri.into(), Orientation::from_degrees(degrees));
        self
    }

    fn open_file(path: &Path) -> io::Result<SourceStream> {
        let file = File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Strip a `file://` scheme, leaving plain paths alone.
pub fn content_path(uri: &str) -> &Path {
    Path::new(uri.strip_prefix("file://").unwrap_or(uri))
}

impl SourceResolver for FsResolver {
    fn open_asset(&self, name: &str) -> io::Result<SourceStream> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            log::warn!("Rejected asset name outside the asset root: {name}");
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("asset name escapes asset root: {name}"),
            ));
        }
        Self::open_file(&self.asset_root.join(relative))
    }

    fn open_content(&self, uri: &str) -> io::Result<SourceStream> {
        Self::open_file(content_path(uri))
    }

    fn open_resource(&self, id: u32) -> io::Result<SourceStream> {
        match self.resources.get(&id) {
            Some(Resource::File(path)) => Self::open_file(path),
            Some(Resource::Embedded(bytes)) => Ok(Box::new(Cursor::new(*bytes))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no resource registered for id {id}"),
            )),
        }
    }

    fn content_orientation(&self, uri: &str) -> Option<Orientation> {
        self.orientations.get(uri).copied()
    }
}
