//! Track assets and the track catalog.
//!
//! A `TrackAsset` is the opaque locator the backend loads. The catalog binds
//! each logical `TrackId` to exactly one asset and never changes after it
//! is built.

use std::path::{Path, PathBuf};

use crate::config::SessionConfig;
use crate::types::TrackId;

/// Represents where the audio for a track comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackAsset {
    /// A music file on disk.
    File {
        /// The name shown in logs (e.g., "home_loop.mp3").
        name: String,
        /// The full path to the file.
        path: PathBuf,
    },
    /// A tone loop synthesised at load time.
    Embedded {
        /// The name of the embedded loop (e.g., "home").
        name: String,
    },
}

impl TrackAsset {
    /// Creates a file asset. The path is not checked until load time.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::File { name, path }
    }

    /// Creates an embedded asset.
    #[must_use]
    pub fn embedded(name: impl Into<String>) -> Self {
        Self::Embedded { name: name.into() }
    }

    /// Returns the display name of the asset.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Embedded { name } => name,
        }
    }

    /// Returns the file path if this is a file asset.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File { path, .. } => Some(path),
            Self::Embedded { .. } => None,
        }
    }

    /// Returns true if this is an embedded asset.
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded { .. })
    }
}

/// Immutable mapping from track ids to assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackCatalog {
    home: TrackAsset,
    game: TrackAsset,
}

impl TrackCatalog {
    /// Creates a catalog from explicit assets.
    #[must_use]
    pub fn new(home: TrackAsset, game: TrackAsset) -> Self {
        Self { home, game }
    }

    /// The catalog of synthesised loops, usable without any files.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(
            TrackAsset::embedded(TrackId::Home.as_str()),
            TrackAsset::embedded(TrackId::Game.as_str()),
        )
    }

    /// Builds the catalog described by the configuration.
    ///
    /// Without `assets_dir` the built-in loops are used.
    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        match &config.assets_dir {
            Some(dir) => Self::new(
                TrackAsset::file(dir.join(&config.home_track)),
                TrackAsset::file(dir.join(&config.game_track)),
            ),
            None => Self::builtin(),
        }
    }

    /// Returns the asset bound to `track`.
    #[must_use]
    pub fn get(&self, track: TrackId) -> &TrackAsset {
        match track {
            TrackId::Home => &self.home,
            TrackId::Game => &self.game,
        }
    }

    /// Iterates over every (track, asset) pair in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (TrackId, &TrackAsset)> {
        TrackId::ALL.into_iter().map(move |track| (track, self.get(track)))
    }
}

impl Default for TrackCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_asset() {
        let asset = TrackAsset::file("/music/home_loop.mp3");
        assert!(!asset.is_embedded());
        assert_eq!(asset.name(), "home_loop.mp3");
        assert_eq!(asset.path(), Some(Path::new("/music/home_loop.mp3")));
    }

    #[test]
    fn test_embedded_asset() {
        let asset = TrackAsset::embedded("home");
        assert!(asset.is_embedded());
        assert_eq!(asset.name(), "home");
        assert!(asset.path().is_none());
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = TrackCatalog::builtin();
        assert_eq!(catalog.get(TrackId::Home), &TrackAsset::embedded("home"));
        assert_eq!(catalog.get(TrackId::Game), &TrackAsset::embedded("game"));
        assert_eq!(catalog, TrackCatalog::default());
    }

    #[test]
    fn test_catalog_from_config_with_assets_dir() {
        let config = SessionConfig::default().with_assets_dir("/opt/kids/music");
        let catalog = TrackCatalog::from_config(&config);

        assert_eq!(
            catalog.get(TrackId::Home).path(),
            Some(Path::new("/opt/kids/music/home_loop.mp3"))
        );
        assert_eq!(
            catalog.get(TrackId::Game).path(),
            Some(Path::new("/opt/kids/music/game_loop.mp3"))
        );
    }

    #[test]
    fn test_catalog_from_config_without_assets_dir() {
        let catalog = TrackCatalog::from_config(&SessionConfig::default());
        assert!(catalog.get(TrackId::Home).is_embedded());
    }

    #[test]
    fn test_catalog_iter_order() {
        let catalog = TrackCatalog::builtin();
        let tracks: Vec<TrackId> = catalog.iter().map(|(track, _)| track).collect();
        assert_eq!(tracks, vec![TrackId::Home, TrackId::Game]);
    }
}
