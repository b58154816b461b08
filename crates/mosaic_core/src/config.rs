//! # Engine Configuration
//!
//! Read once at startup from a TOML file:
//!
//! ```toml
//! backend = "indirect"
//! limit_updates = true
//! ```
//!
//! Every key is optional; missing keys fall back to [`MosaicConfig::default`].

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MosaicError, MosaicResult};

/// Which rendering backend drives the instances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum BackendType {
    /// Instanced rendering disabled entirely: managers keep no instances.
    Off,
    /// CPU-side batching into already-built vertex buffers.
    Batching,
    /// Hardware instancing, one draw per mesh.
    #[default]
    Instancing,
    /// GPU-driven indirect draws out of the packed mesh pool.
    Indirect,
}

impl BackendType {
    /// All backends, in order of increasing GPU involvement.
    pub const ALL: [Self; 4] = [Self::Off, Self::Batching, Self::Instancing, Self::Indirect];

    /// Lowercase name used in config files and on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Batching => "batching",
            Self::Instancing => "instancing",
            Self::Indirect => "indirect",
        }
    }

    /// Every accepted backend name.
    #[must_use]
    pub fn valid_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|backend| backend.name()).collect()
    }

    /// Returns false for [`BackendType::Off`].
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::Off)
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for BackendType {
    type Error = MosaicError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl FromStr for BackendType {
    type Err = MosaicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|backend| backend.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MosaicError::UnknownBackend {
                found: s.to_owned(),
                valid: Self::valid_names(),
            })
    }
}

/// Engine-wide settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    /// Rendering backend.
    pub backend: BackendType,
    /// Throttle tick/frame updates of distant instances.
    pub limit_updates: bool,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            backend: BackendType::default(),
            limit_updates: true,
        }
    }
}

impl MosaicConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> MosaicResult<Self> {
        toml::from_str(text).map_err(|e| MosaicError::ConfigParse(e.to_string()))
    }

    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> MosaicResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MosaicError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
