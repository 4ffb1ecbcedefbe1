//! INI configuration file.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;

use crate::anchors::DEFAULT_MAX_ANCHORS;
use crate::logging::LoggingConfig;
use crate::scene::ObjectId;
use crate::sync::{SyncConfig, DEFAULT_FAR_CLIP, DEFAULT_NEAR_CLIP, DEFAULT_TRACKED_OBJECT};
use crate::taps::DEFAULT_TAP_QUEUE_CAPACITY;
use crate::tracking::PlaneType;

/// Directory under the user's home holding arbridge files.
pub const CONFIG_DIR_NAME: &str = ".arbridge";

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Default number of simulated render ticks (0 runs until interrupted).
pub const DEFAULT_SIMULATION_TICKS: u64 = 600;

/// Default simulated render rate.
pub const DEFAULT_FRAME_RATE: u32 = 60;

/// Default delay between simulated taps.
pub const DEFAULT_TAP_INTERVAL_MS: u64 = 250;

/// Errors loading, validating or saving the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(String),

    #[error("invalid value '{value}' for {section}.{key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(section: &str, key: &str, value: impl ToString, reason: impl ToString) -> Self {
        ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Path of the user's configuration file, `~/.arbridge/config.ini`.
///
/// Falls back to the current directory when no home directory is known.
pub fn config_file_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// `[taps]`
#[derive(Debug, Clone, PartialEq)]
pub struct TapSettings {
    pub queue_capacity: usize,
}

/// `[anchors]`
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorSettings {
    pub max_anchors: usize,
    pub tracked_object: String,
}

/// `[camera]`
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSettings {
    pub near_clip: f32,
    pub far_clip: f32,
}

/// `[planes]`
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneSettings {
    pub search_type: PlaneType,
}

/// `[lighting]`
#[derive(Debug, Clone, PartialEq)]
pub struct LightingSettings {
    pub apply_light_estimate: bool,
}

/// `[simulation]`, used by the CLI's scripted run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    /// Render ticks to run; 0 runs until interrupted.
    pub ticks: u64,
    pub frame_rate: u32,
    pub tap_interval_ms: u64,
}

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub taps: TapSettings,
    pub anchors: AnchorSettings,
    pub camera: CameraSettings,
    pub planes: PlaneSettings,
    pub lighting: LightingSettings,
    pub logging: LoggingConfig,
    pub simulation: SimulationSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            taps: TapSettings {
                queue_capacity: DEFAULT_TAP_QUEUE_CAPACITY,
            },
            anchors: AnchorSettings {
                max_anchors: DEFAULT_MAX_ANCHORS,
                tracked_object: DEFAULT_TRACKED_OBJECT.to_string(),
            },
            camera: CameraSettings {
                near_clip: DEFAULT_NEAR_CLIP,
                far_clip: DEFAULT_FAR_CLIP,
            },
            planes: PlaneSettings {
                search_type: PlaneType::HorizontalUpward,
            },
            lighting: LightingSettings {
                apply_light_estimate: false,
            },
            logging: LoggingConfig::default(),
            simulation: SimulationSettings {
                ticks: DEFAULT_SIMULATION_TICKS,
                frame_rate: DEFAULT_FRAME_RATE,
                tap_interval_ms: DEFAULT_TAP_INTERVAL_MS,
            },
        }
    }
}

impl ConfigFile {
    /// Load from [`config_file_path`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigError::Read {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(e) => ConfigError::Parse(e.to_string()),
        })?;
        Self::from_ini(&ini)
    }

    /// Parse INI text. Missing sections and keys fall back to defaults.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            taps: TapSettings {
                queue_capacity: read(ini, "taps", "queue_capacity", defaults.taps.queue_capacity)?,
            },
            anchors: AnchorSettings {
                max_anchors: read(ini, "anchors", "max_anchors", defaults.anchors.max_anchors)?,
                tracked_object: read_string(
                    ini,
                    "anchors",
                    "tracked_object",
                    &defaults.anchors.tracked_object,
                ),
            },
            camera: CameraSettings {
                near_clip: read(ini, "camera", "near_clip", defaults.camera.near_clip)?,
                far_clip: read(ini, "camera", "far_clip", defaults.camera.far_clip)?,
            },
            planes: PlaneSettings {
                search_type: read(ini, "planes", "search_type", defaults.planes.search_type)?,
            },
            lighting: LightingSettings {
                apply_light_estimate: read_bool(
                    ini,
                    "lighting",
                    "apply_light_estimate",
                    defaults.lighting.apply_light_estimate,
                )?,
            },
            logging: LoggingConfig {
                level: read_string(ini, "logging", "level", &defaults.logging.level),
                file: ini
                    .get_from(Some("logging"), "file")
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(PathBuf::from),
            },
            simulation: SimulationSettings {
                ticks: read(ini, "simulation", "ticks", defaults.simulation.ticks)?,
                frame_rate: read(ini, "simulation", "frame_rate", defaults.simulation.frame_rate)?,
                tap_interval_ms: read(
                    ini,
                    "simulation",
                    "tap_interval_ms",
                    defaults.simulation.tap_interval_ms,
                )?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field and range constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.taps.queue_capacity == 0 {
            return Err(ConfigError::invalid("taps", "queue_capacity", 0, "must be at least 1"));
        }
        if self.anchors.max_anchors == 0 {
            return Err(ConfigError::invalid("anchors", "max_anchors", 0, "must be at least 1"));
        }
        if self.anchors.tracked_object.trim().is_empty() {
            return Err(ConfigError::invalid("anchors", "tracked_object", "", "must not be empty"));
        }
        if !(self.camera.near_clip > 0.0) {
            return Err(ConfigError::invalid(
                "camera",
                "near_clip",
                self.camera.near_clip,
                "must be positive",
            ));
        }
        if !(self.camera.far_clip > self.camera.near_clip) {
            return Err(ConfigError::invalid(
                "camera",
                "far_clip",
                self.camera.far_clip,
                format!("must be greater than near_clip ({})", self.camera.near_clip),
            ));
        }
        if self.simulation.frame_rate == 0 {
            return Err(ConfigError::invalid("simulation", "frame_rate", 0, "must be at least 1"));
        }
        Ok(())
    }

    /// Save to [`config_file_path`].
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Write the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        self.to_ini()
            .write_to_file(path)
            .map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Render as an INI document.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some("taps"))
            .set("queue_capacity", self.taps.queue_capacity.to_string());
        ini.with_section(Some("anchors"))
            .set("max_anchors", self.anchors.max_anchors.to_string())
            .set("tracked_object", self.anchors.tracked_object.as_str());
        ini.with_section(Some("camera"))
            .set("near_clip", self.camera.near_clip.to_string())
            .set("far_clip", self.camera.far_clip.to_string());
        ini.with_section(Some("planes"))
            .set("search_type", self.planes.search_type.as_str());
        ini.with_section(Some("lighting")).set(
            "apply_light_estimate",
            self.lighting.apply_light_estimate.to_string(),
        );
        ini.with_section(Some("logging"))
            .set("level", self.logging.level.as_str())
            .set(
                "file",
                self.logging
                    .file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            );
        ini.with_section(Some("simulation"))
            .set("ticks", self.simulation.ticks.to_string())
            .set("frame_rate", self.simulation.frame_rate.to_string())
            .set("tap_interval_ms", self.simulation.tap_interval_ms.to_string());
        ini
    }

    /// Settings for [`crate::sync::PoseSyncLoop`].
    pub fn to_sync_config(&self) -> SyncConfig {
        SyncConfig::default()
            .with_tap_queue_capacity(self.taps.queue_capacity)
            .with_max_anchors(self.anchors.max_anchors)
            .with_tracked_object(ObjectId::new(self.anchors.tracked_object.trim()))
            .with_clip_planes(self.camera.near_clip, self.camera.far_clip)
            .with_search_plane_type(self.planes.search_type)
            .with_light_estimate(self.lighting.apply_light_estimate)
    }
}

fn read<T>(ini: &Ini, section: &str, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match ini.get_from(Some(section), key).map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(section, key, value, e)),
    }
}

fn read_string(ini: &Ini, section: &str, key: &str, default: &str) -> String {
    match ini.get_from(Some(section), key).map(str::trim) {
        None | Some("") => default.to_string(),
        Some(value) => value.to_string(),
    }
}

pub(super) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn read_bool(ini: &Ini, section: &str, key: &str, default: bool) -> Result<bool, ConfigError> {
    match ini.get_from(Some(section), key).map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => parse_bool(value)
            .ok_or_else(|| ConfigError::invalid(section, key, value, "expected true or false")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = ConfigFile::parse("").unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.to_sync_config(), SyncConfig::default());
    }

    #[test]
    fn test_parse_overrides() {
        let config = ConfigFile::parse(
            "[taps]\nqueue_capacity = 4\n\
             [anchors]\nmax_anchors = 3\ntracked_object = moon\n\
             [camera]\nnear_clip = 0.05\nfar_clip = 50\n\
             [planes]\nsearch_type = vertical\n\
             [lighting]\napply_light_estimate = yes\n\
             [logging]\nlevel = debug\nfile = /tmp/arbridge.log\n",
        )
        .unwrap();

        let sync = config.to_sync_config();
        assert_eq!(sync.tap_queue_capacity, 4);
        assert_eq!(sync.max_anchors, 3);
        assert_eq!(sync.tracked_object, ObjectId::from("moon"));
        assert_eq!(sync.near_clip, 0.05);
        assert_eq!(sync.far_clip, 50.0);
        assert_eq!(sync.search_plane_type, PlaneType::Vertical);
        assert!(sync.apply_light_estimate);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/arbridge.log")));
    }

    #[test]
    fn test_empty_log_file_means_console_only() {
        let config = ConfigFile::parse("[logging]\nfile =\n").unwrap();
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_invalid_number() {
        let err = ConfigFile::parse("[taps]\nqueue_capacity = lots\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref section, ref key, .. } if section == "taps" && key == "queue_capacity"
        ));
    }

    #[test]
    fn test_invalid_plane_type() {
        let err = ConfigFile::parse("[planes]\nsearch_type = diagonal\n").unwrap_err();
        assert!(err.to_string().contains("planes.search_type"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(ConfigFile::parse("[anchors]\nmax_anchors = 0\n").is_err());
        assert!(ConfigFile::parse("[taps]\nqueue_capacity = 0\n").is_err());
    }

    #[test]
    fn test_clip_planes_validated() {
        assert!(ConfigFile::parse("[camera]\nnear_clip = 0\n").is_err());
        assert!(ConfigFile::parse("[camera]\nnear_clip = 5\nfar_clip = 1\n").is_err());
    }

    #[test]
    fn test_invalid_bool() {
        assert!(ConfigFile::parse("[lighting]\napply_light_estimate = maybe\n").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.anchors.max_anchors = 2;
        config.planes.search_type = PlaneType::HorizontalDownward;
        config.logging.file = Some(PathBuf::from("/tmp/arbridge.log"));
        config.simulation.ticks = 0;
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_file_path() {
        let path = config_file_path();
        assert!(path.ends_with(".arbridge/config.ini"));
    }
}
