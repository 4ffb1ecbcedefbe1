//! Individual `section.key` settings, for `config get` / `config set`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::{parse_bool, ConfigError, ConfigFile};

/// A single setting in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    TapsQueueCapacity,
    AnchorsMaxAnchors,
    AnchorsTrackedObject,
    CameraNearClip,
    CameraFarClip,
    PlanesSearchType,
    LightingApplyLightEstimate,
    LoggingLevel,
    LoggingFile,
    SimulationTicks,
    SimulationFrameRate,
    SimulationTapIntervalMs,
}

impl ConfigKey {
    /// Every key, in file order.
    pub const ALL: [ConfigKey; 12] = [
        ConfigKey::TapsQueueCapacity,
        ConfigKey::AnchorsMaxAnchors,
        ConfigKey::AnchorsTrackedObject,
        ConfigKey::CameraNearClip,
        ConfigKey::CameraFarClip,
        ConfigKey::PlanesSearchType,
        ConfigKey::LightingApplyLightEstimate,
        ConfigKey::LoggingLevel,
        ConfigKey::LoggingFile,
        ConfigKey::SimulationTicks,
        ConfigKey::SimulationFrameRate,
        ConfigKey::SimulationTapIntervalMs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::TapsQueueCapacity => "taps.queue_capacity",
            ConfigKey::AnchorsMaxAnchors => "anchors.max_anchors",
            ConfigKey::AnchorsTrackedObject => "anchors.tracked_object",
            ConfigKey::CameraNearClip => "camera.near_clip",
            ConfigKey::CameraFarClip => "camera.far_clip",
            ConfigKey::PlanesSearchType => "planes.search_type",
            ConfigKey::LightingApplyLightEstimate => "lighting.apply_light_estimate",
            ConfigKey::LoggingLevel => "logging.level",
            ConfigKey::LoggingFile => "logging.file",
            ConfigKey::SimulationTicks => "simulation.ticks",
            ConfigKey::SimulationFrameRate => "simulation.frame_rate",
            ConfigKey::SimulationTapIntervalMs => "simulation.tap_interval_ms",
        }
    }

    fn section_and_key(&self) -> (&'static str, &'static str) {
        self.as_str().split_once('.').unwrap_or(("", self.as_str()))
    }

    /// Current value as it would appear in the file.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::TapsQueueCapacity => config.taps.queue_capacity.to_string(),
            ConfigKey::AnchorsMaxAnchors => config.anchors.max_anchors.to_string(),
            ConfigKey::AnchorsTrackedObject => config.anchors.tracked_object.clone(),
            ConfigKey::CameraNearClip => config.camera.near_clip.to_string(),
            ConfigKey::CameraFarClip => config.camera.far_clip.to_string(),
            ConfigKey::PlanesSearchType => config.planes.search_type.to_string(),
            ConfigKey::LightingApplyLightEstimate => {
                config.lighting.apply_light_estimate.to_string()
            }
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingFile => config
                .logging
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            ConfigKey::SimulationTicks => config.simulation.ticks.to_string(),
            ConfigKey::SimulationFrameRate => config.simulation.frame_rate.to_string(),
            ConfigKey::SimulationTapIntervalMs => config.simulation.tap_interval_ms.to_string(),
        }
    }

    /// Parse and store `value`, then re-validate the whole configuration.
    ///
    /// On error `config` is left unchanged.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let mut updated = config.clone();
        let value = value.trim();
        match self {
            ConfigKey::TapsQueueCapacity => updated.taps.queue_capacity = self.parse(value)?,
            ConfigKey::AnchorsMaxAnchors => updated.anchors.max_anchors = self.parse(value)?,
            ConfigKey::AnchorsTrackedObject => updated.anchors.tracked_object = value.to_string(),
            ConfigKey::CameraNearClip => updated.camera.near_clip = self.parse(value)?,
            ConfigKey::CameraFarClip => updated.camera.far_clip = self.parse(value)?,
            ConfigKey::PlanesSearchType => updated.planes.search_type = self.parse(value)?,
            ConfigKey::LightingApplyLightEstimate => {
                updated.lighting.apply_light_estimate =
                    parse_bool(value).ok_or_else(|| self.invalid(value, "expected true or false"))?
            }
            ConfigKey::LoggingLevel => updated.logging.level = value.to_string(),
            ConfigKey::LoggingFile => {
                updated.logging.file = (!value.is_empty()).then(|| PathBuf::from(value))
            }
            ConfigKey::SimulationTicks => updated.simulation.ticks = self.parse(value)?,
            ConfigKey::SimulationFrameRate => updated.simulation.frame_rate = self.parse(value)?,
            ConfigKey::SimulationTapIntervalMs => {
                updated.simulation.tap_interval_ms = self.parse(value)?
            }
        }
        updated.validate()?;
        *config = updated;
        Ok(())
    }

    fn parse<T>(&self, value: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        value.parse().map_err(|e: T::Err| self.invalid(value, e))
    }

    fn invalid(&self, value: &str, reason: impl fmt::Display) -> ConfigError {
        let (section, key) = self.section_and_key();
        ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown `section.key` name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown configuration key '{0}'")]
pub struct UnknownConfigKey(pub String);

impl FromStr for ConfigKey {
    type Err = UnknownConfigKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.as_str() == wanted)
            .ok_or_else(|| UnknownConfigKey(s.to_string()))
    }
}
