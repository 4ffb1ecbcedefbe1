//! Configuration file support.
//!
//! Settings live in `~/.arbridge/config.ini`:
//!
//! ```ini
//! [taps]
//! queue_capacity = 16
//!
//! [anchors]
//! max_anchors = 1
//! tracked_object = earth
//!
//! [camera]
//! near_clip = 0.1
//! far_clip = 100
//!
//! [planes]
//! search_type = horizontal_upward
//!
//! [lighting]
//! apply_light_estimate = false
//!
//! [logging]
//! level = info
//! file =
//!
//! [simulation]
//! ticks = 600
//! frame_rate = 60
//! tap_interval_ms = 250
//! ```
//!
//! Missing keys take their defaults. CLI arguments override file values.

mod file;
mod keys;

pub use file::{
    config_file_path, AnchorSettings, CameraSettings, ConfigError, ConfigFile, LightingSettings,
    PlaneSettings, SimulationSettings, TapSettings, CONFIG_DIR_NAME, CONFIG_FILE_NAME,
    DEFAULT_FRAME_RATE, DEFAULT_SIMULATION_TICKS, DEFAULT_TAP_INTERVAL_MS,
};
pub use keys::{ConfigKey, UnknownConfigKey};
