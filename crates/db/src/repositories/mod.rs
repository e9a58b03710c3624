//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod location_repo;
pub mod reading_repo;
pub mod system_setting_repo;

pub use location_repo::{CameraDeviceRepo, LocationRepo, SensorDeviceRepo};
pub use reading_repo::{ModelReadingRepo, SensorReadingRepo, WeatherRepo};
pub use system_setting_repo::SystemSettingRepo;
