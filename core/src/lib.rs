pub mod computer;
pub mod config;
pub mod error;
pub mod ffi;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod profile;
pub mod relational;
pub mod synthetic;
pub mod units;
pub mod xml;

uniffi::setup_scaffolding!();

pub use config::{ImportConfig, PlaceholderStats};
pub use error::{ImportError, ImportResult};
pub use models::{
    Buddy, BuddyId, Dive, DiveConditions, DiveId, DiveLog, DiveLogistics, DiveSample, DiveSite,
    RecorderInfo, SiteId, SupplyType, TankUsage, WaterType,
};
pub use orchestrator::{complete_profiles, ensure_profile};
