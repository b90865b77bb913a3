//! Live enforcement settings.
//!
//! The manager re-reads its settings on every `tick()` call through the
//! [`SettingsSource`] seam, so configuration changes take effect on the
//! next sweep without reconstructing anything. Loading settings from disk
//! is the hosting runtime's concern; [`SharedSettings`] is the provided
//! in-memory implementation for hosts that push updates.

use outpost_event_system::RegionBounds;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// Default sweep interval for serde deserialization
fn default_check_interval() -> u64 {
    1000
}

fn default_enforce() -> bool {
    true
}

/// Boundary enforcement configuration.
///
/// Owned by configuration and read-only to the boundary loop; the region
/// containment test ([`RegionBounds::contains`]) is pure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundarySettings {
    /// Whether boundary enforcement runs at all
    #[serde(default = "default_enforce")]
    pub enforce: bool,
    /// Minimum time between executed sweeps, in milliseconds
    #[serde(default = "default_check_interval")]
    pub check_interval_ms: u64,
    /// The permitted region tracked actors must stay inside
    pub bounds: RegionBounds,
}

impl BoundarySettings {
    /// The sweep interval as a [`Duration`].
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    /// Validates the settings for consistency.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the settings are valid, or an error string describing
    /// the issue.
    pub fn validate(&self) -> Result<(), String> {
        if self.bounds.min_x >= self.bounds.max_x {
            return Err("Region min_x must be less than max_x".to_string());
        }
        if self.bounds.min_y >= self.bounds.max_y {
            return Err("Region min_y must be less than max_y".to_string());
        }
        if self.bounds.min_z >= self.bounds.max_z {
            return Err("Region min_z must be less than max_z".to_string());
        }
        Ok(())
    }
}

impl Default for BoundarySettings {
    fn default() -> Self {
        Self {
            enforce: true,
            check_interval_ms: 1000,
            bounds: RegionBounds {
                min_x: -1000.0,
                max_x: 1000.0,
                min_y: -1000.0,
                max_y: 1000.0,
                min_z: -100.0,
                max_z: 100.0,
            },
        }
    }
}

/// Source of the current enforcement settings.
///
/// Implementations must return a coherent snapshot; the manager reads one
/// per `tick()` and never caches across ticks.
pub trait SettingsSource: Send + Sync {
    /// Returns the settings in effect right now.
    fn boundary_settings(&self) -> BoundarySettings;
}

/// Lock-backed [`SettingsSource`] for hosts that push settings updates.
///
/// An [`update`](SharedSettings::update) takes effect on the next sweep.
#[derive(Debug)]
pub struct SharedSettings {
    inner: RwLock<BoundarySettings>,
}

impl SharedSettings {
    /// Wraps the given settings for shared live reads.
    pub fn new(settings: BoundarySettings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    /// Replaces the current settings.
    pub fn update(&self, settings: BoundarySettings) {
        *self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner) = settings;
    }
}

impl SettingsSource for SharedSettings {
    fn boundary_settings(&self) -> BoundarySettings {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for SharedSettings {
    fn default() -> Self {
        Self::new(BoundarySettings::default())
    }
}
