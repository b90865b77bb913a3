//! # Core Type Definitions
//!
//! Fundamental types shared by every Outpost subsystem: actor identity,
//! world positioning, and spatial region boundaries.
//!
//! ## Design Principles
//!
//! - **Type Safety**: Wrapper types prevent ID confusion
//! - **Precision**: Double-precision floats for accurate large-world positioning
//! - **Serialization**: All types support JSON serialization for network transmission

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player in the game world.
///
/// This is a wrapper around UUID that provides type safety and ensures
/// player IDs cannot be confused with other types of IDs in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Creates a new random player ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a player ID from a string representation.
    ///
    /// # Arguments
    ///
    /// * `s` - A string slice containing a valid UUID
    ///
    /// # Returns
    ///
    /// Returns `Ok(PlayerId)` if the string is a valid UUID, otherwise returns
    /// `Err(uuid::Error)` with details about the parsing failure.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::str::FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str(s)
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a 3D position in the game world.
///
/// Uses double-precision floating point for maximum accuracy in position
/// calculations. This is essential for large game worlds where
/// single-precision might introduce noticeable errors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate (typically east-west axis)
    pub x: f64,
    /// Y coordinate (typically vertical axis)
    pub y: f64,
    /// Z coordinate (typically north-south axis)
    pub z: f64,
}

impl Position {
    /// Creates a new position with the specified coordinates.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Defines the spatial boundaries of a permitted region.
///
/// This structure defines a 3D bounding box that encompasses all the space
/// an actor is allowed to occupy. It's used for:
/// - Boundary enforcement sweeps
/// - Determining which region a player is in
/// - Resource allocation planning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionBounds {
    /// Minimum X coordinate (western boundary)
    pub min_x: f64,
    /// Maximum X coordinate (eastern boundary)
    pub max_x: f64,
    /// Minimum Y coordinate (bottom boundary)
    pub min_y: f64,
    /// Maximum Y coordinate (top boundary)
    pub max_y: f64,
    /// Minimum Z coordinate (southern boundary)
    pub min_z: f64,
    /// Maximum Z coordinate (northern boundary)
    pub max_z: f64,
}

impl RegionBounds {
    /// Returns whether the given position lies inside this region.
    ///
    /// The test is closed on all faces: a position exactly on a boundary
    /// plane counts as inside. Pure and side-effect free.
    pub fn contains(&self, position: Position) -> bool {
        position.x >= self.min_x
            && position.x <= self.max_x
            && position.y >= self.min_y
            && position.y <= self.max_y
            && position.z >= self.min_z
            && position.z <= self.max_z
    }
}
