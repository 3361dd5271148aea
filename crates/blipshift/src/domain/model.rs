//! Domain models for coordinates, records, and offsets.

use std::fmt;
use std::ops::{Add, AddAssign, Sub};

use serde::Serialize;

use crate::domain::document::NodeId;

/// A point or translation in 3D space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm.
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn components(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Format with a fixed number of decimals, e.g. `(1.000000, 2.000000, 3.000000)`.
    pub fn display_with(&self, precision: usize) -> String {
        format!(
            "({:.p$}, {:.p$}, {:.p$})",
            self.x,
            self.y,
            self.z,
            p = precision
        )
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(value: [f64; 3]) -> Self {
        Vec3::new(value[0], value[1], value[2])
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X={}, Y={}, Z={}", self.x, self.y, self.z)
    }
}

/// Index of a document inside the working set it was loaded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DocumentId(pub usize);

impl DocumentId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One editable point extracted from a source document.
///
/// The record does not own its document: `document` and `node` locate the element the
/// coordinates were read from so updated values can be written back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinateRecord {
    pub name: String,
    pub position: Vec3,
    pub file: String,
    #[serde(skip)]
    pub document: DocumentId,
    #[serde(skip)]
    pub node: NodeId,
}

impl CoordinateRecord {
    /// Menu label such as `Garage - (1.000000, 2.000000, 3.000000)`.
    pub fn label(&self, precision: usize) -> String {
        format!("{} - {}", self.name, self.position.display_with(precision))
    }
}

/// Translation from a record to a reference point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OffsetVector {
    pub delta: Vec3,
    pub distance: f64,
}
