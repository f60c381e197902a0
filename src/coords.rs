//! Integer grid coordinates and their canonical `"x,y,z"` keys.
//!
//! Pieces and outward face directions are both identified by an integer
//! triple. Pieces live on the 3x3x3 lattice `{-1, 0, 1}^3`; directions are
//! the six signed unit axes.

use std::fmt;
use std::str::FromStr;

use nalgebra::Vector3;

use crate::error::Error;

/// A lattice coordinate, each axis in `{-1, 0, 1}` for pieces.
pub type Coord = (i32, i32, i32);

/// Lattice values along one axis.
const AXIS_VALUES: [i32; 3] = [-1, 0, 1];

/// All 27 piece coordinates, x-major.
pub const ALL_COORDINATES: [Coord; 27] = {
    let mut coords = [(0, 0, 0); 27];
    let mut i = 0;
    while i < 27 {
        coords[i] = (
            AXIS_VALUES[i / 9],
            AXIS_VALUES[(i / 3) % 3],
            AXIS_VALUES[i % 3],
        );
        i += 1;
    }
    coords
};

/// Formats a coordinate as its canonical key.
pub fn coord_key(coord: Coord) -> String {
    format!("{},{},{}", coord.0, coord.1, coord.2)
}

/// Parses a `"x,y,z"` key back into a coordinate.
pub fn parse_coord_key(key: &str) -> Result<Coord, Error> {
    let mut parts = key.split(',').map(|part| part.trim().parse::<i32>());
    let invalid = || Error::InvalidKey(key.to_owned());
    let x = parts.next().ok_or_else(invalid)?.map_err(|_| invalid())?;
    let y = parts.next().ok_or_else(invalid)?.map_err(|_| invalid())?;
    let z = parts.next().ok_or_else(invalid)?.map_err(|_| invalid())?;
    if parts.next().is_some() {
        return Err(invalid());
    }
    Ok((x, y, z))
}

/// Number of axes on which the coordinate sits at the outer shell.
pub fn extremal_axes(coord: Coord) -> usize {
    [coord.0, coord.1, coord.2]
        .iter()
        .filter(|v| v.abs() == 1)
        .count()
}

/// Coordinates of the six face-center pieces.
pub fn center_coordinates() -> Vec<Coord> {
    coordinates_with_extremal_axes(1)
}

/// Coordinates of the twelve edge pieces.
pub fn edge_coordinates() -> Vec<Coord> {
    coordinates_with_extremal_axes(2)
}

/// Coordinates of the eight corner pieces.
pub fn corner_coordinates() -> Vec<Coord> {
    coordinates_with_extremal_axes(3)
}

fn coordinates_with_extremal_axes(count: usize) -> Vec<Coord> {
    ALL_COORDINATES
        .iter()
        .copied()
        .filter(|&coord| extremal_axes(coord) == count)
        .collect()
}

/// One of the six outward axis directions of the cube, in cube-local space.
///
/// Exactly one component is nonzero and it is `+1` or `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectionKey(Coord);

impl DirectionKey {
    pub const POS_X: Self = Self((1, 0, 0));
    pub const NEG_X: Self = Self((-1, 0, 0));
    pub const POS_Y: Self = Self((0, 1, 0));
    pub const NEG_Y: Self = Self((0, -1, 0));
    pub const POS_Z: Self = Self((0, 0, 1));
    pub const NEG_Z: Self = Self((0, 0, -1));

    /// The six directions in a fixed order.
    pub const ALL: [Self; 6] = [
        Self::POS_X,
        Self::NEG_X,
        Self::POS_Y,
        Self::NEG_Y,
        Self::POS_Z,
        Self::NEG_Z,
    ];

    /// Builds a direction from a coordinate, if it is a signed unit axis.
    pub fn from_coord(coord: Coord) -> Option<Self> {
        let (x, y, z) = coord;
        let is_unit_axis = x.abs() + y.abs() + z.abs() == 1;
        is_unit_axis.then_some(Self(coord))
    }

    pub fn coord(self) -> Coord {
        self.0
    }

    pub fn vector(self) -> Vector3<f32> {
        let (x, y, z) = self.0;
        Vector3::new(x as f32, y as f32, z as f32)
    }

    pub fn opposite(self) -> Self {
        let (x, y, z) = self.0;
        Self((-x, -y, -z))
    }

    /// Integer cross product of two directions, re-encoded as a direction.
    ///
    /// Returns `None` for parallel inputs, whose cross product is zero.
    pub fn cross(self, other: Self) -> Option<Self> {
        let (ax, ay, az) = self.0;
        let (bx, by, bz) = other.0;
        Self::from_coord((ay * bz - az * by, az * bx - ax * bz, ax * by - ay * bx))
    }
}

impl fmt::Display for DirectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&coord_key(self.0))
    }
}

impl FromStr for DirectionKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let coord = parse_coord_key(s)?;
        Self::from_coord(coord).ok_or_else(|| Error::InvalidKey(s.to_owned()))
    }
}
