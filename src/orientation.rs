//! Tracks which physical face currently plays front, top and left.
//!
//! The user can drag the whole cube into any orientation, so the logical
//! faces a command names are resolved against the cube's current transform.

use std::fmt;

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::coords::DirectionKey;
use crate::math::euler_xy_rotation;
use crate::scene::{FaceNormalMarker, MarkerRole};

/// Forward reference axis. Slightly off-center so that two faces at equal
/// angles to +Z never tie.
const FORWARD_REFERENCE: Vector3<f32> = Vector3::new(0.25, 0.0, 1.0);

const UP_REFERENCE: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

/// Whole-cube orientation as an Euler pair, in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub x: f32,
    pub y: f32,
}

impl Orientation {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn rotation(&self) -> UnitQuaternion<f32> {
        euler_xy_rotation(self.x, self.y)
    }
}

/// A user-facing face label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalFace {
    Front,
    Top,
    Left,
}

impl LogicalFace {
    pub const ALL: [LogicalFace; 3] = [LogicalFace::Front, LogicalFace::Top, LogicalFace::Left];
}

impl fmt::Display for LogicalFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogicalFace::Front => "front",
            LogicalFace::Top => "top",
            LogicalFace::Left => "left",
        };
        f.write_str(name)
    }
}

/// Current resolution of logical faces to cube-local directions.
///
/// Only valid for the orientation it was computed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrimaryNormals {
    pub front: DirectionKey,
    pub top: DirectionKey,
    pub left: DirectionKey,
}

impl PrimaryNormals {
    pub fn get(&self, face: LogicalFace) -> DirectionKey {
        match face {
            LogicalFace::Front => self.front,
            LogicalFace::Top => self.top,
            LogicalFace::Left => self.left,
        }
    }

    pub fn role_of(&self, key: DirectionKey) -> MarkerRole {
        if key == self.front {
            MarkerRole::Front
        } else if key == self.top {
            MarkerRole::Top
        } else if key == self.left {
            MarkerRole::Left
        } else {
            MarkerRole::Other
        }
    }
}

/// Picks the direction whose world-space image is closest in angle to
/// `reference`, among the directions accepted by `candidate`.
fn closest_direction(
    cube_rotation: &UnitQuaternion<f32>,
    reference: &Vector3<f32>,
    candidate: impl Fn(DirectionKey) -> bool,
) -> DirectionKey {
    DirectionKey::ALL
        .into_iter()
        .filter(|&key| candidate(key))
        .map(|key| (key, (cube_rotation * key.vector()).angle(reference)))
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(key, _)| key)
        .unwrap_or(DirectionKey::POS_Z)
}

/// Resolves front, top and left for a cube rotated by `cube_rotation`.
///
/// Front is the face pointing most towards the viewer, top the face
/// perpendicular to front pointing most upwards, and left is `front x top`.
///
/// The face opposite front is never a top candidate: with front tilted far
/// down it can be the most upward face, and `front x top` would vanish.
pub fn resolve_primary_normals(cube_rotation: &UnitQuaternion<f32>) -> PrimaryNormals {
    let front = closest_direction(cube_rotation, &FORWARD_REFERENCE, |_| true);
    let top = closest_direction(cube_rotation, &UP_REFERENCE, |key| {
        key != front && key != front.opposite()
    });
    let left = front.cross(top).unwrap_or(front.opposite());
    PrimaryNormals { front, top, left }
}

/// Updates the debug markers to show the current mapping.
pub fn recolor_markers(markers: &mut [FaceNormalMarker; 6], normals: &PrimaryNormals) {
    for marker in markers.iter_mut() {
        marker.role = normals.role_of(marker.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn resolve(x: f32, y: f32) -> PrimaryNormals {
        resolve_primary_normals(&Orientation::new(x, y).rotation())
    }

    #[test]
    fn identity_orientation() {
        let normals = resolve(0.0, 0.0);
        assert_eq!(normals.front, DirectionKey::POS_Z);
        assert_eq!(normals.top, DirectionKey::POS_Y);
        assert_eq!(normals.left, DirectionKey::NEG_X);
    }

    #[test]
    fn diagonal_view_breaks_tie_towards_positive_x() {
        // at y = pi/4 both +z and -x sit 45 degrees from the viewer; the
        // reference axis leans towards +x in world space, where +z ends up
        let normals = resolve(0.0, FRAC_PI_4);
        assert_eq!(normals.front, DirectionKey::POS_Z);
        let normals = resolve(0.0, FRAC_PI_4 + 0.3);
        assert_eq!(normals.front, DirectionKey::NEG_X);
    }

    #[test]
    fn quarter_turn_about_y() {
        // +x points at the viewer after rotating by -pi/2 about y
        let normals = resolve(0.0, -FRAC_PI_2);
        assert_eq!(normals.front, DirectionKey::POS_X);
        assert_eq!(normals.top, DirectionKey::POS_Y);
        assert_eq!(normals.left, DirectionKey::POS_Z);
    }

    #[test]
    fn upside_down() {
        let normals = resolve(PI, 0.0);
        assert_eq!(normals.front, DirectionKey::NEG_Z);
        assert_eq!(normals.top, DirectionKey::NEG_Y);
        assert_eq!(normals.left, DirectionKey::NEG_X);
    }

    #[test]
    fn mapping_is_always_three_distinct_orthogonal_axes() {
        for i in 0..40 {
            let x = i as f32 * 0.37;
            let y = i as f32 * -0.53;
            let normals = resolve(x, y);
            assert_ne!(normals.front, normals.top);
            assert_ne!(normals.front, normals.left);
            assert_ne!(normals.top, normals.left);
            assert_ne!(normals.front, normals.top.opposite());
            assert_ne!(normals.left, normals.top.opposite());
            assert_eq!(normals.front.cross(normals.top), Some(normals.left));
        }
    }

    #[test]
    fn front_tilted_down_keeps_a_perpendicular_top() {
        // the view axis sits near a cube corner and front points well below
        // the horizon
        let normals = resolve(-0.9, FRAC_PI_4);
        assert_ne!(normals.top, normals.front.opposite());
        assert_eq!(normals.front.cross(normals.top), Some(normals.left));
    }

    #[test]
    fn markers_follow_mapping() {
        let normals = resolve(0.0, 0.0);
        let mut markers = DirectionKey::ALL.map(|key| FaceNormalMarker {
            key,
            role: MarkerRole::Other,
        });
        recolor_markers(&mut markers, &normals);
        let front = markers.iter().find(|m| m.key == DirectionKey::POS_Z).unwrap();
        assert_eq!(front.role, MarkerRole::Front);
        let others = markers.iter().filter(|m| m.role == MarkerRole::Other).count();
        assert_eq!(others, 3);
    }
}
