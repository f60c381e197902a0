//! Resolves a face and depth into the nine pieces forming that layer.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::coords::DirectionKey;
use crate::cube::PieceId;
use crate::error::Error;
use crate::scene::Scene;

/// Pieces per layer.
pub const LAYER_SIZE: usize = 9;

/// Distance along a face axis that lies well outside the cube.
const PROBE_DISTANCE: f32 = 100.0;

/// Layer depth counted from the face a direction points to, nearest first.
/// Serialised as its index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    pub const OUTER: Level = Level(0);
    pub const MIDDLE: Level = Level(1);
    pub const INNER: Level = Level(2);

    pub const ALL: [Level; 3] = [Level::OUTER, Level::MIDDLE, Level::INNER];

    pub fn new(index: u8) -> Option<Self> {
        (index < 3).then_some(Level(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Level {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        Level::new(value).ok_or(Error::InvalidLevel(value))
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.index()
    }
}

/// Selects the layer at `level` counted from the physical face `direction`.
///
/// Every piece's world-space center is measured against a probe point far
/// out along the face axis; the sorted distances are cut into slices of
/// nine. Returns an empty list if the scene does not hold a full cube.
pub fn select_layer(scene: &Scene, direction: DirectionKey, level: Level) -> Vec<PieceId> {
    let pieces = scene.pieces();
    if pieces.len() != 3 * LAYER_SIZE {
        return Vec::new();
    }

    let axis = scene.cube_rotation() * direction.vector();
    let probe = Point3::from(axis * PROBE_DISTANCE);

    let mut distances: Vec<(PieceId, f32)> = pieces
        .iter()
        .filter_map(|piece| {
            let center = scene.piece_center(piece.id)?;
            Some((piece.id, nalgebra::distance(&center, &probe)))
        })
        .collect();
    distances.sort_by(|(_, a), (_, b)| a.total_cmp(b));

    let start = level.index() as usize * LAYER_SIZE;
    distances
        .get(start..start + LAYER_SIZE)
        .map(|layer| layer.iter().map(|&(id, _)| id).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::ALL_COORDINATES;
    use crate::orientation::Orientation;
    use std::collections::HashSet;

    fn homes(scene: &Scene, layer: &[PieceId]) -> HashSet<(i32, i32, i32)> {
        layer
            .iter()
            .map(|&id| scene.piece(id).unwrap().home)
            .collect()
    }

    #[test]
    fn outer_front_layer_is_positive_z() {
        let scene = Scene::new(&ALL_COORDINATES, Orientation::new(0.0, 0.0).rotation());
        let layer = select_layer(&scene, DirectionKey::POS_Z, Level::OUTER);
        assert_eq!(layer.len(), LAYER_SIZE);
        assert!(homes(&scene, &layer).iter().all(|&(_, _, z)| z == 1));

        let inner = select_layer(&scene, DirectionKey::POS_Z, Level::INNER);
        assert!(homes(&scene, &inner).iter().all(|&(_, _, z)| z == -1));
    }

    #[test]
    fn levels_partition_the_cube_for_every_direction() {
        let scene = Scene::new(&ALL_COORDINATES, Orientation::new(0.6, -2.1).rotation());
        for direction in DirectionKey::ALL {
            let mut seen = HashSet::new();
            for level in Level::ALL {
                let layer = select_layer(&scene, direction, level);
                assert_eq!(layer.len(), LAYER_SIZE);
                for id in layer {
                    assert!(seen.insert(id), "{id} selected twice for {direction}");
                }
            }
            assert_eq!(seen.len(), 27);
        }
    }

    #[test]
    fn selection_ignores_cube_orientation() {
        // physical directions are cube-local, so rotating the whole cube
        // selects the same pieces
        let still = Scene::new(&ALL_COORDINATES, Orientation::new(0.0, 0.0).rotation());
        let turned = Scene::new(&ALL_COORDINATES, Orientation::new(1.1, 2.3).rotation());
        for level in Level::ALL {
            let a: HashSet<_> = select_layer(&still, DirectionKey::NEG_Y, level).into_iter().collect();
            let b: HashSet<_> = select_layer(&turned, DirectionKey::NEG_Y, level).into_iter().collect();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn level_bounds() {
        assert_eq!(Level::new(2), Some(Level::INNER));
        assert_eq!(Level::new(3), None);
    }

    #[test]
    fn level_serialises_as_its_index() {
        assert_eq!(serde_json::to_string(&Level::MIDDLE).unwrap(), "1");
        assert_eq!(serde_json::from_str::<Level>("2").unwrap(), Level::INNER);
        assert!(serde_json::from_str::<Level>("3").is_err());
        assert!(matches!(Level::try_from(7), Err(Error::InvalidLevel(7))));
    }
}
