//! Piece ownership and transform composition.
//!
//! Pieces live in an arena indexed by [`PieceId`]. Each piece is owned by
//! exactly one group at a time: the main cube group, or the temporary
//! rotation group that exists only while a layer turn is in flight. Moving a
//! piece between groups composes transforms explicitly so its world
//! transform is unchanged by the move.

use log::trace;
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion};

use crate::coords::{ALL_COORDINATES, Coord, DirectionKey};
use crate::cube::{PIECE_PITCH, Piece, PieceId};
use crate::math::snap_isometry;

/// Which group currently owns a piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupId {
    /// The main cube group.
    Cube,
    /// The temporary rotation group of an in-flight layer turn.
    Rotation,
}

/// Role a face-normal marker plays in the current primary normals mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerRole {
    Front,
    Top,
    Left,
    Other,
}

/// Debug marker for one outward face direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceNormalMarker {
    pub key: DirectionKey,
    pub role: MarkerRole,
}

/// The short-lived group holding one layer during a turn.
#[derive(Clone, Debug)]
struct RotationGroup {
    /// Transform relative to the cube group.
    local: Isometry3<f32>,
    members: Vec<PieceId>,
}

/// Pieces, markers and the group hierarchy of one cube instance.
#[derive(Clone, Debug)]
pub struct Scene {
    pieces: Vec<Piece>,
    markers: [FaceNormalMarker; 6],
    /// World transform of the cube group.
    cube_world: Isometry3<f32>,
    rotation_group: Option<RotationGroup>,
}

impl Scene {
    /// Builds all 27 pieces, hiding the ones whose coordinate is not in
    /// `visible`.
    pub fn new(visible: &[Coord], cube_rotation: UnitQuaternion<f32>) -> Self {
        let pieces = ALL_COORDINATES
            .iter()
            .enumerate()
            .map(|(id, &coord)| Piece::new(id, coord, visible.contains(&coord)))
            .collect();
        let markers = DirectionKey::ALL.map(|key| FaceNormalMarker {
            key,
            role: MarkerRole::Other,
        });
        Self {
            pieces,
            markers,
            cube_world: Isometry3::from_parts(Translation3::identity(), cube_rotation),
            rotation_group: None,
        }
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id)
    }

    pub(crate) fn pieces_mut(&mut self) -> &mut [Piece] {
        &mut self.pieces
    }

    pub fn markers(&self) -> &[FaceNormalMarker; 6] {
        &self.markers
    }

    pub(crate) fn markers_mut(&mut self) -> &mut [FaceNormalMarker; 6] {
        &mut self.markers
    }

    pub fn cube_rotation(&self) -> UnitQuaternion<f32> {
        self.cube_world.rotation
    }

    pub(crate) fn set_cube_rotation(&mut self, rotation: UnitQuaternion<f32>) {
        self.cube_world.rotation = rotation;
    }

    pub fn has_rotation_group(&self) -> bool {
        self.rotation_group.is_some()
    }

    /// Members of the active rotation group, if any.
    pub fn rotation_group_members(&self) -> &[PieceId] {
        self.rotation_group
            .as_ref()
            .map(|group| group.members.as_slice())
            .unwrap_or(&[])
    }

    /// World transform of a group.
    pub fn group_world(&self, group: GroupId) -> Isometry3<f32> {
        match (group, &self.rotation_group) {
            (GroupId::Rotation, Some(rotation_group)) => self.cube_world * rotation_group.local,
            _ => self.cube_world,
        }
    }

    /// World transform of a piece, composed through its owning group.
    pub fn piece_world(&self, id: PieceId) -> Option<Isometry3<f32>> {
        let piece = self.pieces.get(id)?;
        Some(self.group_world(piece.parent) * piece.local)
    }

    /// World-space center of a piece.
    pub fn piece_center(&self, id: PieceId) -> Option<Point3<f32>> {
        self.piece_world(id)
            .map(|world| world.transform_point(&Point3::origin()))
    }

    /// Moves a piece to a new group, preserving its world transform.
    ///
    /// The new local transform is
    /// `inverse(new_parent.world) * old_parent.world * old_local`.
    fn reparent(&mut self, id: PieceId, new_parent: GroupId) {
        let Some(piece) = self.pieces.get(id) else {
            return;
        };
        if piece.parent == new_parent {
            return;
        }
        let old_world = self.group_world(piece.parent);
        let new_world = self.group_world(new_parent);
        let local = new_world.inverse() * old_world * piece.local;

        let piece = &mut self.pieces[id];
        piece.local = local;
        piece.parent = new_parent;
    }

    /// Creates the temporary rotation group and moves `members` into it.
    ///
    /// Returns `false` without touching anything if a group already exists.
    pub(crate) fn detach_layer(&mut self, members: &[PieceId]) -> bool {
        if self.rotation_group.is_some() {
            return false;
        }
        self.rotation_group = Some(RotationGroup {
            local: Isometry3::identity(),
            members: members.to_vec(),
        });
        for &id in members {
            self.reparent(id, GroupId::Rotation);
        }
        trace!("detached {} pieces into rotation group", members.len());
        true
    }

    /// Applies a rotation to the rotation group around an axis in cube space.
    pub(crate) fn rotate_group(&mut self, rotation: UnitQuaternion<f32>) {
        if let Some(group) = &mut self.rotation_group {
            group.local.rotation *= rotation;
        }
    }

    /// Bakes the rotation group's transform into its members, hands them back
    /// to the cube group and removes the rotation group.
    pub(crate) fn reattach_layer(&mut self) {
        let Some(members) = self
            .rotation_group
            .as_ref()
            .map(|group| group.members.clone())
        else {
            return;
        };
        for &id in &members {
            self.reparent(id, GroupId::Cube);
            let piece = &mut self.pieces[id];
            piece.local = snap_isometry(&piece.local, PIECE_PITCH);
        }
        self.rotation_group = None;
        trace!("reattached {} pieces to cube group", members.len());
    }

    /// Number of pieces owned by `group`.
    pub fn owned_by(&self, group: GroupId) -> usize {
        self.pieces.iter().filter(|piece| piece.parent == group).count()
    }

    /// Whether every piece sits at the same cube-local transform as in
    /// `other`, within `epsilon`. Whole-cube orientation is ignored.
    pub fn same_arrangement(&self, other: &Scene, epsilon: f32) -> bool {
        self.pieces.len() == other.pieces.len()
            && self.pieces.iter().zip(&other.pieces).all(|(a, b)| {
                a.parent == b.parent
                    && (a.local.translation.vector - b.local.translation.vector).norm() <= epsilon
                    && (a.local.rotation.to_rotation_matrix().into_inner()
                        - b.local.rotation.to_rotation_matrix().into_inner())
                    .norm()
                        <= epsilon
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use std::f32::consts::FRAC_PI_2;

    fn scene() -> Scene {
        Scene::new(&ALL_COORDINATES, UnitQuaternion::from_euler_angles(0.3, -0.7, 0.1))
    }

    #[test]
    fn reparenting_preserves_world_transforms() {
        let mut scene = scene();
        let members = [0, 1, 2];
        let before: Vec<_> = members.iter().map(|&id| scene.piece_world(id).unwrap()).collect();

        assert!(scene.detach_layer(&members));
        for (&id, world) in members.iter().zip(&before) {
            assert_eq!(scene.piece(id).unwrap().parent, GroupId::Rotation);
            let now = scene.piece_world(id).unwrap();
            assert_relative_eq!(now.translation.vector, world.translation.vector, epsilon = 1e-5);
        }
        assert_eq!(scene.owned_by(GroupId::Rotation), 3);
        assert_eq!(scene.owned_by(GroupId::Cube), 24);
    }

    #[test]
    fn only_one_rotation_group_at_a_time() {
        let mut scene = scene();
        assert!(scene.detach_layer(&[0]));
        assert!(!scene.detach_layer(&[1]));
        assert_eq!(scene.rotation_group_members(), &[0]);
    }

    #[test]
    fn reattaching_bakes_the_group_rotation() {
        let mut scene = Scene::new(&ALL_COORDINATES, UnitQuaternion::identity());
        // piece 26 is at (1, 1, 1)
        assert_eq!(scene.piece(26).unwrap().home, (1, 1, 1));
        scene.detach_layer(&[26]);
        scene.rotate_group(UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2));
        scene.reattach_layer();

        assert!(!scene.has_rotation_group());
        assert_eq!(scene.owned_by(GroupId::Cube), 27);
        let center = scene.piece_center(26).unwrap();
        assert_relative_eq!(
            center.coords,
            Vector3::new(-PIECE_PITCH, PIECE_PITCH, PIECE_PITCH),
            epsilon = 1e-5
        );
    }

    #[test]
    fn four_quarter_turns_restore_the_arrangement() {
        let start = scene();
        let mut turned = start.clone();
        let members: Vec<PieceId> = (0..9).collect();
        for _ in 0..4 {
            turned.detach_layer(&members);
            turned.rotate_group(UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2));
            turned.reattach_layer();
        }
        assert!(turned.same_arrangement(&start, 1e-5));

        turned.detach_layer(&members);
        turned.rotate_group(UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2));
        turned.reattach_layer();
        assert!(!turned.same_arrangement(&start, 1e-5));
    }

    #[test]
    fn hidden_pieces_still_exist() {
        let scene = Scene::new(&[(0, 0, 1)], UnitQuaternion::identity());
        assert_eq!(scene.pieces().len(), 27);
        assert_eq!(scene.pieces().iter().filter(|p| p.visible).count(), 1);
    }
}
