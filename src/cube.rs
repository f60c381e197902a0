//! Spatial model of the 3x3x3 cube.
//!
//! This module defines the sticker colors, the six face slots of a piece and
//! the pieces themselves, including which faces of each piece are colored.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector4};

use crate::coords::{Coord, DirectionKey};
use crate::scene::GroupId;

/// Edge length of a single piece.
pub const CUBE_SIZE: f32 = 1.5;

/// Gap between neighbouring pieces.
pub const CUBE_SPACING: f32 = 0.05;

/// Distance between the centers of neighbouring pieces.
pub const PIECE_PITCH: f32 = CUBE_SIZE + CUBE_SPACING;

/// Index of a piece in the cube's piece arena.
pub type PieceId = usize;

/// Sticker colors, using the standard Rubik's cube scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Yellow,
    Blue,
    Green,
    Red,
    Orange,
    /// Interior face with no sticker.
    None,
}

impl Color {
    /// RGBA of the highlighted variant of this hue, blended towards white.
    pub fn highlighted(self) -> Vector4<f32> {
        const BLEND: f32 = 0.45;
        let base = Vector4::from(self);
        let white = Vector4::new(1.0, 1.0, 1.0, 1.0);
        base + (white - base) * BLEND
    }
}

impl From<Color> for Vector4<f32> {
    /// Converts a color enum to RGBA color values.
    fn from(color: Color) -> Self {
        let hex: u32 = match color {
            Color::White => 0xffffff,
            Color::Yellow => 0xffd500,
            Color::Blue => 0x0051ba,
            Color::Green => 0x009e60,
            Color::Red => 0xc41e3a,
            Color::Orange => 0xff5800,
            Color::None => 0x000000,
        };
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Vector4::new(channel(16), channel(8), channel(0), 1.0)
    }
}

/// The six faces of a piece, in the order their stickers are stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaceSlot {
    Right,
    Left,
    Top,
    Bottom,
    Front,
    Back,
}

impl FaceSlot {
    pub const ALL: [FaceSlot; 6] = [
        FaceSlot::Right,
        FaceSlot::Left,
        FaceSlot::Top,
        FaceSlot::Bottom,
        FaceSlot::Front,
        FaceSlot::Back,
    ];

    /// Outward normal of this face in the piece's own frame.
    pub fn normal(self) -> DirectionKey {
        match self {
            FaceSlot::Right => DirectionKey::POS_X,
            FaceSlot::Left => DirectionKey::NEG_X,
            FaceSlot::Top => DirectionKey::POS_Y,
            FaceSlot::Bottom => DirectionKey::NEG_Y,
            FaceSlot::Front => DirectionKey::POS_Z,
            FaceSlot::Back => DirectionKey::NEG_Z,
        }
    }

    /// Sticker color carried by this face on the solved cube.
    pub fn solved_color(self) -> Color {
        match self {
            FaceSlot::Right => Color::Orange,
            FaceSlot::Left => Color::Red,
            FaceSlot::Top => Color::White,
            FaceSlot::Bottom => Color::Yellow,
            FaceSlot::Front => Color::Blue,
            FaceSlot::Back => Color::Green,
        }
    }
}

/// One face of a piece.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sticker {
    pub color: Color,
    pub highlighted: bool,
}

impl Sticker {
    /// Color to draw, taking the highlight into account.
    pub fn display_color(&self) -> Vector4<f32> {
        if self.highlighted {
            self.color.highlighted()
        } else {
            Vector4::from(self.color)
        }
    }
}

/// Assigns a color to each face slot of the piece at `coord`.
///
/// A face is colored iff the coordinate is extremal on that face's axis, on
/// that face's side. Every other face is [`Color::None`].
pub fn piece_faces(coord: Coord) -> [Color; 6] {
    FaceSlot::ALL.map(|slot| {
        let (nx, ny, nz) = slot.normal().coord();
        let (x, y, z) = coord;
        let on_outer_shell = x * nx + y * ny + z * nz == 1;
        if on_outer_shell {
            slot.solved_color()
        } else {
            Color::None
        }
    })
}

/// A single unit cube of the puzzle.
#[derive(Clone, Debug)]
pub struct Piece {
    pub id: PieceId,
    /// Grid coordinate at creation time. Never changes.
    pub home: Coord,
    /// Stickers in [`FaceSlot::ALL`] order.
    pub stickers: [Sticker; 6],
    pub visible: bool,
    /// Transform relative to `parent`.
    pub local: Isometry3<f32>,
    pub parent: GroupId,
}

impl Piece {
    pub(crate) fn new(id: PieceId, home: Coord, visible: bool) -> Self {
        let stickers = piece_faces(home).map(|color| Sticker {
            color,
            highlighted: false,
        });
        let (x, y, z) = home;
        let translation = Translation3::new(
            x as f32 * PIECE_PITCH,
            y as f32 * PIECE_PITCH,
            z as f32 * PIECE_PITCH,
        );
        Self {
            id,
            home,
            stickers,
            visible,
            local: Isometry3::from_parts(translation, UnitQuaternion::identity()),
            parent: GroupId::Cube,
        }
    }

    pub fn colored_faces(&self) -> usize {
        self.stickers
            .iter()
            .filter(|sticker| sticker.color != Color::None)
            .count()
    }

    /// Highlights every colored face. Blank faces are left untouched.
    pub fn highlight(&mut self) {
        for sticker in &mut self.stickers {
            if sticker.color != Color::None {
                sticker.highlighted = true;
            }
        }
    }

    pub fn clear_highlight(&mut self) {
        for sticker in &mut self.stickers {
            sticker.highlighted = false;
        }
    }

    pub fn is_highlighted(&self) -> bool {
        self.stickers.iter().any(|sticker| sticker.highlighted)
    }
}

/// 36 vertices for a cube (6 faces × 6 vertices per face using 2 triangles each).
///
/// Faces follow [`FaceSlot::ALL`] order so the shader can recover the slot
/// as `vertex_index / 6`. Triangles wind counter-clockwise seen from outside.
#[rustfmt::skip]
pub const CUBE_VERTICES: [[f32; 3]; 36] = [
    // Right face (+X)
    [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0], [ 1.0, -1.0, -1.0],
    // Left face (-X)
    [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0],
    [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0], [-1.0, -1.0, -1.0],
    // Top face (+Y)
    [-1.0,  1.0, -1.0], [-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0],
    // Bottom face (-Y)
    [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0],
    [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0], [-1.0, -1.0, -1.0],
    // Front face (+Z)
    [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0, -1.0,  1.0],
    // Back face (-Z)
    [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0],
    [ 1.0,  1.0, -1.0], [ 1.0, -1.0, -1.0], [-1.0, -1.0, -1.0],
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{ALL_COORDINATES, extremal_axes};

    #[test]
    fn faces_are_colored_exactly_on_extremal_axes() {
        for coord in ALL_COORDINATES {
            let faces = piece_faces(coord);
            let colored = faces.iter().filter(|&&c| c != Color::None).count();
            assert_eq!(colored, extremal_axes(coord), "piece at {coord:?}");

            let (x, y, z) = coord;
            assert_eq!(faces[0] != Color::None, x == 1);
            assert_eq!(faces[1] != Color::None, x == -1);
            assert_eq!(faces[2] != Color::None, y == 1);
            assert_eq!(faces[3] != Color::None, y == -1);
            assert_eq!(faces[4] != Color::None, z == 1);
            assert_eq!(faces[5] != Color::None, z == -1);
        }
    }

    #[test]
    fn corner_edge_and_center_sticker_counts() {
        assert_eq!(Piece::new(0, (1, -1, 1), true).colored_faces(), 3);
        assert_eq!(Piece::new(0, (0, 1, -1), true).colored_faces(), 2);
        assert_eq!(Piece::new(0, (0, 0, 1), true).colored_faces(), 1);
    }

    #[test]
    fn front_face_is_blue_and_top_is_white() {
        let faces = piece_faces((0, 1, 1));
        assert_eq!(faces[2], Color::White);
        assert_eq!(faces[4], Color::Blue);
    }

    #[test]
    fn highlight_skips_blank_faces() {
        let mut piece = Piece::new(0, (0, 0, 1), true);
        piece.highlight();
        for sticker in &piece.stickers {
            assert_eq!(sticker.highlighted, sticker.color != Color::None);
        }
        piece.clear_highlight();
        assert!(!piece.is_highlighted());
    }

    #[test]
    fn highlighted_variant_is_lighter() {
        let base = Vector4::from(Color::Blue);
        let lit = Color::Blue.highlighted();
        assert!(lit.x > base.x && lit.y > base.y && lit.z > base.z);
    }

    #[test]
    fn vertex_slots_match_normals() {
        for (slot_index, slot) in FaceSlot::ALL.iter().enumerate() {
            let normal = slot.normal().vector();
            for vertex in &CUBE_VERTICES[slot_index * 6..slot_index * 6 + 6] {
                let dot = vertex[0] * normal.x + vertex[1] * normal.y + vertex[2] * normal.z;
                assert_eq!(dot, 1.0);
            }
        }
    }
}
