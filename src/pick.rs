//! Ray casting for pointer picking.
//!
//! Unprojects the cursor into a world-space ray and tests it against the
//! oriented boxes of interactable objects: the pieces and the floor button
//! that resets the cube's orientation.

use iced::{Point, Rectangle};
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3, Vector4};

use crate::camera::{Camera, Projection};
use crate::cube::CUBE_SIZE;
use crate::scene::Scene;

/// Height of the floor's top surface.
pub const FLOOR_LEVEL: f32 = -3.0 * CUBE_SIZE;

/// Half extents of the floor slab.
pub const FLOOR_HALF_EXTENTS: Vector3<f32> = Vector3::new(7.5, 0.075, 7.5);

/// Half extents of the reset button lying on the floor.
pub const FLOOR_BUTTON_HALF_EXTENTS: Vector3<f32> = Vector3::new(3.0, 0.075, 0.75);

/// Kinds of objects the pointer can interact with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PickKind {
    FloorButton,
    Piece,
}

/// 3D ray for intersection testing
#[derive(Debug, Clone)]
pub struct Ray {
    pub origin: Point3<f32>,
    /// Normalized.
    pub direction: Vector3<f32>,
}

/// Axis-aligned bounding box in 3D space
#[derive(Debug, Clone)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn from_half_extents(half: Vector3<f32>) -> Self {
        Self {
            min: Point3::from(-half),
            max: Point3::from(half),
        }
    }
}

/// An object the pointer can hit: a box with a world transform.
#[derive(Debug, Clone)]
pub struct Pickable {
    pub kind: PickKind,
    /// Piece id for pieces, zero otherwise.
    pub id: usize,
    pub transform: Isometry3<f32>,
    pub half_extents: Vector3<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub kind: PickKind,
    pub id: usize,
    pub distance: f32,
}

/// World transform of the floor button.
pub fn floor_button_transform() -> Isometry3<f32> {
    Isometry3::from_parts(
        Translation3::new(0.0, FLOOR_LEVEL + FLOOR_HALF_EXTENTS.y, 6.0),
        UnitQuaternion::identity(),
    )
}

/// World transform of the floor slab.
pub fn floor_transform() -> Isometry3<f32> {
    Isometry3::from_parts(
        Translation3::new(0.0, FLOOR_LEVEL - FLOOR_HALF_EXTENTS.y, 0.0),
        UnitQuaternion::identity(),
    )
}

/// Calculate mouse ray from screen coordinates through the 3D scene.
///
/// `mouse_pos` is relative to `bounds`. Returns `None` for a degenerate
/// projection.
pub fn calculate_mouse_ray(
    mouse_pos: Point,
    bounds: Rectangle,
    camera: &Camera,
    projection: &Projection,
) -> Option<Ray> {
    let ndc_x = (2.0 * mouse_pos.x / bounds.width) - 1.0;
    let ndc_y = 1.0 - (2.0 * mouse_pos.y / bounds.height);

    let inv_view_proj = projection.view_proj(camera).try_inverse()?;

    let unproject = |ndc_z: f32| {
        let world = inv_view_proj * Vector4::new(ndc_x, ndc_y, ndc_z, 1.0);
        Point3::new(world.x / world.w, world.y / world.w, world.z / world.w)
    };
    let ray_start = unproject(-1.0);
    let ray_end = unproject(1.0);

    Some(Ray {
        origin: ray_start,
        direction: (ray_end - ray_start).normalize(),
    })
}

/// Test ray intersection with an axis-aligned bounding box using the slab
/// method. Returns the distance along the ray to the nearest hit in front
/// of the origin.
pub fn ray_aabb_intersection(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let inv_dir = ray.direction.map(|d| 1.0 / d);

    let t1 = (aabb.min - ray.origin).component_mul(&inv_dir);
    let t2 = (aabb.max - ray.origin).component_mul(&inv_dir);

    // latest entry and earliest exit over the three slabs
    let tmin = t1.zip_map(&t2, f32::min).max();
    let tmax = t1.zip_map(&t2, f32::max).min();

    if tmax < 0.0 || tmin > tmax {
        None
    } else if tmin >= 0.0 {
        Some(tmin)
    } else {
        Some(tmax)
    }
}

/// Intersects a ray with a box under an arbitrary rigid transform by moving
/// the ray into the box's frame.
pub fn ray_box_intersection(ray: &Ray, transform: &Isometry3<f32>, half_extents: Vector3<f32>) -> Option<f32> {
    let inverse = transform.inverse();
    let local = Ray {
        origin: inverse * ray.origin,
        direction: inverse * ray.direction,
    };
    ray_aabb_intersection(&local, &Aabb::from_half_extents(half_extents))
}

/// Returns the nearest object hit by `ray` whose kind is in `kinds`.
pub fn pick_object(ray: &Ray, objects: &[Pickable], kinds: &[PickKind]) -> Option<Hit> {
    objects
        .iter()
        .filter(|object| kinds.contains(&object.kind))
        .filter_map(|object| {
            let distance = ray_box_intersection(ray, &object.transform, object.half_extents)?;
            Some(Hit {
                kind: object.kind,
                id: object.id,
                distance,
            })
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Interactable objects of a scene: every visible piece plus the floor
/// button.
pub fn scene_pickables(scene: &Scene) -> Vec<Pickable> {
    let half = Vector3::repeat(CUBE_SIZE / 2.0);
    scene
        .pieces()
        .iter()
        .filter(|piece| piece.visible)
        .filter_map(|piece| {
            Some(Pickable {
                kind: PickKind::Piece,
                id: piece.id,
                transform: scene.piece_world(piece.id)?,
                half_extents: half,
            })
        })
        .chain(std::iter::once(Pickable {
            kind: PickKind::FloorButton,
            id: 0,
            transform: floor_button_transform(),
            half_extents: FLOOR_BUTTON_HALF_EXTENTS,
        }))
        .collect()
}
