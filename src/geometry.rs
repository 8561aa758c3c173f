//! Spatial query layer: orientation, shapes, raycasts and push-out helpers.
//!
//! World axes are x forward, y left, z up.  Actors and static obstacles are
//! vertical cylinders standing on their base point; tiles are unit squares in
//! the XY plane.  Every function here is pure and guards its degenerate inputs
//! (zero directions, zero radii) by returning "no hit" / "no push" rather than
//! producing `NaN`.
//!
//! | Query | Shape | Used by |
//! |---|---|---|
//! | [`raycast_vs_disc_2d`] | circle in XY | cylinder sides |
//! | [`raycast_vs_z_cylinder`] | capped vertical cylinder | actors, obstacles |
//! | [`raycast_vs_tile_grid`] | solid cells | tile maps |
//! | [`raycast_vs_floor`] / [`raycast_vs_ceiling`] | horizontal planes | all maps |

use bevy::math::{EulerRot, IVec2, Quat, Vec2, Vec3, Vec3Swizzles};

const EPSILON: f32 = 1e-6;

// ── Orientation ───────────────────────────────────────────────────────────────

/// Yaw/pitch/roll in degrees.  Positive pitch looks down.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl EulerAngles {
    pub const fn new(yaw: f32, pitch: f32, roll: f32) -> Self {
        Self { yaw, pitch, roll }
    }

    pub const fn from_yaw(yaw: f32) -> Self {
        Self::new(yaw, 0.0, 0.0)
    }

    /// Orientation whose forward vector points along `direction`.
    pub fn facing(direction: Vec3) -> Self {
        let horizontal = direction.xy().length();
        if horizontal < EPSILON && direction.z.abs() < EPSILON {
            return Self::default();
        }
        Self {
            yaw: direction.y.atan2(direction.x).to_degrees(),
            pitch: (-direction.z).atan2(horizontal).to_degrees(),
            roll: 0.0,
        }
    }

    pub fn to_quat(self) -> Quat {
        Quat::from_euler(
            EulerRot::ZYX,
            self.yaw.to_radians(),
            self.pitch.to_radians(),
            self.roll.to_radians(),
        )
    }

    /// `(forward, left, up)` unit vectors.
    pub fn basis(self) -> (Vec3, Vec3, Vec3) {
        let q = self.to_quat();
        (q * Vec3::X, q * Vec3::Y, q * Vec3::Z)
    }

    pub fn forward(self) -> Vec3 {
        self.to_quat() * Vec3::X
    }
}

/// Bearing of a 2D vector in degrees, counter-clockwise from +X.
#[inline]
pub fn bearing_degrees(v: Vec2) -> f32 {
    v.y.atan2(v.x).to_degrees()
}

/// Unsigned angle between two 2D vectors, degrees.  Zero if either is zero.
pub fn angle_between_degrees_2d(a: Vec2, b: Vec2) -> f32 {
    if a.length_squared() < EPSILON || b.length_squared() < EPSILON {
        return 0.0;
    }
    a.angle_to(b).abs().to_degrees()
}

/// Shortest signed angular difference `to - from`, in `(-180, 180]`.
pub fn shortest_angular_displacement(from: f32, to: f32) -> f32 {
    let mut delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// Rotate `current` toward `goal` by at most `max_delta` degrees.
pub fn turn_toward_degrees(current: f32, goal: f32, max_delta: f32) -> f32 {
    let delta = shortest_angular_displacement(current, goal);
    let max_delta = max_delta.max(0.0);
    if delta.abs() <= max_delta {
        goal
    } else {
        current + max_delta.copysign(delta)
    }
}

// ── Shapes ────────────────────────────────────────────────────────────────────

/// Vertical cylinder standing on `base`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZCylinder {
    pub base: Vec3,
    pub radius: f32,
    pub height: f32,
}

impl ZCylinder {
    pub const fn new(base: Vec3, radius: f32, height: f32) -> Self {
        Self {
            base,
            radius,
            height,
        }
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.base.z + self.height
    }
}

/// Vertical extents overlap and horizontal distance is below the radius sum.
pub fn cylinders_overlap(a: &ZCylinder, b: &ZCylinder) -> bool {
    if a.base.z >= b.top() || b.base.z >= a.top() {
        return false;
    }
    let reach = a.radius + b.radius;
    a.base.xy().distance_squared(b.base.xy()) < reach * reach
}

/// Point-in-sector test: within `radius` of `origin` and within half of
/// `aperture_degrees` of the `forward_degrees` heading.
pub fn is_point_in_directed_sector_2d(
    point: Vec2,
    origin: Vec2,
    forward_degrees: f32,
    aperture_degrees: f32,
    radius: f32,
) -> bool {
    let offset = point - origin;
    if offset.length_squared() > radius * radius {
        return false;
    }
    if offset.length_squared() < EPSILON {
        return true;
    }
    let heading = Vec2::from_angle(forward_degrees.to_radians());
    angle_between_degrees_2d(heading, offset) <= aperture_degrees * 0.5
}

// ── Push-out ──────────────────────────────────────────────────────────────────

/// Separate two overlapping discs, each moving half the penetration.
///
/// Coincident centres separate along +X.  Returns whether anything moved.
pub fn push_discs_apart(a: &mut Vec2, radius_a: f32, b: &mut Vec2, radius_b: f32) -> bool {
    let offset = *b - *a;
    let distance = offset.length();
    let penetration = radius_a + radius_b - distance;
    if penetration <= 0.0 {
        return false;
    }
    let normal = if distance > EPSILON {
        offset / distance
    } else {
        Vec2::X
    };
    let half = normal * (penetration * 0.5);
    *a -= half;
    *b += half;
    true
}

/// Move `mobile` out of a disc that stays put.  Returns whether it moved.
pub fn push_disc_out_of_fixed_disc(
    mobile: &mut Vec2,
    radius: f32,
    fixed: Vec2,
    fixed_radius: f32,
) -> bool {
    let offset = *mobile - fixed;
    let distance = offset.length();
    let reach = radius + fixed_radius;
    if distance >= reach {
        return false;
    }
    let normal = if distance > EPSILON {
        offset / distance
    } else {
        Vec2::X
    };
    *mobile = fixed + normal * reach;
    true
}

/// Move a disc out of an axis-aligned box.  A centre inside the box leaves
/// through the nearest face.  Returns whether it moved.
pub fn push_disc_out_of_aabb(center: &mut Vec2, radius: f32, min: Vec2, max: Vec2) -> bool {
    let nearest = center.clamp(min, max);
    let offset = *center - nearest;
    let distance_sq = offset.length_squared();

    if distance_sq > EPSILON {
        if distance_sq >= radius * radius {
            return false;
        }
        *center = nearest + offset / distance_sq.sqrt() * radius;
        return true;
    }

    // Centre inside: pick the cheapest exit.
    let exits = [
        (center.x - min.x, Vec2::new(min.x - radius, center.y)),
        (max.x - center.x, Vec2::new(max.x + radius, center.y)),
        (center.y - min.y, Vec2::new(center.x, min.y - radius)),
        (max.y - center.y, Vec2::new(center.x, max.y + radius)),
    ];
    let mut best = exits[0];
    for exit in &exits[1..] {
        if exit.0 < best.0 {
            best = *exit;
        }
    }
    *center = best.1;
    true
}

// ── Raycasts ──────────────────────────────────────────────────────────────────

/// Normalised ray with a finite reach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray3 {
    pub start: Vec3,
    pub forward: Vec3,
    pub max_distance: f32,
}

impl Ray3 {
    /// `None` for a zero or non-finite direction, or a non-positive reach.
    pub fn new(start: Vec3, direction: Vec3, max_distance: f32) -> Option<Self> {
        let forward = direction.try_normalize()?;
        if !start.is_finite() || !(max_distance > 0.0) {
            return None;
        }
        Some(Self {
            start,
            forward,
            max_distance,
        })
    }

    #[inline]
    pub fn at(&self, distance: f32) -> Vec3 {
        self.start + self.forward * distance
    }
}

/// Where a ray struck a single shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayImpact {
    pub distance: f32,
    pub position: Vec3,
    pub normal: Vec3,
}

impl RayImpact {
    fn at(ray: &Ray3, distance: f32, normal: Vec3) -> Self {
        Self {
            distance,
            position: ray.at(distance),
            normal,
        }
    }
}

/// The closer of two optional impacts; ties keep `a`.
pub fn nearer_impact(a: Option<RayImpact>, b: Option<RayImpact>) -> Option<RayImpact> {
    match (a, b) {
        (Some(x), Some(y)) => Some(if y.distance < x.distance { y } else { x }),
        (x, None) => x,
        (None, y) => y,
    }
}

/// Entry distance of a 2D ray into a disc, measured in the 2D ray's own
/// parameter.  `None` when the ray starts inside or misses.
pub fn raycast_vs_disc_2d(start: Vec2, direction: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    if radius <= 0.0 {
        return None;
    }
    let a = direction.length_squared();
    if a < EPSILON {
        return None;
    }
    let m = start - center;
    let c = m.length_squared() - radius * radius;
    if c <= 0.0 {
        return None;
    }
    let b = m.dot(direction);
    if b >= 0.0 {
        return None;
    }
    let discriminant = b * b - a * c;
    if discriminant < 0.0 {
        return None;
    }
    Some((-b - discriminant.sqrt()) / a)
}

/// Capped vertical cylinder.  A ray starting inside reports an impact at
/// distance zero facing back along the ray.
pub fn raycast_vs_z_cylinder(ray: &Ray3, cylinder: &ZCylinder) -> Option<RayImpact> {
    if cylinder.radius <= 0.0 || cylinder.height <= 0.0 {
        return None;
    }
    let bottom = cylinder.base.z;
    let top = cylinder.top();
    let center = cylinder.base.xy();
    let radius_sq = cylinder.radius * cylinder.radius;

    let start_inside_disc = ray.start.xy().distance_squared(center) <= radius_sq;
    if start_inside_disc && (bottom..=top).contains(&ray.start.z) {
        return Some(RayImpact::at(ray, 0.0, -ray.forward));
    }

    // The 2D parameter of the horizontal projection equals the 3D distance
    // because `forward.xy()` is used unnormalised.
    let side = raycast_vs_disc_2d(ray.start.xy(), ray.forward.xy(), center, cylinder.radius)
        .filter(|&t| t <= ray.max_distance)
        .and_then(|t| {
            let hit = ray.at(t);
            if hit.z < bottom || hit.z > top {
                return None;
            }
            let normal = ((hit.xy() - center) / cylinder.radius).extend(0.0);
            Some(RayImpact::at(ray, t, normal))
        });

    let cap = |plane: f32, normal: Vec3| -> Option<RayImpact> {
        if ray.forward.z.abs() < EPSILON {
            return None;
        }
        let t = (plane - ray.start.z) / ray.forward.z;
        if t < 0.0 || t > ray.max_distance {
            return None;
        }
        let hit = ray.at(t);
        (hit.xy().distance_squared(center) <= radius_sq).then(|| RayImpact::at(ray, t, normal))
    };
    let caps = if ray.forward.z > 0.0 && ray.start.z < bottom {
        cap(bottom, Vec3::NEG_Z)
    } else if ray.forward.z < 0.0 && ray.start.z > top {
        cap(top, Vec3::Z)
    } else {
        None
    };

    nearer_impact(side, caps)
}

/// Horizontal plane at `z`, struck from above.
pub fn raycast_vs_floor(ray: &Ray3, z: f32) -> Option<RayImpact> {
    if ray.forward.z >= 0.0 || ray.start.z < z {
        return None;
    }
    let t = (z - ray.start.z) / ray.forward.z;
    (t <= ray.max_distance).then(|| RayImpact::at(ray, t, Vec3::Z))
}

/// Horizontal plane at `z`, struck from below.
pub fn raycast_vs_ceiling(ray: &Ray3, z: f32) -> Option<RayImpact> {
    if ray.forward.z <= 0.0 || ray.start.z > z {
        return None;
    }
    let t = (z - ray.start.z) / ray.forward.z;
    (t <= ray.max_distance).then(|| RayImpact::at(ray, t, Vec3::NEG_Z))
}

/// Grid traversal (Amanatides–Woo) over unit cells in XY.
///
/// `is_solid` is asked about each visited cell; `in_bounds` stops the walk
/// once the ray leaves the grid, which counts as a miss.  A ray that starts in
/// a solid cell hits at distance zero.
pub fn raycast_vs_tile_grid(
    ray: &Ray3,
    in_bounds: impl Fn(IVec2) -> bool,
    is_solid: impl Fn(IVec2) -> bool,
) -> Option<RayImpact> {
    let mut cell = ray.start.xy().floor().as_ivec2();
    if !in_bounds(cell) {
        return None;
    }
    if is_solid(cell) {
        return Some(RayImpact::at(ray, 0.0, -ray.forward));
    }

    let dir = ray.forward.xy();
    let step = IVec2::new(
        if dir.x > 0.0 { 1 } else { -1 },
        if dir.y > 0.0 { 1 } else { -1 },
    );
    let delta = Vec2::new(
        if dir.x.abs() > EPSILON { 1.0 / dir.x.abs() } else { f32::INFINITY },
        if dir.y.abs() > EPSILON { 1.0 / dir.y.abs() } else { f32::INFINITY },
    );
    // Axis-parallel rays never cross that axis' boundaries; 0 * inf would be NaN.
    let first_crossing = |start: f32, cell: i32, dir: f32, delta: f32| -> f32 {
        if delta.is_infinite() {
            f32::INFINITY
        } else if dir > 0.0 {
            (cell as f32 + 1.0 - start) * delta
        } else {
            (start - cell as f32) * delta
        }
    };
    let mut next = Vec2::new(
        first_crossing(ray.start.x, cell.x, dir.x, delta.x),
        first_crossing(ray.start.y, cell.y, dir.y, delta.y),
    );

    loop {
        let (distance, normal) = if next.x < next.y {
            let t = next.x;
            cell.x += step.x;
            next.x += delta.x;
            (t, Vec3::new(-step.x as f32, 0.0, 0.0))
        } else {
            let t = next.y;
            cell.y += step.y;
            next.y += delta.y;
            (t, Vec3::new(0.0, -step.y as f32, 0.0))
        };
        if !distance.is_finite() || distance > ray.max_distance || !in_bounds(cell) {
            return None;
        }
        if is_solid(cell) {
            return Some(RayImpact::at(ray, distance, normal));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn yaw_and_pitch_drive_forward() {
        let f = EulerAngles::from_yaw(90.0).forward();
        assert!(approx(f.x, 0.0) && approx(f.y, 1.0));
        let down = EulerAngles::new(0.0, 90.0, 0.0).forward();
        assert!(approx(down.z, -1.0));
        let (_, left, up) = EulerAngles::default().basis();
        assert!(approx(left.y, 1.0) && approx(up.z, 1.0));
    }

    #[test]
    fn facing_inverts_forward() {
        let dir = Vec3::new(1.0, -2.0, 0.5).normalize();
        let back = EulerAngles::facing(dir).forward();
        assert!(back.distance(dir) < 1e-4);
    }

    #[test]
    fn turning_takes_the_short_way_and_stops_at_goal() {
        assert!(approx(turn_toward_degrees(350.0, 10.0, 5.0), 355.0));
        assert!(approx(turn_toward_degrees(0.0, 3.0, 5.0), 3.0));
        assert!(approx(turn_toward_degrees(0.0, -90.0, 30.0), -30.0));
    }

    #[test]
    fn overlapping_cylinders_need_vertical_and_horizontal_overlap() {
        let a = ZCylinder::new(Vec3::ZERO, 0.5, 1.0);
        let b = ZCylinder::new(Vec3::new(0.8, 0.0, 0.0), 0.5, 1.0);
        let high = ZCylinder::new(Vec3::new(0.8, 0.0, 1.5), 0.5, 1.0);
        assert!(cylinders_overlap(&a, &b));
        assert!(!cylinders_overlap(&a, &high));
    }

    #[test]
    fn disc_separation_is_symmetric_and_exact() {
        let mut a = Vec2::new(0.0, 0.0);
        let mut b = Vec2::new(0.6, 0.0);
        assert!(push_discs_apart(&mut a, 0.5, &mut b, 0.5));
        assert!(approx(a.x, -0.2) && approx(b.x, 0.8));
        assert!(approx(a.distance(b), 1.0));
    }

    #[test]
    fn coincident_discs_separate_along_x() {
        let mut a = Vec2::ONE;
        let mut b = Vec2::ONE;
        assert!(push_discs_apart(&mut a, 0.25, &mut b, 0.25));
        assert!(approx(b.x - a.x, 0.5));
        assert!(a.is_finite() && b.is_finite());
    }

    #[test]
    fn disc_leaves_box_through_nearest_face() {
        let mut edge = Vec2::new(0.9, 0.5);
        assert!(push_disc_out_of_aabb(&mut edge, 0.25, Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0)));
        assert!(approx(edge.x, 0.75));

        let mut inside = Vec2::new(1.1, 0.5);
        assert!(push_disc_out_of_aabb(&mut inside, 0.25, Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0)));
        assert!(approx(inside.x, 0.75));

        let mut clear = Vec2::new(0.5, 0.5);
        assert!(!push_disc_out_of_aabb(&mut clear, 0.25, Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0)));
    }

    #[test]
    fn sector_respects_aperture_and_radius() {
        let origin = Vec2::ZERO;
        assert!(is_point_in_directed_sector_2d(Vec2::new(1.0, 0.0), origin, 0.0, 90.0, 2.0));
        assert!(is_point_in_directed_sector_2d(Vec2::new(1.0, 0.9), origin, 0.0, 90.0, 2.0));
        assert!(!is_point_in_directed_sector_2d(Vec2::new(0.5, 1.0), origin, 0.0, 90.0, 2.0));
        assert!(!is_point_in_directed_sector_2d(Vec2::new(3.0, 0.0), origin, 0.0, 90.0, 2.0));
    }

    #[test]
    fn zero_direction_ray_is_rejected() {
        assert!(Ray3::new(Vec3::ZERO, Vec3::ZERO, 10.0).is_none());
        assert!(Ray3::new(Vec3::ZERO, Vec3::X, 0.0).is_none());
    }

    #[test]
    fn cylinder_side_hit_reports_distance_and_normal() {
        let ray = Ray3::new(Vec3::new(0.0, 0.0, 0.5), Vec3::X, 10.0).unwrap();
        let cyl = ZCylinder::new(Vec3::new(5.0, 0.0, 0.0), 1.0, 1.0);
        let hit = raycast_vs_z_cylinder(&ray, &cyl).unwrap();
        assert!(approx(hit.distance, 4.0));
        assert!(hit.normal.distance(Vec3::NEG_X) < 1e-4);
    }

    #[test]
    fn cylinder_cap_hit_from_above() {
        let ray = Ray3::new(Vec3::new(0.0, 0.0, 3.0), Vec3::NEG_Z, 10.0).unwrap();
        let cyl = ZCylinder::new(Vec3::ZERO, 1.0, 1.0);
        let hit = raycast_vs_z_cylinder(&ray, &cyl).unwrap();
        assert!(approx(hit.distance, 2.0));
        assert_eq!(hit.normal, Vec3::Z);
    }

    #[test]
    fn cylinder_out_of_reach_or_above_misses() {
        let short = Ray3::new(Vec3::new(0.0, 0.0, 0.5), Vec3::X, 3.0).unwrap();
        let cyl = ZCylinder::new(Vec3::new(5.0, 0.0, 0.0), 1.0, 1.0);
        assert!(raycast_vs_z_cylinder(&short, &cyl).is_none());
        let over = Ray3::new(Vec3::new(0.0, 0.0, 2.0), Vec3::X, 10.0).unwrap();
        assert!(raycast_vs_z_cylinder(&over, &cyl).is_none());
    }

    #[test]
    fn grid_walk_finds_first_solid_cell() {
        let ray = Ray3::new(Vec3::new(0.5, 0.5, 0.5), Vec3::X, 10.0).unwrap();
        let hit = raycast_vs_tile_grid(
            &ray,
            |c| c.x >= 0 && c.y >= 0 && c.x < 8 && c.y < 8,
            |c| c == IVec2::new(3, 0),
        )
        .unwrap();
        assert!(approx(hit.distance, 2.5));
        assert_eq!(hit.normal, Vec3::NEG_X);
    }

    #[test]
    fn grid_walk_along_a_cell_boundary() {
        let ray = Ray3::new(Vec3::new(0.01, 0.0, 0.5), Vec3::X, 10.0).unwrap();
        let hit = raycast_vs_tile_grid(
            &ray,
            |c| c.x >= 0 && c.y >= 0 && c.x < 8 && c.y < 8,
            |c| c == IVec2::new(2, 0),
        )
        .unwrap();
        assert!(approx(hit.distance, 1.99));
    }

    #[test]
    fn grid_walk_diagonal_and_out_of_bounds() {
        let ray = Ray3::new(Vec3::new(0.5, 0.5, 0.5), Vec3::new(1.0, 1.0, 0.0), 20.0).unwrap();
        let hit = raycast_vs_tile_grid(&ray, |c| c.x < 8 && c.y < 8, |c| c == IVec2::new(2, 2));
        assert!(hit.is_some());
        let miss = raycast_vs_tile_grid(&ray, |c| c.x < 4 && c.y < 4, |_| false);
        assert!(miss.is_none());
    }

    #[test]
    fn planes_only_hit_when_facing_them() {
        let down = Ray3::new(Vec3::new(0.0, 0.0, 0.5), Vec3::new(1.0, 0.0, -1.0), 10.0).unwrap();
        let floor = raycast_vs_floor(&down, 0.0).unwrap();
        assert!(approx(floor.position.z, 0.0));
        assert!(raycast_vs_ceiling(&down, 1.0).is_none());
    }
}
