//! Triangle/triangle intersection test
//!
//! Tomas Möller, "A Fast Triangle-Triangle Intersection Test",
//! Journal of Graphics Tools 2(2), 1997.
//!
//! Both planes are tested first for an early reject. When neither triangle
//! lies entirely on one side of the other's plane, both triangles are
//! projected onto the line where the planes meet and their intervals are
//! compared. Coplanar triangles are handled in 2D on the axis-aligned plane
//! that preserves the most area.
//!
//! Contacts are closed: triangles that only touch at a vertex or along an
//! edge count as intersecting.

use crate::foundation::math::{utils, Vec3};

/// Signed distances below this magnitude are treated as exactly zero.
pub const COPLANAR_EPSILON: f64 = 1.0e-6;

/// Test whether triangles `v` and `u` intersect
pub fn triangles_intersect(v: [Vec3; 3], u: [Vec3; 3]) -> bool {
    let [v0, v1, v2] = v;
    let [u0, u1, u2] = u;

    // plane of V: n1 . x + d1 = 0
    let n1 = (v1 - v0).cross(&(v2 - v0));
    let d1 = -n1.dot(&v0);

    let du0 = snap(n1.dot(&u0) + d1);
    let du1 = snap(n1.dot(&u1) + d1);
    let du2 = snap(n1.dot(&u2) + d1);
    let du0du1 = du0 * du1;
    let du0du2 = du0 * du2;

    if du0du1 > 0.0 && du0du2 > 0.0 {
        return false;
    }

    // plane of U: n2 . x + d2 = 0
    let n2 = (u1 - u0).cross(&(u2 - u0));
    let d2 = -n2.dot(&u0);

    let dv0 = snap(n2.dot(&v0) + d2);
    let dv1 = snap(n2.dot(&v1) + d2);
    let dv2 = snap(n2.dot(&v2) + d2);
    let dv0dv1 = dv0 * dv1;
    let dv0dv2 = dv0 * dv2;

    if dv0dv1 > 0.0 && dv0dv2 > 0.0 {
        return false;
    }

    // project onto the axis closest to the intersection line direction
    let axis = utils::dominant_axis(&n1.cross(&n2));
    let vp = [v0[axis], v1[axis], v2[axis]];
    let up = [u0[axis], u1[axis], u2[axis]];

    let Some(isect1) = compute_interval(vp, [dv0, dv1, dv2], dv0dv1, dv0dv2) else {
        return coplanar_triangles_intersect(&n1, v, u);
    };
    let Some(isect2) = compute_interval(up, [du0, du1, du2], du0du1, du0du2) else {
        return coplanar_triangles_intersect(&n1, v, u);
    };

    let (min1, max1) = ordered(isect1);
    let (min2, max2) = ordered(isect2);
    max1 >= min2 && max2 >= min1
}

fn snap(distance: f64) -> f64 {
    if distance.abs() < COPLANAR_EPSILON {
        0.0
    } else {
        distance
    }
}

fn ordered((a, b): (f64, f64)) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Interval on the intersection line covered by one triangle
///
/// `p` holds the projected corners and `d` their signed distances to the
/// other triangle's plane. Returns `None` when every distance is zero, i.e.
/// the triangles are coplanar.
fn compute_interval(p: [f64; 3], d: [f64; 3], d0d1: f64, d0d2: f64) -> Option<(f64, f64)> {
    let [d0, d1, d2] = d;

    let crossing = |apex: usize| -> (f64, f64) {
        // the two edges leaving `apex` cross the plane
        let (pa, da) = (p[apex], d[apex]);
        let (pb, db) = (p[(apex + 1) % 3], d[(apex + 1) % 3]);
        let (pc, dc) = (p[(apex + 2) % 3], d[(apex + 2) % 3]);
        (
            pa + (pb - pa) * da / (da - db),
            pa + (pc - pa) * da / (da - dc),
        )
    };

    if d0d1 > 0.0 {
        // d0 and d1 on the same side, d2 on the other side or on the plane
        Some(crossing(2))
    } else if d0d2 > 0.0 {
        // d0 and d2 on the same side, d1 on the other side or on the plane
        Some(crossing(1))
    } else if d1 * d2 > 0.0 || d0 != 0.0 {
        Some(crossing(0))
    } else if d1 != 0.0 {
        Some(crossing(1))
    } else if d2 != 0.0 {
        Some(crossing(2))
    } else {
        None
    }
}

/// 2D intersection test for triangles lying in one plane with normal `normal`
pub fn coplanar_triangles_intersect(normal: &Vec3, v: [Vec3; 3], u: [Vec3; 3]) -> bool {
    // drop the dominant axis of the normal to keep the largest projected area
    let (i0, i1) = match utils::dominant_axis(normal) {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    };
    let project = |p: &Vec3| [p[i0], p[i1]];
    let v2d = [project(&v[0]), project(&v[1]), project(&v[2])];
    let u2d = [project(&u[0]), project(&u[1]), project(&u[2])];

    let edges_cross = (0..3).any(|i| edge_against_triangle(v2d[i], v2d[(i + 1) % 3], &u2d));

    // one triangle entirely inside the other
    edges_cross || point_in_triangle(v2d[0], &u2d) || point_in_triangle(u2d[0], &v2d)
}

fn edge_against_triangle(a: [f64; 2], b: [f64; 2], tri: &[[f64; 2]; 3]) -> bool {
    let ax = b[0] - a[0];
    let ay = b[1] - a[1];
    (0..3).any(|i| edge_edge(a, ax, ay, tri[i], tri[(i + 1) % 3]))
}

/// Segment test from Franklin Antonio, "Faster Line Segment Intersection",
/// Graphics Gems III, pp. 199-202
fn edge_edge(v0: [f64; 2], ax: f64, ay: f64, u0: [f64; 2], u1: [f64; 2]) -> bool {
    let bx = u0[0] - u1[0];
    let by = u0[1] - u1[1];
    let cx = v0[0] - u0[0];
    let cy = v0[1] - u0[1];
    let f = ay * bx - ax * by;
    let d = by * cx - bx * cy;

    if f > 0.0 && d >= 0.0 && d <= f {
        let e = ax * cy - ay * cx;
        e >= 0.0 && e <= f
    } else if f < 0.0 && d <= 0.0 && d >= f {
        let e = ax * cy - ay * cx;
        e <= 0.0 && e >= f
    } else {
        false
    }
}

/// Strict interior test; points on an edge are outside
fn point_in_triangle(p: [f64; 2], tri: &[[f64; 2]; 3]) -> bool {
    let side = |from: [f64; 2], to: [f64; 2]| {
        let a = to[1] - from[1];
        let b = -(to[0] - from[0]);
        let c = -a * from[0] - b * from[1];
        a * p[0] + b * p[1] + c
    };
    let d0 = side(tri[0], tri[1]);
    let d1 = side(tri[1], tri[2]);
    let d2 = side(tri[2], tri[0]);
    d0 * d1 > 0.0 && d0 * d2 > 0.0
}
