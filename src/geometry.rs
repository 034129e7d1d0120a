//! Geometric primitives shared by the triangulation and convex-decomposition algorithms.
//!
//! All coordinates are `f64`. A single scaled epsilon policy backs every "on the line" /
//! "inside circle" decision so geometric predicates stay mutually consistent.

use crate::error::{PlcError, Result};

/// Base epsilon, scaled by operand magnitude wherever a comparison needs to tolerate
/// floating-point noise proportional to coordinate size.
pub const EPSILON: f64 = 1e-10;

/// Returns an epsilon scaled by the magnitude of `a` and `b`, matching the "never smaller than
/// the base epsilon, grows with operand size" policy used throughout this crate.
pub fn scaled_epsilon(a: f64, b: f64) -> f64 {
    (1.0_f64).max(a.abs() + b.abs()) * EPSILON
}

/// A point (or, where the context is a difference, a vector) in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn scale(self, s: f64) -> Point {
        Point::new(self.x * s, self.y * s)
    }

    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (z-component of the 3D cross product of the two vectors).
    pub fn cross(self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn dist(self, other: Point) -> f64 {
        self.sub(other).norm()
    }

    pub fn dist2(self, other: Point) -> f64 {
        let d = self.sub(other);
        d.dot(d)
    }

    /// A vector perpendicular to `self`, rotated 90 degrees clockwise.
    pub fn perp(self) -> Point {
        Point::new(self.y, -self.x)
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }
}

/// An axis-aligned bounding box. Empty boxes (no vertex ever unioned in) are represented
/// separately by callers via `Option<Rect>`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub lo: Point,
    pub hi: Point,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Rect {
            lo: Point::new(x0.min(x1), y0.min(y1)),
            hi: Point::new(x0.max(x1), y0.max(y1)),
        }
    }

    pub fn union_point(self, p: Point) -> Rect {
        Rect {
            lo: Point::new(self.lo.x.min(p.x), self.lo.y.min(p.y)),
            hi: Point::new(self.hi.x.max(p.x), self.hi.y.max(p.y)),
        }
    }

    pub fn area(self) -> f64 {
        (self.hi.x - self.lo.x) * (self.hi.y - self.lo.y)
    }
}

/// Sign of the 2D cross product of the edge direction `v1 -> v2` against `p - v1`.
///
/// Returns -1 (left), 0 (on the line), +1 (right). Note this convention is the negation of
/// the usual signed-area convention: a point to the left of the directed edge (which would
/// give a positive signed area) returns -1 here.
pub fn side_of(v1: Point, v2: Point, p: Point) -> i32 {
    let d = v2.sub(v1);
    let q = p.sub(v1);
    let cross = d.cross(q);
    let eps = scaled_epsilon(d.x.abs() + d.y.abs(), q.x.abs() + q.y.abs()) * (d.norm().max(1.0));
    if cross > eps {
        -1
    } else if cross < -eps {
        1
    } else {
        0
    }
}

/// True iff `p` lies exactly on the line through `v1, v2` AND strictly between the endpoints
/// (endpoints themselves excluded).
pub fn point_on(v1: Point, v2: Point, p: Point) -> bool {
    if side_of(v1, v2, p) != 0 {
        return false;
    }
    let d = v2.sub(v1);
    let q = p.sub(v1);
    let t = if d.x.abs() > d.y.abs() {
        q.x / d.x
    } else {
        q.y / d.y
    };
    let eps = scaled_epsilon(0.0, 1.0);
    t > eps && t < 1.0 - eps
}

/// True iff the open interiors of segments `(a1,a2)` and `(b1,b2)` share a point that is not
/// an endpoint of either segment.
pub fn crosses(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let d1 = side_of(a1, a2, b1);
    let d2 = side_of(a1, a2, b2);
    let d3 = side_of(b1, b2, a1);
    let d4 = side_of(b1, b2, a2);
    d1 != 0 && d2 != 0 && d1 != d2 && d3 != 0 && d4 != 0 && d3 != d4
}

/// Same as [`crosses`] but a shared endpoint also counts as crossing.
pub fn crosses_including(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    if crosses(a1, a2, b1, b2) {
        return true;
    }
    let d1 = side_of(a1, a2, b1);
    let d2 = side_of(a1, a2, b2);
    let d3 = side_of(b1, b2, a1);
    let d4 = side_of(b1, b2, a2);
    (d1 == 0 || d2 == 0) && (d3 == 0 || d4 == 0) && d1 != d2 && d3 != d4
}

/// The unique intersection point of two crossing lines through `(a1,a2)` and `(b1,b2)`.
///
/// Callers are expected to have already established the segments cross (or touch); this
/// function does not itself validate that.
pub fn intersection_point(a1: Point, a2: Point, b1: Point, b2: Point) -> Option<Point> {
    let da = a2.sub(a1);
    let db = b2.sub(b1);
    let denom = da.cross(db);
    if denom.abs() <= scaled_epsilon(da.x + da.y, db.x + db.y) {
        return None;
    }
    let t = b1.sub(a1).cross(db) / denom;
    Some(a1.add(da.scale(t)))
}

/// Circumcenter and circumradius of a triangle, or `Err` if the triangle is degenerate
/// (zero or numerically-indistinguishable-from-zero area).
pub fn circumcircle(a: Point, b: Point, c: Point) -> Result<(Point, f64)> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() <= scaled_epsilon(a.x + a.y, b.x + b.y + c.x + c.y) {
        return Err(PlcError::DegenerateCircumcircle);
    }
    let a2 = a.dot(a);
    let b2 = b.dot(b);
    let c2 = c.dot(c);
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
    let center = Point::new(ux, uy);
    let radius = center.dist(a);
    Ok((center, radius))
}

/// -1 outside, 0 on, +1 strictly inside the circle of the given center/radius, with a
/// scaled-epsilon tolerance on the boundary.
pub fn in_circle(p: Point, center: Point, radius: f64) -> i32 {
    let d = p.dist(center);
    let eps = scaled_epsilon(radius, d);
    if d < radius - eps {
        1
    } else if d > radius + eps {
        -1
    } else {
        0
    }
}

/// Per-axis scaled-epsilon point equality.
pub fn is_equal(p1: Point, p2: Point) -> bool {
    (p1.x - p2.x).abs() <= scaled_epsilon(p1.x, p2.x)
        && (p1.y - p2.y).abs() <= scaled_epsilon(p1.y, p2.y)
}

/// Twice the signed area of the triangle `(a, b, c)` under the usual (counter-clockwise
/// positive) convention -- the negation of [`side_of`]'s sign.
pub fn signed_area2(a: Point, b: Point, c: Point) -> f64 {
    b.sub(a).cross(c.sub(a))
}
