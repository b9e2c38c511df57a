use serde::{Deserialize, Serialize};

/// A pixel coordinate `(x, y)` in the camera frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point(pub i32, pub i32);

impl Point {
    pub fn x(&self) -> i32 {
        self.0
    }

    pub fn y(&self) -> i32 {
        self.1
    }
}

/// A straight line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment(pub Point, pub Point);

/// An axis-aligned bounding box in `(x, y, w, h)` form, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Builds a rectangle from its top-left and bottom-right corners.
    pub fn from_corners(top_left: Point, bottom_right: Point) -> Self {
        Self {
            x: top_left.x(),
            y: top_left.y(),
            w: bottom_right.x().saturating_sub(top_left.x()),
            h: bottom_right.y().saturating_sub(top_left.y()),
        }
    }

    /// Right edge, saturated at the `i32` range.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.w)
    }

    /// Bottom edge, saturated at the `i32` range.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.h)
    }

    pub fn is_degenerate(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// The four edges: top, left, right, bottom.
    pub fn edges(&self) -> [Segment; 4] {
        let top_left = Point(self.x, self.y);
        let top_right = Point(self.right(), self.y);
        let bottom_left = Point(self.x, self.bottom());
        let bottom_right = Point(self.right(), self.bottom());
        [
            Segment(top_left, top_right),
            Segment(top_left, bottom_left),
            Segment(top_right, bottom_right),
            Segment(bottom_left, bottom_right),
        ]
    }
}

/// Area shared by two axis-aligned rectangles, 0 when they only touch or are disjoint.
pub fn overlap_area(r1: &Rect, r2: &Rect) -> i64 {
    let x_dist = r1.right().min(r2.right()) as i64 - r1.x.max(r2.x) as i64;
    let y_dist = r1.bottom().min(r2.bottom()) as i64 - r1.y.max(r2.y) as i64;

    if x_dist > 0 && y_dist > 0 {
        x_dist * y_dist
    } else {
        0
    }
}

// Strictly counter-clockwise; collinear triples are false.
fn ccw(a: Point, b: Point, c: Point) -> bool {
    let lhs = (c.y() as i64 - a.y() as i64) * (b.x() as i64 - a.x() as i64);
    let rhs = (b.y() as i64 - a.y() as i64) * (c.x() as i64 - a.x() as i64);
    lhs > rhs
}

/// Proper intersection test between two segments using orientation predicates.
/// Collinear and endpoint-touching configurations are not special-cased.
pub fn segments_intersect(l1: &Segment, l2: &Segment) -> bool {
    let Segment(a, b) = *l1;
    let Segment(c, d) = *l2;
    ccw(a, c, d) != ccw(b, c, d) && ccw(a, b, c) != ccw(a, b, d)
}

/// True if the segment crosses any of the rectangle's four edges.
pub fn segment_intersects_rect(segment: &Segment, rect: &Rect) -> bool {
    rect.edges()
        .iter()
        .any(|edge| segments_intersect(segment, edge))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn random_rect(rng: &mut SmallRng) -> Rect {
        Rect::new(
            rng.random_range(0..600),
            rng.random_range(0..600),
            rng.random_range(1..200),
            rng.random_range(1..200),
        )
    }

    fn random_point(rng: &mut SmallRng) -> Point {
        Point(rng.random_range(-50..650), rng.random_range(-50..650))
    }

    #[test]
    fn overlap_of_nested_rectangles_is_inner_area() {
        let outer = Rect::new(0, 0, 100, 100);
        let inner = Rect::new(10, 20, 30, 40);
        assert_eq!(overlap_area(&outer, &inner), 1200);
    }

    #[test]
    fn overlap_of_partial_rectangles() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert_eq!(overlap_area(&a, &b), 25);
    }

    #[test]
    fn touching_rectangles_do_not_overlap() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 10, 10);
        assert_eq!(overlap_area(&a, &b), 0);
        let far = Rect::new(300, 300, 5, 5);
        assert_eq!(overlap_area(&a, &far), 0);
    }

    #[test]
    fn overlap_is_symmetric_and_never_negative() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..2000 {
            let r1 = random_rect(&mut rng);
            let r2 = random_rect(&mut rng);
            let area = overlap_area(&r1, &r2);
            assert_eq!(area, overlap_area(&r2, &r1));
            assert!(area >= 0);
            let disjoint = r1.right() <= r2.x
                || r2.right() <= r1.x
                || r1.bottom() <= r2.y
                || r2.bottom() <= r1.y;
            if disjoint {
                assert_eq!(area, 0);
            }
        }
    }

    #[test]
    fn boxes_at_the_edge_of_the_coordinate_range_do_not_overflow() {
        let far = Rect::new(i32::MAX - 5, i32::MAX - 5, 10, 10);
        assert_eq!(far.right(), i32::MAX);
        assert_eq!(far.bottom(), i32::MAX);
        assert_eq!(overlap_area(&far, &Rect::new(0, 0, 100, 100)), 0);
        assert_eq!(overlap_area(&far, &far), 25);

        let line = Segment(Point(218, 95), Point(324, 95));
        assert!(!segment_intersects_rect(&line, &far));
        let wide = Rect::from_corners(Point(i32::MIN, 0), Point(i32::MAX, 10));
        assert_eq!(wide.w, i32::MAX);
    }

    #[test]
    fn crossing_segments_intersect() {
        let a = Segment(Point(0, 0), Point(10, 10));
        let b = Segment(Point(0, 10), Point(10, 0));
        assert!(segments_intersect(&a, &b));
    }

    #[test]
    fn parallel_and_collinear_segments_do_not_intersect() {
        let a = Segment(Point(0, 0), Point(10, 0));
        let b = Segment(Point(0, 5), Point(10, 5));
        assert!(!segments_intersect(&a, &b));
        let overlapping = Segment(Point(5, 0), Point(15, 0));
        assert!(!segments_intersect(&a, &overlapping));
    }

    #[test]
    fn segment_intersection_is_symmetric() {
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..2000 {
            let a = Segment(random_point(&mut rng), random_point(&mut rng));
            let b = Segment(random_point(&mut rng), random_point(&mut rng));
            assert_eq!(segments_intersect(&a, &b), segments_intersect(&b, &a));
        }
    }

    #[test]
    fn segment_through_rectangle_hits_an_edge() {
        let top_stop_line = Segment(Point(218, 95), Point(324, 95));
        let straddling = Rect::new(230, 80, 30, 40);
        assert!(segment_intersects_rect(&top_stop_line, &straddling));
    }

    #[test]
    fn segment_clear_of_rectangle_misses() {
        let top_stop_line = Segment(Point(218, 95), Point(324, 95));
        let above = Rect::new(230, 20, 30, 40);
        assert!(!segment_intersects_rect(&top_stop_line, &above));
    }

    #[test]
    fn segment_inside_rectangle_does_not_count() {
        let inner = Segment(Point(12, 12), Point(18, 18));
        let rect = Rect::new(10, 10, 10, 10);
        assert!(!segment_intersects_rect(&inner, &rect));
    }
}
