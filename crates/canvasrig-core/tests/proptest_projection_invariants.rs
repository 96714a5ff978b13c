//! Property-based invariant tests for normalized → absolute projection.
//!
//! 1. Unit-square fractions always land inside the rectangle.
//! 2. The origin maps to the top-left corner, (1,1) to the bottom-right.
//! 3. Projection is monotone along each axis.
//! 4. Lerp endpoints are exact for arbitrary points.
//! 5. Registry lookups are deterministic.

use canvasrig_core::geometry::{NormalizedPosition, Point, SurfaceRect};
use canvasrig_core::layout::{self, LayoutGroup};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn rect_strategy() -> impl Strategy<Value = SurfaceRect> {
    (-2000.0f64..2000.0, -2000.0f64..2000.0, 1.0f64..4000.0, 1.0f64..4000.0)
        .prop_map(|(x, y, w, h)| SurfaceRect::new(x, y, w, h))
}

fn unit_position() -> impl Strategy<Value = NormalizedPosition> {
    (0.0f64..=1.0, 0.0f64..=1.0).prop_map(|(x, y)| NormalizedPosition::new(x, y))
}

fn point_strategy() -> impl Strategy<Value = Point> {
    (-1.0e6f64..1.0e6, -1.0e6f64..1.0e6).prop_map(|(x, y)| Point::new(x, y))
}

proptest! {
    #[test]
    fn unit_fractions_stay_inside(rect in rect_strategy(), pos in unit_position()) {
        let p = rect.project(pos);
        // Allow one ulp-scale of slack on the far edges.
        let eps = 1e-9 * (rect.width.abs() + rect.height.abs() + rect.x.abs() + rect.y.abs());
        prop_assert!(
            p.x >= rect.x - eps && p.x <= rect.right() + eps,
            "x={} rect={:?}",
            p.x,
            rect
        );
        prop_assert!(
            p.y >= rect.y - eps && p.y <= rect.bottom() + eps,
            "y={} rect={:?}",
            p.y,
            rect
        );
    }
}

proptest! {
    #[test]
    fn corners_map_to_corners(rect in rect_strategy()) {
        prop_assert_eq!(rect.project(NormalizedPosition::ORIGIN), Point::new(rect.x, rect.y));
        prop_assert_eq!(
            rect.project(NormalizedPosition::new(1.0, 1.0)),
            Point::new(rect.right(), rect.bottom())
        );
    }
}

proptest! {
    #[test]
    fn projection_is_monotone(rect in rect_strategy(), a in unit_position(), b in unit_position()) {
        let pa = rect.project(a);
        let pb = rect.project(b);
        if a.x <= b.x {
            prop_assert!(pa.x <= pb.x);
        }
        if a.y <= b.y {
            prop_assert!(pa.y <= pb.y);
        }
    }
}

proptest! {
    #[test]
    fn lerp_endpoints_exact(from in point_strategy(), to in point_strategy()) {
        prop_assert_eq!(Point::lerp(from, to, 0.0), from);
        prop_assert_eq!(Point::lerp(from, to, 1.0), to);
    }
}

proptest! {
    #[test]
    fn registry_lookup_deterministic(idx in 0usize..25) {
        let entry = layout::entries().nth(idx).expect("25 entries");
        let name = entry.qualified_name();
        let first = layout::lookup(&name);
        let second = layout::lookup(&name);
        prop_assert_eq!(first.clone(), second);
        prop_assert_eq!(first, Ok(entry.position));
        prop_assert_eq!(layout::lookup_in(entry.group, entry.name), Ok(entry.position));
    }
}

#[test]
fn groups_partition_entries() {
    let total: usize = LayoutGroup::ALL.iter().map(|g| g.entries().len()).sum();
    assert_eq!(total, layout::entries().count());
}
