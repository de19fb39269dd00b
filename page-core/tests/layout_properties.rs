//! Property tests for layout arithmetic and undo history.

use page_core::layout::{detect_collision, is_on_grid, snap_to_grid, Bounds};
use page_core::History;
use proptest::prelude::*;

fn bounds() -> impl Strategy<Value = Bounds> {
    (0.0..2000.0f64, 0.0..2000.0f64, 1.0..500.0f64, 1.0..500.0f64)
        .prop_map(|(x, y, w, h)| Bounds::new(x, y, w, h))
}

proptest! {
    #[test]
    fn test_snap_is_idempotent(x in 0.0..5000.0f64, y in 0.0..5000.0f64, grid in 1u32..64) {
        let grid = f64::from(grid);
        let once = snap_to_grid(x, y, grid);
        let twice = snap_to_grid(once.x, once.y, grid);
        prop_assert_eq!(once, twice);
        prop_assert!(is_on_grid(once.x, once.y, grid));
    }

    #[test]
    fn test_snap_moves_less_than_half_a_cell(
        x in 0.0..5000.0f64,
        y in 0.0..5000.0f64,
        grid in 1u32..64,
    ) {
        let grid = f64::from(grid);
        let snapped = snap_to_grid(x, y, grid);
        prop_assert!((snapped.x - x).abs() <= grid / 2.0 + 1e-9);
        prop_assert!((snapped.y - y).abs() <= grid / 2.0 + 1e-9);
    }

    #[test]
    fn test_collision_is_symmetric(a in bounds(), b in bounds()) {
        prop_assert_eq!(detect_collision(&a, &b), detect_collision(&b, &a));
    }

    #[test]
    fn test_rectangle_collides_with_itself(a in bounds()) {
        prop_assert!(detect_collision(&a, &a));
    }

    #[test]
    fn test_undo_then_redo_restores_present(values in prop::collection::vec(any::<i32>(), 1..20)) {
        let mut history = History::new(0);
        for value in &values {
            history = history.record(*value);
        }
        let present = *history.present();
        let restored = history.undo().redo();
        prop_assert_eq!(*restored.present(), present);
        prop_assert!(!restored.can_redo());
    }

    #[test]
    fn test_undo_walks_back_in_order(values in prop::collection::vec(any::<i32>(), 1..20)) {
        let mut history = History::with_limit(0, 0);
        for value in &values {
            history = history.record(*value);
        }
        for expected in values.iter().rev().skip(1).chain(std::iter::once(&0)) {
            history = history.undo();
            prop_assert_eq!(history.present(), expected);
        }
        prop_assert!(!history.can_undo());
        prop_assert_eq!(history.len_future(), values.len());
    }

    #[test]
    fn test_limit_bounds_past(
        values in prop::collection::vec(any::<i32>(), 0..50),
        limit in 1usize..10,
    ) {
        let mut history = History::with_limit(0, limit);
        for value in &values {
            history = history.record(*value);
        }
        prop_assert!(history.len_past() <= limit);
        prop_assert_eq!(history.len_past(), values.len().min(limit));
    }
}
