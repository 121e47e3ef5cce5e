use rand::{Rng, SeedableRng};
use tile_atlas_core::grid::{Axis, FreeSpaceGrid, GridError, Side};
use tile_atlas_core::model::Rect;

#[test]
fn fresh_grid_is_one_cell() {
    let g = FreeSpaceGrid::new(16, 16);
    assert_eq!(g.columns(), 1);
    assert_eq!(g.rows(), 1);
    assert_eq!(g.len(), 1);
    let c = g.cell(g.origin());
    assert_eq!((c.width, c.height, c.occupied), (16, 16, false));
    for side in Side::ALL {
        assert!(c.neighbor(side).is_none());
    }
    g.check_integrity().expect("sound");
}

#[test]
fn horizontal_divide_links_sibling_to_the_right() {
    let mut g = FreeSpaceGrid::new(16, 16);
    let origin = g.origin();
    let sib = g.divide(origin, 6, Axis::Horizontal).expect("divide");
    assert_eq!(g.columns(), 2);
    assert_eq!(g.rows(), 1);
    assert_eq!(g.cell(origin).width, 6);
    assert_eq!(g.cell(sib).width, 10);
    assert_eq!(g.cell(sib).height, 16);
    assert_eq!(g.neighbor(origin, Side::Right), Some(sib));
    assert_eq!(g.neighbor(sib, Side::Left), Some(origin));
    assert_eq!(g.neighbor(sib, Side::Right), None);
    assert_eq!(g.get(1, 0).unwrap(), sib);
    g.check_integrity().expect("sound");
}

#[test]
fn column_split_propagates_through_every_row() {
    let mut g = FreeSpaceGrid::new(16, 16);
    let origin = g.origin();
    let bottom = g.divide(origin, 8, Axis::Vertical).expect("row split");
    assert_eq!(g.get(0, 1).unwrap(), bottom);

    // Splitting the lower cell must also split the cell above it.
    let sib = g.divide(bottom, 4, Axis::Horizontal).expect("column split");
    assert_eq!(g.columns(), 2);
    assert_eq!(g.rows(), 2);
    assert_eq!(g.len(), 4);
    assert_eq!(g.get(1, 1).unwrap(), sib);

    let top_right = g.get(1, 0).unwrap();
    assert_eq!(g.cell(top_right).width, 12);
    assert_eq!(g.cell(top_right).height, 8);
    assert_eq!(g.cell(origin).width, 4);
    assert_eq!(g.neighbor(top_right, Side::Bottom), Some(sib));
    assert_eq!(g.neighbor(sib, Side::Top), Some(top_right));
    g.check_integrity().expect("sound");
}

#[test]
fn row_split_in_middle_column_reaches_both_sides() {
    let mut g = FreeSpaceGrid::new(30, 30);
    let origin = g.origin();
    let mid = g.divide(origin, 10, Axis::Horizontal).unwrap();
    g.divide(mid, 10, Axis::Horizontal).unwrap();
    assert_eq!(g.columns(), 3);

    // Cut the middle column's only cell horizontally; all three columns gain a row.
    let below = g.divide(mid, 12, Axis::Vertical).unwrap();
    assert_eq!(g.rows(), 2);
    assert_eq!(g.len(), 6);
    assert_eq!(g.get(1, 1).unwrap(), below);

    assert_eq!(g.cell_rect(0, 0).unwrap(), Rect::new(0, 0, 10, 12));
    assert_eq!(g.cell_rect(2, 0).unwrap(), Rect::new(20, 0, 10, 12));
    assert_eq!(g.cell_rect(0, 1).unwrap(), Rect::new(0, 12, 10, 18));
    assert_eq!(g.cell_rect(1, 1).unwrap(), Rect::new(10, 12, 10, 18));
    assert_eq!(g.cell_rect(2, 1).unwrap(), Rect::new(20, 12, 10, 18));
    g.check_integrity().expect("sound");
}

#[test]
fn sibling_inherits_occupancy() {
    let mut g = FreeSpaceGrid::new(8, 8);
    let origin = g.origin();
    g.mark_occupied(origin, 1, 1).unwrap();
    let sib = g.divide(origin, 3, Axis::Horizontal).unwrap();
    assert!(g.cell(sib).occupied);
    let below = g.divide(origin, 5, Axis::Vertical).unwrap();
    assert!(g.cell(below).occupied);
    g.check_integrity().expect("sound");
}

#[test]
fn invalid_offsets_are_rejected() {
    let mut g = FreeSpaceGrid::new(8, 8);
    let origin = g.origin();
    assert_eq!(
        g.divide(origin, 0, Axis::Horizontal),
        Err(GridError::InvalidSplit {
            offset: 0,
            extent: 8
        })
    );
    assert!(matches!(
        g.divide(origin, 8, Axis::Vertical),
        Err(GridError::InvalidSplit { .. })
    ));
    assert_eq!(g.len(), 1);
}

#[test]
fn get_out_of_bounds_fails() {
    let mut g = FreeSpaceGrid::new(8, 8);
    g.divide(g.origin(), 4, Axis::Horizontal).unwrap();
    assert!(g.get(1, 0).is_ok());
    match g.get(2, 0) {
        Err(GridError::OutOfBounds {
            column,
            columns,
            rows,
            ..
        }) => {
            assert_eq!(column, 2);
            assert_eq!(columns, 2);
            assert_eq!(rows, 1);
        }
        other => panic!("expected OutOfBounds, got {:?}", other),
    }
    assert!(g.get(0, 1).is_err());
}

#[test]
fn span_counts_cells_until_required_extent() {
    let mut g = FreeSpaceGrid::new(16, 16);
    let origin = g.origin();
    let second = g.divide(origin, 4, Axis::Horizontal).unwrap();
    g.divide(second, 4, Axis::Horizontal).unwrap();
    // columns: 4, 4, 8
    assert_eq!(g.span(origin, 1, Axis::Horizontal), 1);
    assert_eq!(g.span(origin, 4, Axis::Horizontal), 1);
    assert_eq!(g.span(origin, 5, Axis::Horizontal), 2);
    assert_eq!(g.span(origin, 16, Axis::Horizontal), 3);
    assert_eq!(g.span(origin, 17, Axis::Horizontal), 0);
    assert_eq!(g.span(origin, 16, Axis::Vertical), 1);
    assert_eq!(g.span(origin, 17, Axis::Vertical), 0);

    g.mark_occupied(second, 1, 1).unwrap();
    assert_eq!(g.span(origin, 5, Axis::Horizontal), 0);
    assert_eq!(g.span(origin, 4, Axis::Horizontal), 1);
    assert_eq!(g.span(second, 1, Axis::Horizontal), 0);
}

#[test]
fn mark_occupied_covers_block_only() {
    let mut g = FreeSpaceGrid::new(12, 12);
    let origin = g.origin();
    let c1 = g.divide(origin, 4, Axis::Horizontal).unwrap();
    g.divide(c1, 4, Axis::Horizontal).unwrap();
    let r1 = g.divide(origin, 4, Axis::Vertical).unwrap();
    g.divide(r1, 4, Axis::Vertical).unwrap();
    assert_eq!((g.columns(), g.rows()), (3, 3));

    assert!(g.is_block_empty(origin, 3, 3));
    g.mark_occupied(g.get(1, 1).unwrap(), 2, 2).unwrap();
    for (c, r) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
        assert!(g.cell(g.get(c, r).unwrap()).occupied, "({c},{r})");
    }
    for (c, r) in [(0, 0), (1, 0), (2, 0), (0, 1), (0, 2)] {
        assert!(!g.cell(g.get(c, r).unwrap()).occupied, "({c},{r})");
    }
    // First row and column of this block are free, the interior is not.
    assert!(!g.is_block_empty(origin, 2, 2));
    assert!(g.is_block_empty(origin, 3, 1));
    assert!(!g.is_block_empty(origin, 4, 1));
    assert!(matches!(
        g.mark_occupied(origin, 4, 1),
        Err(GridError::BlockOutOfBounds { .. })
    ));
}

#[test]
fn random_divides_keep_the_grid_rectangular() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let mut g = FreeSpaceGrid::new(256, 256);
    for _ in 0..200 {
        let c = rng.gen_range(0..g.columns());
        let r = rng.gen_range(0..g.rows());
        let id = g.get(c, r).unwrap();
        let axis = if rng.gen_bool(0.5) {
            Axis::Horizontal
        } else {
            Axis::Vertical
        };
        let extent = g.cell(id).extent(axis);
        if extent < 2 {
            continue;
        }
        let offset = rng.gen_range(1..extent);
        g.divide(id, offset, axis).unwrap();
        g.check_integrity().expect("grid stays sound after every divide");
    }
    assert_eq!(g.len(), g.columns() * g.rows());
    let last = g.cell_rect(g.columns() - 1, g.rows() - 1).unwrap();
    assert_eq!(last.x + last.w, 256);
    assert_eq!(last.y + last.h, 256);
}
