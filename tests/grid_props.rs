use battleship_sync::{Cell, EngineError, Grid, BOARD_SIZE};
use proptest::prelude::*;

fn any_cell() -> impl Strategy<Value = Cell> {
    prop_oneof![
        Just(Cell::Empty),
        Just(Cell::ShipPresent),
        Just(Cell::Hit),
        Just(Cell::Miss),
        Just(Cell::Sunk),
    ]
}

fn any_grid() -> impl Strategy<Value = Grid> {
    prop::collection::vec((0..BOARD_SIZE, 0..BOARD_SIZE, any_cell()), 0..40).prop_map(|writes| {
        writes
            .into_iter()
            .fold(Grid::new(BOARD_SIZE), |g, (r, c, s)| g.set_cell(r, c, s).unwrap())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn set_then_get_changes_only_that_cell(
        grid in any_grid(),
        row in 0..BOARD_SIZE,
        col in 0..BOARD_SIZE,
        state in any_cell(),
    ) {
        let next = grid.set_cell(row, col, state).unwrap();
        prop_assert_eq!(next.get(row, col).unwrap(), state);
        for (r, c, cell) in grid.iter() {
            if (r, c) != (row, col) {
                prop_assert_eq!(next.get(r, c).unwrap(), cell);
            }
        }
    }

    #[test]
    fn out_of_range_reads_fail(row in BOARD_SIZE..BOARD_SIZE * 3, col in 0..BOARD_SIZE * 3) {
        let grid = Grid::new(BOARD_SIZE);
        prop_assert_eq!(grid.get(row, col).unwrap_err(), EngineError::OutOfBounds { row, col });
        prop_assert_eq!(grid.get(col, row).unwrap_err(), EngineError::OutOfBounds { row: col, col: row });
    }
}

#[test]
fn new_grid_is_all_empty() {
    let grid = Grid::new(BOARD_SIZE);
    assert_eq!(grid.size(), BOARD_SIZE);
    assert_eq!(grid.count(Cell::Empty), BOARD_SIZE * BOARD_SIZE);
    assert!(grid.iter().all(|(_, _, c)| c == Cell::Empty));
}
