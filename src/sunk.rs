//! Infers a ship's extent from adjacency on a grid and decides whether it sank.
//!
//! The grid carries no ship identity, so the extent of the ship under a hit
//! cell is the straight run of `Hit`/`ShipPresent` neighbours through it. The
//! horizontal run is tried first; only when it is a single cell is the
//! vertical run used.

use alloc::vec::Vec;

use crate::common::EngineError;
use crate::grid::{Cell, Grid};

fn scan(grid: &Grid, row: usize, col: usize, dr: isize, dc: isize) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let (mut r, mut c) = (row as isize, col as isize);
    loop {
        r += dr;
        c += dc;
        if r < 0 || c < 0 {
            break;
        }
        match grid.get(r as usize, c as usize) {
            Ok(cell) if cell.is_ship_segment() => out.push((r as usize, c as usize)),
            _ => break,
        }
    }
    out
}

fn axis_run(grid: &Grid, row: usize, col: usize, dr: isize, dc: isize) -> Vec<(usize, usize)> {
    let mut run: Vec<(usize, usize)> = scan(grid, row, col, -dr, -dc);
    run.reverse();
    run.push((row, col));
    run.extend(scan(grid, row, col, dr, dc));
    run
}

/// Cells of the ship through `(row, col)`, ordered left-to-right or
/// top-to-bottom. A cell with no ship neighbour is its own extent.
pub fn find_ship_extent(grid: &Grid, row: usize, col: usize) -> Result<Vec<(usize, usize)>, EngineError> {
    grid.get(row, col)?;
    let horizontal = axis_run(grid, row, col, 0, 1);
    if horizontal.len() > 1 {
        return Ok(horizontal);
    }
    Ok(axis_run(grid, row, col, 1, 0))
}

/// Whether every cell of `extent` is `Hit`.
pub fn is_fully_hit(extent: &[(usize, usize)], grid: &Grid) -> bool {
    !extent.is_empty()
        && extent
            .iter()
            .all(|&(r, c)| matches!(grid.get(r, c), Ok(Cell::Hit)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(cells: &[(usize, usize, Cell)]) -> Grid {
        cells
            .iter()
            .fold(Grid::new(10), |g, &(r, c, s)| g.set_cell(r, c, s).unwrap())
    }

    #[test]
    fn horizontal_run_wins_over_vertical() {
        let g = grid_with(&[
            (3, 4, Cell::Hit),
            (3, 5, Cell::ShipPresent),
            (4, 4, Cell::ShipPresent),
        ]);
        assert_eq!(find_ship_extent(&g, 3, 4).unwrap(), vec![(3, 4), (3, 5)]);
    }

    #[test]
    fn falls_back_to_vertical() {
        let g = grid_with(&[(1, 7, Cell::ShipPresent), (2, 7, Cell::Hit), (3, 7, Cell::Hit)]);
        let extent = find_ship_extent(&g, 2, 7).unwrap();
        assert_eq!(extent, vec![(1, 7), (2, 7), (3, 7)]);
        assert!(!is_fully_hit(&extent, &g));
    }

    #[test]
    fn isolated_hit_is_its_own_extent() {
        let g = grid_with(&[(0, 0, Cell::Hit), (0, 1, Cell::Sunk)]);
        let extent = find_ship_extent(&g, 0, 0).unwrap();
        assert_eq!(extent, vec![(0, 0)]);
        assert!(is_fully_hit(&extent, &g));
    }

    #[test]
    fn run_stops_at_board_edge() {
        let g = grid_with(&[(9, 8, Cell::Hit), (9, 9, Cell::Hit)]);
        assert_eq!(find_ship_extent(&g, 9, 9).unwrap(), vec![(9, 8), (9, 9)]);
    }
}
