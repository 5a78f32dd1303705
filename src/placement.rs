//! Setup-phase placement rules: bounds, overlap and rotation checks.

use alloc::vec::Vec;
use log::debug;
use rand::Rng;

use crate::common::EngineError;
use crate::ship::{span_cells, Fleet, Orientation, Ship, ShipId};

/// Whether `ship` anchored at `(row, col)` stays inside a `board_size` grid.
pub fn fits(
    ship: &Ship,
    row: usize,
    col: usize,
    orientation: Orientation,
    board_size: usize,
) -> Result<bool, EngineError> {
    if ship.size == 0 {
        return Err(EngineError::InvalidShipSize(ship.size));
    }
    let (fixed, moving) = match orientation {
        Orientation::Horizontal => (row, col),
        Orientation::Vertical => (col, row),
    };
    Ok(fixed < board_size
        && moving
            .checked_add(ship.size)
            .map_or(false, |end| end <= board_size))
}

/// Whether the candidate placement shares a cell with any other placed ship.
/// The ship itself is skipped by id; unplaced ships never overlap, and
/// neither does a run that leaves the coordinate space.
pub fn overlaps<'a, I>(ship: &Ship, row: usize, col: usize, orientation: Orientation, others: I) -> bool
where
    I: IntoIterator<Item = &'a Ship>,
{
    let Some(candidate) = span_cells(ship.size, row, col, orientation) else {
        return false;
    };
    others
        .into_iter()
        .filter(|other| other.id != ship.id)
        .any(|other| other.cells().iter().any(|cell| candidate.contains(cell)))
}

/// `fits` and does not `overlap`.
pub fn is_valid_placement<'a, I>(
    ship: &Ship,
    row: usize,
    col: usize,
    orientation: Orientation,
    others: I,
    board_size: usize,
) -> Result<bool, EngineError>
where
    I: IntoIterator<Item = &'a Ship>,
{
    Ok(fits(ship, row, col, orientation, board_size)?
        && !overlaps(ship, row, col, orientation, others))
}

/// Re-check the ship at its current anchor with `new_orientation`. An
/// unplaced ship can always rotate.
pub fn is_valid_rotation<'a, I>(
    ship: &Ship,
    new_orientation: Orientation,
    others: I,
    board_size: usize,
) -> Result<bool, EngineError>
where
    I: IntoIterator<Item = &'a Ship>,
{
    match ship.anchor {
        Some((row, col)) => is_valid_placement(ship, row, col, new_orientation, others, board_size),
        None => Ok(true),
    }
}

/// Pick a random valid `(row, col, orientation)` for `ship`.
pub fn random_placement<'a, R, I>(
    rng: &mut R,
    ship: &Ship,
    others: I,
    board_size: usize,
) -> Result<(usize, usize, Orientation), EngineError>
where
    R: Rng,
    I: IntoIterator<Item = &'a Ship>,
{
    if ship.size == 0 {
        return Err(EngineError::InvalidShipSize(ship.size));
    }
    if ship.size > board_size {
        return Err(EngineError::InvalidPlacement);
    }
    let others: Vec<&Ship> = others.into_iter().collect();
    for _ in 0..100 {
        let orient = if rng.random() {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        let span = board_size - ship.size;
        let (r, c) = match orient {
            Orientation::Horizontal => (
                rng.random_range(0..board_size),
                rng.random_range(0..=span),
            ),
            Orientation::Vertical => (
                rng.random_range(0..=span),
                rng.random_range(0..board_size),
            ),
        };
        if !overlaps(ship, r, c, orient, others.iter().copied()) {
            return Ok((r, c, orient));
        }
    }
    Err(EngineError::InvalidPlacement)
}

impl Fleet {
    /// Anchor `id` at `(row, col)` with `orientation`. On rejection the ship
    /// keeps its previous position.
    pub fn place(
        &mut self,
        id: ShipId,
        row: usize,
        col: usize,
        orientation: Orientation,
        board_size: usize,
    ) -> Result<(), EngineError> {
        let ship = *self.get(id)?;
        if !is_valid_placement(&ship, row, col, orientation, self.others(id), board_size)? {
            return Err(EngineError::InvalidPlacement);
        }
        let slot = self.get_mut(id)?;
        slot.anchor = Some((row, col));
        slot.orientation = orientation;
        debug!("placed ship {} at ({}, {}) {:?}", id.0, row, col, orientation);
        Ok(())
    }

    /// Flip the orientation of `id` about its anchor.
    pub fn rotate(&mut self, id: ShipId, board_size: usize) -> Result<Orientation, EngineError> {
        let ship = *self.get(id)?;
        let flipped = ship.orientation.flipped();
        if !is_valid_rotation(&ship, flipped, self.others(id), board_size)? {
            return Err(EngineError::InvalidRotation);
        }
        self.get_mut(id)?.orientation = flipped;
        Ok(flipped)
    }

    /// Place every unplaced ship at a random valid position.
    pub fn place_randomly<R: Rng>(&mut self, rng: &mut R, board_size: usize) -> Result<(), EngineError> {
        let pending: Vec<ShipId> = self
            .ships()
            .iter()
            .filter(|s| !s.is_placed())
            .map(|s| s.id)
            .collect();
        for id in pending {
            let ship = *self.get(id)?;
            let (r, c, o) = random_placement(rng, &ship, self.others(id), board_size)?;
            self.place(id, r, c, o, board_size)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BOARD_SIZE;

    fn ship(id: usize, size: usize) -> Ship {
        Ship::new(ShipId(id), size, Orientation::Horizontal)
    }

    #[test]
    fn fits_respects_edges() {
        let s = ship(0, 3);
        assert!(fits(&s, 0, 7, Orientation::Horizontal, BOARD_SIZE).unwrap());
        assert!(!fits(&s, 0, 8, Orientation::Horizontal, BOARD_SIZE).unwrap());
        assert!(fits(&s, 7, 9, Orientation::Vertical, BOARD_SIZE).unwrap());
        assert!(!fits(&s, 8, 9, Orientation::Vertical, BOARD_SIZE).unwrap());
        assert!(!fits(&s, 10, 0, Orientation::Horizontal, BOARD_SIZE).unwrap());
    }

    #[test]
    fn zero_sized_ship_is_rejected() {
        assert_eq!(
            fits(&ship(0, 0), 0, 0, Orientation::Horizontal, BOARD_SIZE).unwrap_err(),
            EngineError::InvalidShipSize(0)
        );
    }

    #[test]
    fn overlap_ignores_self_and_unplaced() {
        let mut placed = ship(0, 3);
        placed.anchor = Some((2, 2));
        let unplaced = ship(1, 5);
        // moving a ship onto its own old cells is fine
        assert!(!overlaps(&placed, 2, 3, Orientation::Horizontal, [&placed, &unplaced]));
        let other = ship(2, 2);
        assert!(overlaps(&other, 1, 3, Orientation::Vertical, [&placed]));
        assert!(!overlaps(&other, 3, 2, Orientation::Horizontal, [&placed, &unplaced]));
    }

    #[test]
    fn huge_anchor_does_not_overflow() {
        let mut placed = ship(1, 3);
        placed.anchor = Some((0, 0));
        let s = ship(0, 4);
        assert!(!overlaps(&s, usize::MAX, 0, Orientation::Vertical, [&placed]));
        assert!(!overlaps(&s, 0, usize::MAX - 1, Orientation::Horizontal, [&placed]));
        assert!(!is_valid_placement(&s, usize::MAX, 0, Orientation::Vertical, [&placed], BOARD_SIZE).unwrap());
    }

    #[test]
    fn rotation_rejected_on_overlap_keeps_ship() {
        let mut fleet = Fleet::from_sizes(&[3, 2]).unwrap();
        fleet.place(ShipId(0), 0, 0, Orientation::Horizontal, BOARD_SIZE).unwrap();
        fleet.place(ShipId(1), 1, 0, Orientation::Horizontal, BOARD_SIZE).unwrap();
        assert_eq!(
            fleet.rotate(ShipId(0), BOARD_SIZE).unwrap_err(),
            EngineError::InvalidRotation
        );
        let s = fleet.get(ShipId(0)).unwrap();
        assert_eq!(s.orientation, Orientation::Horizontal);
        assert_eq!(s.anchor, Some((0, 0)));
    }
}
