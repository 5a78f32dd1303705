use battleship_sync::placement::{fits, is_valid_placement, is_valid_rotation, overlaps};
use battleship_sync::{EngineError, Fleet, Orientation, Ship, ShipId, BOARD_SIZE};
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn orientation() -> impl Strategy<Value = Orientation> {
    prop_oneof![Just(Orientation::Horizontal), Just(Orientation::Vertical)]
}

fn cells(size: usize, row: usize, col: usize, o: Orientation) -> Vec<(usize, usize)> {
    (0..size)
        .map(|i| match o {
            Orientation::Horizontal => (row, col + i),
            Orientation::Vertical => (row + i, col),
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn placement_matches_bounds_and_overlap_oracle(
        size in 1usize..=5,
        row in 0..BOARD_SIZE + 2,
        col in 0..BOARD_SIZE + 2,
        o in orientation(),
        other_size in 1usize..=5,
        other_row in 0..BOARD_SIZE,
        other_col in 0..BOARD_SIZE,
        other_o in orientation(),
    ) {
        let candidate = Ship::new(ShipId(0), size, o);
        let mut other = Ship::new(ShipId(1), other_size, other_o);
        other.anchor = Some((other_row, other_col));

        let mine = cells(size, row, col, o);
        let in_bounds = mine.iter().all(|&(r, c)| r < BOARD_SIZE && c < BOARD_SIZE);
        let theirs = cells(other_size, other_row, other_col, other_o);
        let intersects = mine.iter().any(|c| theirs.contains(c));

        prop_assert_eq!(fits(&candidate, row, col, o, BOARD_SIZE).unwrap(), in_bounds);
        prop_assert_eq!(overlaps(&candidate, row, col, o, [&other]), intersects);
        prop_assert_eq!(
            is_valid_placement(&candidate, row, col, o, [&other], BOARD_SIZE).unwrap(),
            in_bounds && !intersects
        );
    }

    #[test]
    fn random_fleets_never_overlap(seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut fleet = Fleet::standard();
        fleet.place_randomly(&mut rng, BOARD_SIZE).unwrap();
        prop_assert!(fleet.is_fully_placed());
        let mut seen = Vec::new();
        for ship in fleet.ships() {
            for cell in ship.cells() {
                prop_assert!(cell.0 < BOARD_SIZE && cell.1 < BOARD_SIZE);
                prop_assert!(!seen.contains(&cell));
                seen.push(cell);
            }
        }
        prop_assert_eq!(seen.len(), battleship_sync::TOTAL_SHIP_CELLS);
    }
}

#[test]
fn rotation_into_another_ship_is_ignored() {
    let mut fleet = Fleet::from_sizes(&[4, 3]).unwrap();
    fleet.place(ShipId(0), 5, 2, Orientation::Horizontal, BOARD_SIZE).unwrap();
    fleet.place(ShipId(1), 7, 2, Orientation::Horizontal, BOARD_SIZE).unwrap();
    let before = *fleet.get(ShipId(0)).unwrap();

    assert!(!is_valid_rotation(&before, Orientation::Vertical, fleet.others(ShipId(0)), BOARD_SIZE).unwrap());
    assert_eq!(fleet.rotate(ShipId(0), BOARD_SIZE).unwrap_err(), EngineError::InvalidRotation);
    assert_eq!(fleet.get(ShipId(0)).unwrap(), &before);
}

#[test]
fn rotation_past_edge_is_ignored() {
    let mut fleet = Fleet::from_sizes(&[5]).unwrap();
    fleet.place(ShipId(0), 7, 0, Orientation::Horizontal, BOARD_SIZE).unwrap();
    assert_eq!(fleet.rotate(ShipId(0), BOARD_SIZE).unwrap_err(), EngineError::InvalidRotation);
    assert_eq!(fleet.get(ShipId(0)).unwrap().orientation, Orientation::Horizontal);

    fleet.place(ShipId(0), 0, 0, Orientation::Horizontal, BOARD_SIZE).unwrap();
    assert_eq!(fleet.rotate(ShipId(0), BOARD_SIZE).unwrap(), Orientation::Vertical);
}

#[test]
fn unplaced_ship_cannot_block_placement() {
    let unplaced = Ship::new(ShipId(1), 5, Orientation::Horizontal);
    let ship = Ship::new(ShipId(0), 2, Orientation::Vertical);
    assert!(is_valid_placement(&ship, 0, 0, Orientation::Vertical, [&unplaced], BOARD_SIZE).unwrap());
}

#[test]
fn standard_ships_are_named_by_class() {
    let mut fleet = Fleet::standard();
    fleet.place(ShipId(4), 9, 8, Orientation::Horizontal, BOARD_SIZE).unwrap();
    let destroyer = fleet.ship_at(9, 9).unwrap();
    assert_eq!(destroyer.id, ShipId(4));
    assert_eq!(fleet.name_of(destroyer.id), Some("Destroyer"));
    assert_eq!(fleet.name_of(ShipId(0)), Some("Carrier"));
    assert!(fleet.ship_at(0, 0).is_none());

    // custom sizes have no class name
    let custom = Fleet::from_sizes(&[3, 3]).unwrap();
    assert_eq!(custom.name_of(ShipId(0)), None);
    assert_eq!(custom.name_of(ShipId(7)), None);
}
