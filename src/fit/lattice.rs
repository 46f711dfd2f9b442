//! Neighbourhood lattice for a single search step.
//!
//! Each of the 8 coefficient exponents is perturbed by `-ε`, `0` or `+ε`,
//! giving `3^8 = 6561` candidate points. A point is identified by a mixed
//! base-3 index with one trit per slot, `b0` being the most significant:
//!
//! ```text
//! index = Σ trit_k · 3^(7 - k),   trit 0/1/2 ⇔ offset -1/0/+1
//! ```
//!
//! The unperturbed center is therefore the all-ones index `(3^8 - 1) / 2`.

use crate::domain::SLOT_COUNT;

/// Number of points in the full lattice.
pub const LATTICE_SIZE: usize = 6561;

/// Index of the unperturbed center point.
pub const CENTER_INDEX: usize = (LATTICE_SIZE - 1) / 2;

fn place_value(slot: usize) -> usize {
    3usize.pow((SLOT_COUNT - 1 - slot) as u32)
}

/// Per-slot offsets (`-1`, `0`, `+1`) encoded by `index`.
pub fn offsets(index: usize) -> [i8; SLOT_COUNT] {
    let mut out = [0i8; SLOT_COUNT];
    for (slot, o) in out.iter_mut().enumerate() {
        *o = ((index / place_value(slot)) % 3) as i8 - 1;
    }
    out
}

/// Lattice index of the given per-slot offsets.
///
/// # Panics
/// Panics in debug builds if an offset is outside `-1..=1`.
pub fn index_of(offsets: &[i8; SLOT_COUNT]) -> usize {
    offsets.iter().enumerate().fold(0, |acc, (slot, &o)| {
        debug_assert!((-1..=1).contains(&o));
        acc + (o + 1) as usize * place_value(slot)
    })
}

/// Whether exactly one slot is perturbed.
pub fn is_axis_aligned(index: usize) -> bool {
    offsets(index).iter().filter(|&&o| o != 0).count() == 1
}

/// The part of the lattice a search actually visits.
///
/// Inactive slots stay at offset 0, so only `3^active` indices are enumerated,
/// in ascending (scan) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lattice {
    indices: Vec<usize>,
    axis_neighbours: Vec<usize>,
}

impl Lattice {
    /// The full 6561-point lattice.
    pub fn full() -> Self {
        Self::for_active(&[true; SLOT_COUNT])
    }

    /// Lattice restricted to the active slots.
    pub fn for_active(active: &[bool; SLOT_COUNT]) -> Self {
        let indices: Vec<usize> = (0..LATTICE_SIZE)
            .filter(|&index| {
                offsets(index)
                    .iter()
                    .zip(active.iter())
                    .all(|(&o, &is_active)| is_active || o == 0)
            })
            .collect();

        // Axis-aligned neighbours in slot order, -1 before +1.
        let mut axis_neighbours = Vec::with_capacity(2 * SLOT_COUNT);
        for slot in (0..SLOT_COUNT).filter(|&s| active[s]) {
            for delta in [-1i8, 1] {
                let mut o = [0i8; SLOT_COUNT];
                o[slot] = delta;
                axis_neighbours.push(index_of(&o));
            }
        }

        Self {
            indices,
            axis_neighbours,
        }
    }

    /// Enumerated indices in scan order (always includes `CENTER_INDEX`).
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn axis_neighbours(&self) -> &[usize] {
        &self.axis_neighbours
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Position of `index` within `indices()`.
    pub fn position(&self, index: usize) -> Option<usize> {
        self.indices.binary_search(&index).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_is_all_zero_offsets() {
        assert_eq!(CENTER_INDEX, 3280);
        assert_eq!(offsets(CENTER_INDEX), [0; SLOT_COUNT]);
        assert_eq!(index_of(&[0; SLOT_COUNT]), CENTER_INDEX);
    }

    #[test]
    fn b0_is_most_significant() {
        assert_eq!(offsets(0), [-1; SLOT_COUNT]);
        assert_eq!(offsets(LATTICE_SIZE - 1), [1; SLOT_COUNT]);
        assert_eq!(offsets(CENTER_INDEX + 2187), [1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(offsets(CENTER_INDEX - 1), [0, 0, 0, 0, 0, 0, 0, -1]);
    }

    #[test]
    fn encoding_round_trips_every_index() {
        for index in 0..LATTICE_SIZE {
            assert_eq!(index_of(&offsets(index)), index);
        }
    }

    #[test]
    fn full_lattice_has_sixteen_axis_neighbours() {
        let lattice = Lattice::full();
        assert_eq!(lattice.len(), LATTICE_SIZE);
        assert_eq!(lattice.axis_neighbours().len(), 16);
        assert!(lattice.axis_neighbours().iter().all(|&i| is_axis_aligned(i)));
        assert_eq!(lattice.axis_neighbours()[0], CENTER_INDEX - 2187);
        assert_eq!(lattice.axis_neighbours()[1], CENTER_INDEX + 2187);
    }

    #[test]
    fn restricted_lattice_pins_inactive_slots() {
        let mut active = [false; SLOT_COUNT];
        active[0] = true;
        active[1] = true;
        active[2] = true;
        let lattice = Lattice::for_active(&active);
        assert_eq!(lattice.len(), 27);
        assert!(lattice.position(CENTER_INDEX).is_some());
        for &index in lattice.indices() {
            assert!(offsets(index)[3..].iter().all(|&o| o == 0));
        }
        assert!(lattice.indices().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(lattice.axis_neighbours().len(), 6);
    }
}
