//! Cardinal rotations and compact rotation sets.

use serde::{Deserialize, Serialize};

/// One of the four cardinal directions an entity can face or an item can
/// travel in. `Up` is +y, `Right` is +x.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Rotation {
    #[default]
    Up,
    Right,
    Down,
    Left,
}

impl Rotation {
    /// All four rotations, clockwise from `Up`.
    pub const ALL: [Rotation; 4] = [Rotation::Up, Rotation::Right, Rotation::Down, Rotation::Left];

    /// Clockwise index: Up = 0, Right = 1, Down = 2, Left = 3.
    pub fn index(self) -> u8 {
        match self {
            Rotation::Up => 0,
            Rotation::Right => 1,
            Rotation::Down => 2,
            Rotation::Left => 3,
        }
    }

    /// Inverse of [`Rotation::index`], modulo 4.
    pub fn from_index(index: u8) -> Rotation {
        Rotation::ALL[(index % 4) as usize]
    }

    /// Unit grid offset for this direction.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Rotation::Up => (0, 1),
            Rotation::Right => (1, 0),
            Rotation::Down => (0, -1),
            Rotation::Left => (-1, 0),
        }
    }

    pub fn opposite(self) -> Rotation {
        self.shift(2)
    }

    /// Rotate clockwise by `steps` quarter turns (negative is counter-clockwise).
    pub fn shift(self, steps: i32) -> Rotation {
        let index = (self.index() as i32 + steps).rem_euclid(4);
        Rotation::from_index(index as u8)
    }

    /// True when the rotation runs along the x axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Rotation::Left | Rotation::Right)
    }

    /// Every rotation except the ones listed, clockwise from `Up`.
    pub fn exclude(excluded: &[Rotation]) -> Vec<Rotation> {
        Rotation::ALL
            .into_iter()
            .filter(|r| !excluded.contains(r))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// RotationSet
// ---------------------------------------------------------------------------

/// A set of rotations packed into four bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RotationSet(u8);

impl RotationSet {
    pub const EMPTY: RotationSet = RotationSet(0);
    pub const ALL: RotationSet = RotationSet(0b1111);

    pub fn single(rotation: Rotation) -> Self {
        RotationSet(1 << rotation.index())
    }

    pub fn of(rotations: &[Rotation]) -> Self {
        rotations
            .iter()
            .fold(RotationSet::EMPTY, |set, r| set.with(*r))
    }

    pub fn contains(self, rotation: Rotation) -> bool {
        self.0 & (1 << rotation.index()) != 0
    }

    pub fn with(self, rotation: Rotation) -> Self {
        RotationSet(self.0 | (1 << rotation.index()))
    }

    pub fn without(self, rotation: Rotation) -> Self {
        RotationSet(self.0 & !(1 << rotation.index()))
    }

    pub fn insert(&mut self, rotation: Rotation) {
        *self = self.with(rotation);
    }

    pub fn remove(&mut self, rotation: Rotation) {
        *self = self.without(rotation);
    }

    pub fn is_empty(self) -> bool {
        self.0 & 0b1111 == 0
    }

    pub fn len(self) -> usize {
        (self.0 & 0b1111).count_ones() as usize
    }

    /// Members in clockwise order from `Up`.
    pub fn iter(self) -> impl Iterator<Item = Rotation> {
        Rotation::ALL.into_iter().filter(move |r| self.contains(*r))
    }

    /// Members as a vector, ready to be shuffled.
    pub fn to_vec(self) -> Vec<Rotation> {
        self.iter().collect()
    }

    /// Every direction except the one an item facing `rotation` would be
    /// coming back from. Typical accepted-input set for a conveyor.
    pub fn all_but_back(rotation: Rotation) -> Self {
        RotationSet::ALL.without(rotation.opposite())
    }
}

impl FromIterator<Rotation> for RotationSet {
    fn from_iter<I: IntoIterator<Item = Rotation>>(iter: I) -> Self {
        iter.into_iter().fold(RotationSet::EMPTY, |set, r| set.with(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_pairs() {
        assert_eq!(Rotation::Up.opposite(), Rotation::Down);
        assert_eq!(Rotation::Left.opposite(), Rotation::Right);
        for r in Rotation::ALL {
            assert_eq!(r.opposite().opposite(), r);
        }
    }

    #[test]
    fn shift_wraps_both_ways() {
        assert_eq!(Rotation::Up.shift(1), Rotation::Right);
        assert_eq!(Rotation::Up.shift(-1), Rotation::Left);
        assert_eq!(Rotation::Left.shift(5), Rotation::Up);
        assert_eq!(Rotation::Down.shift(-6), Rotation::Up);
    }

    #[test]
    fn offsets_cancel_with_opposite() {
        for r in Rotation::ALL {
            let (dx, dy) = r.offset();
            let (ox, oy) = r.opposite().offset();
            assert_eq!((dx + ox, dy + oy), (0, 0));
        }
    }

    #[test]
    fn exclude_keeps_order() {
        assert_eq!(
            Rotation::exclude(&[Rotation::Right]),
            vec![Rotation::Up, Rotation::Down, Rotation::Left]
        );
        assert!(Rotation::exclude(&Rotation::ALL).is_empty());
    }

    #[test]
    fn set_membership() {
        let set = RotationSet::of(&[Rotation::Up, Rotation::Left]);
        assert!(set.contains(Rotation::Up));
        assert!(set.contains(Rotation::Left));
        assert!(!set.contains(Rotation::Down));
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_vec(), vec![Rotation::Up, Rotation::Left]);
    }

    #[test]
    fn set_insert_remove() {
        let mut set = RotationSet::EMPTY;
        assert!(set.is_empty());
        set.insert(Rotation::Down);
        set.insert(Rotation::Down);
        assert_eq!(set.len(), 1);
        set.remove(Rotation::Down);
        assert!(set.is_empty());
    }

    #[test]
    fn all_but_back() {
        let set = RotationSet::all_but_back(Rotation::Right);
        assert!(!set.contains(Rotation::Left));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn collect_into_set() {
        let set: RotationSet = [Rotation::Right, Rotation::Down].into_iter().collect();
        assert_eq!(set, RotationSet::of(&[Rotation::Down, Rotation::Right]));
    }
}
