//! Growable dense bit set over small integer identifiers.
//!
//! Each `u64` word holds 64 members; bit `i` lives at
//! `words[i / 64] & (1 << (i % 64))`. Storage grows on `set` only, by at
//! least doubling, and new words are always zero. Reads past the end are
//! simply "absent".
//!
//! The population count is maintained incrementally by `set` and recomputed
//! from scratch for the results of `intersect` / `union`.

use std::ops::{BitAnd, BitOr};

const WORD_BITS: usize = 64;

#[derive(Debug, Clone, Default)]
pub struct BitSet {
    words: Vec<u64>,
    population: usize,
}

impl BitSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty set whose storage already covers `bits` members.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: vec![0; bits.div_ceil(WORD_BITS)],
            population: 0,
        }
    }

    fn from_words(words: Vec<u64>) -> Self {
        let population = words.iter().map(|w| w.count_ones() as usize).sum();
        Self { words, population }
    }

    /// Add `index` to the set, growing storage when needed.
    pub fn set(&mut self, index: u32) {
        let word = index as usize / WORD_BITS;
        if word >= self.words.len() {
            let grown = (self.words.len() * 2).max(word + 1);
            self.words.resize(grown, 0);
        }

        let mask = 1u64 << (index as usize % WORD_BITS);
        if self.words[word] & mask == 0 {
            self.words[word] |= mask;
            self.population += 1;
        }
    }

    /// Membership test. Never grows.
    #[inline]
    pub fn test(&self, index: u32) -> bool {
        let word = index as usize / WORD_BITS;
        match self.words.get(word) {
            Some(w) => w & (1u64 << (index as usize % WORD_BITS)) != 0,
            None => false,
        }
    }

    /// Members of both sets. Sized to the shorter operand.
    pub fn intersect(a: &BitSet, b: &BitSet) -> BitSet {
        let words = a
            .words
            .iter()
            .zip(b.words.iter())
            .map(|(x, y)| x & y)
            .collect();
        Self::from_words(words)
    }

    /// Members of either set. Sized to the longer operand; words past the end
    /// of the shorter one are copied unchanged.
    pub fn union(a: &BitSet, b: &BitSet) -> BitSet {
        let (long, short) = if a.words.len() >= b.words.len() {
            (a, b)
        } else {
            (b, a)
        };
        let mut words = long.words.clone();
        for (w, s) in words.iter_mut().zip(short.words.iter()) {
            *w |= s;
        }
        Self::from_words(words)
    }

    /// Number of members, in O(1).
    #[inline]
    pub fn population(&self) -> usize {
        self.population
    }

    pub fn is_empty(&self) -> bool {
        self.population == 0
    }

    /// Number of storage words currently allocated.
    pub fn word_len(&self) -> usize {
        self.words.len()
    }

    /// Members in ascending order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            words: &self.words,
            word_idx: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }
}

/// Ascending iterator over the members of a [`BitSet`].
pub struct Iter<'a> {
    words: &'a [u64],
    word_idx: usize,
    current: u64,
}

impl Iterator for Iter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                // Clear the lowest set bit.
                self.current &= self.current - 1;
                return Some((self.word_idx * WORD_BITS + bit) as u32);
            }
            self.word_idx += 1;
            self.current = *self.words.get(self.word_idx)?;
        }
    }
}

impl<'a> IntoIterator for &'a BitSet {
    type Item = u32;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl FromIterator<u32> for BitSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut set = BitSet::new();
        for index in iter {
            set.set(index);
        }
        set
    }
}

/// Equality is by membership; trailing zero words do not matter.
impl PartialEq for BitSet {
    fn eq(&self, other: &Self) -> bool {
        if self.population != other.population {
            return false;
        }
        let (long, short) = if self.words.len() >= other.words.len() {
            (&self.words, &other.words)
        } else {
            (&other.words, &self.words)
        };
        long[..short.len()] == short[..] && long[short.len()..].iter().all(|&w| w == 0)
    }
}

impl Eq for BitSet {}

impl BitAnd for &BitSet {
    type Output = BitSet;

    fn bitand(self, rhs: &BitSet) -> BitSet {
        BitSet::intersect(self, rhs)
    }
}

impl BitOr for &BitSet {
    type Output = BitSet;

    fn bitor(self, rhs: &BitSet) -> BitSet {
        BitSet::union(self, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_grows_and_zero_fills() {
        let mut bs = BitSet::new();
        assert_eq!(bs.word_len(), 0);

        bs.set(3);
        assert_eq!(bs.word_len(), 1);

        bs.set(1000);
        assert!(bs.word_len() >= 1000 / 64 + 1);
        assert!(bs.test(3));
        assert!(bs.test(1000));
        assert!(!bs.test(999));
        assert!(!bs.test(64));
        assert_eq!(bs.population(), 2);
    }

    #[test]
    fn growth_at_least_doubles() {
        let mut bs = BitSet::with_capacity(64 * 8);
        assert_eq!(bs.word_len(), 8);
        bs.set(64 * 8);
        assert_eq!(bs.word_len(), 16);
    }

    #[test]
    fn repeated_set_does_not_inflate_population() {
        let mut bs = BitSet::new();
        bs.set(7);
        bs.set(7);
        bs.set(7);
        assert_eq!(bs.population(), 1);
    }

    #[test]
    fn test_past_capacity_is_false_and_does_not_grow() {
        let bs = BitSet::with_capacity(10);
        assert!(!bs.test(u32::MAX));
        assert_eq!(bs.word_len(), 1);
    }

    #[test]
    fn intersect_and_union_sizes() {
        let a: BitSet = [1, 2, 3, 200].into_iter().collect();
        let b: BitSet = [2, 3, 4].into_iter().collect();

        let and = &a & &b;
        assert_eq!(and.word_len(), b.word_len());
        assert_eq!(and.iter().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(and.population(), 2);

        let or = &a | &b;
        assert_eq!(or.word_len(), a.word_len());
        assert_eq!(or.iter().collect::<Vec<_>>(), vec![1, 2, 3, 4, 200]);
        assert_eq!(or.population(), 5);
    }

    #[test]
    fn equality_ignores_storage_length() {
        let mut a = BitSet::with_capacity(64 * 16);
        a.set(5);
        let b: BitSet = [5].into_iter().collect();
        assert_eq!(a, b);
        assert_ne!(a, BitSet::new());
    }

    #[test]
    fn iter_crosses_word_boundaries() {
        let bs: BitSet = [0, 63, 64, 127, 128, 4095].into_iter().collect();
        assert_eq!(
            bs.iter().collect::<Vec<_>>(),
            vec![0, 63, 64, 127, 128, 4095]
        );
        assert_eq!(BitSet::new().iter().next(), None);
    }
}
