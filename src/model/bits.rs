//! Fixed-size bit vector for builder presence tracking

/// A fixed-capacity bit vector sized to a message's field count.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct BitSet {
    words: Vec<u64>,
}

impl BitSet {
    pub(crate) fn with_capacity(bits: usize) -> Self {
        Self {
            words: vec![0; bits.div_ceil(64)],
        }
    }

    pub(crate) fn set(&mut self, bit: usize) {
        self.words[bit / 64] |= 1 << (bit % 64);
    }

    pub(crate) fn clear(&mut self, bit: usize) {
        self.words[bit / 64] &= !(1 << (bit % 64));
    }

    pub(crate) fn get(&self, bit: usize) -> bool {
        self.words
            .get(bit / 64)
            .is_some_and(|w| w & (1 << (bit % 64)) != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_clear_get() {
        let mut bits = BitSet::with_capacity(100);
        assert!(!bits.get(0));
        assert!(!bits.get(99));

        bits.set(0);
        bits.set(63);
        bits.set(64);
        bits.set(99);
        assert!(bits.get(0));
        assert!(bits.get(63));
        assert!(bits.get(64));
        assert!(bits.get(99));

        bits.clear(64);
        assert!(!bits.get(64));
        assert!(bits.get(63));
    }

    #[test]
    fn test_out_of_range_reads_false() {
        let bits = BitSet::with_capacity(8);
        assert!(!bits.get(1000));
    }
}
