//! Arbitrary-width bit vectors used for every wide register word and narrow field view.
//!
//! Bit 0 is the least significant bit. Values are always truncated to their declared width so
//! two vectors with the same width compare equal exactly when their bits do.

use std::fmt;

use smallvec::SmallVec;

const WORD_BITS: usize = 64;

fn mask_for_width(width: usize) -> u64 {
    if width == 0 {
        0
    } else if width >= WORD_BITS {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

fn words_for(width: usize) -> usize {
    width.div_ceil(WORD_BITS)
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Bits {
    width: usize,
    words: SmallVec<[u64; 2]>,
}

impl Bits {
    pub fn zero(width: usize) -> Self {
        Self {
            width,
            words: SmallVec::from_elem(0, words_for(width)),
        }
    }

    /// Builds a vector from the low `width` bits of `value`; higher bits are dropped.
    pub fn from_u64(width: usize, value: u64) -> Self {
        let mut bits = Self::zero(width);
        if let Some(first) = bits.words.first_mut() {
            *first = value;
        }
        bits.truncate();
        bits
    }

    pub fn from_u128(width: usize, value: u128) -> Self {
        let mut bits = Self::zero(width);
        if let Some(first) = bits.words.get_mut(0) {
            *first = value as u64;
        }
        if let Some(second) = bits.words.get_mut(1) {
            *second = (value >> WORD_BITS) as u64;
        }
        bits.truncate();
        bits
    }

    /// All ones when `bit` is set, all zeros otherwise.
    pub fn replicate(bit: bool, width: usize) -> Self {
        let mut bits = Self::zero(width);
        if bit {
            bits.words.iter_mut().for_each(|word| *word = u64::MAX);
            bits.truncate();
        }
        bits
    }

    #[inline(always)]
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    /// Low 64 bits of the vector.
    pub fn to_u64(&self) -> u64 {
        self.words.first().copied().unwrap_or(0)
    }

    /// Low 128 bits of the vector.
    pub fn to_u128(&self) -> u128 {
        let low = self.words.first().copied().unwrap_or(0) as u128;
        let high = self.words.get(1).copied().unwrap_or(0) as u128;
        low | (high << WORD_BITS)
    }

    /// Number of significant bits needed to hold the current value.
    pub fn significant_bits(&self) -> usize {
        for (index, word) in self.words.iter().enumerate().rev() {
            if *word != 0 {
                return index * WORD_BITS + (WORD_BITS - word.leading_zeros() as usize);
            }
        }
        0
    }

    pub fn bit(&self, index: usize) -> bool {
        if index >= self.width {
            return false;
        }
        (self.words[index / WORD_BITS] >> (index % WORD_BITS)) & 1 == 1
    }

    pub fn set_bit(&mut self, index: usize, value: bool) {
        if index >= self.width {
            return;
        }
        let word = &mut self.words[index / WORD_BITS];
        let mask = 1u64 << (index % WORD_BITS);
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    /// Extracts `width` bits starting at `offset`. Bits past the end of `self` read as zero.
    pub fn slice(&self, offset: usize, width: usize) -> Bits {
        let mut out = Bits::zero(width);
        for (index, word) in out.words.iter_mut().enumerate() {
            *word = self.word_at(offset + index * WORD_BITS);
        }
        out.truncate();
        out
    }

    /// Overwrites the bits at `offset..offset + value.width()` with `value`, clipped to `self`.
    pub fn insert(&mut self, offset: usize, value: &Bits) {
        let mut remaining = value.width;
        for (index, word) in value.words.iter().enumerate() {
            let count = remaining.min(WORD_BITS);
            self.put_word(offset + index * WORD_BITS, *word, count);
            remaining -= count;
        }
    }

    /// Returns a copy with bit-wise AND applied; `other` is zero-extended or truncated to fit.
    pub fn and(&self, other: &Bits) -> Bits {
        let mut out = self.clone();
        for (index, word) in out.words.iter_mut().enumerate() {
            *word &= other.words.get(index).copied().unwrap_or(0);
        }
        out
    }

    /// Re-sizes to `width`, zero-extending or truncating.
    pub fn resize(&self, width: usize) -> Bits {
        self.slice(0, width)
    }

    fn truncate(&mut self) {
        let tail = self.width % WORD_BITS;
        if tail != 0
            && let Some(last) = self.words.last_mut()
        {
            *last &= mask_for_width(tail);
        }
    }

    fn word_at(&self, bit: usize) -> u64 {
        let index = bit / WORD_BITS;
        let shift = bit % WORD_BITS;
        let low = self.words.get(index).copied().unwrap_or(0);
        if shift == 0 {
            return low;
        }
        let high = self.words.get(index + 1).copied().unwrap_or(0);
        (low >> shift) | (high << (WORD_BITS - shift))
    }

    fn put_word(&mut self, bit: usize, value: u64, count: usize) {
        let count = count.min(self.width.saturating_sub(bit));
        if count == 0 {
            return;
        }
        let value = value & mask_for_width(count);
        let index = bit / WORD_BITS;
        let shift = bit % WORD_BITS;
        let mask = mask_for_width(count);

        let low = &mut self.words[index];
        *low = (*low & !(mask << shift)) | (value << shift);

        if shift + count > WORD_BITS {
            let spill = WORD_BITS - shift;
            let high = &mut self.words[index + 1];
            *high = (*high & !(mask >> spill)) | (value >> spill);
        }
    }
}

impl fmt::Debug for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bits<{}>({self:#x})", self.width)
    }
}

impl fmt::LowerHex for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str("0x")?;
        }
        let mut started = false;
        for word in self.words.iter().rev() {
            if started {
                write!(f, "{word:016x}")?;
            } else if *word != 0 {
                write!(f, "{word:x}")?;
                started = true;
            }
        }
        if !started {
            f.write_str("0")?;
        }
        Ok(())
    }
}
