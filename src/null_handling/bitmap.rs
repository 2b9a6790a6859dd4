//! Validity bitmaps with an Arrow-compatible layout.
//!
//! One bit per logical row, LSB-first within each byte, 1 = valid / 0 = null —
//! exactly the Arrow validity layout, so a bitmap can wrap an Arrow
//! `NullBuffer` without copying. A wrapped (borrowed) bitmap is a read-only
//! view; `make_mut` is the only path by which it becomes writable, and it
//! copies first.

use arrow::buffer::{BooleanBuffer, Buffer, NullBuffer};
use bitvec::order::Lsb0;
use bitvec::vec::BitVec;

#[derive(Debug, Clone)]
enum Inner {
    Owned(BitVec<u8, Lsb0>),
    Borrowed(NullBuffer),
}

/// A growable validity bitmap.
#[derive(Debug, Clone)]
pub struct Bitmap {
    inner: Inner,
}

impl Bitmap {
    pub fn new() -> Self {
        Self {
            inner: Inner::Owned(BitVec::new()),
        }
    }

    /// A bitmap of `len` bits, all set to `valid`.
    pub fn with_len(len: usize, valid: bool) -> Self {
        Self {
            inner: Inner::Owned(BitVec::repeat(valid, len)),
        }
    }

    /// Wrap an Arrow validity buffer as a read-only view (zero-copy).
    pub fn from_null_buffer(nulls: NullBuffer) -> Self {
        Self {
            inner: Inner::Borrowed(nulls),
        }
    }

    /// Build from raw LSB-first bytes; bits past `len` are ignored.
    pub fn from_lsb_bytes(bytes: &[u8], len: usize) -> Self {
        let mut bits: BitVec<u8, Lsb0> = BitVec::from_slice(bytes);
        bits.truncate(len);
        Self {
            inner: Inner::Owned(bits),
        }
    }

    pub fn len(&self) -> usize {
        match &self.inner {
            Inner::Owned(bits) => bits.len(),
            Inner::Borrowed(nulls) => nulls.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bit at `index`; callers bounds-check against container length.
    pub fn get(&self, index: usize) -> bool {
        match &self.inner {
            Inner::Owned(bits) => bits[index],
            Inner::Borrowed(nulls) => nulls.is_valid(index),
        }
    }

    /// Set the bit at `index`, returning its *prior* state. The prior/new
    /// comparison is what drives incremental null counting in containers.
    pub fn set(&mut self, index: usize, valid: bool) -> bool {
        let bits = self.make_mut();
        let previous = bits[index];
        bits.set(index, valid);
        previous
    }

    pub fn push(&mut self, valid: bool) {
        self.make_mut().push(valid);
    }

    /// Append `count` copies of `valid` in one step (the bulk-append path).
    pub fn extend_fill(&mut self, valid: bool, count: usize) {
        let bits = self.make_mut();
        let new_len = bits.len() + count;
        bits.resize(new_len, valid);
    }

    /// Number of unset (null) bits. Containers track this incrementally; this
    /// scan exists for construction and as a cross-check in tests.
    pub fn count_unset(&self) -> usize {
        match &self.inner {
            Inner::Owned(bits) => bits.count_zeros(),
            Inner::Borrowed(nulls) => nulls.null_count(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    /// Raw LSB-first bytes, `ceil(len / 8)` of them.
    pub fn to_lsb_bytes(&self) -> Vec<u8> {
        match &self.inner {
            Inner::Owned(bits) => {
                let mut bytes = bits.as_raw_slice().to_vec();
                bytes.truncate((bits.len() + 7) / 8);
                bytes
            }
            Inner::Borrowed(nulls) => {
                let mut bytes = vec![0u8; (nulls.len() + 7) / 8];
                for i in 0..nulls.len() {
                    if nulls.is_valid(i) {
                        bytes[i / 8] |= 1u8 << (i % 8);
                    }
                }
                bytes
            }
        }
    }

    /// Convert into an Arrow `NullBuffer` of the same length.
    pub fn to_null_buffer(&self) -> NullBuffer {
        match &self.inner {
            Inner::Owned(_) => {
                let len = self.len();
                let buffer = Buffer::from(self.to_lsb_bytes());
                NullBuffer::new(BooleanBuffer::new(buffer, 0, len))
            }
            Inner::Borrowed(nulls) => nulls.clone(),
        }
    }

    /// Promote to a writable bit vector, copying a borrowed view first. This
    /// is the single read-only-to-writable enforcement point.
    fn make_mut(&mut self) -> &mut BitVec<u8, Lsb0> {
        if let Inner::Borrowed(nulls) = &self.inner {
            let owned: BitVec<u8, Lsb0> = nulls.iter().collect();
            self.inner = Inner::Owned(owned);
        }
        match &mut self.inner {
            Inner::Owned(bits) => bits,
            Inner::Borrowed(_) => unreachable!("borrowed bitmap was just promoted"),
        }
    }
}

impl Default for Bitmap {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<bool> for Bitmap {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            inner: Inner::Owned(iter.into_iter().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_reports_prior_state() {
        let mut bitmap = Bitmap::with_len(4, true);
        assert!(bitmap.set(1, false));
        assert!(!bitmap.set(1, false));
        assert!(!bitmap.set(1, true));
        assert_eq!(bitmap.count_unset(), 0);
    }

    #[test]
    fn lsb_byte_layout() {
        let bitmap: Bitmap = [true, false, true, true, false].into_iter().collect();
        // bits 0,2,3 set -> 0b0000_1101
        assert_eq!(bitmap.to_lsb_bytes(), vec![0b0000_1101]);
        let back = Bitmap::from_lsb_bytes(&[0b0000_1101], 5);
        assert_eq!(back.iter().collect::<Vec<_>>(), vec![true, false, true, true, false]);
    }

    #[test]
    fn borrowed_view_promotes_on_write() {
        let nulls = NullBuffer::from(vec![true, false, true]);
        let mut bitmap = Bitmap::from_null_buffer(nulls.clone());
        assert!(!bitmap.get(1));
        bitmap.set(1, true); // copy-on-write
        assert!(bitmap.get(1));
        assert!(!nulls.is_valid(1)); // source untouched
    }

    #[test]
    fn bulk_fill_matches_pushes() {
        let mut a = Bitmap::new();
        a.extend_fill(false, 10);
        let mut b = Bitmap::new();
        for _ in 0..10 {
            b.push(false);
        }
        assert_eq!(a.to_lsb_bytes(), b.to_lsb_bytes());
        assert_eq!(a.count_unset(), 10);
    }

    #[test]
    fn null_buffer_roundtrip() {
        let bitmap: Bitmap = [true, true, false, true].into_iter().collect();
        let nulls = bitmap.to_null_buffer();
        assert_eq!(nulls.null_count(), 1);
        let back = Bitmap::from_null_buffer(nulls);
        assert_eq!(back.iter().collect::<Vec<_>>(), bitmap.iter().collect::<Vec<_>>());
    }
}
