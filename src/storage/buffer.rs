//! The leaf storage unit: a typed value buffer that is either owned or a
//! zero-copy view over externally-owned (Arrow) memory.
//!
//! Borrowed buffers are read-only. `make_mut` is the one promotion point from
//! read-only to writable; it allocates and copies before the first write, so
//! external memory is never mutated through this type.

use arrow::buffer::ScalarBuffer;

use crate::traits::NativeType;

#[derive(Debug, Clone)]
enum Repr<T: NativeType> {
    Owned(Vec<T>),
    Borrowed(ScalarBuffer<T>),
}

/// A contiguous run of element values for one chunk of a column.
#[derive(Debug, Clone)]
pub struct ValueBuffer<T: NativeType> {
    repr: Repr<T>,
}

impl<T: NativeType> ValueBuffer<T> {
    pub fn new() -> Self {
        Self {
            repr: Repr::Owned(Vec::new()),
        }
    }

    pub fn from_vec(values: Vec<T>) -> Self {
        Self {
            repr: Repr::Owned(values),
        }
    }

    /// Wrap an Arrow scalar buffer without copying. The result is read-only
    /// until promoted.
    pub fn from_scalar_buffer(buffer: ScalarBuffer<T>) -> Self {
        Self {
            repr: Repr::Borrowed(buffer),
        }
    }

    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Owned(values) => values.len(),
            Repr::Borrowed(buffer) => buffer.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this buffer is still a read-only view into external memory.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.repr, Repr::Borrowed(_))
    }

    pub fn as_slice(&self) -> &[T] {
        match &self.repr {
            Repr::Owned(values) => values.as_slice(),
            Repr::Borrowed(buffer) => buffer.as_ref(),
        }
    }

    pub fn get(&self, index: usize) -> T {
        self.as_slice()[index]
    }

    pub fn push(&mut self, value: T) {
        self.make_mut().push(value);
    }

    /// Append `count` copies of `value` in one allocation step.
    pub fn extend_fill(&mut self, value: T, count: usize) {
        let values = self.make_mut();
        let new_len = values.len() + count;
        values.resize(new_len, value);
    }

    pub fn set(&mut self, index: usize, value: T) {
        self.make_mut()[index] = value;
    }

    /// Promote to owned storage, copying a borrowed view first. The only path
    /// by which a read-only buffer becomes writable.
    pub fn make_mut(&mut self) -> &mut Vec<T> {
        if let Repr::Borrowed(buffer) = &self.repr {
            self.repr = Repr::Owned(buffer.as_ref().to_vec());
        }
        match &mut self.repr {
            Repr::Owned(values) => values,
            Repr::Borrowed(_) => unreachable!("borrowed buffer was just promoted"),
        }
    }
}

impl<T: NativeType> Default for ValueBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borrowed_buffer_copies_on_write() {
        let source = ScalarBuffer::<i32>::from(vec![1, 2, 3]);
        let mut buffer = ValueBuffer::from_scalar_buffer(source.clone());
        assert!(buffer.is_borrowed());

        buffer.set(0, 99);
        assert!(!buffer.is_borrowed());
        assert_eq!(buffer.as_slice(), &[99, 2, 3]);
        assert_eq!(source.as_ref(), &[1, 2, 3]); // external memory untouched
    }

    #[test]
    fn extend_fill_appends_in_bulk() {
        let mut buffer = ValueBuffer::from_vec(vec![7u8]);
        buffer.extend_fill(0, 3);
        assert_eq!(buffer.as_slice(), &[7, 0, 0, 0]);
    }
}
