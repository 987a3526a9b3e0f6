//! Saturating sub-view operations on slices.
//!
//! Rust slices already carry their bounds; what the dataflow code needs on
//! top is the sub-view algebra with *saturating* semantics: asking for more
//! than is available silently truncates to what is there instead of
//! panicking. That matches how packet-parsing code wants to behave on short
//! input. The truncation is deliberate and part of the contract; callers
//! that need hard bounds compare lengths first.

/// Saturating sub-views. Implemented for every `[T]`.
pub trait SliceExt {
    /// The first `n` elements, or the whole slice if `n` exceeds its length.
    fn first_n(&self, n: usize) -> &Self;

    /// The last `n` elements, or the whole slice if `n` exceeds its length.
    fn last_n(&self, n: usize) -> &Self;

    /// Everything after the first `n` elements; empty if `n` exceeds the
    /// length.
    fn skip_first(&self, n: usize) -> &Self;

    /// Everything before the last `n` elements; empty if `n` exceeds the
    /// length.
    fn skip_last(&self, n: usize) -> &Self;

    /// `length` elements starting at `offset`, truncated to the available
    /// range.
    fn sub_slice(&self, offset: usize, length: usize) -> &Self;

    /// Elements in `[from, to)`, truncated to the available range; an
    /// inverted range yields an empty view.
    fn sub_range(&self, from: usize, to: usize) -> &Self;

    /// Mutable counterpart of [`first_n`](SliceExt::first_n).
    fn first_n_mut(&mut self, n: usize) -> &mut Self;

    /// Mutable counterpart of [`skip_first`](SliceExt::skip_first).
    fn skip_first_mut(&mut self, n: usize) -> &mut Self;

    /// Mutable counterpart of [`sub_slice`](SliceExt::sub_slice).
    fn sub_slice_mut(&mut self, offset: usize, length: usize) -> &mut Self;
}

impl<T> SliceExt for [T] {
    fn first_n(&self, n: usize) -> &[T] {
        &self[..n.min(self.len())]
    }

    fn last_n(&self, n: usize) -> &[T] {
        &self[self.len() - n.min(self.len())..]
    }

    fn skip_first(&self, n: usize) -> &[T] {
        &self[n.min(self.len())..]
    }

    fn skip_last(&self, n: usize) -> &[T] {
        &self[..self.len() - n.min(self.len())]
    }

    fn sub_slice(&self, offset: usize, length: usize) -> &[T] {
        self.first_n(offset.saturating_add(length)).last_n(length)
    }

    fn sub_range(&self, from: usize, to: usize) -> &[T] {
        self.sub_slice(from, to.saturating_sub(from))
    }

    fn first_n_mut(&mut self, n: usize) -> &mut [T] {
        let n = n.min(self.len());
        &mut self[..n]
    }

    fn skip_first_mut(&mut self, n: usize) -> &mut [T] {
        let n = n.min(self.len());
        &mut self[n..]
    }

    fn sub_slice_mut(&mut self, offset: usize, length: usize) -> &mut [T] {
        let start = offset.min(self.len());
        let end = offset.saturating_add(length).min(self.len());
        &mut self[start..end]
    }
}

/// Length-checked copy into the front of a slice.
pub trait CopyFrom<T: Copy> {
    /// Copy `source` to the beginning of `self`.
    ///
    /// Zero-length sources always succeed and touch nothing. Returns `false`
    /// without writing when the source does not fit.
    fn copy_from(&mut self, source: &[T]) -> bool;
}

impl<T: Copy> CopyFrom<T> for [T] {
    fn copy_from(&mut self, source: &[T]) -> bool {
        if source.is_empty() {
            return true;
        }
        if source.len() > self.len() {
            return false;
        }
        self[..source.len()].copy_from_slice(source);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

    #[test]
    fn first_n_truncates_silently() {
        assert_eq!(DATA.first_n(3), &[0, 1, 2]);
        assert_eq!(DATA.first_n(8), &DATA);
        assert_eq!(DATA.first_n(100), &DATA);
        assert_eq!(DATA.first_n(0), &[] as &[u8]);
    }

    #[test]
    fn last_n_truncates_silently() {
        assert_eq!(DATA.last_n(2), &[6, 7]);
        assert_eq!(DATA.last_n(100), &DATA);
    }

    #[test]
    fn skip_first_saturates_to_empty() {
        assert_eq!(DATA.skip_first(6), &[6, 7]);
        assert_eq!(DATA.skip_first(8), &[] as &[u8]);
        assert_eq!(DATA.skip_first(100), &[] as &[u8]);
    }

    #[test]
    fn skip_last_saturates_to_empty() {
        assert_eq!(DATA.skip_last(6), &[0, 1]);
        assert_eq!(DATA.skip_last(100), &[] as &[u8]);
    }

    #[test]
    fn sub_slice_composes_first_and_last() {
        assert_eq!(DATA.sub_slice(2, 3), &[2, 3, 4]);
        assert_eq!(DATA.sub_slice(6, 5), &[6, 7]);
        assert_eq!(DATA.sub_slice(100, 5), &[3, 4, 5, 6, 7]);
        assert_eq!(DATA.sub_slice(0, 0), &[] as &[u8]);
    }

    #[test]
    fn sub_range_is_half_open() {
        assert_eq!(DATA.sub_range(2, 5), &[2, 3, 4]);
        assert_eq!(DATA.sub_range(5, 5), &[] as &[u8]);
        assert_eq!(DATA.sub_range(5, 2), &[] as &[u8]);
    }

    #[test]
    fn length_invariants() {
        // |first_n(n)| == min(n, len) and |skip_first(n)| == len - n (floored)
        for n in 0..12 {
            assert_eq!(DATA.first_n(n).len(), n.min(DATA.len()));
            assert_eq!(DATA.skip_first(n).len(), DATA.len().saturating_sub(n));
        }
    }

    #[test]
    fn mutable_views_write_through() {
        let mut data = [0u8; 4];
        data.first_n_mut(2).fill(0xAA);
        data.skip_first_mut(2).fill(0xBB);
        assert_eq!(data, [0xAA, 0xAA, 0xBB, 0xBB]);

        data.sub_slice_mut(1, 2).fill(0xCC);
        assert_eq!(data, [0xAA, 0xCC, 0xCC, 0xBB]);
    }

    #[test]
    fn copy_from_checks_length() {
        let mut buffer = [0u8; 4];

        assert!(buffer.copy_from(&[]));
        assert_eq!(buffer, [0, 0, 0, 0]);

        assert!(buffer.copy_from(&[1, 2, 3]));
        assert_eq!(buffer, [1, 2, 3, 0]);

        assert!(!buffer.copy_from(&[9; 5]));
        // refused copies leave the destination untouched
        assert_eq!(buffer, [1, 2, 3, 0]);
    }
}
