//! Block geometry helpers shared by the pools

/// Rounds `value` up to a multiple of the power-of-two `alignment`
///
/// Returns `None` when the rounded value does not fit in `usize`.
///
/// # Examples
/// ```
/// use strata_memory::utils::checked_align_up;
///
/// assert_eq!(checked_align_up(9, 8), Some(16));
/// assert_eq!(checked_align_up(16, 16), Some(16));
/// assert_eq!(checked_align_up(usize::MAX, 16), None);
/// ```
#[inline]
pub const fn checked_align_up(value: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment.is_power_of_two());
    let mask = alignment - 1;
    match value.checked_add(mask) {
        Some(padded) => Some(padded & !mask),
        None => None,
    }
}

/// Stride of one pool block: at least `min_size` bytes, rounded to `alignment`
#[inline]
pub(crate) const fn block_stride(
    requested: usize,
    min_size: usize,
    alignment: usize,
) -> Option<usize> {
    let size = if requested < min_size { min_size } else { requested };
    checked_align_up(size, alignment)
}

/// Checks if a pointer is aligned to the power-of-two `alignment`
#[inline(always)]
pub fn is_aligned_ptr<T>(ptr: *const T, alignment: usize) -> bool {
    debug_assert!(alignment.is_power_of_two());
    ptr.addr() & (alignment - 1) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_align_up() {
        assert_eq!(checked_align_up(0, 16), Some(0));
        assert_eq!(checked_align_up(1, 16), Some(16));
        assert_eq!(checked_align_up(usize::MAX - 14, 16), None);
    }

    #[test]
    fn test_block_stride_respects_link_size() {
        assert_eq!(block_stride(1, 8, 8), Some(8));
        assert_eq!(block_stride(12, 8, 8), Some(16));
        assert_eq!(block_stride(24, 8, 16), Some(32));
    }

    #[test]
    fn test_pointer_alignment() {
        let value = 0_u64;
        assert!(is_aligned_ptr(&raw const value, core::mem::align_of::<u64>()));
    }
}
