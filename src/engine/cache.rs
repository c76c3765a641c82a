//! ### English
//! Cache-line sized padding helpers shared by the atomics in this crate.
//!
//! ### 中文
//! 本 crate 内原子结构共用的 cache line padding 工具。

/// ### English
/// The cache line size we optimize for (bytes).
///
/// ### 中文
/// 作为优化目标的 cache line 大小（字节）。
pub(crate) const CACHE_LINE_BYTES: usize = 64;

/// ### English
/// Returns the padding bytes needed to advance to the next cache-line boundary.
///
/// #### Parameters
/// - `bytes_used`: Number of bytes already occupied by preceding fields.
///
/// ### 中文
/// 返回将偏移推进到下一个 cache line 边界所需的 padding 字节数。
///
/// #### 参数
/// - `bytes_used`：前置字段已占用的字节数。
#[inline]
pub(crate) const fn pad_to_cache_line(bytes_used: usize) -> usize {
    let rem = bytes_used % CACHE_LINE_BYTES;
    if rem == 0 { 0 } else { CACHE_LINE_BYTES - rem }
}

/// ### English
/// Returns the padding bytes needed after a single field of type `T` to reach the next cache line.
///
/// ### 中文
/// 返回在单个 `T` 字段之后推进到下一个 cache line 所需的 padding 字节数。
#[inline]
pub(crate) const fn pad_after<T>() -> usize {
    pad_to_cache_line(std::mem::size_of::<T>())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU8, AtomicU64};

    use super::*;

    #[test]
    fn pads_up_to_the_next_line() {
        assert_eq!(pad_after::<AtomicU64>(), CACHE_LINE_BYTES - 8);
        assert_eq!(pad_after::<AtomicU8>(), CACHE_LINE_BYTES - 1);
        assert_eq!(pad_to_cache_line(CACHE_LINE_BYTES), 0);
        assert_eq!(pad_to_cache_line(0), 0);
    }
}
