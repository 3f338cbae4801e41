pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamps raw pagination input: non-positive pages become page 1,
/// non-positive sizes fall back to the default, oversized requests are
/// capped at the maximum.
pub fn clamp(page: i64, size: i64) -> (i64, i64) {
    let page = if page <= 0 { 1 } else { page };
    let size = if size <= 0 {
        DEFAULT_PAGE_SIZE
    } else {
        size.min(MAX_PAGE_SIZE)
    };
    (page, size)
}

/// Clamped `(offset, limit)` window for a query. Saturates instead of
/// overflowing, so an absurd page number yields a past-the-end offset
/// and an empty result rather than a panic or a negative OFFSET.
pub fn window(page: i64, size: i64) -> (i64, i64) {
    let (page, size) = clamp(page, size);
    (page.saturating_sub(1).saturating_mul(size), size)
}
