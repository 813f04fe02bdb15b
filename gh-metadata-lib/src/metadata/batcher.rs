use core::num::NonZeroUsize;

/// Split `items` into consecutive groups of at most `batch_size`, preserving order.
///
/// Every group but the last holds exactly `batch_size` items. An empty input yields no groups.
#[must_use]
pub fn partition<T>(items: &[T], batch_size: NonZeroUsize) -> Vec<&[T]> {
    items.chunks(batch_size.get()).collect()
}
