/// Default page size for subscription listings.
pub const DEFAULT_LIMIT: u64 = 10;

/// Largest page a caller may request.
pub const MAX_LIMIT: u64 = 100;

/// One page of a filtered listing.
///
/// `total` counts the whole filtered set, independent of `limit`/`offset`.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, limit: u64, offset: u64) -> Self {
        Self {
            items,
            total,
            limit,
            offset,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}
