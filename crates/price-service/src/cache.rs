//! # Price Cache
//!
//! Process-wide map from catalog id to price. It is filled once at startup and read by
//! every request; concurrent readers never block each other.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;

#[derive(Debug, Default)]
pub struct PriceCache {
    prices: DashMap<i32, Decimal>,
}

impl PriceCache {
    pub fn new(entries: impl IntoIterator<Item = (i32, Decimal)>) -> Self {
        Self {
            prices: entries.into_iter().collect(),
        }
    }

    /// The startup contents: catalog 1 costs 100.
    pub fn seeded() -> Self {
        Self::new([(1, Decimal::from(100))])
    }

    pub fn get(&self, id: i32) -> Option<Decimal> {
        self.prices.get(&id).map(|price| *price)
    }

    /// Adds an entry unless `id` is already present. Existing prices are never replaced.
    pub fn insert(&self, id: i32, price: Decimal) -> bool {
        match self.prices.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(price);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_seeded_cache_holds_catalog_one() {
        let cache = PriceCache::seeded();
        assert_eq!(cache.get(1), Some(Decimal::from(100)));
        assert_eq!(cache.get(2), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_existing_entries_are_not_overwritten() {
        let cache = PriceCache::seeded();
        assert!(!cache.insert(1, Decimal::from(999)));
        assert_eq!(cache.get(1), Some(Decimal::from(100)));

        assert!(cache.insert(2, Decimal::from(5)));
        assert_eq!(cache.get(2), Some(Decimal::from(5)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_readers_and_writers() {
        let cache = Arc::new(PriceCache::seeded());
        let mut tasks = tokio::task::JoinSet::new();
        for writer in 0..8 {
            let cache = cache.clone();
            tasks.spawn(async move {
                let mut won = 0;
                for id in 2..=101 {
                    if cache.insert(id, Decimal::from(writer)) {
                        won += 1;
                    }
                    assert_eq!(cache.get(1), Some(Decimal::from(100)));
                }
                won
            });
        }

        let mut inserted = 0;
        while let Some(won) = tasks.join_next().await {
            inserted += won.unwrap();
        }

        // each id was claimed by exactly one writer
        assert_eq!(inserted, 100);
        assert_eq!(cache.len(), 101);
        assert_eq!(cache.get(1), Some(Decimal::from(100)));
    }
}
