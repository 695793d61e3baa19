//! In-memory geo index implementation.
//!
//! Serves the "matches near (lat, lon)" query from process memory; the
//! relational store remains authoritative and the reconciliation job
//! repairs any drift. The internal structure is deliberately simple: the
//! port contract is what matters, and a guarded map with haversine
//! filtering satisfies it.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use geo::{point, HaversineDistance, Point};
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::services::{GeoEntry, GeoIndex, GeoIndexError};

/// Process-local geo index.
#[derive(Default)]
pub struct InMemoryGeoIndex {
    entries: RwLock<HashMap<Uuid, Point<f64>>>,
}

impl InMemoryGeoIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GeoIndex for InMemoryGeoIndex {
    async fn add(&self, entry: GeoEntry) -> Result<(), GeoIndexError> {
        let mut entries = self.entries.write().await;
        entries.insert(entry.match_id, point!(x: entry.longitude, y: entry.latitude));
        Ok(())
    }

    async fn remove(&self, match_id: Uuid) -> Result<(), GeoIndexError> {
        let mut entries = self.entries.write().await;
        entries.remove(&match_id);
        Ok(())
    }

    async fn bulk_add(&self, batch: &[GeoEntry]) -> Result<(), GeoIndexError> {
        let mut entries = self.entries.write().await;
        for entry in batch {
            entries.insert(entry.match_id, point!(x: entry.longitude, y: entry.latitude));
        }
        Ok(())
    }

    async fn all_ids(&self) -> Result<HashSet<Uuid>, GeoIndexError> {
        let entries = self.entries.read().await;
        Ok(entries.keys().copied().collect())
    }

    async fn clear(&self) -> Result<(), GeoIndexError> {
        let mut entries = self.entries.write().await;
        entries.clear();
        Ok(())
    }

    async fn search_within(
        &self,
        longitude: f64,
        latitude: f64,
        radius_meters: f64,
    ) -> Result<Vec<Uuid>, GeoIndexError> {
        let center = point!(x: longitude, y: latitude);
        let entries = self.entries.read().await;
        let mut hits: Vec<(Uuid, f64)> = entries
            .iter()
            .filter_map(|(id, position)| {
                let distance = center.haversine_distance(position);
                (distance <= radius_meters).then_some((*id, distance))
            })
            .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        Ok(hits.into_iter().map(|(id, _)| id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(longitude: f64, latitude: f64) -> GeoEntry {
        GeoEntry {
            match_id: Uuid::new_v4(),
            longitude,
            latitude,
        }
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let index = InMemoryGeoIndex::new();
        let a = entry(126.978, 37.5665);
        let b = entry(127.0276, 37.4979);
        index.add(a).await.unwrap();
        index.add(b).await.unwrap();

        let ids = index.all_ids().await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a.match_id));
        assert!(ids.contains(&b.match_id));
    }

    #[tokio::test]
    async fn test_add_overwrites_position() {
        let index = InMemoryGeoIndex::new();
        let mut a = entry(0.0, 0.0);
        index.add(a).await.unwrap();
        a.longitude = 0.5;
        index.add(a).await.unwrap();
        assert_eq!(index.all_ids().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let index = InMemoryGeoIndex::new();
        let a = entry(126.978, 37.5665);
        index.add(a).await.unwrap();
        index.remove(a.match_id).await.unwrap();
        index.remove(a.match_id).await.unwrap();
        assert!(index.all_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_add_and_clear() {
        let index = InMemoryGeoIndex::new();
        let batch = vec![entry(0.0, 0.0), entry(1.0, 1.0), entry(2.0, 2.0)];
        index.bulk_add(&batch).await.unwrap();
        assert_eq!(index.all_ids().await.unwrap().len(), 3);

        index.clear().await.unwrap();
        assert!(index.all_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_within_filters_by_distance() {
        let index = InMemoryGeoIndex::new();
        // Roughly 1.1 km east of the origin along the equator.
        let near = entry(0.01, 0.0);
        // Roughly 11 km east.
        let far = entry(0.1, 0.0);
        index.add(near).await.unwrap();
        index.add(far).await.unwrap();

        let hits = index.search_within(0.0, 0.0, 2_000.0).await.unwrap();
        assert_eq!(hits, vec![near.match_id]);

        let hits = index.search_within(0.0, 0.0, 20_000.0).await.unwrap();
        assert_eq!(hits.len(), 2);
        // Sorted nearest first.
        assert_eq!(hits[0], near.match_id);
        assert_eq!(hits[1], far.match_id);
    }

    #[tokio::test]
    async fn test_search_within_empty_index() {
        let index = InMemoryGeoIndex::new();
        assert!(index
            .search_within(0.0, 0.0, 5_000.0)
            .await
            .unwrap()
            .is_empty());
    }
}
