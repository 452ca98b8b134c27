use std::collections::BTreeMap;

use async_trait::async_trait;
use rstar::{primitives::GeomWithData, RTree};
use tokio::sync::RwLock;

use super::{city_not_found, CityStore};
use crate::entities::city::validate_point;
use crate::entities::{City, NearbyCity, NewCity};
use crate::error::{AppError, AppResult};
use crate::utils::geo::{geodesic_distance, geodesic_lower_bound, unit_vector};

/// City id attached to its position on the unit sphere
type IndexedPoint = GeomWithData<[f64; 3], i32>;

#[derive(Default)]
struct Inner {
    cities: BTreeMap<i32, City>,
    index: RTree<IndexedPoint>,
    last_id: i32,
}

/// In-process `CityStore` backed by an R-tree.
///
/// Ids come from a counter that only moves forward, so an id is never handed
/// out twice even after the city holding it was deleted.
#[derive(Default)]
pub struct MemoryCityStore {
    inner: RwLock<Inner>,
}

impl MemoryCityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn indexed_point(city: &City) -> IndexedPoint {
    GeomWithData::new(unit_vector(city.lon, city.lat), city.id)
}

#[async_trait]
impl CityStore for MemoryCityStore {
    async fn insert(&self, name: &str, lon: f64, lat: f64) -> AppResult<City> {
        let new_city = NewCity::new(name, lon, lat)?;

        let mut inner = self.inner.write().await;
        let id = inner
            .last_id
            .checked_add(1)
            .ok_or_else(|| AppError::Internal("City id space exhausted".to_string()))?;

        let city = City {
            id,
            name: new_city.name,
            lon: new_city.lon,
            lat: new_city.lat,
        };
        inner.last_id = id;
        inner.index.insert(indexed_point(&city));
        inner.cities.insert(id, city.clone());

        Ok(city)
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(city) = inner.cities.remove(&id) {
            inner.index.remove(&indexed_point(&city));
        }
        Ok(())
    }

    async fn get(&self, id: i32) -> AppResult<City> {
        let inner = self.inner.read().await;
        inner.cities.get(&id).cloned().ok_or_else(|| city_not_found(id))
    }

    async fn list(&self) -> AppResult<Vec<City>> {
        let inner = self.inner.read().await;
        Ok(inner.cities.values().cloned().collect())
    }

    async fn nearest(&self, lon: f64, lat: f64, k: u64) -> AppResult<Vec<NearbyCity>> {
        validate_point(lon, lat)?;

        let inner = self.inner.read().await;
        let k = usize::try_from(k).unwrap_or(usize::MAX).min(inner.cities.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        // The tree yields candidates by chord length, i.e. by spherical
        // distance. Walk it until the next candidate cannot beat the current
        // k-th best geodesic distance even on the most favourable sphere.
        let mut best: Vec<NearbyCity> = Vec::with_capacity(k + 1);
        for (entry, chord_2) in inner
            .index
            .nearest_neighbor_iter_with_distance_2(&unit_vector(lon, lat))
        {
            if best.len() == k && geodesic_lower_bound(chord_2) > best[k - 1].distance {
                break;
            }

            let Some(city) = inner.cities.get(&entry.data) else {
                continue;
            };
            let distance = geodesic_distance(lon, lat, city.lon, city.lat);
            let pos = best.partition_point(|c| (c.distance, c.id) < (distance, city.id));
            if pos < k {
                best.insert(pos, NearbyCity::new(city.clone(), distance));
                best.truncate(k);
            }
        }

        Ok(best)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
