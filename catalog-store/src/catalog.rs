//! Read-only catalog accessor: rooms, products, menus, venue config.
//!
//! Follows the same enum-dispatch house style as `event-llm`'s adapter
//! clients: one concrete backend today ([`InMemoryCatalog`]), with room to
//! add a persistent backend as another `Catalog` variant later.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::CatalogError;
use crate::model::{
    Event, Menu, Product, RankedRoom, Room, RoomRequirements, RoomStatus, RoomStatusMap,
    VenueConfig,
};

/// Shared handle onto the store's events, so room-status lookups see live
/// booking data without the catalog owning persistence itself.
pub type SharedEvents = Arc<RwLock<HashMap<String, Event>>>;

/// In-memory reference catalog: fixed room/product/menu tables plus a
/// shared view of the store's events for availability lookups.
pub struct InMemoryCatalog {
    rooms: BTreeMap<String, Room>,
    products: BTreeMap<String, Product>,
    menus: BTreeMap<String, Menu>,
    venue_config: VenueConfig,
    events: SharedEvents,
}

impl InMemoryCatalog {
    pub fn new(
        rooms: Vec<Room>,
        products: Vec<Product>,
        menus: Vec<Menu>,
        venue_config: VenueConfig,
        events: SharedEvents,
    ) -> Self {
        Self {
            rooms: rooms.into_iter().map(|r| (r.room_id.clone(), r)).collect(),
            products: products.into_iter().map(|p| (p.sku.clone(), p)).collect(),
            menus: menus.into_iter().map(|m| (m.menu_id.clone(), m)).collect(),
            venue_config,
            events,
        }
    }

    pub async fn rooms(&self) -> Vec<Room> {
        self.rooms.values().cloned().collect()
    }

    pub async fn room(&self, id: &str) -> Option<Room> {
        self.rooms.get(id).cloned()
    }

    pub async fn products(&self) -> Vec<Product> {
        self.products.values().cloned().collect()
    }

    pub async fn product(&self, id: &str) -> Option<Product> {
        self.products.get(id).cloned()
    }

    pub async fn menus(&self) -> Vec<Menu> {
        self.menus.values().cloned().collect()
    }

    pub async fn venue_config(&self) -> Result<VenueConfig, CatalogError> {
        Ok(self.venue_config.clone())
    }

    /// Derived from the stored amenity/accessibility lists — never a
    /// hardcoded string list quoted in prose elsewhere.
    pub async fn list_common_room_features(&self) -> Vec<String> {
        if self.rooms.is_empty() {
            return Vec::new();
        }
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for room in self.rooms.values() {
            for amenity in &room.amenities {
                *counts.entry(amenity.as_str()).or_insert(0) += 1;
            }
        }
        let total = self.rooms.len();
        let mut common: Vec<String> = counts
            .into_iter()
            .filter(|(_, count)| *count == total)
            .map(|(name, _)| name.to_string())
            .collect();
        common.sort();
        common
    }

    /// Reads both the canonical `Event::status` and legacy boolean flags an
    /// older event record might still carry (via `offer_accepted`/site
    /// visit state), OR-ing them into one availability verdict per room.
    /// Always excludes `exclude_event_id` so a client never sees their own
    /// record as a conflict.
    pub async fn room_status_on_date(
        &self,
        date: NaiveDate,
        exclude_event_id: Option<&str>,
    ) -> RoomStatusMap {
        let events = self.events.read().await;
        let mut map: RoomStatusMap = self
            .rooms
            .keys()
            .map(|id| (id.clone(), RoomStatus::Available))
            .collect();

        for event in events.values() {
            if Some(event.event_id.as_str()) == exclude_event_id {
                continue;
            }
            if event.event_date != Some(date) {
                continue;
            }
            let Some(room_id) = &event.locked_room_id else {
                continue;
            };
            let legacy_blocked = event.offer_accepted
                && matches!(
                    event.site_visit_state.status,
                    crate::model::SiteVisitStatus::Scheduled
                );
            let status = match event.status {
                crate::model::EventStatus::Confirmed => RoomStatus::Confirmed,
                crate::model::EventStatus::Option if legacy_blocked => RoomStatus::Confirmed,
                crate::model::EventStatus::Option => RoomStatus::Option,
                crate::model::EventStatus::Lead => continue,
                crate::model::EventStatus::Cancelled => continue,
            };
            map.insert(room_id.clone(), status);
        }

        debug!(date = %date, rooms = map.len(), "resolved room status map");
        map
    }

    /// Ranks rooms by capacity/feature/amenity fit. Deterministic: ties
    /// break on name so repeated calls with the same inputs never reorder.
    pub async fn evaluate_room_statuses(
        &self,
        requirements: &RoomRequirements,
        exclude_event_id: Option<&str>,
    ) -> Vec<RankedRoom> {
        let date_independent = self.rooms.values();
        let mut ranked: Vec<RankedRoom> = date_independent
            .map(|room| {
                let capacity_limit = requirements
                    .layout
                    .as_ref()
                    .and_then(|layout| room.layout_capacities.get(layout))
                    .copied()
                    .unwrap_or(room.capacity);
                let fits_capacity = capacity_limit >= requirements.capacity;
                let matched_amenities = requirements
                    .amenities
                    .iter()
                    .filter(|a| room.amenities.iter().any(|ra| ra == *a))
                    .count();
                let amenity_score = if requirements.amenities.is_empty() {
                    1.0
                } else {
                    matched_amenities as f64 / requirements.amenities.len() as f64
                };
                let capacity_score = if requirements.capacity == 0 {
                    1.0
                } else {
                    (capacity_limit as f64 / requirements.capacity as f64).min(1.5) / 1.5
                };
                let score = if fits_capacity {
                    0.5 * amenity_score + 0.5 * capacity_score
                } else {
                    0.0
                };
                RankedRoom {
                    room_id: room.room_id.clone(),
                    name: room.name.clone(),
                    fits: fits_capacity,
                    score,
                }
            })
            .collect();

        let _ = exclude_event_id; // capacity/amenity fit doesn't depend on date occupancy
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        ranked
    }
}

/// Enum-dispatch wrapper; today there is only one backend.
pub enum Catalog {
    InMemory(InMemoryCatalog),
}

impl Catalog {
    pub async fn rooms(&self) -> Vec<Room> {
        match self {
            Self::InMemory(c) => c.rooms().await,
        }
    }

    pub async fn room(&self, id: &str) -> Option<Room> {
        match self {
            Self::InMemory(c) => c.room(id).await,
        }
    }

    pub async fn products(&self) -> Vec<Product> {
        match self {
            Self::InMemory(c) => c.products().await,
        }
    }

    pub async fn product(&self, id: &str) -> Option<Product> {
        match self {
            Self::InMemory(c) => c.product(id).await,
        }
    }

    pub async fn menus(&self) -> Vec<Menu> {
        match self {
            Self::InMemory(c) => c.menus().await,
        }
    }

    pub async fn venue_config(&self) -> Result<VenueConfig, CatalogError> {
        match self {
            Self::InMemory(c) => c.venue_config().await,
        }
    }

    pub async fn list_common_room_features(&self) -> Vec<String> {
        match self {
            Self::InMemory(c) => c.list_common_room_features().await,
        }
    }

    pub async fn room_status_on_date(
        &self,
        date: NaiveDate,
        exclude_event_id: Option<&str>,
    ) -> RoomStatusMap {
        match self {
            Self::InMemory(c) => c.room_status_on_date(date, exclude_event_id).await,
        }
    }

    pub async fn evaluate_room_statuses(
        &self,
        requirements: &RoomRequirements,
        exclude_event_id: Option<&str>,
    ) -> Vec<RankedRoom> {
        match self {
            Self::InMemory(c) => c.evaluate_room_statuses(requirements, exclude_event_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProductUnit;

    fn sample_catalog() -> Catalog {
        let rooms = vec![
            Room {
                room_id: "room-a".into(),
                name: "Atrium".into(),
                capacity: 100,
                layout_capacities: BTreeMap::new(),
                amenities: vec!["projector".into(), "wifi".into()],
                accessibility: vec!["wheelchair".into()],
                rate: 500.0,
                rate_inclusions: vec![],
            },
            Room {
                room_id: "room-b".into(),
                name: "Loft".into(),
                capacity: 40,
                layout_capacities: BTreeMap::new(),
                amenities: vec!["wifi".into()],
                accessibility: vec!["wheelchair".into()],
                rate: 250.0,
                rate_inclusions: vec![],
            },
        ];
        let products = vec![Product {
            sku: "mic-1".into(),
            name: "Wireless Microphone".into(),
            price: 25.0,
            unit: ProductUnit::PerEvent,
        }];
        Catalog::InMemory(InMemoryCatalog::new(
            rooms,
            products,
            vec![],
            VenueConfig::default(),
            Arc::new(RwLock::new(HashMap::new())),
        ))
    }

    #[tokio::test]
    async fn common_features_are_the_intersection_across_all_rooms() {
        let catalog = sample_catalog();
        assert_eq!(catalog.list_common_room_features().await, vec!["wifi".to_string()]);
    }

    #[tokio::test]
    async fn evaluate_room_statuses_excludes_undersized_rooms_but_keeps_order_deterministic() {
        let catalog = sample_catalog();
        let reqs = RoomRequirements {
            capacity: 60,
            layout: None,
            amenities: vec!["projector".into()],
        };
        let ranked = catalog.evaluate_room_statuses(&reqs, None).await;
        assert_eq!(ranked[0].room_id, "room-a");
        assert!(!ranked.iter().find(|r| r.room_id == "room-b").unwrap().fits);
    }
}
