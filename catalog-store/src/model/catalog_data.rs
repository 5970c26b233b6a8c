//! Catalog data shapes: rooms, products, menus, venue config.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub room_id: String,
    pub name: String,
    pub capacity: u32,
    /// Layout name -> max capacity for that layout (e.g. "banquet" -> 120).
    pub layout_capacities: BTreeMap<String, u32>,
    pub amenities: Vec<String>,
    pub accessibility: Vec<String>,
    pub rate: f64,
    pub rate_inclusions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductUnit {
    PerEvent,
    PerPerson,
    PerHour,
    PerDay,
    PerNight,
    PerWeek,
    Flat,
}

impl std::fmt::Display for ProductUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PerEvent => "per event",
            Self::PerPerson => "per person",
            Self::PerHour => "per hour",
            Self::PerDay => "per day",
            Self::PerNight => "per night",
            Self::PerWeek => "per week",
            Self::Flat => "flat fee",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub sku: String,
    pub name: String,
    pub price: f64,
    pub unit: ProductUnit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Menu {
    pub menu_id: String,
    pub name: String,
    pub items: Vec<String>,
    pub price_per_person: Option<f64>,
}

/// Venue-wide configuration, including the thresholds step handlers must
/// read instead of hardcoding (offer-similarity cutoff, manager name list,
/// site-visit slot rules) — see the crate's design notes on Open Question 3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    pub timezone: String,
    pub operating_hours_start: NaiveTime,
    pub operating_hours_end: NaiveTime,
    pub currency: String,
    pub from_address: String,
    pub frontend_url: String,

    pub offer_similarity_threshold: f32,
    pub manager_names: Vec<String>,
    pub site_visit_slot_duration_minutes: u32,
    pub site_visit_max_dates_offered: u8,
    pub negotiation_max_counter_offers: u32,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            timezone: "Europe/Zurich".to_string(),
            operating_hours_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            operating_hours_end: NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
            currency: "CHF".to_string(),
            from_address: "events@venue.example".to_string(),
            frontend_url: "https://venue.example".to_string(),
            offer_similarity_threshold: 0.85,
            manager_names: Vec::new(),
            site_visit_slot_duration_minutes: 30,
            site_visit_max_dates_offered: 5,
            negotiation_max_counter_offers: 3,
        }
    }
}

/// Resolved status of a room on a given date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Available,
    Option,
    Confirmed,
    Blocked,
}

pub type RoomStatusMap = HashMap<String, RoomStatus>;

/// What a client needs from a room: used to rank candidates.
#[derive(Debug, Clone, Default)]
pub struct RoomRequirements {
    pub capacity: u32,
    pub layout: Option<String>,
    pub amenities: Vec<String>,
}

/// One ranked candidate from `evaluate_room_statuses`.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRoom {
    pub room_id: String,
    pub name: String,
    pub fits: bool,
    pub score: f64,
}
