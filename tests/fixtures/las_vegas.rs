//! Real Las Vegas / Henderson places for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap via Overpass API.

use delivery_planner::model::Location;

/// A named place; the name doubles as its street address in tests.
#[derive(Debug, Clone, Copy)]
pub struct Place {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Place {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn location(&self) -> Location {
        Location::new(self.lat, self.lng)
    }
}

/// Warehouse candidates.
pub const DEPOTS: &[Place] = &[
    Place::new("Wynn Las Vegas", 36.1263781, -115.1658180),
    Place::new("MGM Grand", 36.1023654, -115.1688720),
    Place::new("Longhorn Casino", 36.1070664, -115.0591256),
];

pub const STRIP_STOPS: &[Place] = &[
    Place::new("Hard Rock Cafe", 36.1041592, -115.1722166),
    Place::new("SW Steakhouse", 36.1262145, -115.1669146),
    Place::new("Sinatra", 36.1300035, -115.1654850),
    Place::new("Public House", 36.1219193, -115.1689317),
    Place::new("Brooklyn Bowl", 36.1175388, -115.1695094),
    Place::new("Gordon Ramsay BurGR", 36.1107195, -115.1720818),
    Place::new("Spago by Wolfgang Puck", 36.1139368, -115.1741462),
    Place::new("Rao's", 36.1163982, -115.1763053),
    Place::new("Il Fornaio", 36.1024474, -115.1740110),
    Place::new("Strip Steak", 36.0908722, -115.1776176),
];

/// Stops spread across the metro area.
pub const METRO_STOPS: &[Place] = &[
    Place::new("Rivas Mexican Grill North", 36.1450055, -115.0482587),
    Place::new("Beers and Bets", 36.1428945, -115.1573836),
    Place::new("Bellagio", 36.1126, -115.1767),
    Place::new("Bootlegger Bistro", 36.0492047, -115.1715744),
    Place::new("Budget Suites South", 36.0366259, -115.1713361),
    Place::new("Green Valley Ranch Area", 36.0308, -115.0825),
    Place::new("Sunset Station Area", 36.0614, -115.0631),
    Place::new("I Love Sushi Henderson", 35.9916660, -115.1028343),
    Place::new("Islander's Grill", 36.0335058, -114.9856162),
];

pub fn all_places() -> Vec<Place> {
    DEPOTS
        .iter()
        .chain(STRIP_STOPS)
        .chain(METRO_STOPS)
        .copied()
        .collect()
}

#[test]
fn test_coordinates_in_vegas_area() {
    for place in all_places() {
        assert!(
            place.lat > 35.9 && place.lat < 36.3,
            "{} lat out of range: {}",
            place.name,
            place.lat
        );
        assert!(
            place.lng > -115.4 && place.lng < -114.8,
            "{} lng out of range: {}",
            place.name,
            place.lng
        );
    }
}
