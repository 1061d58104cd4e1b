//! City and district lookup for shipping addresses.
//!
//! The dataset is bundled into the binary and parsed once at startup.

use serde::{Deserialize, Serialize};

const LOCATIONS_JSON: &str = include_str!("../../data/locations.json");

/// A city with its districts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    /// Licence-plate code of the province.
    pub id: u16,
    pub name: String,
    pub districts: Vec<String>,
}

/// City listing entry for the lookup API.
#[derive(Debug, Clone, Serialize)]
pub struct CityRef<'a> {
    pub id: u16,
    pub name: &'a str,
}

/// All deliverable cities, sorted by name.
#[derive(Debug, Clone)]
pub struct Locations {
    cities: Vec<City>,
}

impl Locations {
    /// Parse the bundled dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled JSON is malformed.
    pub fn bundled() -> Result<Self, serde_json::Error> {
        Self::from_json(LOCATIONS_JSON)
    }

    /// Parse a dataset from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the expected shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut cities: Vec<City> = serde_json::from_str(json)?;
        cities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self { cities })
    }

    #[must_use]
    pub fn cities(&self) -> Vec<CityRef<'_>> {
        self.cities
            .iter()
            .map(|c| CityRef {
                id: c.id,
                name: &c.name,
            })
            .collect()
    }

    #[must_use]
    pub fn city(&self, id: u16) -> Option<&City> {
        self.cities.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn city_by_name(&self, name: &str) -> Option<&City> {
        let name = name.trim();
        self.cities.iter().find(|c| c.name == name)
    }

    /// Districts of the named city; empty for an unknown city.
    #[must_use]
    pub fn districts_of(&self, city: &str) -> &[String] {
        self.city_by_name(city)
            .map_or(&[], |c| c.districts.as_slice())
    }

    /// Whether `district` belongs to `city`.
    #[must_use]
    pub fn contains(&self, city: &str, district: &str) -> bool {
        let district = district.trim();
        self.districts_of(city).iter().any(|d| d == district)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_dataset_parses() {
        let locations = Locations::bundled().unwrap();
        assert!(!locations.cities().is_empty());
        assert!(locations.city(34).is_some());
    }

    #[test]
    fn test_cities_sorted_by_name() {
        let locations = Locations::from_json(
            r#"[{"id":48,"name":"Muğla","districts":["Bodrum"]},
                {"id":6,"name":"Ankara","districts":["Çankaya"]}]"#,
        )
        .unwrap();
        let names: Vec<_> = locations.cities().iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Ankara", "Muğla"]);
    }

    #[test]
    fn test_contains_checks_pairing() {
        let locations = Locations::bundled().unwrap();
        assert!(locations.contains("Muğla", "Bodrum"));
        assert!(locations.contains(" Muğla ", " Bodrum "));
        assert!(!locations.contains("Ankara", "Bodrum"));
        assert!(!locations.contains("Atlantis", "Bodrum"));
    }

    #[test]
    fn test_unknown_city_has_no_districts() {
        let locations = Locations::bundled().unwrap();
        assert!(locations.districts_of("Atlantis").is_empty());
    }
}
