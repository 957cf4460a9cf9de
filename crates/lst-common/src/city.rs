//! City registry: the named regions a query can target.
//!
//! The registry ships with a built-in set of Brazilian state capitals and
//! can be replaced wholesale from a YAML file. It is static configuration,
//! not persisted state.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LstResult;
use crate::geo::LatLon;

/// A named query target with its map presentation defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub name: String,
    pub center: LatLon,
    pub zoom: u8,
}

/// Lookup table of available cities, keyed by identifier.
///
/// Backed by a BTreeMap so listings are deterministic.
#[derive(Debug, Clone, Default)]
pub struct CityRegistry {
    cities: BTreeMap<String, City>,
}

impl CityRegistry {
    /// Registry with the built-in city set.
    pub fn builtin() -> Self {
        let defaults = [
            ("sao_paulo", "São Paulo", -23.55, -46.63),
            ("rio_janeiro", "Rio de Janeiro", -22.91, -43.17),
            ("brasilia", "Brasília", -15.78, -47.93),
            ("belo_horizonte", "Belo Horizonte", -19.92, -43.94),
            ("curitiba", "Curitiba", -25.43, -49.27),
            ("fortaleza", "Fortaleza", -3.73, -38.52),
            ("recife", "Recife", -8.05, -34.88),
            ("salvador", "Salvador", -12.97, -38.51),
        ];

        let cities = defaults
            .into_iter()
            .map(|(id, name, lat, lon)| {
                (
                    id.to_string(),
                    City {
                        id: id.to_string(),
                        name: name.to_string(),
                        center: LatLon::new(lat, lon),
                        zoom: 11,
                    },
                )
            })
            .collect();

        Self { cities }
    }

    /// Load a registry from a YAML file containing a list of cities.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> LstResult<Self> {
        let text = fs::read_to_string(path)?;
        let cities: Vec<City> = serde_yaml::from_str(&text)?;
        Ok(Self {
            cities: cities.into_iter().map(|c| (c.id.clone(), c)).collect(),
        })
    }

    /// Look up a city by identifier.
    pub fn get(&self, id: &str) -> Option<&City> {
        self.cities.get(id)
    }

    /// All cities in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &City> {
        self.cities.values()
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_registry() {
        let registry = CityRegistry::builtin();
        assert_eq!(registry.len(), 8);

        let sp = registry.get("sao_paulo").unwrap();
        assert_eq!(sp.name, "São Paulo");
        assert!((sp.center.lat - (-23.55)).abs() < 1e-9);

        assert!(registry.get("atlantis").is_none());
    }

    #[test]
    fn test_iteration_is_sorted_by_id() {
        let registry = CityRegistry::builtin();
        let ids: Vec<&str> = registry.iter().map(|c| c.id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_from_yaml_file() {
        let yaml = r#"
- id: porto_alegre
  name: Porto Alegre
  center: { lat: -30.03, lon: -51.23 }
  zoom: 12
- id: manaus
  name: Manaus
  center: { lat: -3.12, lon: -60.02 }
  zoom: 11
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let registry = CityRegistry::from_yaml_file(file.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("manaus").unwrap().zoom, 11);
        let first = registry.iter().next().unwrap();
        assert_eq!(first.id, "manaus");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = CityRegistry::from_yaml_file("/nonexistent/cities.yaml").unwrap_err();
        assert!(matches!(err, crate::error::LstError::Config(_)));
    }
}
