// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! Safe-place lookup - grounding chunk extraction and fallback handling

use std::collections::HashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::sensors::Coordinates;
use crate::service::PlaceFinder;

/// A nearby place the user can head toward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafePlace {
    pub name: String,
    pub address: String,
    pub distance: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl SafePlace {
    /// Entry shown when the lookup itself fails
    pub fn emergency_fallback() -> Self {
        Self {
            name: "Emergency Services".to_string(),
            address: "Dial 911 / 112".to_string(),
            distance: "N/A".to_string(),
            kind: "Emergency".to_string(),
            uri: None,
        }
    }
}

impl From<PlaceRef> for SafePlace {
    fn from(place: PlaceRef) -> Self {
        Self {
            name: place.title,
            address: "See map link".to_string(),
            distance: "Nearby".to_string(),
            kind: "Safe place".to_string(),
            uri: place.uri,
        }
    }
}

/// Name and link extracted from a grounding chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRef {
    pub title: String,
    pub uri: Option<String>,
}

/// Provider-specific grounding reference returned with a generated answer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub maps: Option<GroundingSource>,
    #[serde(default)]
    pub web: Option<GroundingSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroundingSource {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

/// Pull named places out of grounding chunks, maps sources first.
/// Chunks without a title are skipped and repeated URIs dropped.
pub fn extract_places(chunks: &[GroundingChunk]) -> Vec<PlaceRef> {
    let mut seen = HashSet::new();

    chunks
        .iter()
        .filter_map(|chunk| chunk.maps.as_ref().or(chunk.web.as_ref()))
        .filter_map(|source| {
            let title = source.title.as_ref()?.trim();
            if title.is_empty() {
                return None;
            }
            Some(PlaceRef {
                title: title.to_string(),
                uri: source.uri.clone(),
            })
        })
        .filter(|place| match &place.uri {
            Some(uri) => seen.insert(uri.clone()),
            None => true,
        })
        .collect()
}

/// Look up safe places near a location.
///
/// A failed lookup yields the single emergency entry; an empty answer yields an empty list.
pub async fn find_safe_places(finder: &dyn PlaceFinder, at: Coordinates, query: &str) -> Vec<SafePlace> {
    match finder.find_places(at, query).await {
        Ok(places) => {
            debug!("Place lookup returned {} entries", places.len());
            places.into_iter().map(SafePlace::from).collect()
        }
        Err(e) => {
            warn!("Safe-place lookup failed: {}", e);
            vec![SafePlace::emergency_fallback()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::service::ServiceError;

    struct FixedFinder(Option<Vec<PlaceRef>>);

    #[async_trait]
    impl PlaceFinder for FixedFinder {
        async fn find_places(&self, _at: Coordinates, _query: &str) -> Result<Vec<PlaceRef>, ServiceError> {
            self.0.clone().ok_or(ServiceError::EmptyResponse)
        }
    }

    fn chunk(title: Option<&str>, uri: Option<&str>) -> GroundingChunk {
        GroundingChunk {
            maps: Some(GroundingSource {
                title: title.map(String::from),
                uri: uri.map(String::from),
            }),
            web: None,
        }
    }

    #[test]
    fn test_extract_skips_untitled_and_duplicates() {
        let chunks = vec![
            chunk(Some("Police"), Some("u1")),
            chunk(None, Some("u2")),
            chunk(Some("Police again"), Some("u1")),
            chunk(Some("  "), Some("u3")),
            chunk(Some("Clinic"), None),
            GroundingChunk::default(),
        ];

        let places = extract_places(&chunks);
        let titles: Vec<_> = places.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Police", "Clinic"]);
    }

    #[test]
    fn test_place_type_serialized_as_type() {
        let json = serde_json::to_value(SafePlace::emergency_fallback()).unwrap();
        assert_eq!(json["type"], "Emergency");
        assert!(json.get("uri").is_none());
    }

    #[tokio::test]
    async fn test_failure_yields_fallback() {
        let finder = FixedFinder(None);
        let places = find_safe_places(&finder, Coordinates::new(0.0, 0.0), "q").await;
        assert_eq!(places, vec![SafePlace::emergency_fallback()]);
    }

    #[tokio::test]
    async fn test_empty_result_yields_empty() {
        let finder = FixedFinder(Some(vec![]));
        let places = find_safe_places(&finder, Coordinates::new(0.0, 0.0), "q").await;
        assert!(places.is_empty());
    }

    #[tokio::test]
    async fn test_results_converted() {
        let finder = FixedFinder(Some(vec![PlaceRef {
            title: "Hospital".to_string(),
            uri: Some("https://maps.example/h".to_string()),
        }]));
        let places = find_safe_places(&finder, Coordinates::new(0.0, 0.0), "q").await;
        assert_eq!(places[0].name, "Hospital");
        assert_eq!(places[0].distance, "Nearby");
    }
}
