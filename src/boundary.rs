use crate::source::Source;
use crate::types::BoundaryCollection;
use anyhow::{anyhow, Context, Result};
use geojson::{Feature, FeatureCollection};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

/// Loads every boundary document in order and concatenates their features.
///
/// Documents are fetched one after another; the first failure aborts the load.
pub async fn load_boundaries(
    client: &reqwest::Client,
    sources: &[String],
) -> Result<BoundaryCollection> {
    let mut collections = Vec::with_capacity(sources.len());
    for location in sources {
        let source = Source::parse(location);
        let collection = load_document(client, &source).await?;
        info!(source = %source, features = collection.features.len(), "Loaded boundary document");
        collections.push(collection);
    }

    let merged = merge(collections);
    info!(features = merged.len(), "Merged boundary documents");
    Ok(merged)
}

pub async fn load_document(client: &reqwest::Client, source: &Source) -> Result<FeatureCollection> {
    let bytes = source.fetch_bytes(client).await?;
    parse_document(&bytes).with_context(|| format!("Invalid boundary document {}", source))
}

/// Parses a FeatureCollection one feature at a time, so a single bad
/// geometry leaves a geometry-less feature in its place instead of failing
/// the document.
fn parse_document(bytes: &[u8]) -> Result<FeatureCollection> {
    let document: JsonValue = serde_json::from_slice(bytes).context("Failed to parse GeoJSON")?;
    let mut object = match document {
        JsonValue::Object(object)
            if object.get("type").and_then(JsonValue::as_str) == Some("FeatureCollection") =>
        {
            object
        }
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };
    let entries = match object.remove("features") {
        Some(JsonValue::Array(entries)) => entries,
        _ => return Err(anyhow!("FeatureCollection has no features array")),
    };

    let features = entries
        .into_iter()
        .enumerate()
        .map(|(position, entry)| parse_feature(position, entry))
        .collect();
    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

fn parse_feature(position: usize, entry: JsonValue) -> Feature {
    let object = match entry {
        JsonValue::Object(object) => object,
        other => {
            warn!(position, "Feature is not a JSON object: {}", other);
            return empty_feature(None);
        }
    };
    let properties = object
        .get("properties")
        .and_then(JsonValue::as_object)
        .cloned();
    match Feature::try_from(object) {
        Ok(feature) => feature,
        Err(e) => {
            warn!(position, "Keeping feature without geometry: {}", e);
            empty_feature(properties)
        }
    }
}

fn empty_feature(properties: Option<geojson::JsonObject>) -> Feature {
    Feature {
        bbox: None,
        geometry: None,
        id: None,
        properties,
        foreign_members: None,
    }
}

/// Order-preserving concatenation, no deduplication.
pub fn merge(collections: impl IntoIterator<Item = FeatureCollection>) -> BoundaryCollection {
    let features = collections
        .into_iter()
        .flat_map(|collection| collection.features)
        .collect();
    BoundaryCollection { features }
}
