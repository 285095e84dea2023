use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::attributes::Attribute;

/// A geographic position, latitude and longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> LatLon {
        LatLon { lat, lon }
    }
}

/// Outcome of decoding a geometry attribute, memoized per record.
#[derive(Debug, Clone)]
enum GeomCache<T> {
    NotAttempted,
    Decoded(T),
    Failed,
}

/// Metadata of one Earth observation product.
///
/// Attribute values are stored as the raw strings received from the
/// catalogue. The footprint and scene center decode lazily into
/// positions on first access, a failed decode drops the raw value.
#[derive(Debug, Clone)]
pub struct MetadataRecord {
    values: BTreeMap<Attribute, String>,
    footprint: GeomCache<Vec<LatLon>>,
    center: GeomCache<LatLon>,
}

impl MetadataRecord {
    pub fn new() -> MetadataRecord {
        MetadataRecord {
            values: BTreeMap::new(),
            footprint: GeomCache::NotAttempted,
            center: GeomCache::NotAttempted,
        }
    }

    /// Stores an attribute value, returning the previous one if any.
    pub fn put(&mut self, attribute: Attribute, value: impl Into<String>) -> Option<String> {
        self.invalidate(attribute);
        self.values.insert(attribute, value.into())
    }

    /// Removes an attribute value, returning it if it was present.
    pub fn remove(&mut self, attribute: Attribute) -> Option<String> {
        self.invalidate(attribute);
        self.values.remove(&attribute)
    }

    fn invalidate(&mut self, attribute: Attribute) {
        match attribute {
            Attribute::Footprint => self.footprint = GeomCache::NotAttempted,
            Attribute::SceneCenter => self.center = GeomCache::NotAttempted,
            _ => {}
        }
    }

    pub fn get(&self, attribute: Attribute) -> Option<&str> {
        self.values.get(&attribute).map(String::as_str)
    }

    pub fn contains(&self, attribute: Attribute) -> bool {
        self.values.contains_key(&attribute)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Attribute values in importance order.
    pub fn iter(&self) -> impl Iterator<Item = (Attribute, &str)> {
        self.values.iter().map(|(attribute, value)| (*attribute, value.as_str()))
    }

    /// The footprint as decoded positions.
    ///
    /// Decodes the raw footprint string on first call and memoizes the
    /// outcome. An undecodable footprint is removed from the record and
    /// reported as None from then on.
    pub fn footprint_points(&mut self) -> Option<&[LatLon]> {
        if matches!(self.footprint, GeomCache::NotAttempted) {
            if let Some(raw) = self.values.get(&Attribute::Footprint) {
                match parse_positions(raw) {
                    Some(points) => self.footprint = GeomCache::Decoded(points),
                    None => {
                        self.values.remove(&Attribute::Footprint);
                        self.footprint = GeomCache::Failed;
                    }
                }
            }
        }
        match &self.footprint {
            GeomCache::Decoded(points) => Some(points.as_slice()),
            _ => None,
        }
    }

    /// The scene center as a decoded position, memoized like
    /// [`footprint_points`](MetadataRecord::footprint_points).
    pub fn scene_center(&mut self) -> Option<LatLon> {
        if matches!(self.center, GeomCache::NotAttempted) {
            if let Some(raw) = self.values.get(&Attribute::SceneCenter) {
                match parse_single_position(raw) {
                    Some(point) => self.center = GeomCache::Decoded(point),
                    None => {
                        self.values.remove(&Attribute::SceneCenter);
                        self.center = GeomCache::Failed;
                    }
                }
            }
        }
        match self.center {
            GeomCache::Decoded(point) => Some(point),
            _ => None,
        }
    }

    /// Orders records by parent identifier, then product identifier.
    /// Records missing either side of a comparison rank as equal on it.
    pub fn compare(&self, other: &MetadataRecord) -> Ordering {
        let by_collection = compare_values(
            self.get(Attribute::ParentIdentifier),
            other.get(Attribute::ParentIdentifier),
        );
        if by_collection != Ordering::Equal {
            return by_collection;
        }
        compare_values(
            self.get(Attribute::ProductIdentifier),
            other.get(Attribute::ProductIdentifier),
        )
    }
}

impl Default for MetadataRecord {
    fn default() -> MetadataRecord {
        MetadataRecord::new()
    }
}

impl PartialEq for MetadataRecord {
    fn eq(&self, other: &MetadataRecord) -> bool {
        self.values == other.values
    }
}

impl Eq for MetadataRecord {}

fn compare_values(left: Option<&str>, right: Option<&str>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => left.cmp(right),
        _ => Ordering::Equal,
    }
}

/// Parses whitespace separated lat/lon ordinates. An empty string, a
/// bad token or an odd ordinate count all count as failure.
fn parse_positions(raw: &str) -> Option<Vec<LatLon>> {
    let mut ordinates = Vec::new();
    for token in raw.split_whitespace() {
        ordinates.push(token.parse::<f64>().ok()?);
    }
    if ordinates.is_empty() || ordinates.len() % 2 != 0 {
        return None;
    }
    Some(
        ordinates
            .chunks_exact(2)
            .map(|pair| LatLon::new(pair[0], pair[1]))
            .collect(),
    )
}

fn parse_single_position(raw: &str) -> Option<LatLon> {
    let points = parse_positions(raw)?;
    if points.len() == 1 {
        Some(points[0])
    } else {
        None
    }
}
