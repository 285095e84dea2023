use std::collections::HashMap;

use crate::attributes::Attribute;
use crate::error::{CatalogueError, Result};

/// Prefix of all HMA ebRIM slot name URNs.
pub const SLOT_URN_PREFIX: &str = "urn:ogc:def:slot:OGC-CSW-ebRIM-EO::";

/// Prefix of all HMA ebRIM extrinsic object type URNs.
pub const OBJECT_TYPE_URN_PREFIX: &str = "urn:ogc:def:objectType:OGC-CSW-ebRIM-EO::";

/// The extrinsic object hosting a catalogue attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotHost {
    Product,
    AcquisitionPlatform,
    ArchivingInformation,
    BrowseInformation,
}

impl SlotHost {
    /// Object type name under [`OBJECT_TYPE_URN_PREFIX`], None for the
    /// product object which request locators address without a predicate.
    pub fn type_name(self) -> Option<&'static str> {
        match self {
            SlotHost::Product => None,
            SlotHost::AcquisitionPlatform => Some("EOAcquisitionPlatform"),
            SlotHost::ArchivingInformation => Some("EOArchivingInformation"),
            SlotHost::BrowseInformation => Some("EOBrowseInformation"),
        }
    }
}

/// How an attribute is materialized inside its extrinsic object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRole {
    /// A `rim:Slot`, addressed through its value list.
    Slot {
        /// Base slot name under [`SLOT_URN_PREFIX`].
        name: &'static str,
        /// Geometry slots use `wrs:ValueList/wrs:AnyValue` instead of
        /// `rim:ValueList/rim:Value`.
        any_value: bool,
    },
    /// The object's `rim:Name`, request side only.
    ObjectName,
}

/// One entry of the attribute/slot mapping table.
#[derive(Debug, Clone, Copy)]
pub struct SlotRow {
    pub attribute: Attribute,
    pub host: SlotHost,
    pub role: SlotRole,
}

impl SlotRow {
    const fn value(attribute: Attribute, host: SlotHost, name: &'static str) -> SlotRow {
        SlotRow {
            attribute,
            host,
            role: SlotRole::Slot {
                name,
                any_value: false,
            },
        }
    }

    const fn any_value(attribute: Attribute, host: SlotHost, name: &'static str) -> SlotRow {
        SlotRow {
            attribute,
            host,
            role: SlotRole::Slot {
                name,
                any_value: true,
            },
        }
    }

    const fn object_name(attribute: Attribute, host: SlotHost) -> SlotRow {
        SlotRow {
            attribute,
            host,
            role: SlotRole::ObjectName,
        }
    }

    /// Full slot name URN, None for attributes carried in a `rim:Name`.
    pub fn slot_urn(&self) -> Option<String> {
        match self.role {
            SlotRole::Slot { name, .. } => Some(format!("{SLOT_URN_PREFIX}{name}")),
            SlotRole::ObjectName => None,
        }
    }

    /// XPath locator used as `ogc:PropertyName` in query predicates.
    pub fn locator(&self) -> String {
        let object_step = match self.host.type_name() {
            Some(type_name) => {
                format!("/rim:ExtrinsicObject[@objectType=\"{OBJECT_TYPE_URN_PREFIX}{type_name}\"]")
            }
            None => "/rim:ExtrinsicObject".to_string(),
        };
        match self.role {
            SlotRole::ObjectName => format!("{object_step}/rim:Name/rim:LocalizedString/@value"),
            SlotRole::Slot { name, any_value } => {
                let (list, item) = if any_value {
                    ("wrs:ValueList", "wrs:AnyValue")
                } else {
                    ("rim:ValueList", "rim:Value")
                };
                format!(
                    "{object_step}/rim:Slot[@name=\"{SLOT_URN_PREFIX}{name}\"]/{list}/{item}[1]"
                )
            }
        }
    }
}

/// The standard HMA ebRIM mapping table.
const STANDARD_ROWS: [SlotRow; 41] = [
    // EOProduct slots
    SlotRow::value(Attribute::ParentIdentifier, SlotHost::Product, "parentIdentifier"),
    SlotRow::value(Attribute::ProductType, SlotHost::Product, "productType"),
    SlotRow::any_value(Attribute::Footprint, SlotHost::Product, "multiExtentOf"),
    SlotRow::value(Attribute::SensingStart, SlotHost::Product, "beginPosition"),
    SlotRow::value(Attribute::SensingStop, SlotHost::Product, "endPosition"),
    SlotRow::value(Attribute::OrbitNumber, SlotHost::Product, "orbitNumber"),
    SlotRow::value(Attribute::LastOrbitNumber, SlotHost::Product, "lastOrbitNumber"),
    SlotRow::value(Attribute::OrbitDirection, SlotHost::Product, "orbitDirection"),
    SlotRow::value(Attribute::AcquisitionStation, SlotHost::Product, "acquisitionStation"),
    SlotRow::value(Attribute::PolarisationChannels, SlotHost::Product, "polarisationChannels"),
    SlotRow::value(Attribute::PolarisationMode, SlotHost::Product, "polarisationMode"),
    SlotRow::value(Attribute::IncidenceAngle, SlotHost::Product, "incidenceAngle"),
    SlotRow::value(
        Attribute::AlongTrackIncidenceAngle,
        SlotHost::Product,
        "alongTrackIncidenceAngle",
    ),
    SlotRow::value(
        Attribute::AcrossTrackIncidenceAngle,
        SlotHost::Product,
        "acrossTrackIncidenceAngle",
    ),
    SlotRow::value(Attribute::IlluminationAzimuth, SlotHost::Product, "illuminationAzimuthAngle"),
    SlotRow::value(
        Attribute::IlluminationElevation,
        SlotHost::Product,
        "illuminationElevationAngle",
    ),
    SlotRow::value(Attribute::MinIncidenceAngle, SlotHost::Product, "minimumIncidenceAngle"),
    SlotRow::value(Attribute::MaxIncidenceAngle, SlotHost::Product, "maximumIncidenceAngle"),
    SlotRow::value(Attribute::ProductStatus, SlotHost::Product, "status"),
    SlotRow::any_value(Attribute::SceneCenter, SlotHost::Product, "centerOf"),
    SlotRow::value(Attribute::AcquisitionDate, SlotHost::Product, "acquisitionDate"),
    SlotRow::value(Attribute::AcquisitionType, SlotHost::Product, "acquisitionType"),
    SlotRow::value(Attribute::AcquisitionSubtype, SlotHost::Product, "acquisitionSubType"),
    SlotRow::value(
        Attribute::AscendingNodeLongitude,
        SlotHost::Product,
        "ascendingNodeLongitude",
    ),
    SlotRow::value(Attribute::WrsLongitude, SlotHost::Product, "wrsLongitudeGrid"),
    SlotRow::value(Attribute::WrsLatitude, SlotHost::Product, "wrsLatitudeGrid"),
    SlotRow::value(Attribute::LookDirection, SlotHost::Product, "antennaLookDirection"),
    SlotRow::value(
        Attribute::ImageQualityDegradation,
        SlotHost::Product,
        "imageQualityDegradation",
    ),
    SlotRow::value(Attribute::CloudCover, SlotHost::Product, "cloudCoverPercentage"),
    SlotRow::value(Attribute::SnowCover, SlotHost::Product, "snowCoverPercentage"),
    // EOAcquisitionPlatform slots
    SlotRow::value(
        Attribute::InstrumentName,
        SlotHost::AcquisitionPlatform,
        "instrumentShortName",
    ),
    SlotRow::value(Attribute::SensorMode, SlotHost::AcquisitionPlatform, "sensorOperationalMode"),
    SlotRow::value(
        Attribute::PlatformSerial,
        SlotHost::AcquisitionPlatform,
        "platformSerialIdentifier",
    ),
    SlotRow::value(Attribute::SensorType, SlotHost::AcquisitionPlatform, "sensorType"),
    SlotRow::value(Attribute::SensorResolution, SlotHost::AcquisitionPlatform, "sensorResolution"),
    SlotRow::value(Attribute::SensorSwath, SlotHost::AcquisitionPlatform, "swathIdentifier"),
    // EOArchivingInformation slots
    SlotRow::value(
        Attribute::ArchivingIdentifier,
        SlotHost::ArchivingInformation,
        "archivingIdentifier",
    ),
    SlotRow::value(Attribute::ArchivingDate, SlotHost::ArchivingInformation, "archivingDate"),
    // EOBrowseInformation slots
    SlotRow::value(Attribute::BrowseFileName, SlotHost::BrowseInformation, "fileName"),
    // carried in the object rim:Name rather than a slot, queryable only
    SlotRow::object_name(Attribute::PlatformName, SlotHost::AcquisitionPlatform),
    SlotRow::object_name(Attribute::ArchivingCenter, SlotHost::ArchivingInformation),
];

/// Bidirectional mapping between catalogue attributes, response slot
/// URNs and request XPath locators.
#[derive(Debug, Clone)]
pub struct SlotDictionary {
    slot_to_attribute: HashMap<String, Attribute>,
    attribute_to_slot: HashMap<Attribute, String>,
    locator_to_attribute: HashMap<String, Attribute>,
    attribute_to_locator: HashMap<Attribute, String>,
}

impl SlotDictionary {
    /// The standard HMA ebRIM dictionary.
    pub fn standard() -> SlotDictionary {
        let mut dictionary = SlotDictionary::empty();
        for row in &STANDARD_ROWS {
            dictionary.insert(row);
        }
        dictionary
    }

    /// Builds a dictionary from a custom row table, rejecting rows that
    /// repeat an attribute, a slot URN or a locator.
    pub fn from_rows(rows: &[SlotRow]) -> Result<SlotDictionary> {
        let mut dictionary = SlotDictionary::empty();
        for row in rows {
            if dictionary.attribute_to_locator.contains_key(&row.attribute) {
                return Err(CatalogueError::DuplicateEntry(
                    row.attribute.wire_name().to_string(),
                ));
            }
            if let Some(urn) = row.slot_urn() {
                if dictionary.slot_to_attribute.contains_key(&urn) {
                    return Err(CatalogueError::DuplicateEntry(urn));
                }
            }
            let locator = row.locator();
            if dictionary.locator_to_attribute.contains_key(&locator) {
                return Err(CatalogueError::DuplicateEntry(locator));
            }
            dictionary.insert(row);
        }
        Ok(dictionary)
    }

    fn empty() -> SlotDictionary {
        SlotDictionary {
            slot_to_attribute: HashMap::new(),
            attribute_to_slot: HashMap::new(),
            locator_to_attribute: HashMap::new(),
            attribute_to_locator: HashMap::new(),
        }
    }

    fn insert(&mut self, row: &SlotRow) {
        if let Some(urn) = row.slot_urn() {
            self.slot_to_attribute.insert(urn.clone(), row.attribute);
            self.attribute_to_slot.insert(row.attribute, urn);
        }
        let locator = row.locator();
        self.locator_to_attribute.insert(locator.clone(), row.attribute);
        self.attribute_to_locator.insert(row.attribute, locator);
    }

    /// Attribute carried by a response slot URN.
    pub fn attribute_for_slot(&self, slot_urn: &str) -> Option<Attribute> {
        self.slot_to_attribute.get(slot_urn).copied()
    }

    /// Response slot URN carrying an attribute, None for attributes that
    /// never appear in a slot.
    pub fn response_slot_for(&self, attribute: Attribute) -> Option<&str> {
        self.attribute_to_slot.get(&attribute).map(String::as_str)
    }

    /// Attribute addressed by a request locator.
    pub fn attribute_for_locator(&self, locator: &str) -> Option<Attribute> {
        self.locator_to_attribute.get(locator).copied()
    }

    /// Request XPath locator for an attribute.
    ///
    /// Panics when the attribute is not queryable, building a predicate
    /// on such an attribute is a programming error.
    pub fn request_locator_for(&self, attribute: Attribute) -> &str {
        match self.attribute_to_locator.get(&attribute) {
            Some(locator) => locator,
            None => panic!("attribute {attribute} has no request locator"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_dictionary_entry_counts() {
        let dictionary = SlotDictionary::standard();
        assert_eq!(dictionary.slot_to_attribute.len(), 39);
        assert_eq!(dictionary.attribute_to_slot.len(), 39);
        assert_eq!(dictionary.locator_to_attribute.len(), 41);
        assert_eq!(dictionary.attribute_to_locator.len(), 41);
    }

    #[test]
    fn test_standard_slot_mappings_are_inverse() {
        let dictionary = SlotDictionary::standard();
        for row in &STANDARD_ROWS {
            if let Some(urn) = row.slot_urn() {
                assert_eq!(dictionary.attribute_for_slot(&urn), Some(row.attribute));
                assert_eq!(dictionary.response_slot_for(row.attribute), Some(urn.as_str()));
            }
            let locator = row.locator();
            assert_eq!(dictionary.attribute_for_locator(&locator), Some(row.attribute));
            assert_eq!(dictionary.request_locator_for(row.attribute), locator);
        }
    }

    #[test]
    fn test_product_slot_locator_shape() {
        let dictionary = SlotDictionary::standard();
        assert_eq!(
            dictionary.request_locator_for(Attribute::ParentIdentifier),
            "/rim:ExtrinsicObject/rim:Slot[@name=\"urn:ogc:def:slot:OGC-CSW-ebRIM-EO::parentIdentifier\"]\
             /rim:ValueList/rim:Value[1]"
        );
    }

    #[test]
    fn test_geometry_slot_locator_uses_any_value() {
        let dictionary = SlotDictionary::standard();
        assert_eq!(
            dictionary.request_locator_for(Attribute::Footprint),
            "/rim:ExtrinsicObject/rim:Slot[@name=\"urn:ogc:def:slot:OGC-CSW-ebRIM-EO::multiExtentOf\"]\
             /wrs:ValueList/wrs:AnyValue[1]"
        );
    }

    #[test]
    fn test_name_hosted_attribute_locator_shape() {
        let dictionary = SlotDictionary::standard();
        assert_eq!(
            dictionary.request_locator_for(Attribute::PlatformName),
            "/rim:ExtrinsicObject[@objectType=\"urn:ogc:def:objectType:OGC-CSW-ebRIM-EO::EOAcquisitionPlatform\"]\
             /rim:Name/rim:LocalizedString/@value"
        );
        assert_eq!(dictionary.response_slot_for(Attribute::PlatformName), None);
    }

    #[test]
    fn test_from_rows_rejects_duplicate_slots() {
        let rows = [
            SlotRow::value(Attribute::ProductType, SlotHost::Product, "productType"),
            SlotRow::value(Attribute::ProductStatus, SlotHost::Product, "productType"),
        ];
        let err = SlotDictionary::from_rows(&rows).unwrap_err();
        assert!(matches!(err, CatalogueError::DuplicateEntry(_)));
    }

    #[test]
    fn test_from_rows_rejects_repeated_attributes() {
        let rows = [
            SlotRow::value(Attribute::ProductType, SlotHost::Product, "productType"),
            SlotRow::value(Attribute::ProductType, SlotHost::Product, "typeOfProduct"),
        ];
        let err = SlotDictionary::from_rows(&rows).unwrap_err();
        assert!(matches!(err, CatalogueError::DuplicateEntry(_)));
    }

    #[test]
    #[should_panic(expected = "has no request locator")]
    fn test_missing_request_locator_panics() {
        let dictionary = SlotDictionary::from_rows(&[]).unwrap();
        dictionary.request_locator_for(Attribute::ParentIdentifier);
    }
}
