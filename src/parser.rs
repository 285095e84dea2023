use quick_xml::events::{BytesCData, BytesStart, BytesText, Event};
use quick_xml::Reader;
use tracing::warn;

use crate::attributes::{Attribute, SlotPayload};
use crate::model::MetadataRecord;
use crate::slots::SlotDictionary;

/// Auxiliary extrinsic objects recognized inside a registry package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectKind {
    AcquisitionPlatform,
    ArchivingInformation,
    BrowseInformation,
}

impl ObjectKind {
    /// Substring match tolerates both HMA 1.0 URNs and the older
    /// `urn:x-ogc:specification:csw-ebrim` style.
    fn classify(object_type: &str) -> Option<ObjectKind> {
        if object_type.contains("EOArchivingInformation") {
            Some(ObjectKind::ArchivingInformation)
        } else if object_type.contains("EOAcquisitionPlatform") {
            Some(ObjectKind::AcquisitionPlatform)
        } else if object_type.contains("EOBrowseInformation") {
            Some(ObjectKind::BrowseInformation)
        } else {
            None
        }
    }
}

/// Accumulates one [`MetadataRecord`] while scanning the events of a
/// registry package. Element names are matched by local name so any
/// namespace prefix is tolerated.
struct PackageScan<'d> {
    slots: &'d SlotDictionary,
    record: MetadataRecord,
    /// Attribute and payload of the slot being scanned, if recognized.
    slot: Option<(Attribute, SlotPayload)>,
    /// Set once the current slot stored its first value.
    slot_captured: bool,
    /// Attribute the next text event is stored under.
    sink: Option<Attribute>,
    /// The next value text inside a browse object is its browse URL.
    awaiting_browse_url: bool,
    object: Option<ObjectKind>,
    in_name: bool,
    /// Set once the current name consumed a localized string.
    name_consumed: bool,
    browse_url: Option<String>,
    browse_tag: Option<String>,
}

impl<'d> PackageScan<'d> {
    fn new(slots: &'d SlotDictionary) -> PackageScan<'d> {
        PackageScan {
            slots,
            record: MetadataRecord::new(),
            slot: None,
            slot_captured: false,
            sink: None,
            awaiting_browse_url: false,
            object: None,
            in_name: false,
            name_consumed: false,
            browse_url: None,
            browse_tag: None,
        }
    }

    fn handle_start(&mut self, e: &BytesStart<'_>) {
        match e.local_name().as_ref() {
            b"Slot" => self.begin_slot(e),
            b"Value" | b"AnyValue" => self.begin_value(),
            b"posList" => self.begin_geometry(SlotPayload::PositionList),
            b"pos" => self.begin_geometry(SlotPayload::Position),
            b"ExtrinsicObject" => self.begin_object(e),
            b"Name" => {
                self.in_name = true;
                self.name_consumed = false;
            }
            b"LocalizedString" => self.read_localized_string(e),
            _ => {}
        }
    }

    fn handle_empty(&mut self, e: &BytesStart<'_>) {
        // the one element routinely written in self closing form
        if e.local_name().as_ref() == b"LocalizedString" {
            self.read_localized_string(e);
        }
    }

    fn handle_text(&mut self, t: &BytesText<'_>) {
        if let Ok(text) = t.unescape() {
            self.consume_text(text.trim().to_string());
        }
    }

    fn handle_cdata(&mut self, t: &BytesCData<'_>) {
        let text = String::from_utf8_lossy(t).trim().to_string();
        self.consume_text(text);
    }

    fn handle_element_end(&mut self, local_name: &[u8]) {
        match local_name {
            b"Slot" => {
                self.slot = None;
                self.slot_captured = false;
                self.sink = None;
            }
            b"Value" | b"AnyValue" | b"posList" | b"pos" => {
                self.sink = None;
                self.awaiting_browse_url = false;
            }
            b"ExtrinsicObject" => self.finish_object(),
            b"Name" => {
                self.in_name = false;
                self.name_consumed = false;
            }
            _ => {}
        }
    }

    fn begin_slot(&mut self, e: &BytesStart<'_>) {
        self.slot = None;
        self.slot_captured = false;
        self.sink = None;
        match attr_value(e, "name") {
            Some(slot_urn) => match self.slots.attribute_for_slot(&slot_urn) {
                Some(attribute) => self.slot = Some((attribute, attribute.slot_payload())),
                None => warn!("Unknown HMA slot: {}", slot_urn),
            },
            None => warn!("Slot without a name attribute"),
        }
    }

    fn begin_value(&mut self) {
        if let Some((attribute, SlotPayload::Text)) = self.slot {
            if !self.slot_captured {
                self.sink = Some(attribute);
            }
        }
        if self.object == Some(ObjectKind::BrowseInformation) && self.browse_url.is_none() {
            self.awaiting_browse_url = true;
        }
    }

    fn begin_geometry(&mut self, seen: SlotPayload) {
        if let Some((attribute, payload)) = self.slot {
            if payload == seen && !self.slot_captured {
                self.sink = Some(attribute);
            }
        }
    }

    fn begin_object(&mut self, e: &BytesStart<'_>) {
        self.finish_object();
        self.object = attr_value(e, "objectType")
            .as_deref()
            .and_then(ObjectKind::classify);
    }

    fn read_localized_string(&mut self, e: &BytesStart<'_>) {
        if !self.in_name || self.name_consumed {
            return;
        }
        let Some(value) = attr_value(e, "value") else {
            return;
        };
        self.name_consumed = true;
        match self.object {
            Some(ObjectKind::ArchivingInformation) => {
                self.record.put(Attribute::ArchivingCenter, value);
            }
            Some(ObjectKind::AcquisitionPlatform) => {
                self.record.put(Attribute::PlatformName, value);
            }
            Some(ObjectKind::BrowseInformation) => self.browse_tag = Some(value),
            None => {}
        }
    }

    fn consume_text(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        if self.awaiting_browse_url {
            self.browse_url = Some(text.clone());
            self.awaiting_browse_url = false;
        }
        if let Some(attribute) = self.sink.take() {
            self.slot_captured = true;
            self.record.put(attribute, text);
        }
    }

    /// Commits the browse URL gathered from a browse object. The name
    /// tag decides which attribute receives it, other tags are dropped.
    fn finish_object(&mut self) {
        if self.object == Some(ObjectKind::BrowseInformation) {
            if let (Some(url), Some(tag)) = (self.browse_url.take(), self.browse_tag.take()) {
                match tag.as_str() {
                    "THUMBNAIL" => {
                        self.record.put(Attribute::ThumbnailUrl, url);
                    }
                    "QUICKLOOK" => {
                        self.record.put(Attribute::QuicklookUrl, url);
                    }
                    _ => {}
                }
            }
        }
        self.object = None;
        self.awaiting_browse_url = false;
        self.browse_url = None;
        self.browse_tag = None;
    }

    fn finish(mut self) -> MetadataRecord {
        self.finish_object();
        self.record
    }
}

/// Maps registry packages of GetRecords responses to metadata records.
///
/// The parser absorbs whatever it does not understand: unknown slots,
/// missing values and malformed optional content are skipped, only a
/// document whose root is not a registry package is rejected.
pub struct ResponseParser<'d> {
    slots: &'d SlotDictionary,
}

impl<'d> ResponseParser<'d> {
    pub fn new(slots: &'d SlotDictionary) -> ResponseParser<'d> {
        ResponseParser { slots }
    }

    /// Parses a single registry package document. Returns None when the
    /// root element is not a `RegistryPackage`.
    pub fn parse_registry_package(&self, xml: &str) -> Option<MetadataRecord> {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    if e.local_name().as_ref() != b"RegistryPackage" {
                        return None;
                    }
                    return Some(self.read_package(&e, &mut reader));
                }
                Ok(Event::Empty(e)) => {
                    if e.local_name().as_ref() != b"RegistryPackage" {
                        return None;
                    }
                    return Some(package_stub(&e));
                }
                Ok(Event::Eof) => return None,
                Err(_) => return None,
                _ => {}
            }
        }
    }

    /// Collects the metadata records of every registry package found in
    /// a GetRecords response.
    pub fn parse_response(&self, xml: &str) -> Vec<MetadataRecord> {
        let mut records = Vec::new();
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) if e.local_name().as_ref() == b"RegistryPackage" => {
                    records.push(self.read_package(&e, &mut reader));
                }
                Ok(Event::Empty(e)) if e.local_name().as_ref() == b"RegistryPackage" => {
                    records.push(package_stub(&e));
                }
                Ok(Event::Eof) => break,
                Err(_) => break,
                _ => {}
            }
        }
        records
    }

    /// Scans events up to the end of the current package. A truncated
    /// or malformed tail yields the record accumulated so far.
    fn read_package(&self, start: &BytesStart<'_>, reader: &mut Reader<&[u8]>) -> MetadataRecord {
        let mut scan = PackageScan::new(self.slots);
        if let Some(id) = attr_value(start, "id") {
            scan.record.put(Attribute::ProductIdentifier, id);
        }
        let mut depth = 1usize;
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    depth += 1;
                    scan.handle_start(&e);
                }
                Ok(Event::Empty(e)) => scan.handle_empty(&e),
                Ok(Event::Text(t)) => scan.handle_text(&t),
                Ok(Event::CData(t)) => scan.handle_cdata(&t),
                Ok(Event::End(e)) => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    scan.handle_element_end(e.local_name().as_ref());
                }
                Ok(Event::Eof) => break,
                Err(_) => break,
                _ => {}
            }
        }
        scan.finish()
    }
}

/// A package in self closing form carries its identifier only.
fn package_stub(e: &BytesStart<'_>) -> MetadataRecord {
    let mut record = MetadataRecord::new();
    if let Some(id) = attr_value(e, "id") {
        record.put(Attribute::ProductIdentifier, id);
    }
    record
}

/// Reads the `numberOfRecordsMatched` count from the `SearchResults`
/// element of a GetRecords response.
pub fn matched_records(xml: &str) -> Option<u64> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"SearchResults" =>
            {
                return attr_value(&e, "numberOfRecordsMatched")?.parse().ok();
            }
            Ok(Event::Eof) => return None,
            Err(_) => return None,
            _ => {}
        }
    }
}

pub(crate) fn attr_value(e: &BytesStart<'_>, name: &str) -> Option<String> {
    let attr = e.try_get_attribute(name).ok()??;
    attr.unescape_value().ok().map(|value| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LatLon;

    fn parse_one(xml: &str) -> Option<MetadataRecord> {
        let slots = SlotDictionary::standard();
        ResponseParser::new(&slots).parse_registry_package(xml)
    }

    const SLOT_PREFIX: &str = "urn:ogc:def:slot:OGC-CSW-ebRIM-EO::";

    #[test]
    fn test_parses_identifier_and_product_slots() {
        let xml = format!(
            r#"<rim:RegistryPackage xmlns:rim="urn:oasis:names:tc:ebxml-regrep:xsd:rim:3.0" id="urn:SAR:P1">
                 <rim:Slot name="{SLOT_PREFIX}parentIdentifier">
                   <rim:ValueList><rim:Value>COLLECTION_A</rim:Value></rim:ValueList>
                 </rim:Slot>
                 <rim:Slot name="{SLOT_PREFIX}beginPosition">
                   <rim:ValueList><rim:Value>2020-01-01T00:00:00.000Z</rim:Value></rim:ValueList>
                 </rim:Slot>
               </rim:RegistryPackage>"#
        );
        let record = parse_one(&xml).unwrap();
        assert_eq!(record.get(Attribute::ProductIdentifier), Some("urn:SAR:P1"));
        assert_eq!(record.get(Attribute::ParentIdentifier), Some("COLLECTION_A"));
        assert_eq!(
            record.get(Attribute::SensingStart),
            Some("2020-01-01T00:00:00.000Z")
        );
    }

    #[test]
    fn test_only_the_first_slot_value_is_stored() {
        let xml = format!(
            r#"<rim:RegistryPackage xmlns:rim="urn:oasis:names:tc:ebxml-regrep:xsd:rim:3.0" id="P1">
                 <rim:Slot name="{SLOT_PREFIX}polarisationChannels">
                   <rim:ValueList>
                     <rim:Value>HH</rim:Value>
                     <rim:Value>VV</rim:Value>
                   </rim:ValueList>
                 </rim:Slot>
               </rim:RegistryPackage>"#
        );
        let record = parse_one(&xml).unwrap();
        assert_eq!(record.get(Attribute::PolarisationChannels), Some("HH"));
    }

    #[test]
    fn test_geometry_slots_capture_raw_ordinates() {
        let xml = format!(
            r#"<rim:RegistryPackage xmlns:rim="urn:oasis:names:tc:ebxml-regrep:xsd:rim:3.0"
                                    xmlns:gml="http://www.opengis.net/gml"
                                    xmlns:wrs="http://www.opengis.net/cat/wrs/1.0" id="P1">
                 <rim:Slot name="{SLOT_PREFIX}multiExtentOf">
                   <wrs:ValueList><wrs:AnyValue>
                     <gml:Polygon><gml:exterior><gml:LinearRing>
                       <gml:posList>10.0 20.0 11.0 20.0 11.0 21.0 10.0 20.0</gml:posList>
                     </gml:LinearRing></gml:exterior></gml:Polygon>
                   </wrs:AnyValue></wrs:ValueList>
                 </rim:Slot>
                 <rim:Slot name="{SLOT_PREFIX}centerOf">
                   <wrs:ValueList><wrs:AnyValue>
                     <gml:Point><gml:pos>10.5 20.5</gml:pos></gml:Point>
                   </wrs:AnyValue></wrs:ValueList>
                 </rim:Slot>
               </rim:RegistryPackage>"#
        );
        let mut record = parse_one(&xml).unwrap();
        assert_eq!(
            record.get(Attribute::Footprint),
            Some("10.0 20.0 11.0 20.0 11.0 21.0 10.0 20.0")
        );
        assert_eq!(record.footprint_points().map(<[LatLon]>::len), Some(4));
        assert_eq!(record.scene_center(), Some(LatLon::new(10.5, 20.5)));
    }

    #[test]
    fn test_unknown_slots_are_skipped_not_fatal() {
        let xml = format!(
            r#"<rim:RegistryPackage xmlns:rim="urn:oasis:names:tc:ebxml-regrep:xsd:rim:3.0" id="P1">
                 <rim:Slot name="{SLOT_PREFIX}notAnEoSlot">
                   <rim:ValueList><rim:Value>ignored</rim:Value></rim:ValueList>
                 </rim:Slot>
                 <rim:Slot name="{SLOT_PREFIX}status">
                   <rim:ValueList><rim:Value>ARCHIVED</rim:Value></rim:ValueList>
                 </rim:Slot>
               </rim:RegistryPackage>"#
        );
        let record = parse_one(&xml).unwrap();
        assert_eq!(record.get(Attribute::ProductStatus), Some("ARCHIVED"));
        // identifier and status only
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_platform_and_archiving_objects_contribute_names_and_slots() {
        let xml = format!(
            r#"<rim:RegistryPackage xmlns:rim="urn:oasis:names:tc:ebxml-regrep:xsd:rim:3.0" id="P1">
                 <rim:ExtrinsicObject objectType="urn:ogc:def:objectType:OGC-CSW-ebRIM-EO::EOAcquisitionPlatform" id="pf">
                   <rim:Name><rim:LocalizedString value="SENTINEL-1"/></rim:Name>
                   <rim:Slot name="{SLOT_PREFIX}instrumentShortName">
                     <rim:ValueList><rim:Value>C-SAR</rim:Value></rim:ValueList>
                   </rim:Slot>
                 </rim:ExtrinsicObject>
                 <rim:ExtrinsicObject objectType="urn:ogc:def:objectType:OGC-CSW-ebRIM-EO::EOArchivingInformation" id="ar">
                   <rim:Name><rim:LocalizedString value="ESRIN"/></rim:Name>
                   <rim:Slot name="{SLOT_PREFIX}archivingDate">
                     <rim:ValueList><rim:Value>2020-02-02T00:00:00.000Z</rim:Value></rim:ValueList>
                   </rim:Slot>
                 </rim:ExtrinsicObject>
               </rim:RegistryPackage>"#
        );
        let record = parse_one(&xml).unwrap();
        assert_eq!(record.get(Attribute::PlatformName), Some("SENTINEL-1"));
        assert_eq!(record.get(Attribute::InstrumentName), Some("C-SAR"));
        assert_eq!(record.get(Attribute::ArchivingCenter), Some("ESRIN"));
        assert_eq!(
            record.get(Attribute::ArchivingDate),
            Some("2020-02-02T00:00:00.000Z")
        );
    }

    #[test]
    fn test_browse_objects_map_urls_by_name_tag() {
        let xml = format!(
            r#"<rim:RegistryPackage xmlns:rim="urn:oasis:names:tc:ebxml-regrep:xsd:rim:3.0" id="P1">
                 <rim:ExtrinsicObject objectType="urn:ogc:def:objectType:OGC-CSW-ebRIM-EO::EOBrowseInformation" id="b1">
                   <rim:Name><rim:LocalizedString value="THUMBNAIL"/></rim:Name>
                   <rim:Slot name="{SLOT_PREFIX}fileName">
                     <rim:ValueList><rim:Value>http://cat/thumb.png</rim:Value></rim:ValueList>
                   </rim:Slot>
                 </rim:ExtrinsicObject>
                 <rim:ExtrinsicObject objectType="urn:ogc:def:objectType:OGC-CSW-ebRIM-EO::EOBrowseInformation" id="b2">
                   <rim:Name><rim:LocalizedString value="QUICKLOOK"/></rim:Name>
                   <rim:Slot name="{SLOT_PREFIX}fileName">
                     <rim:ValueList><rim:Value>http://cat/look.png</rim:Value></rim:ValueList>
                   </rim:Slot>
                 </rim:ExtrinsicObject>
               </rim:RegistryPackage>"#
        );
        let record = parse_one(&xml).unwrap();
        assert_eq!(
            record.get(Attribute::ThumbnailUrl),
            Some("http://cat/thumb.png")
        );
        assert_eq!(
            record.get(Attribute::QuicklookUrl),
            Some("http://cat/look.png")
        );
        // the file name slot itself is also a mapped attribute
        assert_eq!(
            record.get(Attribute::BrowseFileName),
            Some("http://cat/look.png")
        );
    }

    #[test]
    fn test_unmapped_browse_tags_are_dropped() {
        let xml = format!(
            r#"<rim:RegistryPackage xmlns:rim="urn:oasis:names:tc:ebxml-regrep:xsd:rim:3.0" id="P1">
                 <rim:ExtrinsicObject objectType="urn:ogc:def:objectType:OGC-CSW-ebRIM-EO::EOBrowseInformation" id="b1">
                   <rim:Name><rim:LocalizedString value="ALBUM"/></rim:Name>
                   <rim:Slot name="{SLOT_PREFIX}fileName">
                     <rim:ValueList><rim:Value>http://cat/album.png</rim:Value></rim:ValueList>
                   </rim:Slot>
                 </rim:ExtrinsicObject>
               </rim:RegistryPackage>"#
        );
        let record = parse_one(&xml).unwrap();
        assert_eq!(record.get(Attribute::ThumbnailUrl), None);
        assert_eq!(record.get(Attribute::QuicklookUrl), None);
    }

    #[test]
    fn test_rejects_documents_that_are_not_packages() {
        assert_eq!(parse_one("<csw:GetRecordsResponse xmlns:csw=\"x\"/>"), None);
        assert_eq!(parse_one("plain text"), None);
    }

    #[test]
    fn test_namespace_prefixes_are_irrelevant() {
        let xml = format!(
            r#"<ns2:RegistryPackage xmlns:ns2="urn:oasis:names:tc:ebxml-regrep:xsd:rim:3.0" id="P1">
                 <ns2:Slot name="{SLOT_PREFIX}productType">
                   <ns2:ValueList><ns2:Value>SAR_IMG</ns2:Value></ns2:ValueList>
                 </ns2:Slot>
               </ns2:RegistryPackage>"#
        );
        let record = parse_one(&xml).unwrap();
        assert_eq!(record.get(Attribute::ProductType), Some("SAR_IMG"));
    }

    #[test]
    fn test_parse_response_collects_every_package() {
        let slots = SlotDictionary::standard();
        let parser = ResponseParser::new(&slots);
        let xml = format!(
            r#"<csw:GetRecordsResponse xmlns:csw="http://www.opengis.net/cat/csw/2.0.2"
                                       xmlns:rim="urn:oasis:names:tc:ebxml-regrep:xsd:rim:3.0">
                 <csw:SearchResults numberOfRecordsMatched="2" numberOfRecordsReturned="2">
                   <rim:RegistryPackage id="P1">
                     <rim:Slot name="{SLOT_PREFIX}parentIdentifier">
                       <rim:ValueList><rim:Value>COLL_A</rim:Value></rim:ValueList>
                     </rim:Slot>
                   </rim:RegistryPackage>
                   <rim:RegistryPackage id="P2"/>
                 </csw:SearchResults>
               </csw:GetRecordsResponse>"#
        );
        let records = parser.parse_response(&xml);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get(Attribute::ProductIdentifier), Some("P1"));
        assert_eq!(records[0].get(Attribute::ParentIdentifier), Some("COLL_A"));
        assert_eq!(records[1].get(Attribute::ProductIdentifier), Some("P2"));
        assert_eq!(matched_records(&xml), Some(2));
    }

    #[test]
    fn test_matched_records_reads_hits_responses() {
        let xml = r#"<csw:GetRecordsResponse xmlns:csw="http://www.opengis.net/cat/csw/2.0.2">
                       <csw:SearchResults numberOfRecordsMatched="1234"/>
                     </csw:GetRecordsResponse>"#;
        assert_eq!(matched_records(xml), Some(1234));
        assert_eq!(matched_records("<other/>"), None);
    }
}
