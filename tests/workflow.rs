// End to end workflow: compose a GetRecords query, then parse catalogue
// responses back from disk the way a client session does.

use chrono::{TimeZone, Utc};
use std::fs;

use hma_catalogue::{
    matched_records, Attribute, Detail, GetRecordsBuilder, LatLon, ResponseParser, ResultKind,
    SlotDictionary, SpatialOp,
};

#[test]
fn test_query_composition_workflow() {
    let slots = SlotDictionary::standard();
    let mut builder = GetRecordsBuilder::new(&slots).expect("built in template must load");

    builder.set_result_kind(ResultKind::Results);
    builder.set_detail(Detail::Summary);
    builder.set_max_records(50);
    builder.add_collections(&["COLLECTION_A", "COLLECTION_B"]);
    builder.add_temporal_overlaps(
        Utc.with_ymd_and_hms(2020, 5, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2020, 5, 31, 23, 59, 59).unwrap(),
    );
    builder.add_spatial_range(SpatialOp::Overlaps, -10.5, 30.0, 100.25, 140.0);

    let request = builder.request_xml().expect("serialization must succeed");

    // Envelope carries the paging and element set choices
    assert!(request.contains(r#"resultType="results""#));
    assert!(request.contains(r#"startPosition="1" maxRecords="50""#));
    assert!(request.contains(">summary</csw:ElementSetName>"));

    // Both collections sit under one disjunction
    assert!(request.contains("<ogc:Or>"));
    assert!(request.contains("<ogc:Literal>COLLECTION_A</ogc:Literal>"));
    assert!(request.contains("<ogc:Literal>COLLECTION_B</ogc:Literal>"));

    // The overlap window crosses the comparands: the product stop bounds
    // the window start and the product start bounds the window stop
    assert!(request.contains(
        "endPosition\"]/rim:ValueList/rim:Value[1]</ogc:PropertyName>\n            \
         <ogc:Literal>2020-05-01T00:00:00.000Z</ogc:Literal>"
    ));
    assert!(request.contains(
        "beginPosition\"]/rim:ValueList/rim:Value[1]</ogc:PropertyName>\n            \
         <ogc:Literal>2020-05-31T23:59:59.000Z</ogc:Literal>"
    ));

    // The bounding box becomes a gml envelope in lat lon axis order
    assert!(request.contains(r#"<gml:Envelope srsName="urn:ogc:def:crs:EPSG:6.3:4326">"#));
    assert!(request.contains("<gml:lowerCorner>-10.5 100.25</gml:lowerCorner>"));
    assert!(request.contains("<gml:upperCorner>30 140</gml:upperCorner>"));

    // Serialization is deterministic for a fixed builder state
    let again = builder.request_xml().expect("serialization must succeed");
    assert_eq!(request, again, "same state must yield the same document");
}

#[test]
fn test_generated_document_reloads_as_template() {
    let slots = SlotDictionary::standard();
    let mut builder = GetRecordsBuilder::new(&slots).expect("built in template must load");
    builder.set_detail(Detail::Brief);
    builder.set_max_records(25);

    let first = builder.request_xml().expect("serialization must succeed");

    // An unconstrained document is itself a valid template
    let reloaded = GetRecordsBuilder::from_template(&slots, &first)
        .expect("generated document must load as a template");
    let second = reloaded.request_xml().expect("serialization must succeed");

    assert_eq!(first, second, "envelope must survive a load round trip");
}

#[test]
fn test_response_files_to_sorted_records() {
    // Two packages, deliberately out of collection order
    let results_response = r#"<?xml version="1.0" encoding="UTF-8"?>
<csw:GetRecordsResponse xmlns:csw="http://www.opengis.net/cat/csw/2.0.2"
                        xmlns:rim="urn:oasis:names:tc:ebxml-regrep:xsd:rim:3.0"
                        xmlns:wrs="http://www.opengis.net/cat/wrs/1.0"
                        xmlns:gml="http://www.opengis.net/gml">
  <csw:SearchStatus timestamp="2020-03-01T12:00:00.000Z"/>
  <csw:SearchResults numberOfRecordsMatched="2" numberOfRecordsReturned="2">
    <rim:RegistryPackage id="urn:EOP:SAR:B2">
      <rim:RegistryObjectList>
        <rim:ExtrinsicObject id="b2-prod" objectType="urn:ogc:def:objectType:OGC-CSW-ebRIM-EO::EOProduct">
          <rim:Slot name="urn:ogc:def:slot:OGC-CSW-ebRIM-EO::parentIdentifier">
            <rim:ValueList><rim:Value>COLLECTION_B</rim:Value></rim:ValueList>
          </rim:Slot>
          <rim:Slot name="urn:ogc:def:slot:OGC-CSW-ebRIM-EO::productType">
            <rim:ValueList><rim:Value>SAR_IMG</rim:Value></rim:ValueList>
          </rim:Slot>
          <rim:Slot name="urn:ogc:def:slot:OGC-CSW-ebRIM-EO::multiExtentOf">
            <wrs:ValueList><wrs:AnyValue>
              <gml:Polygon><gml:exterior><gml:LinearRing>
                <gml:posList>10 20 11 20 11 21 10 20</gml:posList>
              </gml:LinearRing></gml:exterior></gml:Polygon>
            </wrs:AnyValue></wrs:ValueList>
          </rim:Slot>
        </rim:ExtrinsicObject>
        <rim:ExtrinsicObject id="b2-platform" objectType="urn:ogc:def:objectType:OGC-CSW-ebRIM-EO::EOAcquisitionPlatform">
          <rim:Name><rim:LocalizedString value="SENTINEL-1"/></rim:Name>
          <rim:Slot name="urn:ogc:def:slot:OGC-CSW-ebRIM-EO::instrumentShortName">
            <rim:ValueList><rim:Value>C-SAR</rim:Value></rim:ValueList>
          </rim:Slot>
        </rim:ExtrinsicObject>
      </rim:RegistryObjectList>
    </rim:RegistryPackage>
    <rim:RegistryPackage id="urn:EOP:OPT:A1">
      <rim:RegistryObjectList>
        <rim:ExtrinsicObject id="a1-prod" objectType="urn:ogc:def:objectType:OGC-CSW-ebRIM-EO::EOProduct">
          <rim:Slot name="urn:ogc:def:slot:OGC-CSW-ebRIM-EO::parentIdentifier">
            <rim:ValueList><rim:Value>COLLECTION_A</rim:Value></rim:ValueList>
          </rim:Slot>
          <rim:Slot name="urn:ogc:def:slot:OGC-CSW-ebRIM-EO::beginPosition">
            <rim:ValueList><rim:Value>2020-01-01T00:00:00.000Z</rim:Value></rim:ValueList>
          </rim:Slot>
          <rim:Slot name="urn:ogc:def:slot:OGC-CSW-ebRIM-EO::centerOf">
            <wrs:ValueList><wrs:AnyValue>
              <gml:Point><gml:pos>45.5 9.25</gml:pos></gml:Point>
            </wrs:AnyValue></wrs:ValueList>
          </rim:Slot>
        </rim:ExtrinsicObject>
        <rim:ExtrinsicObject id="a1-browse" objectType="urn:ogc:def:objectType:OGC-CSW-ebRIM-EO::EOBrowseInformation">
          <rim:Name><rim:LocalizedString value="THUMBNAIL"/></rim:Name>
          <rim:Slot name="urn:ogc:def:slot:OGC-CSW-ebRIM-EO::fileName">
            <rim:ValueList><rim:Value>http://cat/a1-thumb.png</rim:Value></rim:ValueList>
          </rim:Slot>
        </rim:ExtrinsicObject>
      </rim:RegistryObjectList>
    </rim:RegistryPackage>
  </csw:SearchResults>
</csw:GetRecordsResponse>
"#;

    let hits_response = r#"<?xml version="1.0" encoding="UTF-8"?>
<csw:GetRecordsResponse xmlns:csw="http://www.opengis.net/cat/csw/2.0.2">
  <csw:SearchResults numberOfRecordsMatched="27" numberOfRecordsReturned="0"/>
</csw:GetRecordsResponse>
"#;

    // 1. Stage the responses on disk and read them back
    let dir = tempfile::tempdir().expect("temp dir");
    let results_path = dir.path().join("results.xml");
    let hits_path = dir.path().join("hits.xml");
    fs::write(&results_path, results_response).expect("write results fixture");
    fs::write(&hits_path, hits_response).expect("write hits fixture");

    let slots = SlotDictionary::standard();
    let parser = ResponseParser::new(&slots);

    let mut records = Vec::new();
    for path in [&results_path, &hits_path] {
        let xml = fs::read_to_string(path).expect("read fixture back");
        records.extend(parser.parse_response(&xml));
    }

    // 2. Order by collection, then product
    records.sort_by(|a, b| a.compare(b));

    assert_eq!(records.len(), 2, "hits only file contributes no records");
    assert_eq!(
        records[0].get(Attribute::ProductIdentifier),
        Some("urn:EOP:OPT:A1")
    );
    assert_eq!(
        records[1].get(Attribute::ProductIdentifier),
        Some("urn:EOP:SAR:B2")
    );

    // 3. Field routing across the package objects
    assert_eq!(records[0].get(Attribute::ParentIdentifier), Some("COLLECTION_A"));
    assert_eq!(
        records[0].get(Attribute::SensingStart),
        Some("2020-01-01T00:00:00.000Z")
    );
    assert_eq!(
        records[0].get(Attribute::ThumbnailUrl),
        Some("http://cat/a1-thumb.png")
    );
    assert_eq!(records[0].scene_center(), Some(LatLon::new(45.5, 9.25)));

    assert_eq!(records[1].get(Attribute::ParentIdentifier), Some("COLLECTION_B"));
    assert_eq!(records[1].get(Attribute::ProductType), Some("SAR_IMG"));
    assert_eq!(records[1].get(Attribute::PlatformName), Some("SENTINEL-1"));
    assert_eq!(records[1].get(Attribute::InstrumentName), Some("C-SAR"));
    let footprint = records[1].footprint_points().expect("footprint must decode");
    assert_eq!(footprint.len(), 4);
    assert_eq!(footprint[0], LatLon::new(10.0, 20.0));

    // 4. The hits only file still reports the server side match count
    let hits_xml = fs::read_to_string(&hits_path).expect("read fixture back");
    assert_eq!(matched_records(&hits_xml), Some(27));
    assert_eq!(matched_records(results_response), Some(2));
}
