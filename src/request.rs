use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::trace;

use crate::attributes::Attribute;
use crate::error::{CatalogueError, Result};
use crate::model::LatLon;
use crate::parser::attr_value;
use crate::slots::SlotDictionary;

/// Coordinate reference system of every geometry in a request.
pub const CRS_URN: &str = "urn:ogc:def:crs:EPSG:6.3:4326";

const NS_CSW: &str = "http://www.opengis.net/cat/csw/2.0.2";
const NS_OGC: &str = "http://www.opengis.net/ogc";
const NS_GML: &str = "http://www.opengis.net/gml";
const NS_RIM: &str = "urn:oasis:names:tc:ebxml-regrep:xsd:rim:3.0";
const NS_WRS: &str = "http://www.opengis.net/cat/wrs/1.0";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

const DEFAULT_TEMPLATE: &str = include_str!("templates/getrecords.xml");

/// Whether the catalogue returns records or only a match count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Hits,
    Results,
}

impl ResultKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultKind::Hits => "hits",
            ResultKind::Results => "results",
        }
    }

    pub fn parse(value: &str) -> Option<ResultKind> {
        match value {
            "hits" => Some(ResultKind::Hits),
            "results" => Some(ResultKind::Results),
            _ => None,
        }
    }
}

/// Element set requested for each returned record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detail {
    Brief,
    Summary,
    Full,
}

impl Detail {
    pub fn as_str(self) -> &'static str {
        match self {
            Detail::Brief => "brief",
            Detail::Summary => "summary",
            Detail::Full => "full",
        }
    }

    pub fn parse(value: &str) -> Option<Detail> {
        match value {
            "brief" => Some(Detail::Brief),
            "summary" => Some(Detail::Summary),
            "full" => Some(Detail::Full),
            _ => None,
        }
    }
}

/// Filter encoding comparison operators used by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    GreaterOrEqual,
    LessOrEqual,
}

impl ComparisonOp {
    fn tag_name(self) -> &'static str {
        match self {
            ComparisonOp::Equal => "PropertyIsEqualTo",
            ComparisonOp::GreaterOrEqual => "PropertyIsGreaterThanOrEqualTo",
            ComparisonOp::LessOrEqual => "PropertyIsLessThanOrEqualTo",
        }
    }
}

/// Filter encoding spatial operators applicable to the footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialOp {
    Overlaps,
    Contains,
    Intersects,
    Within,
}

impl SpatialOp {
    pub fn tag_name(self) -> &'static str {
        match self {
            SpatialOp::Overlaps => "Overlaps",
            SpatialOp::Contains => "Contains",
            SpatialOp::Intersects => "Intersects",
            SpatialOp::Within => "Within",
        }
    }
}

/// Geometry operand of a spatial predicate. Coordinates are lat/lon
/// degrees in [`CRS_URN`] axis order.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Polygon(Vec<LatLon>),
    Polyline(Vec<LatLon>),
    Point(LatLon),
    LatLonRange {
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    },
    Circle {
        center: LatLon,
        radius_m: f64,
    },
}

/// One constraint of the query filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Comparison {
        op: ComparisonOp,
        locator: String,
        literal: String,
    },
    Or(Vec<Predicate>),
    Spatial {
        op: SpatialOp,
        locator: String,
        shape: Shape,
    },
}

/// Fixed envelope strings read from the request template.
#[derive(Debug, Clone)]
struct Envelope {
    service: String,
    version: String,
    output_format: String,
    output_schema: String,
    type_names: String,
    element_set_type_names: Option<String>,
    constraint_version: String,
    result_kind: ResultKind,
    detail: Detail,
    start_position: u32,
    max_records: u32,
}

impl Envelope {
    fn parse(template: &str) -> Result<Envelope> {
        let mut reader = Reader::from_str(template);
        let root = loop {
            match reader.read_event()? {
                Event::Start(e) => break e,
                Event::Empty(_) => return Err(invalid("the envelope has no query body")),
                Event::Eof => return Err(invalid("empty template document")),
                _ => {}
            }
        };
        if root.local_name().as_ref() != b"GetRecords" {
            return Err(invalid("root element is not csw:GetRecords"));
        }
        let result_kind = {
            let raw = attr_or(&root, "resultType", "results");
            ResultKind::parse(&raw)
                .ok_or_else(|| invalid(&format!("unsupported resultType: {raw}")))?
        };

        let mut type_names = None;
        let mut element_set_type_names = None;
        let mut detail = None;
        let mut constraint_version = None;
        let mut saw_query = false;
        let mut saw_constraint = false;
        let mut saw_filter = false;
        let mut saw_and = false;
        let mut in_element_set = false;
        let mut in_and = false;
        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    if in_and {
                        return Err(invalid("the filter container must be empty"));
                    }
                    match e.local_name().as_ref() {
                        b"Query" => {
                            saw_query = true;
                            type_names = attr_value(&e, "typeNames");
                        }
                        b"ElementSetName" => {
                            in_element_set = true;
                            element_set_type_names = attr_value(&e, "typeNames");
                        }
                        b"Constraint" => {
                            saw_constraint = true;
                            constraint_version = attr_value(&e, "version");
                        }
                        b"Filter" => saw_filter = true,
                        b"And" => {
                            saw_and = true;
                            in_and = true;
                        }
                        _ => {}
                    }
                }
                Event::Empty(e) => {
                    if in_and {
                        return Err(invalid("the filter container must be empty"));
                    }
                    if e.local_name().as_ref() == b"And" {
                        saw_and = true;
                    }
                }
                Event::Text(t) => {
                    let text = t.unescape().unwrap_or_default();
                    let text = text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    if in_element_set {
                        detail = Some(Detail::parse(text).ok_or_else(|| {
                            invalid(&format!("unsupported detail level: {text}"))
                        })?);
                    } else if in_and {
                        return Err(invalid("the filter container must be empty"));
                    }
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"ElementSetName" => in_element_set = false,
                    b"And" => in_and = false,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }
        if !saw_query {
            return Err(invalid("missing csw:Query"));
        }
        if !saw_constraint {
            return Err(invalid("missing csw:Constraint"));
        }
        if !saw_filter {
            return Err(invalid("missing ogc:Filter"));
        }
        if !saw_and {
            return Err(invalid("missing ogc:And filter container"));
        }
        let detail = detail.ok_or_else(|| invalid("missing or empty csw:ElementSetName"))?;

        Ok(Envelope {
            service: attr_or(&root, "service", "CSW"),
            version: attr_or(&root, "version", "2.0.2"),
            output_format: attr_or(&root, "outputFormat", "application/xml"),
            output_schema: attr_or(&root, "outputSchema", NS_RIM),
            type_names: type_names.unwrap_or_else(|| "rim:RegistryPackage".to_string()),
            element_set_type_names,
            constraint_version: constraint_version.unwrap_or_else(|| "1.1.0".to_string()),
            result_kind,
            detail,
            start_position: numeric_attr(&root, "startPosition", 1)?,
            max_records: numeric_attr(&root, "maxRecords", 100)?,
        })
    }
}

/// Composes CSW GetRecords query documents against the HMA ebRIM
/// profile.
///
/// The envelope comes from a template validated at construction, the
/// filter accumulates through the `add_*` methods. Serialization does
/// not consume the builder so the same query can be issued first as a
/// hits request and then as a results one.
#[derive(Debug)]
pub struct GetRecordsBuilder<'d> {
    slots: &'d SlotDictionary,
    envelope: Envelope,
    result_kind: ResultKind,
    detail: Detail,
    start_position: u32,
    max_records: u32,
    predicates: Vec<Predicate>,
}

impl<'d> GetRecordsBuilder<'d> {
    /// Builder over the built in envelope template.
    pub fn new(slots: &'d SlotDictionary) -> Result<GetRecordsBuilder<'d>> {
        GetRecordsBuilder::from_template(slots, DEFAULT_TEMPLATE)
    }

    /// Builder over a custom envelope template. Fails when the template
    /// is not a well formed GetRecords skeleton with an empty filter.
    pub fn from_template(
        slots: &'d SlotDictionary,
        template: &str,
    ) -> Result<GetRecordsBuilder<'d>> {
        let envelope = Envelope::parse(template)?;
        trace!("Request builder initialized from template");
        Ok(GetRecordsBuilder {
            slots,
            result_kind: envelope.result_kind,
            detail: envelope.detail,
            start_position: envelope.start_position,
            max_records: envelope.max_records,
            envelope,
            predicates: Vec::new(),
        })
    }

    pub fn set_result_kind(&mut self, kind: ResultKind) {
        self.result_kind = kind;
        trace!("Set result type to {}", kind.as_str());
    }

    pub fn set_detail(&mut self, detail: Detail) {
        self.detail = detail;
        trace!("Set detail level to {}", detail.as_str());
    }

    pub fn set_start_position(&mut self, position: u32) {
        self.start_position = position;
        trace!("Set start position to {}", position);
    }

    pub fn set_max_records(&mut self, max: u32) {
        self.max_records = max;
        trace!("Set max records to {}", max);
    }

    /// Constrains the parent identifier to one collection.
    pub fn add_collection(&mut self, collection: &str) {
        let predicate =
            self.comparison(ComparisonOp::Equal, Attribute::ParentIdentifier, collection.into());
        self.predicates.push(predicate);
        trace!("Added collection clause for {}", collection);
    }

    /// Constrains the parent identifier to any of the given collections.
    /// The clauses always nest inside an Or group, also for one element.
    pub fn add_collections(&mut self, collections: &[&str]) {
        let group = collections
            .iter()
            .map(|collection| {
                self.comparison(
                    ComparisonOp::Equal,
                    Attribute::ParentIdentifier,
                    (*collection).into(),
                )
            })
            .collect();
        self.predicates.push(Predicate::Or(group));
        trace!("Added collection clauses for {} collections", collections.len());
    }

    /// Keeps products whose sensing interval lies inside the window.
    pub fn add_temporal_contained(&mut self, start: DateTime<Utc>, stop: DateTime<Utc>) {
        let after = self.comparison(
            ComparisonOp::GreaterOrEqual,
            Attribute::SensingStart,
            format_timestamp(start),
        );
        let before = self.comparison(
            ComparisonOp::LessOrEqual,
            Attribute::SensingStop,
            format_timestamp(stop),
        );
        self.predicates.push(after);
        self.predicates.push(before);
        trace!("Added sensing time containment between {} and {}", start, stop);
    }

    /// Keeps products whose sensing interval intersects the window:
    /// sensing must stop after the window opens and start before it
    /// closes, hence each bound constrains the opposite endpoint.
    pub fn add_temporal_overlaps(&mut self, start: DateTime<Utc>, stop: DateTime<Utc>) {
        let stops_after = self.comparison(
            ComparisonOp::GreaterOrEqual,
            Attribute::SensingStop,
            format_timestamp(start),
        );
        let starts_before = self.comparison(
            ComparisonOp::LessOrEqual,
            Attribute::SensingStart,
            format_timestamp(stop),
        );
        self.predicates.push(stops_after);
        self.predicates.push(starts_before);
        trace!("Added sensing time overlap between {} and {}", start, stop);
    }

    /// Keeps products that started sensing at the instant or later.
    pub fn add_temporal_after(&mut self, instant: DateTime<Utc>) {
        let predicate = self.comparison(
            ComparisonOp::GreaterOrEqual,
            Attribute::SensingStart,
            format_timestamp(instant),
        );
        self.predicates.push(predicate);
        trace!("Added sensing time lower bound {}", instant);
    }

    /// Keeps products that stopped sensing at the instant or earlier.
    pub fn add_temporal_before(&mut self, instant: DateTime<Utc>) {
        let predicate = self.comparison(
            ComparisonOp::LessOrEqual,
            Attribute::SensingStop,
            format_timestamp(instant),
        );
        self.predicates.push(predicate);
        trace!("Added sensing time upper bound {}", instant);
    }

    pub fn add_spatial_polygon(&mut self, op: SpatialOp, ring: &[LatLon]) {
        self.push_spatial(op, Shape::Polygon(ring.to_vec()));
        trace!("Added {} polygon constraint with {} points", op.tag_name(), ring.len());
    }

    pub fn add_spatial_polyline(&mut self, op: SpatialOp, path: &[LatLon]) {
        self.push_spatial(op, Shape::Polyline(path.to_vec()));
        trace!("Added {} polyline constraint with {} points", op.tag_name(), path.len());
    }

    pub fn add_spatial_point(&mut self, op: SpatialOp, lat: f64, lon: f64) {
        self.push_spatial(op, Shape::Point(LatLon::new(lat, lon)));
        trace!("Added {} point constraint at {} {}", op.tag_name(), lat, lon);
    }

    pub fn add_spatial_range(
        &mut self,
        op: SpatialOp,
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    ) {
        self.push_spatial(
            op,
            Shape::LatLonRange {
                min_lat,
                max_lat,
                min_lon,
                max_lon,
            },
        );
        trace!("Added {} range constraint", op.tag_name());
    }

    pub fn add_spatial_circle(&mut self, op: SpatialOp, lat: f64, lon: f64, radius_m: f64) {
        self.push_spatial(
            op,
            Shape::Circle {
                center: LatLon::new(lat, lon),
                radius_m,
            },
        );
        trace!("Added {} circle constraint of radius {} m", op.tag_name(), radius_m);
    }

    /// The accumulated filter constraints, in insertion order.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    fn comparison(&self, op: ComparisonOp, attribute: Attribute, literal: String) -> Predicate {
        Predicate::Comparison {
            op,
            locator: self.slots.request_locator_for(attribute).to_string(),
            literal,
        }
    }

    fn push_spatial(&mut self, op: SpatialOp, shape: Shape) {
        self.predicates.push(Predicate::Spatial {
            op,
            locator: self.slots.request_locator_for(Attribute::Footprint).to_string(),
            shape,
        });
    }

    /// Serializes the GetRecords document. Calling it twice on the same
    /// builder state yields byte identical documents.
    pub fn request_xml(&self) -> Result<String> {
        let mut xml = String::new();
        writeln!(xml, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(xml, r#"<csw:GetRecords xmlns:csw="{NS_CSW}""#)?;
        writeln!(xml, r#"                xmlns:ogc="{NS_OGC}""#)?;
        writeln!(xml, r#"                xmlns:gml="{NS_GML}""#)?;
        writeln!(xml, r#"                xmlns:rim="{NS_RIM}""#)?;
        writeln!(xml, r#"                xmlns:wrs="{NS_WRS}""#)?;
        writeln!(
            xml,
            r#"                service="{}" version="{}" resultType="{}""#,
            xml_escape(&self.envelope.service),
            xml_escape(&self.envelope.version),
            self.result_kind.as_str()
        )?;
        writeln!(
            xml,
            r#"                outputFormat="{}" outputSchema="{}""#,
            xml_escape(&self.envelope.output_format),
            xml_escape(&self.envelope.output_schema)
        )?;
        writeln!(
            xml,
            r#"                startPosition="{}" maxRecords="{}">"#,
            self.start_position, self.max_records
        )?;
        writeln!(
            xml,
            r#"  <csw:Query typeNames="{}">"#,
            xml_escape(&self.envelope.type_names)
        )?;
        match &self.envelope.element_set_type_names {
            Some(names) => writeln!(
                xml,
                r#"    <csw:ElementSetName typeNames="{}">{}</csw:ElementSetName>"#,
                xml_escape(names),
                self.detail.as_str()
            )?,
            None => writeln!(
                xml,
                "    <csw:ElementSetName>{}</csw:ElementSetName>",
                self.detail.as_str()
            )?,
        }
        writeln!(
            xml,
            r#"    <csw:Constraint version="{}">"#,
            xml_escape(&self.envelope.constraint_version)
        )?;
        writeln!(xml, "      <ogc:Filter>")?;
        if self.predicates.is_empty() {
            writeln!(xml, "        <ogc:And/>")?;
        } else {
            writeln!(xml, "        <ogc:And>")?;
            for predicate in &self.predicates {
                write_predicate(&mut xml, predicate, 10)?;
            }
            writeln!(xml, "        </ogc:And>")?;
        }
        writeln!(xml, "      </ogc:Filter>")?;
        writeln!(xml, "    </csw:Constraint>")?;
        writeln!(xml, "  </csw:Query>")?;
        writeln!(xml, "</csw:GetRecords>")?;
        Ok(xml)
    }
}

fn write_predicate(xml: &mut String, predicate: &Predicate, indent: usize) -> Result<()> {
    let pad = " ".repeat(indent);
    match predicate {
        Predicate::Comparison { op, locator, literal } => {
            writeln!(xml, "{pad}<ogc:{}>", op.tag_name())?;
            writeln!(xml, "{pad}  <ogc:PropertyName>{locator}</ogc:PropertyName>")?;
            writeln!(xml, "{pad}  <ogc:Literal>{}</ogc:Literal>", xml_escape(literal))?;
            writeln!(xml, "{pad}</ogc:{}>", op.tag_name())?;
        }
        Predicate::Or(group) => {
            writeln!(xml, "{pad}<ogc:Or>")?;
            for child in group {
                write_predicate(xml, child, indent + 2)?;
            }
            writeln!(xml, "{pad}</ogc:Or>")?;
        }
        Predicate::Spatial { op, locator, shape } => {
            writeln!(xml, "{pad}<ogc:{}>", op.tag_name())?;
            writeln!(xml, "{pad}  <ogc:PropertyName>{locator}</ogc:PropertyName>")?;
            write_shape(xml, shape, indent + 2)?;
            writeln!(xml, "{pad}</ogc:{}>", op.tag_name())?;
        }
    }
    Ok(())
}

fn write_shape(xml: &mut String, shape: &Shape, indent: usize) -> Result<()> {
    let pad = " ".repeat(indent);
    match shape {
        Shape::Polygon(ring) => {
            writeln!(xml, r#"{pad}<gml:Polygon srsName="{CRS_URN}">"#)?;
            writeln!(xml, "{pad}  <gml:exterior>")?;
            writeln!(xml, "{pad}    <gml:LinearRing>")?;
            writeln!(xml, "{pad}      <gml:posList>{}</gml:posList>", pos_list(ring))?;
            writeln!(xml, "{pad}    </gml:LinearRing>")?;
            writeln!(xml, "{pad}  </gml:exterior>")?;
            writeln!(xml, "{pad}</gml:Polygon>")?;
        }
        Shape::Polyline(path) => {
            writeln!(xml, r#"{pad}<gml:LineString srsName="{CRS_URN}">"#)?;
            writeln!(xml, "{pad}  <gml:posList>{}</gml:posList>", pos_list(path))?;
            writeln!(xml, "{pad}</gml:LineString>")?;
        }
        Shape::Point(point) => {
            writeln!(xml, r#"{pad}<gml:Point srsName="{CRS_URN}">"#)?;
            writeln!(xml, "{pad}  <gml:pos>{} {}</gml:pos>", point.lat, point.lon)?;
            writeln!(xml, "{pad}</gml:Point>")?;
        }
        Shape::LatLonRange {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        } => {
            writeln!(xml, r#"{pad}<gml:Envelope srsName="{CRS_URN}">"#)?;
            writeln!(xml, "{pad}  <gml:lowerCorner>{min_lat} {min_lon}</gml:lowerCorner>")?;
            writeln!(xml, "{pad}  <gml:upperCorner>{max_lat} {max_lon}</gml:upperCorner>")?;
            writeln!(xml, "{pad}</gml:Envelope>")?;
        }
        Shape::Circle { center, radius_m } => {
            writeln!(xml, r#"{pad}<gml:CircleByCenterPoint numArc="1" srsName="{CRS_URN}">"#)?;
            writeln!(xml, "{pad}  <gml:pos>{} {}</gml:pos>", center.lat, center.lon)?;
            writeln!(xml, r#"{pad}  <gml:radius uom="m">{radius_m}</gml:radius>"#)?;
            writeln!(xml, "{pad}</gml:CircleByCenterPoint>")?;
        }
    }
    Ok(())
}

/// Ordinates as `lat lon` pairs separated by single spaces.
fn pos_list(points: &[LatLon]) -> String {
    points
        .iter()
        .map(|point| format!("{} {}", point.lat, point.lon))
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn invalid(message: &str) -> CatalogueError {
    CatalogueError::InvalidTemplate(message.to_string())
}

fn attr_or(e: &BytesStart<'_>, name: &str, default: &str) -> String {
    attr_value(e, name).unwrap_or_else(|| default.to_string())
}

fn numeric_attr(e: &BytesStart<'_>, name: &str, default: u32) -> Result<u32> {
    match attr_value(e, name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| invalid(&format!("bad {name} value: {raw}"))),
        None => Ok(default),
    }
}
