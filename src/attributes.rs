use std::fmt;

use crate::error::{CatalogueError, Result};

/// Metadata attributes of an Earth observation product as exposed by
/// HMA catalogues. Variants are declared roughly by importance, which
/// fixes the iteration order of keyed collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attribute {
    ProductIdentifier,
    ParentIdentifier,
    Footprint,
    SensingStart,
    SensingStop,
    ProductType,
    OrbitNumber,
    LastOrbitNumber,
    AcquisitionStation,
    AcquisitionDate,
    AcquisitionType,
    AcquisitionSubtype,
    ArchivePath,
    ArchivingCenter,
    ArchivingDate,
    ProductStatus,
    OrbitDirection,
    DownlinkStart,
    DownlinkStop,
    MissionName,
    PlatformName,
    InstrumentName,
    PlatformSerial,
    SensorType,
    SensorMode,
    SensorResolution,
    SceneCenter,
    ArchivingIdentifier,
    ProcessingLevel,
    SensorSwath,
    AscendingNodeLongitude,
    WrsLongitude,
    WrsLatitude,
    PolarisationChannels,
    PolarisationMode,
    LookDirection,
    IncidenceAngle,
    MinIncidenceAngle,
    MaxIncidenceAngle,
    IncidenceAngleVariation,
    AlongTrackIncidenceAngle,
    AcrossTrackIncidenceAngle,
    IlluminationAzimuth,
    IlluminationElevation,
    DopplerFrequency,
    CloudCover,
    SnowCover,
    ImageQualityDegradation,
    ThumbnailUrl,
    QuicklookUrl,
    BrowseFileName,
}

/// Payload carried by an attribute's response slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPayload {
    /// Whitespace separated lat/lon ordinates in a `gml:posList`.
    PositionList,
    /// A single lat/lon pair in a `gml:pos`.
    Position,
    /// Plain text in the first `rim:Value`.
    Text,
}

impl Attribute {
    /// All attributes in importance order.
    pub const ALL: [Attribute; 51] = [
        Attribute::ProductIdentifier,
        Attribute::ParentIdentifier,
        Attribute::Footprint,
        Attribute::SensingStart,
        Attribute::SensingStop,
        Attribute::ProductType,
        Attribute::OrbitNumber,
        Attribute::LastOrbitNumber,
        Attribute::AcquisitionStation,
        Attribute::AcquisitionDate,
        Attribute::AcquisitionType,
        Attribute::AcquisitionSubtype,
        Attribute::ArchivePath,
        Attribute::ArchivingCenter,
        Attribute::ArchivingDate,
        Attribute::ProductStatus,
        Attribute::OrbitDirection,
        Attribute::DownlinkStart,
        Attribute::DownlinkStop,
        Attribute::MissionName,
        Attribute::PlatformName,
        Attribute::InstrumentName,
        Attribute::PlatformSerial,
        Attribute::SensorType,
        Attribute::SensorMode,
        Attribute::SensorResolution,
        Attribute::SceneCenter,
        Attribute::ArchivingIdentifier,
        Attribute::ProcessingLevel,
        Attribute::SensorSwath,
        Attribute::AscendingNodeLongitude,
        Attribute::WrsLongitude,
        Attribute::WrsLatitude,
        Attribute::PolarisationChannels,
        Attribute::PolarisationMode,
        Attribute::LookDirection,
        Attribute::IncidenceAngle,
        Attribute::MinIncidenceAngle,
        Attribute::MaxIncidenceAngle,
        Attribute::IncidenceAngleVariation,
        Attribute::AlongTrackIncidenceAngle,
        Attribute::AcrossTrackIncidenceAngle,
        Attribute::IlluminationAzimuth,
        Attribute::IlluminationElevation,
        Attribute::DopplerFrequency,
        Attribute::CloudCover,
        Attribute::SnowCover,
        Attribute::ImageQualityDegradation,
        Attribute::ThumbnailUrl,
        Attribute::QuicklookUrl,
        Attribute::BrowseFileName,
    ];

    /// The catalogue wire name of this attribute.
    pub fn wire_name(self) -> &'static str {
        match self {
            Attribute::ProductIdentifier => "prodIdentifier",
            Attribute::ParentIdentifier => "parentIdentifier",
            Attribute::Footprint => "footprint",
            Attribute::SensingStart => "startSensingTime",
            Attribute::SensingStop => "stopSensingTime",
            Attribute::ProductType => "productType",
            Attribute::OrbitNumber => "orbitNumber",
            Attribute::LastOrbitNumber => "lastOrbitNumber",
            Attribute::AcquisitionStation => "acquisitionStation",
            Attribute::AcquisitionDate => "acquisitionDate",
            Attribute::AcquisitionType => "acquisitionType",
            Attribute::AcquisitionSubtype => "acquisitionSubType",
            Attribute::ArchivePath => "archivePath",
            Attribute::ArchivingCenter => "archivingCenter",
            Attribute::ArchivingDate => "archivingDate",
            Attribute::ProductStatus => "productStatus",
            Attribute::OrbitDirection => "orbitDirection",
            Attribute::DownlinkStart => "startDownlinkTime",
            Attribute::DownlinkStop => "stopDownlinkTime",
            Attribute::MissionName => "missionName",
            Attribute::PlatformName => "platformShortName",
            Attribute::InstrumentName => "instrumentShortName",
            Attribute::PlatformSerial => "platformSerialIdentifier",
            Attribute::SensorType => "sensorType",
            Attribute::SensorMode => "sensorOperationalMode",
            Attribute::SensorResolution => "sensorResolution",
            Attribute::SceneCenter => "sceneCenter",
            Attribute::ArchivingIdentifier => "archivingIdentifier",
            Attribute::ProcessingLevel => "processingLevel",
            Attribute::SensorSwath => "sensorSwathIdentifier",
            Attribute::AscendingNodeLongitude => "ascendingNodeLongitude",
            Attribute::WrsLongitude => "wrsLongitudeGrid",
            Attribute::WrsLatitude => "wrsLatitudeGrid",
            Attribute::PolarisationChannels => "polarisationChannels",
            Attribute::PolarisationMode => "polarisationMode",
            Attribute::LookDirection => "antennaLookDirection",
            Attribute::IncidenceAngle => "incidenceAngle",
            Attribute::MinIncidenceAngle => "minimumIncidenceAngle",
            Attribute::MaxIncidenceAngle => "maximumIncidenceAngle",
            Attribute::IncidenceAngleVariation => "incidenceAngleVariation",
            Attribute::AlongTrackIncidenceAngle => "alongTrackIncidenceAngle",
            Attribute::AcrossTrackIncidenceAngle => "acrossTrackIncidenceAngle",
            Attribute::IlluminationAzimuth => "illuminationAzimuthAngle",
            Attribute::IlluminationElevation => "illuminationElevationAngle",
            Attribute::DopplerFrequency => "dopplerFrequency",
            Attribute::CloudCover => "cloudCoverPercentage",
            Attribute::SnowCover => "snowCoverPercentage",
            Attribute::ImageQualityDegradation => "imageQualityDegradation",
            Attribute::ThumbnailUrl => "thumbnailUrl",
            Attribute::QuicklookUrl => "quicklookUrl",
            Attribute::BrowseFileName => "browseFileName",
        }
    }

    /// Looks up an attribute by wire name, ignoring ASCII case.
    pub fn resolve(name: &str) -> Result<Attribute> {
        Attribute::ALL
            .iter()
            .copied()
            .find(|attr| attr.wire_name().eq_ignore_ascii_case(name))
            .ok_or_else(|| CatalogueError::UnknownAttribute(name.to_string()))
    }

    /// Payload kind of the response slot carrying this attribute.
    pub fn slot_payload(self) -> SlotPayload {
        match self {
            Attribute::Footprint => SlotPayload::PositionList,
            Attribute::SceneCenter => SlotPayload::Position,
            _ => SlotPayload::Text,
        }
    }

    /// Abbreviated label for tabular display.
    pub fn short_label(self) -> &'static str {
        match self {
            Attribute::ProductIdentifier => "Product Id",
            Attribute::ParentIdentifier => "Parent Id",
            Attribute::Footprint => "Footprint",
            Attribute::SensingStart => "Sens. Start",
            Attribute::SensingStop => "Sens. Stop",
            Attribute::ProductType => "Prod. Type",
            Attribute::OrbitNumber => "Orb. Num.",
            Attribute::LastOrbitNumber => "Last Orb.",
            Attribute::AcquisitionStation => "Acq. Station",
            Attribute::AcquisitionDate => "Acq. Date",
            Attribute::AcquisitionType => "Acq. Type",
            Attribute::AcquisitionSubtype => "Acq. Subtype",
            Attribute::ArchivePath => "Arch. Path",
            Attribute::ArchivingCenter => "Arch. Center",
            Attribute::ArchivingDate => "Arch. Date",
            Attribute::ProductStatus => "Status",
            Attribute::OrbitDirection => "Orb. Dir.",
            Attribute::DownlinkStart => "Dlink Start",
            Attribute::DownlinkStop => "Dlink Stop",
            Attribute::MissionName => "Mission",
            Attribute::PlatformName => "Satellite",
            Attribute::InstrumentName => "Instrument",
            Attribute::PlatformSerial => "Sat. Ser.",
            Attribute::SensorType => "Sensor Type",
            Attribute::SensorMode => "Sens. Op. Mode",
            Attribute::SensorResolution => "Sens. Res.",
            Attribute::SceneCenter => "Scn. Center",
            Attribute::ArchivingIdentifier => "Arch. Id",
            Attribute::ProcessingLevel => "Proc. Level",
            Attribute::SensorSwath => "Sens. Swath",
            Attribute::AscendingNodeLongitude => "ANX Lon.",
            Attribute::WrsLongitude => "WRS Lon.",
            Attribute::WrsLatitude => "WRS Lat.",
            Attribute::PolarisationChannels => "Polarz. Chans.",
            Attribute::PolarisationMode => "Polarz. Mode",
            Attribute::LookDirection => "Look Side",
            Attribute::IncidenceAngle => "Incid. Angle",
            Attribute::MinIncidenceAngle => "Min Incid. Angle",
            Attribute::MaxIncidenceAngle => "Max Incid. Angle",
            Attribute::IncidenceAngleVariation => "Incid. Angle Var.",
            Attribute::AlongTrackIncidenceAngle => "Aln. Incid. Angle",
            Attribute::AcrossTrackIncidenceAngle => "Acr. Incid. Angle",
            Attribute::IlluminationAzimuth => "Illum. Angle Azim.",
            Attribute::IlluminationElevation => "Illum. Angle Elev.",
            Attribute::DopplerFrequency => "Doppler Freq.",
            Attribute::CloudCover => "Cloud Cover",
            Attribute::SnowCover => "Snow Cover",
            Attribute::ImageQualityDegradation => "Img. Degrad.",
            Attribute::ThumbnailUrl => "Thumbnail URL",
            Attribute::QuicklookUrl => "Quicklook URL",
            Attribute::BrowseFileName => "Browse File",
        }
    }

    /// Full label for form display.
    pub fn long_label(self) -> &'static str {
        match self {
            Attribute::ProductIdentifier => "Product Identifier",
            Attribute::ParentIdentifier => "Parent Identifier",
            Attribute::Footprint => "Footprint",
            Attribute::SensingStart => "Sensing Start",
            Attribute::SensingStop => "Sensing Stop",
            Attribute::ProductType => "Product Type",
            Attribute::OrbitNumber => "Orbit Number",
            Attribute::LastOrbitNumber => "Last Orbit",
            Attribute::AcquisitionStation => "Acquisition Station",
            Attribute::AcquisitionDate => "Acquisition Date",
            Attribute::AcquisitionType => "Acquisition Type",
            Attribute::AcquisitionSubtype => "Acquisition Subtype",
            Attribute::ArchivePath => "Archiving Path",
            Attribute::ArchivingCenter => "Archiving Center",
            Attribute::ArchivingDate => "Archiving Date",
            Attribute::ProductStatus => "Status",
            Attribute::OrbitDirection => "Orbit Direction",
            Attribute::DownlinkStart => "Downlink Start",
            Attribute::DownlinkStop => "Downlink Stop",
            Attribute::MissionName => "Mission Name",
            Attribute::PlatformName => "Satellite",
            Attribute::InstrumentName => "Instrument Name",
            Attribute::PlatformSerial => "Satellite Serial",
            Attribute::SensorType => "Sensor Type",
            Attribute::SensorMode => "Sensor Operational Mode",
            Attribute::SensorResolution => "Sensor Resolution",
            Attribute::SceneCenter => "Scene Center",
            Attribute::ArchivingIdentifier => "Archiving Identifier",
            Attribute::ProcessingLevel => "Processing Level",
            Attribute::SensorSwath => "Sensor Swath",
            Attribute::AscendingNodeLongitude => "ANX Longitude",
            Attribute::WrsLongitude => "WRS Longitude",
            Attribute::WrsLatitude => "WRS Latitude",
            Attribute::PolarisationChannels => "Polarization Channels",
            Attribute::PolarisationMode => "Polarization Mode",
            Attribute::LookDirection => "Look Side",
            Attribute::IncidenceAngle => "Incidence Angle",
            Attribute::MinIncidenceAngle => "Min Incidence Angle",
            Attribute::MaxIncidenceAngle => "Max Incidence Angle",
            Attribute::IncidenceAngleVariation => "Incidence Angle Variation",
            Attribute::AlongTrackIncidenceAngle => "Along Incidence Angle",
            Attribute::AcrossTrackIncidenceAngle => "Across Incidence Angle",
            Attribute::IlluminationAzimuth => "Illumination Angle Azimuth",
            Attribute::IlluminationElevation => "Illumination Angle Elevation",
            Attribute::DopplerFrequency => "Doppler Frequency",
            Attribute::CloudCover => "Cloud Coverage %",
            Attribute::SnowCover => "Snow Coverage %",
            Attribute::ImageQualityDegradation => "Image Quality Degradation",
            Attribute::ThumbnailUrl => "Thumbnail URL",
            Attribute::QuicklookUrl => "Quicklook URL",
            Attribute::BrowseFileName => "Browse File Name",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// The most important attributes, for listing several products in a grid.
pub const GRID_BRIEF: [Attribute; 12] = [
    Attribute::ParentIdentifier,
    Attribute::ProductIdentifier,
    Attribute::ProductType,
    Attribute::SensingStart,
    Attribute::SensingStop,
    Attribute::AcquisitionStation,
    Attribute::AcquisitionDate,
    Attribute::OrbitNumber,
    Attribute::InstrumentName,
    Attribute::SensorMode,
    Attribute::ArchivingCenter,
    Attribute::ProductStatus,
];

/// All grid-worthy attributes ordered by importance. Geometries and the
/// browse file name are excluded, they do not render as grid cells.
pub const GRID_FULL: [Attribute; 48] = [
    Attribute::ParentIdentifier,
    Attribute::ProductIdentifier,
    Attribute::ProductType,
    Attribute::SensingStart,
    Attribute::SensingStop,
    Attribute::AcquisitionStation,
    Attribute::AcquisitionDate,
    Attribute::OrbitNumber,
    Attribute::LastOrbitNumber,
    Attribute::OrbitDirection,
    Attribute::MissionName,
    Attribute::PlatformName,
    Attribute::PlatformSerial,
    Attribute::InstrumentName,
    Attribute::SensorType,
    Attribute::SensorMode,
    Attribute::SensorResolution,
    Attribute::ArchivingCenter,
    Attribute::ArchivingDate,
    Attribute::ArchivePath,
    Attribute::ThumbnailUrl,
    Attribute::QuicklookUrl,
    Attribute::ProductStatus,
    Attribute::DownlinkStart,
    Attribute::DownlinkStop,
    Attribute::ArchivingIdentifier,
    Attribute::AcquisitionType,
    Attribute::AcquisitionSubtype,
    Attribute::ProcessingLevel,
    Attribute::SensorSwath,
    Attribute::AscendingNodeLongitude,
    Attribute::WrsLongitude,
    Attribute::WrsLatitude,
    Attribute::CloudCover,
    Attribute::SnowCover,
    Attribute::PolarisationChannels,
    Attribute::PolarisationMode,
    Attribute::LookDirection,
    Attribute::IncidenceAngle,
    Attribute::AlongTrackIncidenceAngle,
    Attribute::AcrossTrackIncidenceAngle,
    Attribute::MinIncidenceAngle,
    Attribute::MaxIncidenceAngle,
    Attribute::IncidenceAngleVariation,
    Attribute::IlluminationAzimuth,
    Attribute::IlluminationElevation,
    Attribute::DopplerFrequency,
    Attribute::ImageQualityDegradation,
];

/// Product attributes grouped for single product form display.
pub const FORM_PRODUCT: [Attribute; 36] = [
    Attribute::ProductIdentifier,
    Attribute::ParentIdentifier,
    Attribute::ProductType,
    Attribute::ProductStatus,
    Attribute::SensingStart,
    Attribute::SensingStop,
    Attribute::DownlinkStart,
    Attribute::DownlinkStop,
    Attribute::OrbitNumber,
    Attribute::LastOrbitNumber,
    Attribute::OrbitDirection,
    Attribute::AcquisitionStation,
    Attribute::AcquisitionDate,
    Attribute::AcquisitionType,
    Attribute::AcquisitionSubtype,
    Attribute::CloudCover,
    Attribute::SnowCover,
    Attribute::PolarisationChannels,
    Attribute::PolarisationMode,
    Attribute::IlluminationAzimuth,
    Attribute::IlluminationElevation,
    Attribute::IncidenceAngle,
    Attribute::AlongTrackIncidenceAngle,
    Attribute::AcrossTrackIncidenceAngle,
    Attribute::MinIncidenceAngle,
    Attribute::MaxIncidenceAngle,
    Attribute::IncidenceAngleVariation,
    Attribute::LookDirection,
    Attribute::ImageQualityDegradation,
    Attribute::ProcessingLevel,
    Attribute::DopplerFrequency,
    Attribute::AscendingNodeLongitude,
    Attribute::WrsLongitude,
    Attribute::WrsLatitude,
    Attribute::Footprint,
    Attribute::SceneCenter,
];

/// Acquisition platform attributes for form display.
pub const FORM_PLATFORM: [Attribute; 7] = [
    Attribute::PlatformName,
    Attribute::PlatformSerial,
    Attribute::InstrumentName,
    Attribute::SensorType,
    Attribute::SensorMode,
    Attribute::SensorSwath,
    Attribute::SensorResolution,
];

/// Archiving attributes for form display.
pub const FORM_ARCHIVING: [Attribute; 4] = [
    Attribute::ArchivingCenter,
    Attribute::ArchivingDate,
    Attribute::ArchivePath,
    Attribute::ArchivingIdentifier,
];

/// Browse attributes for form display.
pub const FORM_BROWSE: [Attribute; 3] = [
    Attribute::ThumbnailUrl,
    Attribute::QuicklookUrl,
    Attribute::BrowseFileName,
];
