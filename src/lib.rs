//! Query and response codec for Earth observation catalogues speaking
//! CSW 2.0.2 with the HMA ebRIM profile. Composes GetRecords filter
//! documents and maps returned registry packages to metadata records.

pub mod attributes;
pub mod error;
pub mod model;
pub mod parser;
pub mod request;
pub mod slots;

pub use attributes::{Attribute, SlotPayload};
pub use error::{CatalogueError, Result};
pub use model::{LatLon, MetadataRecord};
pub use parser::{matched_records, ResponseParser};
pub use request::{Detail, GetRecordsBuilder, Predicate, ResultKind, Shape, SpatialOp};
pub use slots::SlotDictionary;
