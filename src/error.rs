use thiserror::Error;

/// The result type used throughout the catalogue library.
pub type Result<T> = std::result::Result<T, CatalogueError>;

/// Errors raised by the catalogue query/response codec.
#[derive(Debug, Error)]
pub enum CatalogueError {
    /// No catalogue attribute matches the given wire name.
    #[error("unknown metadata attribute name: {0}")]
    UnknownAttribute(String),

    /// The GetRecords envelope template is missing or structurally broken.
    #[error("invalid GetRecords template: {0}")]
    InvalidTemplate(String),

    /// A dictionary table maps two attributes to the same slot or locator.
    #[error("duplicate slot dictionary entry: {0}")]
    DuplicateEntry(String),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("format error: {0}")]
    Fmt(#[from] std::fmt::Error),
}
