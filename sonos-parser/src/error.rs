//! Error types for XML parsing operations

use thiserror::Error;

/// Errors that can occur during XML parsing operations
#[derive(Error, Debug)]
pub enum ParseError {
    /// XML deserialization failed
    #[error("XML deserialization failed: {0}")]
    XmlDeserializationFailed(String),

    /// Invalid XML structure
    #[error("Invalid XML structure: {0}")]
    InvalidXmlStructure(String),

    /// Missing required element
    #[error("Missing required element: {0}")]
    MissingRequiredElement(String),

    /// A property value exceeded the accumulation limit
    #[error("Property {name} exceeds {limit} bytes")]
    PropertyTooLarge { name: String, limit: usize },
}

impl From<quick_xml::Error> for ParseError {
    fn from(err: quick_xml::Error) -> Self {
        ParseError::InvalidXmlStructure(err.to_string())
    }
}

/// Result type alias for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;
