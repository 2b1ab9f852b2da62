use thiserror::Error;

/// Result alias for `relay-transport` operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Registry and (de)serialization failures (§7 of the spec).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("name not registered: {0}")]
    NameNotRegistered(String),

    #[error("name already registered: {0}")]
    NameAlreadyRegistered(String),

    #[error("id maker tag already bound: {0}")]
    TagReserved(u32),

    #[error("unknown id maker tag: {0}")]
    IdMakerUnknown(u32),

    #[error("unknown codec tag: {0}")]
    CodecUnknown(u8),

    #[error("failed to encode: {0}")]
    EncodeFailed(String),

    #[error("failed to decode: {0}")]
    DecodeFailed(String),
}
