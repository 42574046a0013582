use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Invalid simulation parameters: {0}")]
    InvalidConfig(String),

    #[error("Bad cross sections in mesh cell {cell}: {reason}")]
    CrossSection { cell: usize, reason: String },

    #[error("Malformed slab geometry: {0}")]
    Geometry(String),

    #[error("Phase space capacity exceeded: {requested} rows requested, capacity is {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },
}

pub type Result<T> = std::result::Result<T, TransportError>;
