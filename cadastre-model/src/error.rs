use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    InvalidCadastralNumber(String),
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidCadastralNumber(value) => write!(
                f,
                "cadastral number '{value}' must match the format NN:NN:NNNNNN:NN"
            ),
            ModelError::LatitudeOutOfRange(value) => {
                write!(f, "latitude {value} must be within [-90, 90]")
            }
            ModelError::LongitudeOutOfRange(value) => {
                write!(f, "longitude {value} must be within [-180, 180]")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
