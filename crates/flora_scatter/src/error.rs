//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Only
//! configuration problems surface as errors; per-candidate rejections are reported
//! through [`crate::scatter::events`] instead.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("species pool is empty")]
    MissingSpecies,

    #[error("ground classification mask is empty")]
    MissingGroundClassification,

    #[error("unknown species '{id}'")]
    UnknownSpecies { id: String },

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_uses_other_variant() {
        let err: Error = String::from("boom").into();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn unknown_species_names_the_id() {
        let err = Error::UnknownSpecies { id: "fern".into() };
        assert_eq!(err.to_string(), "unknown species 'fern'");
    }

    #[test]
    fn config_errors_render_cause() {
        assert_eq!(
            Error::MissingSpecies.to_string(),
            "species pool is empty"
        );
        assert_eq!(
            Error::InvalidConfig("octaves must be >= 1".into()).to_string(),
            "invalid configuration: octaves must be >= 1"
        );
    }
}
