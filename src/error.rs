use thiserror::Error;

/// Errors raised while building materials. Evaluating or sampling a lobe never fails: degenerate
/// configurations contribute nothing instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("unknown microfacet type `{0}`, expected one of `ggx`, `disney` or `beckmann`")]
    UnknownMicrofacetType(String),

    #[error("unknown ior curve `{0}`")]
    UnknownIorCurve(String),

    #[error("spectrum dimension must be between 1 and 4, got {0}")]
    SpectrumDimension(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
