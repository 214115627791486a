use crate::geom::SurfaceFitError;

/// Errors raised by the pipeline builders.
///
/// Every builder validates at construction and fails fast; no partially
/// built network, skeleton, package, or stack is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A required reference surface or mesh is absent for the selected
    /// reference option.
    #[error("missing reference {kind} for the selected reference option")]
    MissingReference { kind: &'static str },

    /// A selector or parameter value is outside its valid range.
    #[error("invalid option {value} for {selector}")]
    InvalidOption { selector: &'static str, value: f64 },

    /// The input point grid is unusable: ragged rows, empty rows, or too few
    /// points to form a traversal.
    #[error("malformed grid: {reason}")]
    MalformedGrid { reason: String },

    /// All speed factors are equal, so the remap interval has zero width.
    #[error("degenerate speed-factor range: min equals max")]
    DegenerateRange,

    /// A referenced upstream aggregate is absent at the point of use.
    #[error("missing upstream {kind}")]
    MissingUpstream { kind: &'static str },
}

impl From<SurfaceFitError> for BuildError {
    fn from(err: SurfaceFitError) -> Self {
        Self::MalformedGrid {
            reason: err.to_string(),
        }
    }
}
