/// Errors that can occur across the cadence pipeline.
///
/// Each variant maps to one stage of the pipeline. Failed metric results
/// carry the variant name as their `errorClass` metadata tag so formatters
/// can group failures without parsing messages.
///
/// # Examples
///
/// ```
/// use cadence_core::CadenceError;
///
/// let err = CadenceError::Validation("repository label is empty".into());
/// assert!(err.to_string().contains("repository label"));
/// assert_eq!(err.class(), "ValidationError");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum CadenceError {
    /// Invalid input detected before any computation begins.
    #[error("validation error: {0}")]
    Validation(String),

    /// Raw log text could not be turned into records.
    #[error("parse error: {0}")]
    Parse(String),

    /// A metric algorithm failed mid-computation.
    #[error("computation error: {0}")]
    Computation(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CadenceError {
    /// Short class tag for this error, used as `errorClass` in failed
    /// metric results.
    ///
    /// # Examples
    ///
    /// ```
    /// use cadence_core::CadenceError;
    ///
    /// assert_eq!(
    ///     CadenceError::Computation("division by zero".into()).class(),
    ///     "ComputationError",
    /// );
    /// ```
    pub fn class(&self) -> &'static str {
        match self {
            CadenceError::Validation(_) => "ValidationError",
            CadenceError::Parse(_) => "ParseError",
            CadenceError::Computation(_) => "ComputationError",
            CadenceError::Serialization(_) => "SerializationError",
        }
    }
}
