/// Fatal input-validation errors raised by the scoring pipeline
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EvalError {
    #[error("Unsupported metric: {0} (expected one of: mse, mae)")]
    UnsupportedMetric(String),

    #[error("Invalid random baseline range [{low}, {high}]: bounds must be finite with low <= high")]
    InvalidBaselineRange { low: f64, high: f64 },

    #[error("Baseline name {0:?} is used by both baselines")]
    DuplicateBaselineName(String),

    #[error("Model {name:?} not found in predictions (available: {available})")]
    UnknownModel { name: String, available: String },
}
