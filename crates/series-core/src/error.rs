use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Data integrity: {0}")]
    DataIntegrity(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Provider error: {0}")]
    Provider(String),
}
