use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Request is empty")]
    EmptyRequest,

    #[error("Oracle error: {0}")]
    OracleError(#[from] llm_router_oracle::OracleError),

    #[error("Evaluation error: {0}")]
    EvaluationError(#[from] llm_router_critic::EvaluationError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
