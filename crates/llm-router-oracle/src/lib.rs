//! # llm-router-oracle
//!
//! Client side of the external inference service used by llm-router.
//!
//! Every call is a structured [`Instruction`]: one [`Operation`] plus its
//! labeled inputs. The oracle answers with the operation's named output
//! fields ([`OracleFields`]). Failures are never retried here.
//!
//! ## Key Types
//!
//! - [`Oracle`] - The capability trait every backend implements
//! - [`OracleConfig`] - Explicit connection settings (model, endpoint, key)
//! - [`Signature`] - Static description of each operation's fields
//! - [`ScriptedOracle`] - Deterministic backend for tests

mod anthropic;
mod http;
mod openai;
mod output;
mod scripted;
mod signature;
pub mod structured;
mod traits;

pub use anthropic::AnthropicOracle;
pub use openai::OpenAiOracle;
pub use output::OracleFields;
pub use scripted::ScriptedOracle;
pub use signature::{
    FieldSpec, Instruction, Operation, Signature, CLASSIFY, EVALUATE, EXPLAIN, SUMMARIZE,
    TRANSLATE,
};
pub use traits::{
    Oracle, OracleConfig, OracleError, OracleProvider, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
};

/// Create an oracle for the configured provider
pub fn create_oracle(config: OracleConfig) -> Result<Box<dyn Oracle>, OracleError> {
    match config.provider {
        OracleProvider::Anthropic => Ok(Box::new(AnthropicOracle::new(config)?)),
        OracleProvider::OpenAi => Ok(Box::new(OpenAiOracle::new(config)?)),
    }
}
