//! # Insight API
//!
//! Natural-language questions over a store's synced data. A chat model
//! turns the question into SQL; static guards validate it, scope every
//! table reference to the calling store, and cap the row count before
//! anything executes. SQL failures are folded into the answer; model
//! transport failures surface as errors.

pub mod engine;
pub mod error;
pub mod guard;
pub mod llm;
pub mod router;

pub use engine::{plan, InsightAnswer, InsightEngine, SqlPlan};
pub use error::InsightError;
pub use llm::{ChatModel, LlmError, OpenAiCompatClient};
pub use router::insight_router;
