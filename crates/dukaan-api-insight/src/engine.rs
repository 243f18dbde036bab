//! The question-to-answer pipeline.
//!
//! Generate SQL, validate it, scope it to the store, execute, then
//! summarize. Everything before execution is pure ([`plan`]), which
//! keeps the guard behavior testable without a database.

use dukaan_core::StoreId;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;

use crate::guard::{
    apply_row_cap, scope_to_store, validate_sql, CANNOT_ANSWER, SAFETY_RULES, SCHEMA_PROMPT,
};
use crate::llm::{ChatModel, LlmError};

/// Rows handed back to the model for summarization.
const SUMMARY_ROW_LIMIT: usize = 20;

const SQL_MAX_TOKENS: u32 = 512;
const ANSWER_MAX_TOKENS: u32 = 300;

/// Full result of one question.
#[derive(Debug, Serialize)]
pub struct InsightAnswer {
    pub question: String,
    pub answer: String,
    pub sql_used: Option<String>,
    pub data: Vec<Value>,
}

/// What to do with the model's SQL response.
#[derive(Debug, PartialEq, Eq)]
pub enum SqlPlan {
    /// Model declined; answer without executing anything.
    CannotAnswer,
    /// Deny-list hit; answer without executing anything.
    Blocked,
    /// Safe to run. `raw` is reported to the caller, `scoped` is what
    /// actually executes.
    Execute { raw: String, scoped: String },
}

/// Classifies the model's SQL response and, when it is runnable,
/// produces the store-scoped, row-capped statement.
#[must_use]
pub fn plan(raw_sql: &str, store_id: StoreId) -> SqlPlan {
    let raw = raw_sql.trim();
    if raw.eq_ignore_ascii_case(CANNOT_ANSWER) {
        return SqlPlan::CannotAnswer;
    }
    if !validate_sql(raw) {
        return SqlPlan::Blocked;
    }
    let scoped = apply_row_cap(&scope_to_store(raw, store_id.into_uuid()));
    SqlPlan::Execute {
        raw: raw.to_string(),
        scoped,
    }
}

pub struct InsightEngine {
    llm: Arc<dyn ChatModel>,
    pool: PgPool,
}

impl InsightEngine {
    pub fn new(llm: Arc<dyn ChatModel>, pool: PgPool) -> Self {
        Self { llm, pool }
    }

    /// Answers one question against one store's data. Model transport
    /// errors propagate; SQL execution errors come back as the answer.
    pub async fn ask(&self, question: &str, store_id: StoreId) -> Result<InsightAnswer, LlmError> {
        let sql_prompt = format!("{SCHEMA_PROMPT}\n{SAFETY_RULES}\n\nQuestion: {question}\n\nSQL:");
        let raw_sql = self.llm.complete(&sql_prompt, SQL_MAX_TOKENS).await?;

        let (raw, scoped) = match plan(&raw_sql, store_id) {
            SqlPlan::CannotAnswer => {
                return Ok(InsightAnswer {
                    question: question.to_string(),
                    answer: "I can't answer that with the available data.".to_string(),
                    sql_used: None,
                    data: Vec::new(),
                });
            }
            SqlPlan::Blocked => {
                tracing::warn!(%store_id, "Blocked unsafe generated SQL");
                return Ok(InsightAnswer {
                    question: question.to_string(),
                    answer: "Query was blocked for safety reasons.".to_string(),
                    sql_used: None,
                    data: Vec::new(),
                });
            }
            SqlPlan::Execute { raw, scoped } => (raw, scoped),
        };

        let rows = match self.execute(&scoped).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("SQL execution error: {} | SQL: {}", e, scoped);
                return Ok(InsightAnswer {
                    question: question.to_string(),
                    answer: format!("SQL error: {e}"),
                    sql_used: Some(raw),
                    data: Vec::new(),
                });
            }
        };

        let sample = serde_json::to_string(&rows[..rows.len().min(SUMMARY_ROW_LIMIT)])
            .unwrap_or_else(|_| "[]".to_string());
        let answer_prompt = format!(
            "Question: {question}\n\nData (JSON):\n{sample}\n\n\
             Provide a concise, friendly answer in 1-3 sentences. Use \u{20b9} for currency. \
             Round numbers sensibly. Refer to 'your store' not 'the store'."
        );
        let answer = self.llm.complete(&answer_prompt, ANSWER_MAX_TOKENS).await?;

        Ok(InsightAnswer {
            question: question.to_string(),
            answer,
            sql_used: Some(raw),
            data: rows,
        })
    }

    /// Runs the scoped statement and returns its rows as JSON objects.
    async fn execute(&self, scoped_sql: &str) -> Result<Vec<Value>, sqlx::Error> {
        let wrapped = format!(
            "SELECT COALESCE(json_agg(row_to_json(result)), '[]'::json) FROM ({scoped_sql}) AS result"
        );
        let (rows,): (Value,) = sqlx::query_as(&wrapped).fetch_one(&self.pool).await?;
        match rows {
            Value::Array(items) => Ok(items),
            other => Ok(vec![other]),
        }
    }
}
