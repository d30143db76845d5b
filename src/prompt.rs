//! Prompt Builder
//!
//! Joins the fixed schema prefix with one question and the answer sentinel.

use crate::schema_context::prompt_prefix;

/// Sentinel that invites the model to complete a single statement.
pub const ANSWER_SENTINEL: &str = "Ответ:";
pub const QUESTION_LABEL: &str = "Вопрос:";

pub fn build_prompt(question: &str) -> String {
    build_prompt_with_prefix(prompt_prefix(), question)
}

pub fn build_prompt_with_prefix(prefix: &str, question: &str) -> String {
    format!(
        "{}\n\n{} {}\n{}",
        prefix,
        QUESTION_LABEL,
        question,
        ANSWER_SENTINEL
    )
}
