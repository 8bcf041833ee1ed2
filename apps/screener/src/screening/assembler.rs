//! Prompt assembly — builds the exact instruction text sent to the generative model.
//!
//! Order is fixed: job context, resume text, the four evaluation rules, then the output
//! schema. No I/O happens here; the same inputs always produce the same prompt.

use crate::errors::AppError;
use crate::screening::index::ContextBlock;
use crate::screening::prompts::{DECISION_PROMPT_TEMPLATE, NO_CONTEXT_MARKER};
use crate::screening::rules::EvaluationRules;

/// The single text artifact sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub text: String,
}

pub struct PromptAssembler;

impl PromptAssembler {
    /// Fails with `InvalidInput` when the resume text or schema hint is empty.
    /// An empty context block is allowed and rendered as an explicit marker.
    pub fn build(
        context: &ContextBlock,
        resume_text: &str,
        rules: &EvaluationRules,
        schema_hint: &str,
    ) -> Result<Prompt, AppError> {
        if resume_text.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "resume text cannot be empty".to_string(),
            ));
        }
        if schema_hint.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "schema hint cannot be empty".to_string(),
            ));
        }

        let context_text = if context.is_empty() {
            NO_CONTEXT_MARKER.to_string()
        } else {
            context.text()
        };
        let rules_text = rules.describe();

        let text = fill_template(
            DECISION_PROMPT_TEMPLATE,
            &[
                ("context", context_text.trim()),
                ("resume_text", resume_text.trim()),
                ("rules", &rules_text),
                ("schema_hint", schema_hint.trim()),
            ],
        );

        Ok(Prompt { text })
    }
}

/// Substitutes `{key}` placeholders in a single pass over the template, so braces inside
/// substituted values (resume text, JSON schema) are never re-expanded.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replacement = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match replacement {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screening::engine::schema_hint;

    fn context(text: &str) -> ContextBlock {
        ContextBlock {
            chunks: vec![text.to_string()],
        }
    }

    #[test]
    fn test_sections_appear_in_fixed_order() {
        let prompt = PromptAssembler::build(
            &context("job_title: Backend Engineer"),
            "Jane Doe, Rust developer",
            &EvaluationRules::standard(),
            &schema_hint(),
        )
        .unwrap();

        let text = &prompt.text;
        let context_at = text.find("job_title: Backend Engineer").unwrap();
        let resume_at = text.find("Jane Doe, Rust developer").unwrap();
        let rules_at = text.find("1. **Mandatory Requirements Check**").unwrap();
        let rule4_at = text.find("4. **Projects**").unwrap();
        let schema_at = text.find("\"compatibility_score\"").unwrap();

        assert!(context_at < resume_at);
        assert!(resume_at < rules_at);
        assert!(rules_at < rule4_at);
        assert!(rule4_at < schema_at);
    }

    #[test]
    fn test_same_inputs_same_prompt() {
        let build = || {
            PromptAssembler::build(
                &context("ctx"),
                "resume",
                &EvaluationRules::standard(),
                &schema_hint(),
            )
            .unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_empty_resume_is_invalid_input() {
        let err = PromptAssembler::build(
            &context("ctx"),
            "  \n",
            &EvaluationRules::standard(),
            &schema_hint(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_empty_schema_hint_is_invalid_input() {
        let err =
            PromptAssembler::build(&context("ctx"), "resume", &EvaluationRules::standard(), "")
                .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_empty_context_uses_marker() {
        let prompt = PromptAssembler::build(
            &ContextBlock::default(),
            "resume",
            &EvaluationRules::standard(),
            &schema_hint(),
        )
        .unwrap();
        assert!(prompt.text.contains(NO_CONTEXT_MARKER));
    }

    #[test]
    fn test_placeholders_in_resume_are_not_expanded() {
        let prompt = PromptAssembler::build(
            &context("ctx"),
            "My template skills: {rules} and {schema_hint}",
            &EvaluationRules::standard(),
            &schema_hint(),
        )
        .unwrap();
        assert!(prompt
            .text
            .contains("My template skills: {rules} and {schema_hint}"));
    }

    #[test]
    fn test_fill_template_leaves_unknown_braces() {
        let out = fill_template("a {x} b {unknown} c {", &[("x", "1")]);
        assert_eq!(out, "a 1 b {unknown} c {");
    }
}
