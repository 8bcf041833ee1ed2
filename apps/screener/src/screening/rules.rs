//! Evaluation rules — the fixed checks every decision is held to, and the deterministic
//! skill matcher that backs the skills-coverage check.
//!
//! The model is told these rules in natural language, but the engine re-applies them in
//! code: the categorical decision is always derived from `EvaluationRules::assess`.

use std::fmt;

use crate::screening::prompts::{RULE_PROJECTS, RULE_REQUIREMENTS, RULE_SCORING, RULE_SKILLS};

/// One deterministic check, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuleCheck {
    RequirementsMatch,
    SkillsCoverage { min_ratio: f32 },
    ProjectCount { min_projects: u32 },
}

/// Constant for the process lifetime. Use `EvaluationRules::standard()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationRules {
    pub min_skill_coverage: f32,
    pub min_matching_projects: u32,
    pub score_threshold: u8,
}

/// Why a candidate cannot be SELECTED.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckFailure {
    RequirementsNotMet,
    SkillsCoverage { ratio: f32, required: f32 },
    ProjectCount { found: u32, required: u32 },
    ScoreBelowThreshold { score: u8, threshold: u8 },
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckFailure::RequirementsNotMet => write!(f, "mandatory requirements not met"),
            CheckFailure::SkillsCoverage { ratio, required } => write!(
                f,
                "skills coverage {:.0}% is below the required {:.0}%",
                ratio * 100.0,
                required * 100.0
            ),
            CheckFailure::ProjectCount { found, required } => write!(
                f,
                "{found} matching project(s) found, at least {required} required"
            ),
            CheckFailure::ScoreBelowThreshold { score, threshold } => write!(
                f,
                "compatibility score {score} is below the threshold of {threshold}"
            ),
        }
    }
}

impl EvaluationRules {
    pub const fn standard() -> Self {
        Self {
            min_skill_coverage: 0.5,
            min_matching_projects: 2,
            score_threshold: 80,
        }
    }

    pub fn checks(&self) -> [RuleCheck; 3] {
        [
            RuleCheck::RequirementsMatch,
            RuleCheck::SkillsCoverage {
                min_ratio: self.min_skill_coverage,
            },
            RuleCheck::ProjectCount {
                min_projects: self.min_matching_projects,
            },
        ]
    }

    /// The four rules as numbered natural-language paragraphs, in prompt order.
    pub fn describe(&self) -> String {
        let skills_percent = format!("{:.0}", self.min_skill_coverage * 100.0);
        [
            RULE_REQUIREMENTS.to_string(),
            RULE_SKILLS.replace("{skills_percent}", &skills_percent),
            RULE_SCORING.replace("{threshold}", &self.score_threshold.to_string()),
            RULE_PROJECTS.replace("{min_projects}", &self.min_matching_projects.to_string()),
        ]
        .iter()
        .enumerate()
        .map(|(i, rule)| format!("{}. {}", i + 1, rule))
        .collect::<Vec<_>>()
        .join("\n")
    }

    /// Applies every check plus the score threshold. An empty result means SELECTED.
    /// `matching_projects == None` skips the project check.
    pub fn assess(
        &self,
        score: u8,
        requirements_met: bool,
        skills: &SkillCoverage,
        matching_projects: Option<u32>,
    ) -> Vec<CheckFailure> {
        let mut failures = Vec::new();

        for check in self.checks() {
            match check {
                RuleCheck::RequirementsMatch => {
                    if !requirements_met {
                        failures.push(CheckFailure::RequirementsNotMet);
                    }
                }
                RuleCheck::SkillsCoverage { min_ratio } => {
                    if skills.ratio < min_ratio {
                        failures.push(CheckFailure::SkillsCoverage {
                            ratio: skills.ratio,
                            required: min_ratio,
                        });
                    }
                }
                RuleCheck::ProjectCount { min_projects } => {
                    if let Some(found) = matching_projects {
                        if found < min_projects {
                            failures.push(CheckFailure::ProjectCount {
                                found,
                                required: min_projects,
                            });
                        }
                    }
                }
            }
        }

        if score < self.score_threshold {
            failures.push(CheckFailure::ScoreBelowThreshold {
                score,
                threshold: self.score_threshold,
            });
        }

        failures
    }
}

impl Default for EvaluationRules {
    fn default() -> Self {
        Self::standard()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Skill matching
// ────────────────────────────────────────────────────────────────────────────

/// Which of the job's skills the resume demonstrates.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillCoverage {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    /// matched / total. 1.0 when the job lists no skills.
    pub ratio: f32,
}

/// Case-insensitive, trimmed, boundary-aware skill matching against resume text.
///
/// Both sides are normalised: lowercase, and runs of `-`, `_` and whitespace collapse to a
/// single space, so "Problem-solving" matches "problem solving". A skill only matches on
/// alphanumeric boundaries: "java" does not match inside "javascript", while "c++" still
/// matches "C++17".
pub fn skill_coverage(job_skills: &[String], resume_text: &str) -> SkillCoverage {
    let resume = normalize(resume_text);

    let mut seen: Vec<String> = Vec::new();
    let mut matched = Vec::new();
    let mut missing = Vec::new();

    for skill in job_skills {
        let key = normalize(skill);
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        if contains_term(&resume, &key) {
            matched.push(skill.trim().to_string());
        } else {
            missing.push(skill.trim().to_string());
        }
        seen.push(key);
    }

    let total = matched.len() + missing.len();
    let ratio = if total == 0 {
        1.0
    } else {
        matched.len() as f32 / total as f32
    };

    SkillCoverage {
        matched,
        missing,
        ratio,
    }
}

fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_whitespace() || c == '-' || c == '_' {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.extend(c.to_lowercase());
    }
    out
}

fn contains_term(haystack: &str, needle: &str) -> bool {
    let starts_alnum = needle.chars().next().is_some_and(char::is_alphanumeric);
    let ends_alnum = needle.chars().last().is_some_and(char::is_alphanumeric);

    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before_ok = !starts_alnum
            || haystack[..start]
                .chars()
                .last()
                .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = !ends_alnum
            || haystack[end..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}
