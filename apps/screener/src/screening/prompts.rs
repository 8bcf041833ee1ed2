// Prompt text for the screening decision. Rule wording lives here and is filled
// from `EvaluationRules` constants, never from request-time input.

/// System prompt for the decision call. Append `llm_client::prompts::JSON_ONLY_SYSTEM`.
pub const DECISION_SYSTEM: &str = "You are an expert and very strict AI Recruitment Agent. \
    You analyze a candidate's resume against a specific job description and apply the \
    evaluation rules exactly as written.";

/// Decision prompt template.
/// Replace: {context}, {resume_text}, {rules}, {schema_hint}
pub const DECISION_PROMPT_TEMPLATE: &str = r#"Here is the relevant context from the job description:
{context}

Here is the candidate's resume:
{resume_text}

**Evaluation Rules (Follow these strictly):**
{rules}

**Your Tasks:**
1. Provide a decision: 'SELECTED' or 'REJECTED'.
2. Provide a compatibility score (integer, 0-100).
3. Report whether the mandatory requirements are met and how many of the candidate's projects match the required skills.
4. Provide a concise, professional justification for your decision in four sentences, explaining how you applied the rules.

**Output format:**
Return ONE JSON object that conforms to this JSON schema (no extra text):
{schema_hint}"#;

/// Shown in place of the job context when retrieval returned nothing.
pub const NO_CONTEXT_MARKER: &str = "(no job description context was retrieved)";

/// Rule 1. No placeholders.
pub const RULE_REQUIREMENTS: &str = "**Mandatory Requirements Check**: The candidate MUST meet \
    the requirements specified in the job description. If they do not meet the requirements, \
    they must be 'REJECTED' regardless of other factors.";

/// Rule 2. Replace: {skills_percent}
pub const RULE_SKILLS: &str = "**Skills Check**: The candidate MUST possess at least \
    {skills_percent}% of the skills listed in the job description. If they do not, they must \
    be 'REJECTED'.";

/// Rule 3. Replace: {threshold}
pub const RULE_SCORING: &str = "**Scoring and Final Decision**: If the candidate fails the \
    Mandatory Requirements or Skills Check, the decision is 'REJECTED'. If the candidate passes \
    both checks, evaluate their overall profile (experience, projects, etc.) to assign a \
    compatibility score from 0 to 100. A candidate is 'SELECTED' only if they pass both checks \
    AND their compatibility score is {threshold} or higher. Otherwise, they are 'REJECTED'.";

/// Rule 4. Replace: {min_projects}
pub const RULE_PROJECTS: &str = "**Projects**: The candidate must have at least {min_projects} \
    projects that match the technical skill requirements.";

/// Appended to the prompt on the single schema re-prompt.
/// Replace: {violation}
pub const SCHEMA_CORRECTION_TEMPLATE: &str = r#"

**Correction:** Your previous response was rejected because it did not match the required schema: {violation}
Respond again with ONE JSON object that matches the schema exactly."#;
