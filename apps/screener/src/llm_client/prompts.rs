// Cross-cutting prompt fragments. Prompts specific to one call live in that module's prompts.rs.

/// System prompt fragment for calls that send a JSON schema as the `format` constraint.
/// Small local models still wrap output in prose or fences without it.
pub const JSON_ONLY_SYSTEM: &str = "Answer with a single JSON object that matches the \
    requested schema. Write nothing before or after the object, no markdown fences, \
    no commentary.";
