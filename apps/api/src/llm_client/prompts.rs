// Cross-cutting prompt fragments. Each service that calls the LLM keeps its
// own prompts.rs alongside it.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every extraction prompt so the model does not fill gaps.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    CRITICAL: Only report information present in the document. \
    Do NOT infer, interpolate, or invent details. \
    When a value is unknown, use an empty string or an empty array, never null.";
