// Shared prompt fragments. Feature prompts live in their own prompts.rs.

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured quotation assistant. \
    You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to every structured prompt so the schema never sees nulls.
pub const NO_NULLS_INSTRUCTION: &str = "\
    IMPORTANTE: si algún campo no aplica o no hay información suficiente, \
    devuelve un string vacío \"\" o una lista vacía []. Nunca devuelvas null.";
