// Shared prompt fragments. Feature modules keep their own prompts.rs alongside
// the code that sends them; this file holds the cross-cutting pieces.

/// Appended to prompts whose completion is shown to the user verbatim.
pub const NO_META_COMMENTARY: &str = "\
    The output must be ready to use without any additional instructions or explanations. \
    Do not add notes, headings or remarks before or after the requested content.";
