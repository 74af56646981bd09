use serde::Serialize;

/// Fixed grounding instructions placed at the top of every prompt.
pub const SYSTEM_INSTRUCTION: &str = "\
SYSTEM INSTRUCTIONS:
You are a knowledgeable and helpful assistant.
Your role is to answer the user's query accurately using ONLY the provided context.

CONSTRAINTS & GENERATION STYLE:
1. **Strict Grounding**: Answer ONLY with information found in the \"CONTEXT\" section. Do not use outside knowledge.
2. **No Fabrication**: If the answer is not in the context, reply exactly: \"I cannot answer this question based on the provided context.\" Never invent an answer.
3. **Citations**: Cite every source you use. When drawing on a context record, reference its source label (e.g., [Source: Title/Filename]).
4. **Tone**: Professional, concise, and direct.
5. **Formatting**: Use Markdown for readability (bullet points, bold text for key terms).";

/// Context block used when there is nothing to ground the answer on.
pub const EMPTY_CONTEXT: &str = "No context provided.";

/// Marks where the generated answer begins.
pub const ANSWER_CUE: &str = "ANSWER:";

/// An assembled prompt and its parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub system_instruction: String,
    pub query: String,
    pub context_block: String,
    pub full_text: String,
}

impl Prompt {
    pub fn new(query: &str, context_block: String) -> Self {
        let full_text = render(SYSTEM_INSTRUCTION, query, &context_block);
        Self {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            query: query.to_string(),
            context_block,
            full_text,
        }
    }

    /// Length of `full_text` in characters.
    pub fn len(&self) -> usize {
        self.full_text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.full_text.is_empty()
    }
}

pub(crate) fn render(system_instruction: &str, query: &str, context_block: &str) -> String {
    format!(
        "{system_instruction}\n\nUSER QUERY:\n\"{query}\"\n\nCONTEXT:\n{context_block}\n\n{ANSWER_CUE}"
    )
}
