//! Prompt construction for trend questions.

use crate::rag::core::document::IndexDocument;

/// Separator between documents in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Instruction template; `{context}` and `{question}` are substituted.
pub const RAG_PROMPT_TEMPLATE: &str = "You are a helpful digital talent manager. Use the following context to answer the user's question:

Context in the format of (ranking, source, title, datetime): {context}

Question: {question}

Answer:";

/// Join document contents in retrieval order.
#[must_use]
pub fn build_context(documents: &[IndexDocument]) -> String {
    documents
        .iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Fill the template with a context block and the question.
#[must_use]
pub fn build_prompt(context: &str, question: &str) -> String {
    // Single pass so braces inside the context are never re-expanded.
    let mut out = String::with_capacity(RAG_PROMPT_TEMPLATE.len() + context.len() + question.len());
    let mut rest = RAG_PROMPT_TEMPLATE;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{context}") {
            out.push_str(context);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{question}") {
            out.push_str(question);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
