//! Prompt templates for grounded answering.

use crate::store::ScoredRecord;

/// Join retrieved chunk texts into one context block.
pub fn render_context(retrieved: &[ScoredRecord]) -> String {
    retrieved
        .iter()
        .map(|record| record.document.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Template for single-pass answers and the first pass of refinement.
///
/// Instructs the model to stay inside the supplied context and to admit
/// when the context does not contain the answer.
pub fn grounded_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant. Use the following pieces of context to answer the question at the end.\n\
         If you don't know the answer, just say so.\n\n\
         Context:\n{context}\n\n\
         Question: {question}\n"
    )
}

/// Template for one refinement step: the existing answer plus one new
/// piece of context.
pub fn refine_prompt(question: &str, existing_answer: &str, context: &str) -> String {
    format!(
        "The original question is as follows: {question}\n\
         We have provided an existing answer: {existing_answer}\n\
         We have the opportunity to refine the existing answer with some more context below.\n\
         ------------\n\
         {context}\n\
         ------------\n\
         Given the new context, refine the original answer to better answer the question. \
         If the context isn't useful, return the existing answer unchanged.\n"
    )
}
