//! Prompt assembly.

use std::path::Path;

use crate::index::SearchHit;

/// Instruction prepended to every generation request.
pub const SYSTEM_INSTRUCTION: &str = "You are a study assistant answering questions about a \
collection of documents. Answer using only the context below. If the context does not contain \
the answer, say that you do not know. Mention the document names you relied on.";

/// Render the final user prompt: instruction, labeled context, question.
///
/// Prior turns are sent to the model as separate messages.
#[must_use]
pub fn build_prompt(question: &str, context: &[SearchHit<'_>]) -> String {
    let mut prompt = String::with_capacity(
        SYSTEM_INSTRUCTION.len()
            + question.len()
            + context.iter().map(|h| h.window.text.len() + 32).sum::<usize>(),
    );

    prompt.push_str(SYSTEM_INSTRUCTION);
    prompt.push_str("\n\nContext:\n");

    if context.is_empty() {
        prompt.push_str("(no matching documents)\n");
    }
    for hit in context {
        let name = Path::new(&hit.window.source)
            .file_name()
            .map_or_else(|| hit.window.source.clone(), |n| n.to_string_lossy().into_owned());
        prompt.push_str(&format!("[{name}]\n{}\n\n", hit.window.text.trim()));
    }

    prompt.push_str(&format!("\nQuestion: {}", question.trim()));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexedWindow;

    fn window(source: &str, text: &str) -> IndexedWindow {
        IndexedWindow {
            source: source.to_string(),
            index: 0,
            text: text.to_string(),
            embedding: vec![1.0],
        }
    }

    #[test]
    fn test_prompt_labels_context_by_file_name() {
        let a = window("/docs/os/a.pdf", "Paging splits memory into frames.");
        let b = window("/docs/b.pdf", "Segmentation uses variable sizes.");
        let hits = [
            SearchHit { window: &a, score: 0.9 },
            SearchHit { window: &b, score: 0.5 },
        ];

        let prompt = build_prompt("What is paging?", &hits);
        assert!(prompt.starts_with(SYSTEM_INSTRUCTION));
        assert!(prompt.contains("[a.pdf]\nPaging splits memory into frames."));
        assert!(prompt.contains("[b.pdf]\nSegmentation uses variable sizes."));
        assert!(prompt.ends_with("Question: What is paging?"));
        assert!(prompt.find("[a.pdf]") < prompt.find("[b.pdf]"));
    }

    #[test]
    fn test_prompt_without_context() {
        let prompt = build_prompt("anything?", &[]);
        assert!(prompt.contains("(no matching documents)"));
    }
}
