//! Prompt material: the system instruction and the retrieval context block.

use sdk::types::{flatten_themes, RetrievalHit};

/// Instruction placed at the head of every transcript
pub const SYSTEM_PROMPT: &str = "Ești un asistent bibliotecar. Folosește contextul RAG pentru a recomanda O SINGURĂ carte potrivită cererii utilizatorului. După ce alegi titlul, emite un apel de funcție `get_summary_by_title` cu titlul exact. Ton: concis, prietenos.";

/// Context block used when retrieval finds nothing
pub const NO_CONTEXT: &str = "Context (RAG): none";

/// Render retrieval hits as the system message injected after a user message.
///
/// One line per hit, in retrieval order:
/// `- <title>: <document> (themes: <a, b>)`
pub fn render_context(hits: &[RetrievalHit]) -> String {
    if hits.is_empty() {
        return NO_CONTEXT.to_string();
    }

    let lines: Vec<String> = hits
        .iter()
        .map(|hit| {
            format!(
                "- {}: {} (themes: {})",
                hit.metadata.title,
                hit.document,
                flatten_themes(&hit.metadata.themes)
            )
        })
        .collect();

    format!("Context (RAG):\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_hits() {
        assert_eq!(render_context(&[]), "Context (RAG): none");
    }

    #[test]
    fn test_hits_render_one_line_each() {
        let hits = vec![
            RetrievalHit::new(
                "A hobbit leaves home with dwarves.",
                "The Hobbit",
                vec!["friendship".to_string(), "adventure".to_string()],
            ),
            RetrievalHit::new("A boy learns he is a wizard.", "Harry Potter", vec![]),
        ];

        assert_eq!(
            render_context(&hits),
            "Context (RAG):\n\
             - The Hobbit: A hobbit leaves home with dwarves. (themes: friendship, adventure)\n\
             - Harry Potter: A boy learns he is a wizard. (themes: )"
        );
    }
}
