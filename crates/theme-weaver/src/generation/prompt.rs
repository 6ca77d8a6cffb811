//! Prompt templates for per-document answers and theme analysis

/// System instruction for per-document answers
pub const DOCUMENT_QA_SYSTEM: &str =
    "You answer document-based questions with accurate citations.";

/// System instruction for theme identification
pub const THEME_SYSTEM: &str = "You are a theme identification expert. \
Analyze documents and identify common themes with supporting evidence.";

/// A document handed to theme analysis
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeInput {
    /// Label used in evidence lines, e.g. `Document 2` or `DOC002`
    pub label: String,
    /// Document text
    pub text: String,
}

/// First `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Prompt builder
pub struct PromptBuilder;

impl PromptBuilder {
    /// Prompt asking one question against one document
    pub fn document_question(question: &str, document_text: &str, max_chars: usize) -> String {
        let mut prompt = String::new();

        prompt.push_str("You are an assistant answering user questions based on a document.\n\n");
        prompt.push_str("Document:\n");
        prompt.push_str(truncate_chars(document_text, max_chars));
        prompt.push_str("\n\n");
        prompt.push_str("User Question: ");
        prompt.push_str(question);
        prompt.push_str("\n\n");
        prompt.push_str("Please answer the question using only the information in the document. ");
        prompt.push_str(
            "Include a brief citation in parentheses, e.g. (page 2, para 3), where applicable.",
        );

        prompt
    }

    /// Prompt asking for themes shared across documents
    pub fn theme_analysis(documents: &[ThemeInput], excerpt_chars: usize) -> String {
        let mut prompt =
            String::from("Analyze the following document excerpts and identify common themes:\n\n");

        for doc in documents {
            prompt.push_str(&format!(
                "{}:\n{}...\n\n",
                doc.label,
                truncate_chars(&doc.text, excerpt_chars)
            ));
        }

        prompt.push_str(
            "\nIdentify and explain the main themes present across these documents. For each theme:\n",
        );
        prompt.push_str("1. Start a line with \"Theme: <name>\"\n");
        prompt.push_str("2. Explain the theme on the next line\n");
        prompt.push_str("3. Add a line \"Evidence:\" followed by lines of the form ");
        prompt.push_str("\"- <document label>: <supporting evidence>\"\n");

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_document_question_truncates() {
        let text = "x".repeat(5000);
        let prompt = PromptBuilder::document_question("What happened?", &text, 3000);

        assert!(prompt.contains(&"x".repeat(3000)));
        assert!(!prompt.contains(&"x".repeat(3001)));
        assert!(prompt.contains("User Question: What happened?"));
        assert!(prompt.contains("(page 2, para 3)"));
    }

    #[test]
    fn test_theme_analysis_labels() {
        let docs = vec![
            ThemeInput {
                label: "Document 1".to_string(),
                text: "alpha".to_string(),
            },
            ThemeInput {
                label: "DOC002".to_string(),
                text: "beta".to_string(),
            },
        ];
        let prompt = PromptBuilder::theme_analysis(&docs, 1000);

        assert!(prompt.contains("Document 1:\nalpha...\n\n"));
        assert!(prompt.contains("DOC002:\nbeta...\n\n"));
        assert!(prompt.contains("Theme: <name>"));
    }
}
