//! Citation extraction from free-form answers
//!
//! Every parenthesized span is a citation group. A group holds one or more
//! clauses separated by `and` or commas, each of the form
//! `page <n>[, para <m>[-<k>]]`. Clauses that don't match are dropped.

use regex::Regex;
use std::sync::OnceLock;

use crate::types::response::{Citation, NO_PARAGRAPH};

fn group_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\(([^()]*)\)").expect("Invalid regex"))
}

fn conjunction_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\band\b").expect("Invalid regex"))
}

fn clause_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^pages?\s*(\d+)(?:\s*,\s*para(?:graph)?s?\.?\s*(\d+)(?:\s*[-–]\s*(\d+))?)?")
            .expect("Invalid regex")
    })
}

fn starts_with_page(fragment: &str) -> bool {
    fragment
        .trim_start()
        .get(..4)
        .map(|head| head.eq_ignore_ascii_case("page"))
        .unwrap_or(false)
}

/// Parses `(page N, para M)` style citations
#[derive(Debug, Default, Clone, Copy)]
pub struct CitationParser;

impl CitationParser {
    /// Extract citations in order of appearance
    pub fn parse(answer: &str) -> Vec<Citation> {
        let mut citations = Vec::new();

        for group in group_pattern().captures_iter(answer) {
            let raw_text = group.get(0).map(|m| m.as_str()).unwrap_or_default();
            let inner = group.get(1).map(|m| m.as_str()).unwrap_or_default();

            for clause in Self::clauses(inner) {
                if let Some(citation) = Self::parse_clause(&clause, raw_text) {
                    citations.push(citation);
                }
            }
        }

        citations
    }

    /// Split a group into clauses.
    ///
    /// A comma fragment that doesn't start a new `page` reference continues
    /// the previous clause, so `page 2, para 3` stays whole while
    /// `page 2, page 5` splits in two.
    fn clauses(inner: &str) -> Vec<String> {
        let mut clauses: Vec<String> = Vec::new();

        for part in conjunction_pattern().split(inner) {
            let mut current: Option<String> = None;
            for fragment in part.split(',') {
                match current.as_mut() {
                    Some(clause) if !starts_with_page(fragment) => {
                        clause.push(',');
                        clause.push_str(fragment);
                    }
                    _ => {
                        if let Some(done) = current.take() {
                            clauses.push(done);
                        }
                        current = Some(fragment.to_string());
                    }
                }
            }
            clauses.extend(current);
        }

        clauses
    }

    fn parse_clause(clause: &str, raw_text: &str) -> Option<Citation> {
        let caps = clause_pattern().captures(clause.trim())?;
        let page = caps.get(1)?.as_str().to_string();

        let paragraph = match (caps.get(2), caps.get(3)) {
            (Some(start), Some(end)) => format!("{}-{}", start.as_str(), end.as_str()),
            (Some(start), None) => start.as_str().to_string(),
            _ => NO_PARAGRAPH.to_string(),
        };

        Some(Citation {
            page,
            paragraph,
            raw_text: raw_text.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(citations: &[Citation]) -> Vec<(&str, &str)> {
        citations
            .iter()
            .map(|c| (c.page.as_str(), c.paragraph.as_str()))
            .collect()
    }

    #[test]
    fn test_two_groups() {
        let citations = CitationParser::parse("See (page 2, para 3) and (page 4, para 1-2).");

        assert_eq!(pairs(&citations), vec![("2", "3"), ("4", "1-2")]);
        assert_eq!(citations[0].raw_text, "(page 2, para 3)");
        assert_eq!(citations[1].raw_text, "(page 4, para 1-2)");
    }

    #[test]
    fn test_no_parentheses() {
        assert!(CitationParser::parse("Page 2, para 3 says so.").is_empty());
        assert!(CitationParser::parse("").is_empty());
    }

    #[test]
    fn test_multiple_clauses_share_raw_text() {
        let citations = CitationParser::parse("Revenue grew (Page 1, Para 2 and page 7).");

        assert_eq!(pairs(&citations), vec![("1", "2"), ("7", "N/A")]);
        assert!(citations
            .iter()
            .all(|c| c.raw_text == "(Page 1, Para 2 and page 7)"));
    }

    #[test]
    fn test_comma_separated_pages() {
        let citations = CitationParser::parse("(page 2, page 5, para 4)");
        assert_eq!(pairs(&citations), vec![("2", "N/A"), ("5", "4")]);
    }

    #[test]
    fn test_non_matching_clauses_are_dropped() {
        let citations =
            CitationParser::parse("Costs (see appendix) rose (roughly 4%) (p. 3) (page 9).");
        assert_eq!(pairs(&citations), vec![("9", "N/A")]);
    }

    #[test]
    fn test_paragraph_spelling_variants() {
        let citations = CitationParser::parse("(page 3, paragraph 6) (page 8, para. 2 - 4)");
        assert_eq!(pairs(&citations), vec![("3", "6"), ("8", "2-4")]);
    }

    #[test]
    fn test_order_follows_text() {
        let citations = CitationParser::parse("(page 9) then (page 1) then (page 5, para 5)");
        assert_eq!(pairs(&citations), vec![("9", "N/A"), ("1", "N/A"), ("5", "5")]);
    }
}
