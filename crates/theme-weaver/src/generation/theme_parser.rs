//! Line state machine turning free-form theme analysis into `Theme` records

use regex::Regex;
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};

use crate::error::Result;
use crate::providers::knowledge_store::{KnowledgeStore, Metadata, StoreRecord};
use crate::types::response::Theme;

/// Theme under construction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThemeDraft {
    pub name: String,
    pub description: Option<String>,
    pub evidence: Vec<String>,
    pub collecting_evidence: bool,
}

impl ThemeDraft {
    fn named(name: String) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }
}

/// Parser state
#[derive(Debug, Default, PartialEq)]
pub enum ParserState {
    #[default]
    NoActiveTheme,
    BuildingTheme(ThemeDraft),
}

/// Text of a line that is a `#` heading or fully wrapped in `**`
fn heading_text(line: &str) -> &str {
    if line.starts_with('#') {
        return line.trim_start_matches('#').trim_start();
    }
    match line.strip_prefix("**").and_then(|rest| rest.strip_suffix("**")) {
        Some(inner) => inner.trim(),
        None => line,
    }
}

/// Theme name if `line` opens a new theme
fn theme_name(line: &str) -> Option<String> {
    let marker = heading_text(line);
    if !(marker.starts_with("Theme:") || marker.starts_with("Theme ")) {
        return None;
    }

    let name = match marker.split_once(':') {
        Some((_, rest)) => rest,
        None => &marker["Theme ".len()..],
    };
    Some(name.trim().to_string())
}

fn is_evidence_marker(line: &str) -> bool {
    let marker = heading_text(line);
    marker.starts_with("Evidence:") || marker.starts_with("Supporting evidence:")
}

impl ParserState {
    /// Consume one line, returning a theme this line closed
    pub fn feed(&mut self, line: &str) -> Option<ThemeDraft> {
        let line = line.trim();

        if let Some(name) = theme_name(line) {
            let closed = std::mem::take(self).finish();
            *self = ParserState::BuildingTheme(ThemeDraft::named(name));
            return closed;
        }

        if let ParserState::BuildingTheme(draft) = self {
            if is_evidence_marker(line) {
                draft.collecting_evidence = true;
                draft.evidence.clear();
            } else if line.is_empty() {
                // blank lines never carry content
            } else if draft.collecting_evidence {
                draft.evidence.push(line.to_string());
            } else if draft.description.is_none() {
                draft.description = Some(line.to_string());
            }
        }
        None
    }

    /// Close the open theme at end of input
    pub fn finish(self) -> Option<ThemeDraft> {
        match self {
            ParserState::NoActiveTheme => None,
            ParserState::BuildingTheme(draft) => Some(draft),
        }
    }
}

fn document_ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^-\s*(Document\s+\d+|[\w.\-]+)\s*:").expect("Invalid regex")
    })
}

/// Distinct document tokens cited by evidence lines, first-seen order
pub fn referenced_documents(evidence: &[String]) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();
    for line in evidence {
        if let Some(caps) = document_ref_pattern().captures(line) {
            let token = caps[1].to_string();
            if !refs.contains(&token) {
                refs.push(token);
            }
        }
    }
    refs
}

/// Id of the `ordinal`th theme of a parse call
pub fn theme_id(scope_tag: &str, ordinal: usize) -> String {
    format!("{}_theme_{}", scope_tag, ordinal)
}

/// Rebuild a theme from the record it was persisted as
pub fn theme_from_record(record: StoreRecord) -> Theme {
    let field = |key: &str| {
        record
            .metadata
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let name = field("name");
    let evidence_lines: Vec<String> = field("evidence").lines().map(str::to_string).collect();

    Theme {
        referenced_document_ids: referenced_documents(&evidence_lines),
        theme_id: record.id,
        name,
        description: record.text,
        evidence_lines,
    }
}

/// Parses theme analysis text and persists each theme as it closes
pub struct ThemeResponseParser {
    store: Arc<dyn KnowledgeStore>,
}

impl ThemeResponseParser {
    /// Create a parser writing into `store`
    pub fn new(store: Arc<dyn KnowledgeStore>) -> Self {
        Self { store }
    }

    /// Parse `text` into themes tagged with `scope_tag`.
    ///
    /// Ordinals restart at 1 on every call, so callers pass a fresh scope
    /// tag to avoid overwriting earlier themes. A store failure aborts the
    /// parse; themes closed before it stay persisted.
    pub async fn parse(&self, text: &str, scope_tag: &str) -> Result<Vec<Theme>> {
        let mut state = ParserState::default();
        let mut themes = Vec::new();

        for line in text.lines() {
            if let Some(draft) = state.feed(line) {
                let theme = self.finalize(draft, scope_tag, themes.len() + 1).await?;
                themes.push(theme);
            }
        }
        if let Some(draft) = state.finish() {
            let theme = self.finalize(draft, scope_tag, themes.len() + 1).await?;
            themes.push(theme);
        }

        tracing::info!("Parsed {} themes for scope '{}'", themes.len(), scope_tag);
        Ok(themes)
    }

    async fn finalize(&self, draft: ThemeDraft, scope_tag: &str, ordinal: usize) -> Result<Theme> {
        let theme = Theme {
            theme_id: theme_id(scope_tag, ordinal),
            referenced_document_ids: referenced_documents(&draft.evidence),
            name: draft.name,
            description: draft.description.unwrap_or_default(),
            evidence_lines: draft.evidence,
        };

        let mut metadata = Metadata::new();
        metadata.insert("name".to_string(), json!(theme.name));
        metadata.insert("timestamp".to_string(), json!(scope_tag));
        metadata.insert("evidence".to_string(), json!(theme.evidence_lines.join("\n")));

        self.store
            .put(&theme.theme_id, &theme.description, metadata)
            .await?;
        Ok(theme)
    }
}
