//! Text normalization for RAG ingestion.
//!
//! Cleans raw (possibly HTML-flavoured) text into plain text in a fixed order:
//! 1. Decode character and entity references
//! 2. Remove markup, replacing every tag with a single space
//! 3. Normalize bullet glyphs to a `- ` marker
//! 4. Remove boilerplate (copyright lines, page numbers, header/footer labels)
//! 5. Collapse whitespace
//! 6. Trim
//!
//! Markup removal is regex based. A DOM text walk concatenates adjacent text nodes
//! (`<p>A</p><p>B</p>` becomes `AB`), which is exactly what step 2 must avoid.

use std::borrow::Cow;

use regex::Regex;
use serde_json::Value;

use super::document::RawDocument;

/// Upper bound on full pipeline passes while searching for a fixed point.
const MAX_PASSES: usize = 8;

/// Whitespace that is not a line break (spaces, tabs, NBSP, other Unicode blanks).
const HSPACE: &str = r"[^\S\r\n]";

/// Stateless text normalizer. Build once and share; all patterns are compiled up front.
#[derive(Debug, Clone)]
pub struct Normalizer {
    patterns: Patterns,
}

#[derive(Debug, Clone)]
struct Patterns {
    script_style: Regex,
    comment: Regex,
    tag: Regex,
    bullet_glyph: Regex,
    star_bullet: Regex,
    double_dash: Regex,
    line_dash: Regex,
    boilerplate: Vec<Regex>,
    header_footer_line: Regex,
    hspace_run: Regex,
    newline_padding: Regex,
    newline_run: Regex,
}

impl Patterns {
    fn new() -> Self {
        Self {
            script_style: compile(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>"),
            comment: compile(r"(?s)<!--.*?-->"),
            tag: compile(r"</?[A-Za-z][^<>]*>|<[!?][^<>]*>"),
            bullet_glyph: compile(r"[•●▪◦◆■]"),
            star_bullet: compile(&format!(r"\*{HSPACE}+")),
            double_dash: compile(&format!(r"-(?:{HSPACE}*-)+")),
            line_dash: compile(&format!(r"(?m)^{HSPACE}*-{HSPACE}*")),
            boilerplate: vec![
                compile(&format!(r"(?i)(?:copyright|©){HSPACE}*(?:©{HSPACE}*)?\d{{4}}")),
                compile(r"(?i)all rights reserved\.?"),
                compile(r"(?i)\bconfidential\b"),
                compile(&format!(
                    r"(?i)\bpage{HSPACE}+\d+(?:{HSPACE}+of{HSPACE}+\d+)?\b"
                )),
            ],
            header_footer_line: compile(&format!(
                r"(?im)^{HSPACE}*(?:header|footer)(?:{HSPACE}*:[^\r\n]*|{HSPACE}+[|\-–—][^\r\n]*|{HSPACE}*)\r?$"
            )),
            hspace_run: compile(&format!(r"{HSPACE}+")),
            newline_padding: compile(r" ?\n ?"),
            newline_run: compile(r"\n{2,}"),
        }
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("normalizer pattern must compile")
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            patterns: Patterns::new(),
        }
    }

    /// Cleans one raw text value. Never fails; `normalize(normalize(x)) == normalize(x)`.
    pub fn normalize(&self, text: &str) -> String {
        let mut current = self.clean_once(text);
        for _ in 1..MAX_PASSES {
            let next = self.clean_once(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// Normalizes a mixed batch of plain strings and `{content|text, ...}` records.
    ///
    /// Strings stay strings. Records keep every other field untouched and in
    /// place; `content` wins over `text` when both are present. Anything else
    /// passes through as-is.
    pub fn normalize_all(&self, items: &[Value]) -> Vec<Value> {
        items.iter().map(|item| self.normalize_item(item)).collect()
    }

    /// Typed counterpart of [`normalize_all`](Self::normalize_all).
    pub fn normalize_documents(&self, documents: &[RawDocument]) -> Vec<RawDocument> {
        documents
            .iter()
            .map(|doc| RawDocument {
                text: self.normalize(&doc.text),
                metadata: doc.metadata.clone(),
            })
            .collect()
    }

    fn normalize_item(&self, item: &Value) -> Value {
        match item {
            Value::String(text) => Value::String(self.normalize(text)),
            Value::Object(record) => {
                let field = ["content", "text"]
                    .into_iter()
                    .find(|key| record.get(*key).is_some_and(Value::is_string));
                let Some(field) = field else {
                    tracing::debug!("Record without a text field left unchanged");
                    return item.clone();
                };
                let mut record = record.clone();
                if let Some(Value::String(text)) = record.get_mut(field) {
                    *text = self.normalize(text);
                }
                Value::Object(record)
            }
            other => other.clone(),
        }
    }

    fn clean_once(&self, text: &str) -> String {
        let decoded = decode_entities(text);
        let stripped = self.strip_markup(&decoded);
        let bulleted = self.normalize_bullets(&stripped);
        let cleaned = self.remove_boilerplate(&bulleted);
        let collapsed = self.collapse_whitespace(&cleaned);
        collapsed.trim().to_string()
    }

    fn strip_markup(&self, text: &str) -> String {
        let p = &self.patterns;
        let mut output = p.script_style.replace_all(text, " ").into_owned();
        output = p.comment.replace_all(&output, " ").into_owned();
        // Removing one tag can expose another (`<<b>b>`), so repeat until stable.
        loop {
            match p.tag.replace_all(&output, " ") {
                Cow::Borrowed(_) => break,
                Cow::Owned(next) => output = next,
            }
        }
        output
    }

    fn normalize_bullets(&self, text: &str) -> String {
        let p = &self.patterns;
        let output = p.bullet_glyph.replace_all(text, "-");
        let output = p.star_bullet.replace_all(&output, "- ");
        let output = p.double_dash.replace_all(&output, "-");
        p.line_dash.replace_all(&output, "- ").into_owned()
    }

    fn remove_boilerplate(&self, text: &str) -> String {
        let p = &self.patterns;
        let mut output = text.to_string();
        for pattern in &p.boilerplate {
            if let Cow::Owned(next) = pattern.replace_all(&output, "") {
                output = next;
            }
        }
        p.header_footer_line.replace_all(&output, "").into_owned()
    }

    fn collapse_whitespace(&self, text: &str) -> String {
        let p = &self.patterns;
        let output = text.replace('\r', "");
        let output = p.hspace_run.replace_all(&output, " ");
        let output = p.newline_padding.replace_all(&output, "\n");
        p.newline_run.replace_all(&output, "\n").into_owned()
    }
}

/// Decodes entity references until none remain, so `&amp;lt;` ends up as `<`.
fn decode_entities(text: &str) -> String {
    let mut output = text.to_string();
    loop {
        match html_escape::decode_html_entities(&output) {
            Cow::Owned(next) if next != output => output = next,
            _ => break,
        }
    }
    output
}
