//! Result Normalizer: turns raw design-service text into a [`RobotDesign`].
//!
//! Models wrap JSON in prose, markdown fences, or both. Extraction runs an ordered chain of
//! [`Extractor`] strategies; each candidate gets a strict JSON decode and the first object wins.
//! Field defaults are applied only after a successful decode, so a response with no parseable
//! object at all is a [`GenerationError::ResponseFormat`], never a fabricated design.

use serde_json::{Map, Value};

use crate::design::RobotDesign;
use crate::error::{ForgeResult, GenerationError};

const FENCE: &str = "```";

/// One strategy for locating a JSON candidate inside free text.
pub trait Extractor: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    /// Candidate slices of `raw` in preference order; empty when this strategy finds nothing.
    fn candidates<'a>(&self, raw: &'a str) -> Vec<&'a str>;
}

/// Contents of fenced blocks tagged `json`, then of untagged fences.
/// Blocks tagged with another language (```python, ...) are never candidates.
pub struct FencedBlock;

impl Extractor for FencedBlock {
    fn name(&self) -> &'static str {
        "fenced_block"
    }

    fn candidates<'a>(&self, raw: &'a str) -> Vec<&'a str> {
        let blocks = fenced_blocks(raw);
        let tagged = blocks.iter().filter(|(tag, _)| tag.eq_ignore_ascii_case("json"));
        let untagged = blocks.iter().filter(|(tag, _)| tag.is_empty());
        tagged.chain(untagged).map(|(_, body)| *body).collect()
    }
}

/// Splits `raw` into `(tag, body)` pairs for every closed fence.
///
/// An opening fence counts only at the start of a line (leading whitespace allowed), so
/// backticks inside a JSON string value or inline prose never open a block.
fn fenced_blocks(raw: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(found) = raw[pos..].find(FENCE) {
        let open = pos + found;
        let line_start = raw[..open].rfind('\n').map_or(0, |nl| nl + 1);
        if !raw[line_start..open].trim().is_empty() {
            pos = open + FENCE.len();
            continue;
        }
        let body_start = open + FENCE.len();
        let Some(close) = raw[body_start..].find(FENCE) else {
            break;
        };
        let block = &raw[body_start..body_start + close];
        let tag_len = block
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(block.len());
        out.push((&block[..tag_len], &block[tag_len..]));
        pos = body_start + close + FENCE.len();
    }
    out
}

/// Balanced top-level `{ ... }` spans, first one first. String literals and escapes are
/// honored, so braces inside values do not shift the depth count.
pub struct BalancedObject;

impl Extractor for BalancedObject {
    fn name(&self) -> &'static str {
        "balanced_object"
    }

    fn candidates<'a>(&self, raw: &'a str) -> Vec<&'a str> {
        let mut out = Vec::new();
        let mut search_from = 0;
        while let Some(offset) = raw[search_from..].find('{') {
            let start = search_from + offset;
            match balanced_end(&raw[start..]) {
                Some(len) => {
                    out.push(&raw[start..start + len]);
                    search_from = start + len;
                }
                None => search_from = start + 1,
            }
        }
        out
    }
}

/// Byte length of the object starting at `s[0] == '{'`, or `None` if it never closes.
fn balanced_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Last resort: the whole text.
pub struct RawText;

impl Extractor for RawText {
    fn name(&self) -> &'static str {
        "raw_text"
    }

    fn candidates<'a>(&self, raw: &'a str) -> Vec<&'a str> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed]
        }
    }
}

/// Removes fence markers left over around a candidate.
fn strip_fences(candidate: &str) -> &str {
    let trimmed = candidate.trim();
    let cleaned = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```JSON"))
        .or_else(|| trimmed.strip_prefix(FENCE))
        .unwrap_or(trimmed);
    cleaned.strip_suffix(FENCE).unwrap_or(cleaned).trim()
}

/// Ordered extraction chain plus defaulting. Cheap to share behind an `Arc`.
pub struct ResultNormalizer {
    extractors: Vec<Box<dyn Extractor>>,
}

impl Default for ResultNormalizer {
    fn default() -> Self {
        Self {
            extractors: vec![
                Box::new(FencedBlock),
                Box::new(BalancedObject),
                Box::new(RawText),
            ],
        }
    }
}

impl ResultNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy; it runs after the existing ones.
    pub fn with_extractor(mut self, extractor: impl Extractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }

    /// Run the chain without applying defaults. `None` when no candidate decodes to an object.
    ///
    /// The first object carrying at least one design field wins; an object with none of them
    /// (`{}`, a stray settings map) is used only when nothing better turns up.
    pub fn extract_object(&self, raw: &str) -> Option<Map<String, Value>> {
        let mut fallback = None;
        for extractor in &self.extractors {
            for candidate in extractor.candidates(raw) {
                match serde_json::from_str::<Value>(strip_fences(candidate)) {
                    Ok(Value::Object(obj)) if RobotDesign::has_known_field(&obj) => {
                        tracing::debug!(strategy = extractor.name(), "design payload extracted");
                        return Some(obj);
                    }
                    Ok(Value::Object(obj)) => {
                        tracing::debug!(strategy = extractor.name(), "object has no design fields");
                        if fallback.is_none() {
                            fallback = Some(obj);
                        }
                    }
                    Ok(_) => {
                        tracing::debug!(strategy = extractor.name(), "candidate is not a JSON object");
                    }
                    Err(e) => {
                        tracing::debug!(strategy = extractor.name(), error = %e, "candidate rejected");
                    }
                }
            }
        }
        fallback
    }

    /// Raw design text in, fully-defaulted [`RobotDesign`] out.
    pub fn normalize(&self, raw: &str) -> ForgeResult<RobotDesign> {
        if raw.trim().is_empty() {
            return Err(GenerationError::UpstreamEmpty(
                "design service returned an empty body".to_string(),
            ));
        }
        match self.extract_object(raw) {
            Some(obj) => Ok(RobotDesign::from_value(&obj)),
            None => {
                tracing::warn!(raw = %raw, "design payload has no parseable JSON object");
                Err(GenerationError::ResponseFormat {
                    raw: raw.to_string(),
                })
            }
        }
    }
}
