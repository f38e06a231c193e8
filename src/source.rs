//! Seams to the external collaborators around the index.
//!
//! Text never enters the index. An [`Embedder`] turns text into vectors on
//! the build side, and on the query side a [`Translator`] first brings the
//! query into the corpus language. Both are opaque: their failures are
//! surfaced unchanged as [`GroveDbError::Embedding`] and
//! [`GroveDbError::Translation`] and never retried here.

use crate::constants::source::DEFAULT_TARGET_LANGUAGE;
use crate::error::{BoxError, GroveDbError, Result};
use crate::index::{ForestIndex, SearchResult};
use tracing::debug;

/// Deterministic text-to-vector function.
pub trait Embedder: Send + Sync {
    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;

    /// Embed one piece of text.
    fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, BoxError>;
}

/// Text translation service.
pub trait Translator: Send + Sync {
    /// Translate `text` into `target_language`.
    fn translate(&self, text: &str, target_language: &str) -> std::result::Result<String, BoxError>;
}

/// Reduce markup-bearing text to a plain, lowercase token stream.
///
/// Tags are dropped, a handful of common entities are decoded, and anything
/// other than ASCII letters, digits and whitespace is removed.
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '<' => {
                // Skip to the end of the tag; an unterminated tag eats the rest.
                for c in chars.by_ref() {
                    if c == '>' {
                        break;
                    }
                }
                // Tags separate words ("<p>a</p><p>b</p>").
                out.push(' ');
            }
            '&' => {
                let mut entity = String::new();
                while let Some(&next) = chars.peek() {
                    if next == ';' || entity.len() > 8 || !(next.is_ascii_alphanumeric() || next == '#') {
                        break;
                    }
                    entity.push(next);
                    chars.next();
                }
                if chars.peek() == Some(&';') {
                    chars.next();
                    if let Some(decoded) = decode_entity(&entity) {
                        push_normalized(&mut out, decoded);
                    }
                } else {
                    // Not an entity: keep the word, drop the ampersand.
                    entity.chars().for_each(|c| push_normalized(&mut out, c));
                }
            }
            c => push_normalized(&mut out, c),
        }
    }

    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = entity.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

fn push_normalized(out: &mut String, c: char) {
    if c.is_ascii_alphanumeric() {
        out.push(c.to_ascii_lowercase());
    } else if c.is_whitespace() {
        out.push(c);
    }
}

/// Lazily normalize and embed at most `limit` texts.
///
/// Texts past the limit are never pulled from `texts`. Each produced vector
/// is checked against the embedder's declared dimension.
pub fn embed_corpus<'a, I, S, E>(
    texts: I,
    embedder: &'a E,
    limit: usize,
) -> impl Iterator<Item = Result<Vec<f32>>> + 'a
where
    I: IntoIterator<Item = S>,
    I::IntoIter: 'a,
    S: AsRef<str> + 'a,
    E: Embedder + ?Sized,
{
    texts.into_iter().take(limit).map(move |text| {
        let normalized = normalize_text(text.as_ref());
        let vector = embedder.embed(&normalized).map_err(GroveDbError::Embedding)?;
        if vector.len() != embedder.dimension() {
            return Err(GroveDbError::dimension_mismatch(
                embedder.dimension(),
                vector.len(),
            ));
        }
        Ok(vector)
    })
}

/// Online half of the system: translate, embed, query.
pub struct QueryPipeline<'a, T: ?Sized, E: ?Sized> {
    translator: &'a T,
    embedder: &'a E,
    index: &'a ForestIndex,
    target_language: String,
}

impl<'a, T, E> QueryPipeline<'a, T, E>
where
    T: Translator + ?Sized,
    E: Embedder + ?Sized,
{
    /// Create a pipeline translating into the default target language.
    pub fn new(translator: &'a T, embedder: &'a E, index: &'a ForestIndex) -> Self {
        Self {
            translator,
            embedder,
            index,
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
        }
    }

    /// Translate queries into `language` instead.
    pub fn with_target_language(mut self, language: impl Into<String>) -> Self {
        self.target_language = language.into();
        self
    }

    /// Find the `k` corpus items closest to a free-text query.
    pub fn search_text(&self, text: &str, k: usize) -> Result<Vec<SearchResult>> {
        let translated = self
            .translator
            .translate(text, &self.target_language)
            .map_err(GroveDbError::Translation)?;
        let vector = self
            .embedder
            .embed(&translated)
            .map_err(GroveDbError::Embedding)?;
        debug!(query_len = text.len(), translated_len = translated.len(), "text query embedded");
        self.index.search(&vector, k)
    }
}
