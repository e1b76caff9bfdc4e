//! Linking by entity names and vocabularies.
//!
//! Each [`Entity`] contributes its name plus its vocabulary as surface
//! terms. End-to-end, the linker scans the text for whole-word occurrences
//! of every term; otherwise it types the mentions already on the document.
//!
//! | Match | Score |
//! |-------|-------|
//! | exact case | 1.0 |
//! | case-insensitive | 0.8 |
//! | term inside a mention (mention mode only) | 0.6 |

use super::Linker;
use crate::document::Document;
use crate::{Entity, Result, Span};

const EXACT: f64 = 1.0;
const CASELESS: f64 = 0.8;
const PARTIAL: f64 = 0.6;

/// String-matching linker over entity names and vocabularies.
#[derive(Debug, Clone)]
pub struct VocabularyLinker {
    entities: Vec<Entity>,
    end2end: bool,
}

impl Default for VocabularyLinker {
    fn default() -> Self {
        Self::new()
    }
}

impl VocabularyLinker {
    /// End-to-end linker (scans raw text).
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            end2end: true,
        }
    }

    /// Linker that only types existing mentions.
    #[must_use]
    pub fn for_mentions() -> Self {
        Self {
            entities: Vec::new(),
            end2end: false,
        }
    }

    fn terms(entity: &Entity) -> impl Iterator<Item = &str> {
        std::iter::once(entity.name.as_str())
            .chain(entity.vocabulary.iter().flatten().map(String::as_str))
            .filter(|t| !t.is_empty())
    }

    fn lower(chars: &[char]) -> Vec<char> {
        chars
            .iter()
            .map(|c| c.to_lowercase().next().unwrap_or(*c))
            .collect()
    }

    fn scan(&self, doc: &Document) -> Vec<Span> {
        let text: Vec<char> = doc.text.chars().collect();
        let lowered = Self::lower(&text);
        let mut spans = Vec::new();

        for entity in &self.entities {
            for term in Self::terms(entity) {
                let needle: Vec<char> = term.chars().collect();
                for start in find_words(&lowered, &Self::lower(&needle)) {
                    let end = start + needle.len();
                    let score = if text[start..end] == needle[..] { EXACT } else { CASELESS };
                    spans.push(Span::scored(start, end, entity.name.clone(), score));
                }
            }
        }
        spans.sort_by_key(Span::bounds);
        spans
    }

    fn type_mentions(&self, doc: &Document) -> Vec<Span> {
        doc.mentions
            .iter()
            .filter_map(|mention| {
                let surface = doc.span_text(mention).to_lowercase();
                let mut best: Option<(f64, &Entity)> = None;
                for entity in &self.entities {
                    for term in Self::terms(entity) {
                        let term = term.to_lowercase();
                        let score = if surface == term {
                            EXACT
                        } else if surface.contains(&term) {
                            PARTIAL
                        } else {
                            continue;
                        };
                        if best.map_or(true, |(s, _)| score > s) {
                            best = Some((score, entity));
                        }
                    }
                }
                best.map(|(score, entity)| {
                    Span::scored(mention.start, mention.end, entity.name.clone(), score)
                })
            })
            .collect()
    }
}

/// Start offsets of whole-word occurrences of `needle` in `haystack`.
fn find_words(haystack: &[char], needle: &[char]) -> Vec<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return Vec::new();
    }
    let boundary = |idx: Option<&char>| idx.map_or(true, |c| !c.is_alphanumeric());
    (0..=haystack.len() - needle.len())
        .filter(|&i| haystack[i..i + needle.len()] == *needle)
        .filter(|&i| {
            let before = i.checked_sub(1).and_then(|p| haystack.get(p));
            boundary(before) && boundary(haystack.get(i + needle.len()))
        })
        .collect()
}

impl Linker for VocabularyLinker {
    fn name(&self) -> &str {
        "vocabulary"
    }

    fn set_kg(&mut self, entities: &[Entity]) {
        self.entities = entities.to_vec();
    }

    fn entities(&self) -> &[Entity] {
        &self.entities
    }

    fn predict(&self, docs: &[Document]) -> Result<Vec<Vec<Span>>> {
        Ok(docs
            .iter()
            .map(|doc| {
                if self.end2end {
                    self.scan(doc)
                } else {
                    self.type_mentions(doc)
                }
            })
            .collect())
    }

    fn is_end2end(&self) -> bool {
        self.end2end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fruit_kg() -> Vec<Entity> {
        vec![
            Entity::new("fruits", "edible plant parts").with_vocabulary(["apple", "pear"]),
            Entity::new("city", "a large town").with_vocabulary(["Paris"]),
        ]
    }

    #[test]
    fn test_scan_whole_words() {
        let mut linker = VocabularyLinker::new();
        linker.set_kg(&fruit_kg());
        let doc = Document::from_text("An Apple in paris, not pineapple");
        let spans = linker.predict(&[doc]).unwrap().remove(0);

        assert_eq!(
            spans,
            [Span::scored(3, 8, "fruits", CASELESS), Span::scored(12, 17, "city", CASELESS)]
        );
    }

    #[test]
    fn test_exact_case_scores_higher() {
        let mut linker = VocabularyLinker::new();
        linker.set_kg(&fruit_kg());
        let spans = linker.predict(&[Document::from_text("Paris")]).unwrap().remove(0);
        assert_eq!(spans, [Span::scored(0, 5, "city", EXACT)]);
    }

    #[test]
    fn test_type_mentions() {
        let mut linker = VocabularyLinker::for_mentions();
        linker.set_kg(&fruit_kg());
        assert!(!linker.is_end2end());

        let mut doc = Document::from_text("Green Apple and Paris and Bob");
        doc.mentions = vec![Span::new(0, 11), Span::new(16, 21), Span::new(26, 29)];
        let spans = linker.predict(&[doc]).unwrap().remove(0);
        assert_eq!(
            spans,
            [Span::scored(0, 11, "fruits", PARTIAL), Span::scored(16, 21, "city", EXACT)]
        );
    }

    #[test]
    fn test_find_words() {
        let hay: Vec<char> = "a cat, cats".chars().collect();
        let needle: Vec<char> = "cat".chars().collect();
        assert_eq!(find_words(&hay, &needle), [2]);
        assert!(find_words(&needle, &hay).is_empty());
    }
}
