use std::collections::{BTreeMap, BTreeSet, HashMap};
use crate::analysis::analyzer::Analyzer;
use crate::analysis::token::Token;
use crate::core::error::Result;
use crate::core::types::{DocId, Document, FieldValue};
use crate::index::definition::IndexDefinition;
use crate::index::posting::{Posting, PostingList};
use crate::index::{IndexStats, SecondaryIndex};
use crate::query::text::TextQuery;
use crate::query::types::DeadlineGuard;
use crate::scoring::scorer::{idf, DocStats, Scorer};

/// Position gap between fields (and array elements) so phrases never
/// match across a boundary
pub const FIELD_POSITION_GAP: u32 = 100;

/// Inverted index over the analyzed text of one or more string fields
pub struct TextIndex {
    pub definition: IndexDefinition,
    pub analyzer: Analyzer,
    pub postings: HashMap<String, PostingList>,
    pub doc_lengths: HashMap<DocId, u32>,
    pub doc_terms: HashMap<DocId, Vec<String>>,
}

impl TextIndex {
    pub fn new(definition: IndexDefinition, analyzer: Analyzer) -> Self {
        TextIndex {
            definition,
            analyzer,
            postings: HashMap::new(),
            doc_lengths: HashMap::new(),
            doc_terms: HashMap::new(),
        }
    }

    /// Analyzed tokens of every indexed field, or None if the document
    /// has none of them
    fn tokens_for(&self, doc: &Document) -> Option<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut present = false;
        let mut base = 0u32;

        let mut push = |text: &str, tokens: &mut Vec<Token>| {
            let analyzed = self.analyzer.analyze_from(text, base);
            let last = analyzed.iter().map(|t| t.position).max().unwrap_or(base);
            base = last + FIELD_POSITION_GAP;
            tokens.extend(analyzed);
        };

        for field in &self.definition.fields {
            match doc.get_field(&field.name) {
                Some(FieldValue::Text(text)) => {
                    present = true;
                    push(text, &mut tokens);
                }
                Some(FieldValue::List(items)) => {
                    present = true;
                    for item in items {
                        push(item, &mut tokens);
                    }
                }
                _ => {}
            }
        }

        present.then_some(tokens)
    }

    fn analyzed_terms(&self, words: &[String]) -> BTreeSet<String> {
        words.iter()
            .flat_map(|w| self.analyzer.analyze(w))
            .map(|t| t.text)
            .collect()
    }

    /// Documents in the index
    pub fn doc_count(&self) -> u64 {
        self.doc_lengths.len() as u64
    }

    pub fn doc_freq(&self, term: &str) -> u32 {
        self.postings.get(term).map(|p| p.doc_freq()).unwrap_or(0)
    }

    /// Whether the analyzed phrase occurs in `doc_id` with the same relative
    /// token positions
    fn phrase_matches(&self, doc_id: DocId, phrase: &[Token]) -> bool {
        let Some(first) = phrase.first() else {
            return true;
        };
        let Some(first_posting) = self.postings.get(&first.text).and_then(|p| p.get(doc_id)) else {
            return false;
        };

        let mut rest = Vec::with_capacity(phrase.len() - 1);
        for token in &phrase[1..] {
            let Some(posting) = self.postings.get(&token.text).and_then(|p| p.get(doc_id)) else {
                return false;
            };
            rest.push((token.position - first.position, posting));
        }

        first_posting.positions.iter().any(|start| {
            rest.iter().all(|(delta, posting)| posting.positions.binary_search(&(start + delta)).is_ok())
        })
    }

    /// Matching documents with their relevance, ascending by id.
    ///
    /// A document matches if it contains any positive term, every phrase,
    /// and no negated term or phrase. The guard is ticked once per candidate.
    pub fn search(&self, query: &TextQuery, scorer: &dyn Scorer, guard: &mut DeadlineGuard) -> Result<Vec<(DocId, f32)>> {
        let phrases: Vec<Vec<Token>> = query.phrases.iter()
            .map(|p| self.analyzer.analyze(p))
            .filter(|tokens| !tokens.is_empty())
            .collect();
        let negated_phrases: Vec<Vec<Token>> = query.negated_phrases.iter()
            .map(|p| self.analyzer.analyze(p))
            .filter(|tokens| !tokens.is_empty())
            .collect();

        let mut positive = self.analyzed_terms(&query.terms);
        positive.extend(phrases.iter().flatten().map(|t| t.text.clone()));
        let negated = self.analyzed_terms(&query.negated_terms);

        let candidates: BTreeSet<DocId> = positive.iter()
            .filter_map(|term| self.postings.get(term))
            .flat_map(|list| list.doc_ids())
            .collect();

        let total_docs = self.doc_count();
        let mut results = Vec::new();
        for doc_id in candidates {
            guard.tick()?;
            if !phrases.iter().all(|p| self.phrase_matches(doc_id, p)) {
                continue;
            }
            let excluded = negated.iter()
                .any(|term| self.postings.get(term).is_some_and(|list| list.get(doc_id).is_some()));
            if excluded || negated_phrases.iter().any(|p| self.phrase_matches(doc_id, p)) {
                continue;
            }

            let stats = DocStats {
                doc_length: self.doc_lengths.get(&doc_id).copied().unwrap_or(0),
                total_docs,
            };
            // BTreeSet order keeps floating point summation deterministic
            let score: f32 = positive.iter()
                .filter_map(|term| {
                    let list = self.postings.get(term)?;
                    let posting = list.get(doc_id)?;
                    Some(scorer.score(posting.term_freq, idf(total_docs, list.doc_freq()), &stats))
                })
                .sum();
            results.push((doc_id, score));
        }
        Ok(results)
    }
}

impl SecondaryIndex for TextIndex {
    fn definition(&self) -> &IndexDefinition {
        &self.definition
    }

    fn insert(&mut self, doc: &Document) -> Result<()> {
        if self.doc_lengths.contains_key(&doc.id) {
            self.remove(doc);
        }
        let Some(tokens) = self.tokens_for(doc) else {
            return Ok(());
        };

        let mut term_positions: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        for token in &tokens {
            term_positions.entry(token.text.clone())
                .or_default()
                .push(token.position);
        }

        let mut terms = Vec::with_capacity(term_positions.len());
        for (term, mut positions) in term_positions {
            positions.sort_unstable();
            let posting = Posting {
                doc_id: doc.id,
                term_freq: positions.len() as u32,
                positions,
            };
            self.postings.entry(term.clone())
                .or_default()
                .add_posting(posting);
            terms.push(term);
        }

        self.doc_lengths.insert(doc.id, tokens.len() as u32);
        self.doc_terms.insert(doc.id, terms);
        Ok(())
    }

    fn remove(&mut self, doc: &Document) {
        let Some(terms) = self.doc_terms.remove(&doc.id) else {
            return;
        };
        for term in terms {
            if let Some(list) = self.postings.get_mut(&term) {
                list.remove(doc.id);
                if list.is_empty() {
                    self.postings.remove(&term);
                }
            }
        }
        self.doc_lengths.remove(&doc.id);
    }

    fn contains(&self, doc_id: DocId) -> bool {
        self.doc_lengths.contains_key(&doc_id)
    }

    fn stats(&self) -> IndexStats {
        IndexStats {
            name: self.definition.name.clone(),
            kind: self.definition.kind,
            documents: self.doc_lengths.len(),
            entries: self.postings.values().map(|p| p.len() as u64).sum(),
            distinct_keys: self.postings.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FieldMap;
    use crate::scoring::scorer::TfIdfScorer;

    fn doc(id: u64, description: &str) -> Document {
        let mut fields = FieldMap::new();
        fields.insert("description".to_string(), description.into());
        Document::new(DocId(id), fields)
    }

    fn index_with(docs: &[(u64, &str)]) -> TextIndex {
        let mut index = TextIndex::new(IndexDefinition::text(&["description"]), Analyzer::english());
        for (id, text) in docs {
            index.insert(&doc(*id, text)).unwrap();
        }
        index
    }

    fn search(index: &TextIndex, query: &str) -> Vec<(DocId, f32)> {
        let mut guard = DeadlineGuard::new(None, 1);
        index.search(&TextQuery::parse(query), &TfIdfScorer, &mut guard).unwrap()
    }

    fn ids(hits: &[(DocId, f32)]) -> Vec<u64> {
        hits.iter().map(|(id, _)| id.0).collect()
    }

    #[test]
    fn terms_are_or_ed_and_stemmed() {
        let index = index_with(&[
            (1, "Loves running in the park"),
            (2, "Coffee enthusiast"),
            (3, "Nothing relevant"),
        ]);
        let hits = search(&index, "runs coffee");
        assert_eq!(ids(&hits), vec![1, 2]);
    }

    #[test]
    fn phrase_requires_adjacent_words() {
        let index = index_with(&[
            (1, "open source maintainer"),
            (2, "source code that is open"),
        ]);
        let hits = search(&index, "\"open source\"");
        assert_eq!(ids(&hits), vec![1]);
    }

    #[test]
    fn negation_excludes() {
        let index = index_with(&[(1, "tea and coffee"), (2, "just coffee")]);
        let hits = search(&index, "coffee -tea");
        assert_eq!(ids(&hits), vec![2]);
    }

    #[test]
    fn repeated_terms_score_higher() {
        let index = index_with(&[(1, "rust"), (2, "rust rust rust"), (3, "go")]);
        let hits = search(&index, "rust");
        assert!(hits[1].1 > hits[0].1);
    }

    #[test]
    fn remove_forgets_terms() {
        let mut index = index_with(&[(1, "unique word")]);
        index.remove(&doc(1, "unique word"));
        assert!(index.postings.is_empty());
        assert!(index.doc_lengths.is_empty());
        assert!(search(&index, "unique").is_empty());
    }

    #[test]
    fn documents_without_the_field_are_not_indexed() {
        let mut index = index_with(&[]);
        index.insert(&Document::new(DocId(9), FieldMap::new())).unwrap();
        assert_eq!(index.doc_count(), 0);
    }

    #[test]
    fn expired_deadline_stops_the_search() {
        let index = index_with(&[(1, "coffee"), (2, "more coffee")]);
        let past = std::time::Instant::now().checked_sub(std::time::Duration::from_secs(1)).unwrap();
        let mut guard = DeadlineGuard::new(Some(past), 64);
        let err = index.search(&TextQuery::parse("coffee"), &TfIdfScorer, &mut guard).unwrap_err();
        assert_eq!(err.kind, crate::core::error::ErrorKind::DeadlineExceeded);
    }
}
