use std::fmt;
use std::sync::Arc;
use rust_stemmers::Algorithm;
use crate::analysis::filter::TokenFilter;
use crate::analysis::filters::lowercase::LowercaseFilter;
use crate::analysis::filters::stemmer::StemmerFilter;
use crate::analysis::filters::stopword::StopWordFilter;
use crate::analysis::token::Token;
use crate::analysis::tokenizer::{Tokenizer, WordTokenizer};

/// Text analysis pipeline. Documents and `$search` strings must go
/// through the same one or their terms will not line up.
#[derive(Clone)]
pub struct Analyzer {
    name: &'static str,
    tokenizer: Arc<dyn Tokenizer>,
    filters: Vec<Arc<dyn TokenFilter>>,
}

impl Analyzer {
    pub fn new(name: &'static str, tokenizer: impl Tokenizer + 'static) -> Self {
        Analyzer {
            name,
            tokenizer: Arc::new(tokenizer),
            filters: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: impl TokenFilter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokens = self.tokenizer.tokenize(text);
        for filter in &self.filters {
            filter.apply(&mut tokens);
        }
        tokens
    }

    /// Like `analyze`, with every position shifted by `base`; used to keep
    /// separate fields and array elements apart inside one text index
    pub fn analyze_from(&self, text: &str, base: u32) -> Vec<Token> {
        let mut tokens = self.analyze(text);
        for token in &mut tokens {
            token.position += base;
        }
        tokens
    }

    /// Lowercase, English stop words, English Snowball stemmer
    pub fn english() -> Self {
        Analyzer::new("english", WordTokenizer::default())
            .with_filter(LowercaseFilter)
            .with_filter(StopWordFilter::english())
            .with_filter(StemmerFilter::new(Algorithm::English))
    }

    /// Lowercase only
    pub fn simple() -> Self {
        Analyzer::new("simple", WordTokenizer::default()).with_filter(LowercaseFilter)
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "english" => Some(Analyzer::english()),
            "simple" => Some(Analyzer::simple()),
            _ => None,
        }
    }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filters: Vec<&str> = self.filters.iter().map(|filter| filter.name()).collect();
        f.debug_struct("Analyzer")
            .field("name", &self.name)
            .field("tokenizer", &self.tokenizer.name())
            .field("filters", &filters)
            .finish()
    }
}
