use std::borrow::Cow;
use rust_stemmers::{Algorithm, Stemmer};
use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

/// Snowball stemming, so "loving" and "loves" both index as "love"
pub struct StemmerFilter {
    algorithm: Algorithm,
}

impl StemmerFilter {
    pub fn new(algorithm: Algorithm) -> Self {
        StemmerFilter { algorithm }
    }
}

impl TokenFilter for StemmerFilter {
    fn apply(&self, tokens: &mut Vec<Token>) {
        let stemmer = Stemmer::create(self.algorithm);
        for token in tokens.iter_mut() {
            if let Cow::Owned(stem) = stemmer.stem(&token.text) {
                token.text = stem;
            }
        }
    }

    fn name(&self) -> &'static str {
        "snowball"
    }
}
