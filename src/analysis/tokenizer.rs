use crate::analysis::token::Token;
use unicode_segmentation::UnicodeSegmentation;

pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;

    fn name(&self) -> &'static str;
}

/// Splits on Unicode word boundaries (UAX #29)
pub struct WordTokenizer {
    pub max_token_length: usize,
}

impl Default for WordTokenizer {
    fn default() -> Self {
        WordTokenizer { max_token_length: 255 }
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        text.unicode_words()
            .zip(0u32..)
            // Overlong words still consume a position so phrase gaps stay honest
            .filter(|(word, _)| word.len() <= self.max_token_length)
            .map(|(word, position)| Token::new(word, position))
            .collect()
    }

    fn name(&self) -> &'static str {
        "unicode_words"
    }
}
