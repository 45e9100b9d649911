use crate::analysis::token::Token;

/// A pipeline stage that rewrites or drops tokens in place
pub trait TokenFilter: Send + Sync {
    fn apply(&self, tokens: &mut Vec<Token>);

    fn name(&self) -> &'static str;
}
