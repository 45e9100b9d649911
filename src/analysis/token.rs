/// An analyzed term and the word slot it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub position: u32,   // gaps remain where filters dropped words
}

impl Token {
    pub fn new(text: impl Into<String>, position: u32) -> Self {
        Token { text: text.into(), position }
    }
}
