use serde::{Serialize, Deserialize};

/// Parsed `$search`-style text query.
///
/// Bare words are OR-ed. `"quoted phrases"` must all appear with their
/// words adjacent. A leading `-` excludes a word or a phrase.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextQuery {
    pub raw: String,
    pub terms: Vec<String>,
    pub phrases: Vec<String>,
    pub negated_terms: Vec<String>,
    pub negated_phrases: Vec<String>,
}

impl TextQuery {
    pub fn parse(input: &str) -> Self {
        let mut query = TextQuery {
            raw: input.to_string(),
            ..TextQuery::default()
        };

        let mut chars = input.chars().peekable();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
                continue;
            }

            let negated = c == '-';
            if negated {
                chars.next();
                match chars.peek() {
                    Some(next) if !next.is_whitespace() => {}
                    _ => continue,
                }
            }

            if chars.peek() == Some(&'"') {
                chars.next();
                let phrase: String = chars.by_ref().take_while(|c| *c != '"').collect();
                let phrase = phrase.trim();
                if !phrase.is_empty() {
                    if negated {
                        query.negated_phrases.push(phrase.to_string());
                    } else {
                        query.phrases.push(phrase.to_string());
                    }
                }
                continue;
            }

            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || c == '"' {
                    break;
                }
                word.push(c);
                chars.next();
            }
            if negated {
                query.negated_terms.push(word);
            } else {
                query.terms.push(word);
            }
        }

        query
    }

    /// Whether anything could make a document match
    pub fn has_positive(&self) -> bool {
        !self.terms.is_empty() || !self.phrases.is_empty()
    }
}
