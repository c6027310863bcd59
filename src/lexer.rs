//! Tokenizer (TK): turns a `.jack` source string into a forward cursor over
//! [`Token`]s, skipping whitespace and both comment forms before each token.
//!
//! The whole input is scanned once up front into a flat token list; the
//! forward cursor is then just an index into that list. This mirrors how
//! the teacher's own `tokenize()` works (char-by-char, one pass, no
//! backtracking) rather than re-deriving it with a regex crate.

use crate::token::{Keyword, Token, SYMBOL_CHARS};
use tracing::debug;

/// Discriminant for [`Token`], returned by [`Tokenizer::token_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Keyword,
    Symbol,
    IntConst,
    StringConst,
    Identifier,
}

/// A forward-only cursor over the tokens of a source file.
///
/// Exactly one token is "current" at any time. `new` positions the cursor
/// at the first token (if any); `advance` moves to the next one.
pub struct Tokenizer {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Tokenizer {
    pub fn new(source: &str) -> Self {
        let tokens = scan(source);
        debug!(count = tokens.len(), "tokenized source");
        Tokenizer { tokens, pos: 0 }
    }

    pub fn has_more_tokens(&self) -> bool {
        self.pos < self.tokens.len()
    }

    /// The current token, or `None` once the stream is exhausted.
    pub fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    /// 0-indexed source line of the current token, for diagnostics. Past
    /// end of input this is the line after the last token, or 0 for an
    /// empty file.
    pub fn current_line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|(_, line)| *line)
            .unwrap_or(0)
    }

    pub fn token_type(&self) -> TokenType {
        match self.current().expect("token_type called past end of input") {
            Token::Keyword(_) => TokenType::Keyword,
            Token::Symbol(_) => TokenType::Symbol,
            Token::IntConst(_) => TokenType::IntConst,
            Token::StringConst(_) => TokenType::StringConst,
            Token::Identifier(_) => TokenType::Identifier,
        }
    }

    pub fn keyword(&self) -> Keyword {
        match self.current().expect("keyword called past end of input") {
            Token::Keyword(k) => *k,
            other => panic!("keyword called on non-keyword token {:?}", other),
        }
    }

    pub fn symbol(&self) -> char {
        match self.current().expect("symbol called past end of input") {
            Token::Symbol(c) => *c,
            other => panic!("symbol called on non-symbol token {:?}", other),
        }
    }

    pub fn identifier(&self) -> &str {
        match self.current().expect("identifier called past end of input") {
            Token::Identifier(name) => name,
            other => panic!("identifier called on non-identifier token {:?}", other),
        }
    }

    pub fn int_val(&self) -> u16 {
        match self.current().expect("int_val called past end of input") {
            Token::IntConst(n) => *n,
            other => panic!("int_val called on non-int token {:?}", other),
        }
    }

    pub fn string_val(&self) -> &str {
        match self
            .current()
            .expect("string_val called past end of input")
        {
            Token::StringConst(s) => s,
            other => panic!("string_val called on non-string token {:?}", other),
        }
    }

    pub fn advance(&mut self) {
        debug_assert!(self.has_more_tokens(), "advance called past end of input");
        self.pos += 1;
    }

    /// One token ahead of current, without moving the cursor. Used by the
    /// translator to disambiguate `ID`, `ID [`, `ID (`, and `ID .` without a
    /// dedicated peek buffer elsewhere.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1).map(|(t, _)| t)
    }
}

fn scan(source: &str) -> Vec<(Token, usize)> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0usize;
    let mut line = 0usize;

    loop {
        // Comment and whitespace skipping repeats until neither applies.
        loop {
            if i >= chars.len() {
                break;
            }
            if chars[i] == '\n' {
                line += 1;
                i += 1;
            } else if chars[i].is_whitespace() {
                i += 1;
            } else if chars[i] == '/' && chars.get(i + 1) == Some(&'/') {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            } else if chars[i] == '/' && chars.get(i + 1) == Some(&'*') {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    if chars[i] == '\n' {
                        line += 1;
                    }
                    i += 1;
                }
                if i < chars.len() {
                    i += 2; // past `*/`
                }
                // An unterminated block comment runs i to chars.len(); the
                // outer loop below then reports end-of-input, matching the
                // "malformed input produces end-of-input silently" rule.
            } else {
                break;
            }
        }

        if i >= chars.len() {
            break;
        }

        let start_line = line;
        let c = chars[i];

        if SYMBOL_CHARS.contains(&c) {
            tokens.push((Token::Symbol(c), start_line));
            i += 1;
        } else if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let n: u32 = text.parse().unwrap_or(0);
            tokens.push((Token::IntConst(n.min(32767) as u16), start_line));
        } else if c == '"' {
            i += 1;
            let start = i;
            while i < chars.len() && chars[i] != '"' && chars[i] != '\n' {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            if i < chars.len() && chars[i] == '"' {
                i += 1;
            }
            // An unterminated string (hit newline or EOF first) still
            // yields the partial content; the translator will fail at its
            // next structural expectation, per the tokenizer's failure model.
            tokens.push((Token::StringConst(text), start_line));
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let token = match Keyword::from_str(&text) {
                Some(kw) => Token::Keyword(kw),
                None => Token::Identifier(text),
            };
            tokens.push((token, start_line));
        } else {
            // Not part of the grammar's lexical alphabet; skip it rather
            // than loop forever. Well-formed input never reaches this arm.
            i += 1;
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_line_and_block_comments() {
        let mut tk = Tokenizer::new("// leading\nclass /* inner \n comment */ Main {}");
        assert_eq!(tk.keyword(), Keyword::Class);
        tk.advance();
        assert_eq!(tk.identifier(), "Main");
        tk.advance();
        assert_eq!(tk.symbol(), '{');
        tk.advance();
        assert_eq!(tk.symbol(), '}');
        tk.advance();
        assert!(!tk.has_more_tokens());
    }

    #[test]
    fn classifies_each_token_type() {
        let mut tk = Tokenizer::new(r#"class 32767 "hi" foo_1 +"#);
        assert_eq!(tk.token_type(), TokenType::Keyword);
        tk.advance();
        assert_eq!(tk.token_type(), TokenType::IntConst);
        assert_eq!(tk.int_val(), 32767);
        tk.advance();
        assert_eq!(tk.token_type(), TokenType::StringConst);
        assert_eq!(tk.string_val(), "hi");
        tk.advance();
        assert_eq!(tk.token_type(), TokenType::Identifier);
        assert_eq!(tk.identifier(), "foo_1");
        tk.advance();
        assert_eq!(tk.token_type(), TokenType::Symbol);
        assert_eq!(tk.symbol(), '+');
    }

    #[test]
    fn unterminated_block_comment_yields_end_of_input() {
        let mut tk = Tokenizer::new("class /* never closed");
        assert_eq!(tk.keyword(), Keyword::Class);
        tk.advance();
        assert!(!tk.has_more_tokens());
    }

    #[test]
    fn empty_string_literal() {
        let tk = Tokenizer::new(r#""""#);
        assert_eq!(tk.string_val(), "");
    }
}
