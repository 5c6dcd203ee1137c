//! Lexer: a single-lookahead cursor over the source text.
//!
//! The parser only ever needs one token of lookahead, so instead of
//! materializing the whole token vector the [`Tokenizer`] keeps the current
//! token and rescans on [`Tokenizer::advance`]. [`tokenize`] drains a fresh
//! cursor for callers that want the full stream.
//!
//! Scanning rules:
//!
//! - Whitespace separates tokens; `#` starts a comment running to the end
//!   of the line.
//! - Numbers are `digits? '.'? digits?`. A second `.` ends the number, so
//!   `3.14.5` scans as `3.14` followed by `.5`.
//! - A number running straight into a letter (`3x`) is a lexical error.
//! - Every symbol is exactly one character.
//! - Identifiers are `[A-Za-z_][A-Za-z0-9_]*`; `let`, `int`, `float` and
//!   `tensor` are keywords.

use crate::errors::{CompileError, CompileResult};
use crate::token::{Keyword, Span, Token, TokenKind};
use std::borrow::Cow;
use std::mem;

/// Characters that always form a token on their own.
const SYMBOLS: &[char] = &[
    '{', '}', '(', ')', '[', ']', ',', ';', '+', '-', '*', '/', '^', '%', '=', '~', '\'', '@',
    '!',
];

pub fn is_symbol(c: char) -> bool {
    SYMBOLS.contains(&c)
}

pub struct Tokenizer<'src> {
    source: &'src str,
    pos: usize, // Byte offset of the next unscanned character
    current: Token,
}

impl<'src> Tokenizer<'src> {
    /// Create a cursor positioned on the first token of `source`.
    pub fn new(source: &'src str) -> CompileResult<Self> {
        let mut tokenizer = Self {
            source,
            pos: 0,
            current: Token::eof(0),
        };
        tokenizer.current = tokenizer.scan()?;
        Ok(tokenizer)
    }

    /// The token under the cursor. At end of input this is the empty
    /// sentinel, and stays so however often the cursor advances.
    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn has_more_tokens(&self) -> bool {
        !self.current.is_eof()
    }

    /// Consume the current token and scan the next one. Returns the
    /// consumed token.
    pub fn advance(&mut self) -> CompileResult<Token> {
        let next = self.scan()?;
        Ok(mem::replace(&mut self.current, next))
    }

    /// Trace form of the current token, e.g. `<symbol> ; </symbol>`.
    pub fn current_repr(&self) -> Option<String> {
        token_repr(&self.current)
    }

    // ── Scanning ─────────────────────────────────────────────────────

    fn scan(&mut self) -> CompileResult<Token> {
        self.skip_trivia();

        let start = self.pos;
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(Token::eof(self.source.len())),
        };

        let token = if c.is_ascii_digit() || c == '.' {
            self.number()?
        } else if is_symbol(c) {
            self.bump();
            Token::new(c.to_string(), TokenKind::Symbol, Span::new(start, self.pos))
        } else if c.is_ascii_alphabetic() || c == '_' {
            self.identifier()
        } else {
            self.bump();
            return Err(CompileError::lexical(
                format!("unexpected character '{}'", c),
                Span::new(start, self.pos),
            ));
        };

        log::trace!("scanned {} '{}' at {}", token.kind, token.lexeme, start);
        Ok(token)
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' || c == '\r' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn number(&mut self) -> CompileResult<Token> {
        let start = self.pos;
        let mut seen_dot = false;
        let mut seen_digit = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                seen_digit = true;
            } else if c == '.' && !seen_dot {
                seen_dot = true;
            } else {
                break;
            }
            self.bump();
        }

        if seen_digit {
            if let Some(c) = self.peek() {
                if c.is_ascii_alphabetic() || c == '_' {
                    self.bump();
                    return Err(CompileError::lexical(
                        format!(
                            "numeric literal '{}' runs into '{}'",
                            &self.source[start..self.pos - c.len_utf8()],
                            c
                        ),
                        Span::new(start, self.pos),
                    ));
                }
            }
        }

        let kind = match (seen_digit, seen_dot) {
            (true, false) => TokenKind::IntLiteral,
            (true, true) => TokenKind::FloatLiteral,
            (false, _) => TokenKind::None,
        };
        Ok(Token::new(
            &self.source[start..self.pos],
            kind,
            Span::new(start, self.pos),
        ))
    }

    fn identifier(&mut self) -> Token {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }

        let lexeme = &self.source[start..self.pos];
        let kind = match Keyword::from_lexeme(lexeme) {
            Some(_) => TokenKind::Keyword,
            None => TokenKind::Identifier,
        };
        Token::new(lexeme, kind, Span::new(start, self.pos))
    }

    // ── Character-level helpers ──────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }
}

/// Scan all of `source`. The returned vector ends with the EOF sentinel.
pub fn tokenize(source: &str) -> CompileResult<Vec<Token>> {
    let mut tokenizer = Tokenizer::new(source)?;
    let mut tokens = Vec::new();
    while tokenizer.has_more_tokens() {
        tokens.push(tokenizer.advance()?);
    }
    tokens.push(tokenizer.current().clone());
    log::debug!("tokenized {} tokens", tokens.len());
    Ok(tokens)
}

/// Escape a lexeme for the trace. Only `<`, `>`, `"` and `&` are touched,
/// and the entities carry no trailing semicolon.
pub fn xml_escape(lexeme: &str) -> Cow<'_, str> {
    if !lexeme.contains(['<', '>', '"', '&']) {
        return Cow::Borrowed(lexeme);
    }
    let mut escaped = String::with_capacity(lexeme.len() + 8);
    for c in lexeme.chars() {
        match c {
            '<' => escaped.push_str("&lt"),
            '>' => escaped.push_str("&gt"),
            '"' => escaped.push_str("&quot"),
            '&' => escaped.push_str("&amp"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Trace form of a token: the escaped lexeme wrapped in its class tag.
/// Sentinel and unclassifiable tokens have none.
pub fn token_repr(token: &Token) -> Option<String> {
    let tag = token.kind.trace_tag()?;
    Some(format!("<{tag}> {} </{tag}>", xml_escape(&token.lexeme)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use rstest::rstest;

    fn lex(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .expect("lex failed")
            .into_iter()
            .map(|t| (t.kind, t.lexeme))
            .collect()
    }

    fn lexemes(source: &str) -> Vec<String> {
        tokenize(source)
            .expect("lex failed")
            .into_iter()
            .filter(|t| !t.is_eof())
            .map(|t| t.lexeme)
            .collect()
    }

    #[rstest]
    #[case("42", TokenKind::IntLiteral)]
    #[case("3.14", TokenKind::FloatLiteral)]
    #[case(".5", TokenKind::FloatLiteral)]
    #[case("3.", TokenKind::FloatLiteral)]
    #[case(".", TokenKind::None)]
    #[case("let", TokenKind::Keyword)]
    #[case("tensor", TokenKind::Keyword)]
    #[case("lettuce", TokenKind::Identifier)]
    #[case("_x9", TokenKind::Identifier)]
    #[case("~", TokenKind::Symbol)]
    #[case("'", TokenKind::Symbol)]
    fn test_classification(#[case] source: &str, #[case] kind: TokenKind) {
        assert_eq!(
            lex(source),
            vec![(kind, source.to_string()), (TokenKind::Eof, String::new())]
        );
    }

    #[test]
    fn test_second_dot_starts_new_token() {
        assert_eq!(lexemes("3.14.5"), vec!["3.14", ".5"]);
        assert_eq!(
            lex("1.2.3")[..2],
            [
                (TokenKind::FloatLiteral, "1.2".to_string()),
                (TokenKind::FloatLiteral, ".3".to_string()),
            ]
        );
    }

    #[rstest]
    #[case("3x")]
    #[case("let int a = 12abc;")]
    #[case("3.x")]
    #[case("7_")]
    fn test_digit_run_into_letter_is_lexical_error(#[case] source: &str) {
        let err = tokenize(source).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lexical);
    }

    #[test]
    fn test_lone_dot_before_letter_is_not_an_error() {
        assert_eq!(
            lex(".x"),
            vec![
                (TokenKind::None, ".".to_string()),
                (TokenKind::Identifier, "x".to_string()),
                (TokenKind::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn test_unknown_character_is_lexical_error() {
        let err = tokenize("let int a = 1 $ 2;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lexical);
        assert_eq!(err.offset(), 14);
    }

    #[test]
    fn test_symbols_are_single_characters() {
        assert_eq!(lexemes("{{}}"), vec!["{", "{", "}", "}"]);
        assert_eq!(lexemes("a=-b;"), vec!["a", "=", "-", "b", ";"]);
        assert_eq!(lexemes("[]^%@!"), vec!["[", "]", "^", "%", "@", "!"]);
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = "let int x = 1; # trailing comment with let and 3x\n# whole line\nlet int y = 2;";
        let tokens = lexemes(source);
        assert_eq!(
            tokens,
            vec!["let", "int", "x", "=", "1", ";", "let", "int", "y", "=", "2", ";"]
        );
        assert!(tokens.iter().all(|t| !t.contains("comment") && !t.contains('#')));
    }

    #[test]
    fn test_lexemes_reproduce_source_without_trivia() {
        let source = "let tensor t = { {1, 2.5},\n\t{.5, 0} } ;  # note\nlet float f=(t*2)/-3.;";
        let joined: String = lexemes(source).concat();
        let stripped: String = source
            .lines()
            .map(|line| line.split('#').next().unwrap_or(""))
            .collect::<String>()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        assert_eq!(joined, stripped);
    }

    #[test]
    fn test_spans_point_into_source() {
        let source = "let float y = 2.0;";
        for token in tokenize(source).unwrap() {
            assert_eq!(&source[token.span.start..token.span.end], token.lexeme);
        }
    }

    #[test]
    fn test_cursor_stays_on_sentinel() {
        let mut tokenizer = Tokenizer::new("x").unwrap();
        assert_eq!(tokenizer.current().lexeme, "x");
        let consumed = tokenizer.advance().unwrap();
        assert_eq!(consumed.lexeme, "x");
        assert!(tokenizer.current().is_eof());
        tokenizer.advance().unwrap();
        assert!(tokenizer.current().is_eof());
        assert_eq!(tokenizer.current().lexeme, "");
    }

    #[test]
    fn test_empty_and_comment_only_sources() {
        assert_eq!(lex(""), vec![(TokenKind::Eof, String::new())]);
        assert_eq!(lex("# nothing here"), vec![(TokenKind::Eof, String::new())]);
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("plain"), "plain");
        assert_eq!(xml_escape("<"), "&lt");
        assert_eq!(xml_escape("a>b"), "a&gtb");
        assert_eq!(xml_escape("\"&\""), "&quot&amp&quot");
    }

    #[test]
    fn test_current_repr() {
        let tokenizer = Tokenizer::new("let").unwrap();
        assert_eq!(tokenizer.current_repr().as_deref(), Some("<keyword> let </keyword>"));
        let tokenizer = Tokenizer::new("2.5").unwrap();
        assert_eq!(tokenizer.current_repr().as_deref(), Some("<float_const> 2.5 </float_const>"));
        let tokenizer = Tokenizer::new("").unwrap();
        assert_eq!(tokenizer.current_repr(), None);
    }
}
