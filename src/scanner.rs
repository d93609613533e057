//! Module `scanner` implements a one-pass lexer over raw source bytes.
//!
//! It transforms a byte slice (`&[u8]`) into a sequence of [`Token`]s,
//! skipping whitespace and comments, and emitting exactly one `EOF` token at
//! the end.  Lexing is never fatal: unrecognised characters and unterminated
//! strings are recorded as diagnostics and scanning continues, so one bad
//! byte does not hide later errors.  The driver decides whether a program
//! with lexical diagnostics may run (it must not).
//!
//! # Public API
//!
//! - `Scanner::new(src: &[u8]) -> Scanner`
//!   Create a new lexer over the input buffer.
//!
//! - `Scanner::scan(self) -> (Vec<Token>, Vec<LoxError>)`
//!   Consume the scanner, producing every token plus every diagnostic.
//!
//! # Lexeme rules
//!
//! - Single-character punctuators: `( ) { } , . - + ; *`.
//! - Two-character operators via a greedy `=` suffix check: `!=`, `==`,
//!   `<=`, `>=`.
//! - `//` comments run to end of line (skipped in bulk via `memchr`).
//! - String literals between double quotes may span lines; an unterminated
//!   string is reported *and* still emits a token with whatever was scanned.
//! - Numbers are a digit run with an optional `.digits` fraction.  A
//!   trailing `.` with no digit after it is not consumed: `1.` lexes as
//!   `NUMBER(1)` then `DOT`.
//! - Identifiers are `[A-Za-z_][A-Za-z0-9_]*`, reclassified as keywords via
//!   a compile-time perfect-hash table.

use crate::error::LoxError;
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile-time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// A single pass **scanner / lexer** that converts raw source bytes into a
/// token sequence, accumulating diagnostics along the way.
pub struct Scanner<'a> {
    src: &'a [u8],                 // entire source buffer (memory-mapped)
    start: usize,                  // index of the *first* byte of the current lexeme
    curr: usize,                   // index *one past* the last byte examined
    line: usize,                   // 1-based line counter (\n increments)
    pending: Option<TokenType>,    // recognised token kind waiting to be emitted
    tokens: Vec<Token>,            // tokens emitted so far
    diagnostics: Vec<LoxError>,    // lexical errors recorded so far
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `src`.
    #[inline]
    pub fn new(src: &'a [u8]) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
            tokens: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Scan the entire input.  Always terminates the token list with exactly
    /// one `EOF` token; every lexical error ends up in the diagnostics list.
    pub fn scan(mut self) -> (Vec<Token>, Vec<LoxError>) {
        while !self.is_at_end() {
            self.start = self.curr;
            self.pending = None;

            self.scan_token();

            if let Some(tt) = self.pending.take() {
                self.emit(tt);
            }
        }

        self.tokens
            .push(Token::new(TokenType::EOF, "", self.line));

        info!(
            "Scan finished: {} token(s), {} diagnostic(s)",
            self.tokens.len(),
            self.diagnostics.len()
        );

        (self.tokens, self.diagnostics)
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    /// Return the length of the input slice.
    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    /// Are we at (or past) the end of input?
    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it.  *Panics* if called at EOF – higher
    /// level code always guards with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` if past
    /// EOF to avoid branching at call-site.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src[self.curr]
        }
    }

    /// Peek one byte beyond [`peek`].  Safe at EOF.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.len() {
            0
        } else {
            self.src[self.curr + 1]
        }
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    /// Returns `true` on success so callers can branch inline without an else.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Push a token whose lexeme is the current `start..curr` slice.
    fn emit(&mut self, tt: TokenType) {
        let slice: &[u8] = &self.src[self.start..self.curr];
        let lex: &str = std::str::from_utf8(slice).unwrap_or("");

        debug!("Scanned token ({:?}) on line {}", tt, self.line);

        self.tokens.push(Token::new(tt, lex, self.line));
    }

    /// Record a lexical diagnostic and keep scanning.
    fn report(&mut self, message: String) {
        self.diagnostics.push(LoxError::lex(self.line, message));
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* lexeme starting at `self.start`.  If it produces an
    /// actual token the kind is stored in `self.pending`; whitespace and
    /// comments leave `pending` empty.
    fn scan_token(&mut self) {
        let b = self.advance();

        match b {
            // ── single-character punctuators ──────────────────────────────
            b'(' => self.pending = Some(TokenType::LEFT_PAREN),
            b')' => self.pending = Some(TokenType::RIGHT_PAREN),
            b'{' => self.pending = Some(TokenType::LEFT_BRACE),
            b'}' => self.pending = Some(TokenType::RIGHT_BRACE),
            b',' => self.pending = Some(TokenType::COMMA),
            b'.' => self.pending = Some(TokenType::DOT),
            b'-' => self.pending = Some(TokenType::MINUS),
            b'+' => self.pending = Some(TokenType::PLUS),
            b';' => self.pending = Some(TokenType::SEMICOLON),
            b'*' => self.pending = Some(TokenType::STAR),

            // ── two-character operators (!=, ==, <=, >=) ─────────────────
            b'!' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                };

                self.pending = Some(tt);
            }

            b'=' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                };

                self.pending = Some(tt);
            }

            b'<' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                };

                self.pending = Some(tt);
            }

            b'>' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                };

                self.pending = Some(tt);
            }

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => {}

            b'\n' => {
                self.line += 1; // track for diagnostics
            }

            // ── comments (// … until newline) ────────────────────────────
            b'/' => {
                if self.match_byte(b'/') {
                    // Fast-forward to the next newline using `memchr`.
                    // If none found, skip to EOF.
                    if let Some(pos) = memchr(b'\n', &self.src[self.curr..]) {
                        self.curr += pos;
                    } else {
                        self.curr = self.len();
                    }
                } else {
                    self.pending = Some(TokenType::SLASH);
                }
            }

            // ── string literal " … " ─────────────────────────────────────
            b'"' => {
                self.parse_string();
            }

            // ── number literal (digit-leading) ───────────────────────────
            b'0'..=b'9' => {
                self.parse_number();
            }

            // ── identifiers / keywords (alpha or underscore-leading) ─────
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.parse_identifier();
            }

            // ── unexpected character ─────────────────────────────────────
            _ => {
                self.report(format!("Unexpected character: {}", b as char));
            }
        }
    }

    /// Parse a double-quoted string literal.
    ///
    /// * `self.start` still points to the opening `"`.
    /// * When we return, `self.curr` points past the closing `"` (or at EOF
    ///   for an unterminated string, which is reported but still tokenised).
    fn parse_string(&mut self) {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1; // strings may span lines
            }
        }

        if self.is_at_end() {
            self.report("Unterminated string.".to_string());

            // Emit the partial contents anyway so the parser sees the same
            // token stream shape as for a terminated string.
            let slice: &[u8] = &self.src[self.start + 1..self.curr];
            let s: String = String::from_utf8_lossy(slice).into_owned();

            self.pending = Some(TokenType::STRING(s));
            return;
        }

        self.advance(); // consume closing quote

        // Slice excluding the surrounding quotes.
        let slice: &[u8] = &self.src[self.start + 1..self.curr - 1];
        let s: String = String::from_utf8_lossy(slice).into_owned();

        self.pending = Some(TokenType::STRING(s));
    }

    /// Parse a numeric literal (`123`, `3.14`).  Fractions are optional.
    fn parse_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // Optional fractional part.  The dot is only taken when a digit
        // follows, so `1.` stays two tokens.
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let slice: &[u8] = &self.src[self.start..self.curr];
        let s: &str = std::str::from_utf8(slice).unwrap_or("0");
        let n: f64 = s.parse::<f64>().unwrap_or(0.0); // digit-checked, cannot fail

        self.pending = Some(TokenType::NUMBER(n));
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let slice: &[u8] = &self.src[self.start..self.curr];

        let tt: TokenType = KEYWORDS
            .get(slice)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER);

        self.pending = Some(tt);
    }
}
