#[cfg(test)]
mod scanner_tests {
    use treelox as lox;

    use lox::error::LoxError;
    use lox::scanner::Scanner;
    use lox::token::{Token, TokenType};

    fn scan(source: &str) -> (Vec<Token>, Vec<LoxError>) {
        Scanner::new(source.as_bytes()).scan()
    }

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let (tokens, diagnostics) = scan(source);

        assert!(
            diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            diagnostics
        );
        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_two_char_operators() {
        assert_token_sequence(
            "! != = == < <= > >=",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_comments_skipped() {
        assert_token_sequence(
            "var x; // the rest of this line vanishes ,.$(#\nprint x;",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::PRINT, "print"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_slash_is_division() {
        assert_token_sequence(
            "8 / 2",
            &[
                (TokenType::NUMBER(8.0), "8"),
                (TokenType::SLASH, "/"),
                (TokenType::NUMBER(2.0), "2"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_05_string_literal_payload() {
        let (tokens, diagnostics) = scan("\"hello world\"");

        assert!(diagnostics.is_empty());
        assert_eq!(tokens.len(), 2);

        // Lexeme keeps the quotes; the payload strips them.
        assert_eq!(tokens[0].lexeme, "\"hello world\"");

        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "hello world"),
            other => panic!("expected STRING, got {:?}", other),
        }
    }

    #[test]
    fn test_scanner_06_unterminated_string_reports_and_tokenizes() {
        let (tokens, diagnostics) = scan("\"abc");

        // The diagnostic is recorded, and the partial contents still become
        // a token so the parser sees a well-shaped stream.
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].to_string().contains("Unterminated string."));

        assert_eq!(tokens.len(), 2);
        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "abc"),
            other => panic!("expected STRING, got {:?}", other),
        }
        assert_eq!(tokens[1].token_type, TokenType::EOF);
    }

    #[test]
    fn test_scanner_07_trailing_dot_not_consumed() {
        assert_token_sequence(
            "1.",
            &[
                (TokenType::NUMBER(1.0), "1"),
                (TokenType::DOT, "."),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_08_number_payloads() {
        let (tokens, diagnostics) = scan("3 3.14");

        assert!(diagnostics.is_empty());

        match tokens[0].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 3.0),
            ref other => panic!("expected NUMBER, got {:?}", other),
        }
        match tokens[1].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 3.14),
            ref other => panic!("expected NUMBER, got {:?}", other),
        }
    }

    #[test]
    fn test_scanner_09_keywords_and_identifiers() {
        assert_token_sequence(
            "class this while var fun nil foo _bar2",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::THIS, "this"),
                (TokenType::WHILE, "while"),
                (TokenType::VAR, "var"),
                (TokenType::FUN, "fun"),
                (TokenType::NIL, "nil"),
                (TokenType::IDENTIFIER, "foo"),
                (TokenType::IDENTIFIER, "_bar2"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_10_super_is_a_plain_identifier() {
        // Not a reserved word in this language.
        assert_token_sequence(
            "super",
            &[(TokenType::IDENTIFIER, "super"), (TokenType::EOF, "")],
        );
    }

    #[test]
    fn test_scanner_11_unexpected_chars_report_and_continue() {
        let (tokens, diagnostics) = scan(",.$(#");

        // Scanning is never fatal: both bad bytes are reported and the
        // valid tokens around them survive.
        assert_eq!(diagnostics.len(), 2);
        for e in &diagnostics {
            assert!(
                e.to_string().contains("Unexpected character"),
                "diagnostic should mention the unexpected character, got: {}",
                e
            );
        }

        let kinds: Vec<_> = tokens.iter().map(|t| t.token_type.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenType::COMMA,
                TokenType::DOT,
                TokenType::LEFT_PAREN,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn test_scanner_12_line_tracking() {
        let (tokens, diagnostics) = scan("one\ntwo\n\"a\nb\"\nthree");

        assert!(diagnostics.is_empty());

        assert_eq!(tokens[0].line, 1); // one
        assert_eq!(tokens[1].line, 2); // two
        assert_eq!(tokens[2].line, 4); // string, emitted after its newlines
        assert_eq!(tokens[3].line, 5); // three
        assert_eq!(tokens[4].line, 5); // EOF
    }

    #[test]
    fn test_scanner_13_exactly_one_eof() {
        let (tokens, _) = scan("");

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_type, TokenType::EOF);
        assert_eq!(tokens[0].lexeme, "");
    }

    #[test]
    fn test_scanner_14_token_display_format() {
        let (tokens, _) = scan("var x = 3 \"hi\"");

        let rendered: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();

        assert_eq!(rendered[0], "VAR var null");
        assert_eq!(rendered[1], "IDENTIFIER x null");
        assert_eq!(rendered[2], "EQUAL = null");
        assert_eq!(rendered[3], "NUMBER 3 3.0");
        assert_eq!(rendered[4], "STRING \"hi\" hi");
        assert_eq!(rendered[5], "EOF  null");
    }
}
