#[cfg(test)]
mod scanner_tests {
    use rox::error::LoxError;
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    fn assert_token_matches(
        result: &Result<Token, LoxError>,
        expected_type: TokenType,
        expected_lexeme: &str,
    ) {
        match result {
            Ok(token) => {
                assert_eq!(
                    token.token_type, expected_type,
                    "Expected token type {:?}, got {:?}",
                    expected_type, token.token_type
                );
                assert_eq!(
                    token.lexeme, expected_lexeme,
                    "Expected lexeme '{}', got '{}'",
                    expected_lexeme, token.lexeme
                );
            }
            Err(e) => panic!("Expected token but got error: {}", e),
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
            "! != = == < <= > >= /",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::SLASH, "/"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "var language = nil; class orchid fun super this",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "language"),
                (TokenType::EQUAL, "="),
                (TokenType::NIL, "nil"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::FUN, "fun"),
                (TokenType::SUPER, "super"),
                (TokenType::THIS, "this"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_identifiers_are_letters_only() {
        // Digits and underscores end an identifier.
        assert_token_sequence(
            "abc123",
            &[
                (TokenType::IDENTIFIER, "abc"),
                (TokenType::NUMBER(0.0), "123"),
                (TokenType::EOF, ""),
            ],
        );

        let (tokens, errors) = scan_tokens("foo_bar");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Unexpected character.");
        assert_eq!(tokens.len(), 3); // foo, bar, EOF
    }

    #[test]
    fn test_scanner_05_numbers() {
        let (tokens, errors) = scan_tokens("12 3.25 7. .5");
        assert!(errors.is_empty());

        let kinds: Vec<&TokenType> = tokens.iter().map(|t| &t.token_type).collect();

        assert!(matches!(kinds[0], TokenType::NUMBER(n) if *n == 12.0));
        assert!(matches!(kinds[1], TokenType::NUMBER(n) if *n == 3.25));
        // A trailing dot is not part of the number.
        assert!(matches!(kinds[2], TokenType::NUMBER(n) if *n == 7.0));
        assert_eq!(*kinds[3], TokenType::DOT);
        assert_eq!(*kinds[4], TokenType::DOT);
        assert!(matches!(kinds[5], TokenType::NUMBER(n) if *n == 5.0));
        assert_eq!(*kinds[6], TokenType::EOF);
    }

    #[test]
    fn test_scanner_06_strings_and_lines() {
        let (tokens, errors) = scan_tokens("\"hello\nworld\" x");
        assert!(errors.is_empty());

        assert_eq!(tokens[0].lexeme, "\"hello\nworld\"");
        assert!(matches!(&tokens[0].token_type, TokenType::STRING(s) if s == "hello\nworld"));
        // The string ends on line 2, and so does the identifier after it.
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[2].token_type, TokenType::EOF);
    }

    #[test]
    fn test_scanner_07_comments_and_whitespace() {
        let (tokens, errors) = scan_tokens("// nothing here\n\t\r print 1; // trailing");
        assert!(errors.is_empty());

        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].token_type, TokenType::PRINT);
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[3].token_type, TokenType::EOF);
    }

    #[test]
    fn test_scanner_08_unterminated_string() {
        let (tokens, errors) = scan_tokens("print \"never closed\n");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Unterminated string.");
        assert_eq!(errors[0].line(), Some(2));
        assert_eq!(
            tokens.last().map(|t| t.token_type.clone()),
            Some(TokenType::EOF)
        );
    }

    #[test]
    fn test_scanner_09_exactly_one_eof() {
        let mut scanner = Scanner::new("");

        assert_token_matches(&scanner.next().unwrap(), TokenType::EOF, "");
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_scanner_10_display() {
        let (tokens, _) = scan_tokens("var x = 42; \"hi\" 1.5");

        let lines: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();

        assert_eq!(lines[0], "VAR var null");
        assert_eq!(lines[3], "NUMBER 42 42.0");
        assert_eq!(lines[5], "STRING \"hi\" hi");
        assert_eq!(lines[6], "NUMBER 1.5 1.5");
        assert_eq!(lines[7], "EOF  null");
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        let results: Vec<_> = scanner.collect();

        // 0: COMMA  1: DOT  2: error '$'  3: LEFT_PAREN  4: error '#'  5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(err.to_string(), "[line 1] Error: Unexpected character.");
        }
    }

    #[test]
    fn test_unexpected_multibyte_char_is_skipped_whole() {
        let (tokens, errors) = scan_tokens("a é b");

        assert_eq!(errors.len(), 1);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].lexeme, "b");
    }

    #[test]
    fn test_token_serializes_to_json() {
        let (tokens, _) = scan_tokens("x");
        let json = serde_json::to_value(&tokens[0]).unwrap();

        assert_eq!(json["token_type"], "IDENTIFIER");
        assert_eq!(json["lexeme"], "x");
        assert_eq!(json["line"], 1);
    }
}
