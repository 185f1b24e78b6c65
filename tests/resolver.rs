#[cfg(test)]
mod resolver_tests {
    use rox::error::LoxError;
    use rox::interpreter::Interpreter;
    use rox::parser::Parser;
    use rox::resolver::Resolver;
    use rox::scanner::scan_tokens;

    /// Runs the resolver over `source` and returns its diagnostics.
    fn resolve_errors(source: &str) -> Vec<String> {
        let (tokens, lex_errors) = scan_tokens(source);
        assert!(lex_errors.is_empty());

        let statements = Parser::new(&tokens)
            .parse()
            .unwrap_or_else(|e| panic!("unexpected parse errors: {:?}", e));

        let mut interpreter = Interpreter::with_output(Box::new(std::io::sink()));

        match Resolver::new(&mut interpreter).resolve(&statements) {
            Ok(()) => Vec::new(),
            Err(errors) => {
                assert!(errors.iter().all(LoxError::is_compile_error));
                errors.iter().map(LoxError::to_string).collect()
            }
        }
    }

    #[test]
    fn test_clean_program_has_no_errors() {
        let source = r#"
            var a = 1;
            fun outer() {
                var b = a;
                fun inner() { return b; }
                return inner;
            }
            class Box {
                init(v) { this.v = v; }
                get() { return this.v; }
            }
        "#;

        assert!(resolve_errors(source).is_empty());
    }

    #[test]
    fn test_redeclaration_in_local_scope() {
        assert_eq!(
            resolve_errors("{\n var a = 1;\n var a = 2;\n}"),
            vec!["[line 3] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn test_redeclaration_in_nested_block_is_allowed() {
        assert!(resolve_errors("{ var a = 1; { var a = 2; print a; } print a; }").is_empty());
    }

    #[test]
    fn test_global_redeclaration_is_allowed() {
        assert!(resolve_errors("var a = 1; var a = 2;").is_empty());
    }

    #[test]
    fn test_duplicate_parameter() {
        assert_eq!(
            resolve_errors("fun f(a, a) {}"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn test_read_in_own_initializer() {
        assert_eq!(
            resolve_errors("{ var a = a; }"),
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_global_self_reference_is_not_a_resolve_error() {
        assert!(resolve_errors("var a = a;").is_empty());
    }

    #[test]
    fn test_top_level_return() {
        assert_eq!(
            resolve_errors("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
    }

    #[test]
    fn test_value_returned_from_initializer() {
        assert_eq!(
            resolve_errors("class A { init() { return 1; } }"),
            vec!["[line 1] Error at 'return': Can't return a value from an initializer."]
        );
    }

    #[test]
    fn test_bare_return_in_initializer_is_fine() {
        assert!(resolve_errors("class A { init() { return; } }").is_empty());
    }

    #[test]
    fn test_this_outside_class() {
        assert_eq!(
            resolve_errors("print this;\nfun f() { return this; }"),
            vec![
                "[line 1] Error at 'this': Can't use 'this' outside of a class.",
                "[line 2] Error at 'this': Can't use 'this' outside of a class.",
            ]
        );
    }

    #[test]
    fn test_all_errors_are_collected() {
        let errors = resolve_errors("return;\n{ var x = 1; var x = 2; }\nprint this;");

        assert_eq!(errors.len(), 3);
    }
}
