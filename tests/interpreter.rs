#[cfg(test)]
mod interpreter_tests {
    use rox::error::LoxError;
    use rox::{run_program, Outcome, Session, Status};

    /// Runs a program that must succeed and returns what it printed.
    fn output_of(source: &str) -> String {
        let outcome: Outcome = run_program(source);

        assert_eq!(
            outcome.status,
            Status::Ok,
            "diagnostics: {:?}, runtime error: {:?}",
            outcome.diagnostics,
            outcome.runtime_error
        );

        outcome.output
    }

    /// Runs a program that must fail at runtime; returns the printed output
    /// and the error.
    fn runtime_failure(source: &str) -> (String, LoxError) {
        let outcome: Outcome = run_program(source);

        assert_eq!(outcome.status, Status::RuntimeError);
        assert!(outcome.diagnostics.is_empty());

        match outcome.runtime_error {
            Some(e) => (outcome.output, e),
            None => panic!("expected a runtime error"),
        }
    }

    fn runtime_message(source: &str) -> String {
        runtime_failure(source).1.message()
    }

    // ───────────────────────────── expressions ─────────────────────────────

    #[test]
    fn test_arithmetic() {
        assert_eq!(output_of("print 1 + 2 * 3;"), "7\n");
        assert_eq!(output_of("print (1 + 2) * 3;"), "9\n");
        assert_eq!(output_of("print 10 / 4;"), "2.5\n");
        assert_eq!(output_of("print -3 - -5;"), "2\n");
    }

    #[test]
    fn test_large_integral_numbers_print_every_digit() {
        assert_eq!(
            output_of("print 123456789012345678901234567890;"),
            "123456789012345677877719597056\n"
        );
    }

    #[test]
    fn test_division_by_zero_follows_ieee() {
        assert_eq!(output_of("print 1 / 0;"), "inf\n");
        assert_eq!(output_of("print 0 / 0 == 0 / 0;"), "false\n");
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(output_of("print \"foo\" + \"bar\";"), "foobar\n");
    }

    #[test]
    fn test_mixed_plus_is_an_error() {
        let (_, error) = runtime_failure("print \"a\" + 1;");

        assert_eq!(
            error.to_string(),
            "Operands must be two numbers or two strings.\n[line 1]"
        );
    }

    #[test]
    fn test_operand_type_errors() {
        assert_eq!(runtime_message("print -\"x\";"), "Operand must be a number.");
        assert_eq!(runtime_message("print 1 < \"2\";"), "Operands must be numbers.");
        assert_eq!(runtime_message("print nil * 2;"), "Operands must be numbers.");
    }

    #[test]
    fn test_truthiness() {
        assert_eq!(
            output_of("print !nil; print !false; print !0; print !\"\"; print !!true;"),
            "true\ntrue\nfalse\nfalse\ntrue\n"
        );
    }

    #[test]
    fn test_equality() {
        assert_eq!(
            output_of(
                "print nil == nil; print nil == false; print 1 == 1; print \"a\" == \"a\"; print 1 == \"1\"; print 2 != 3; print false == false;"
            ),
            "true\nfalse\ntrue\ntrue\nfalse\ntrue\ntrue\n"
        );
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(
            output_of("print nil or \"yes\"; print 0 and 1; print false and undefined;"),
            "yes\n1\nfalse\n"
        );
    }

    #[test]
    fn test_value_display() {
        let source = r#"
            fun f() {}
            class C {}
            print 3.0;
            print 0.5;
            print f;
            print clock;
            print C;
            print C();
            print nil;
        "#;

        assert_eq!(
            output_of(source),
            "3\n0.5\n<fn f>\n<native fn>\nC\nobject<C>\nnil\n"
        );
    }

    // ───────────────────────────── statements ──────────────────────────────

    #[test]
    fn test_block_scope_shadows_and_restores() {
        let source = r#"
            var a = "global";
            {
                var a = "inner";
                print a;
            }
            print a;
        "#;

        assert_eq!(output_of(source), "inner\nglobal\n");
    }

    #[test]
    fn test_nested_block_may_redeclare() {
        let outcome: Outcome = run_program("{ var a = 1; { var a = 2; print a; } print a; }");

        assert_eq!(outcome.status, Status::Ok);
        assert!(outcome.diagnostics.is_empty());
        assert_eq!(outcome.output, "2\n1\n");
    }

    #[test]
    fn test_assignment_reaches_enclosing_scope() {
        assert_eq!(output_of("var a = 1; { a = 2; } print a;"), "2\n");
    }

    #[test]
    fn test_if_else() {
        assert_eq!(
            output_of("if (1 > 2) print \"no\"; else print \"yes\"; if (nil) print \"never\";"),
            "yes\n"
        );
    }

    #[test]
    fn test_while_loop() {
        assert_eq!(
            output_of("var i = 0; while (i < 3) { print i; i = i + 1; }"),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn test_for_loop() {
        assert_eq!(
            output_of("for (var i = 0; i < 3; i = i + 1) print i;"),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn test_for_loop_variable_is_scoped() {
        let (output, error) = runtime_failure("for (var i = 0; i < 1; i = i + 1) {} print i;");

        assert_eq!(output, "");
        assert_eq!(error.message(), "Undefined variable 'i'.");
    }

    #[test]
    fn test_undefined_variable() {
        let (_, error) = runtime_failure("print 1;\nprint missing;");

        assert_eq!(error.to_string(), "Undefined variable 'missing'.\n[line 2]");
    }

    #[test]
    fn test_assignment_to_undeclared_variable() {
        assert_eq!(runtime_message("missing = 1;"), "Undefined variable 'missing'.");
    }

    #[test]
    fn test_output_before_runtime_error_is_kept() {
        let (output, _) = runtime_failure("print \"before\"; print -nil; print \"after\";");

        assert_eq!(output, "before\n");
    }

    // ───────────────────────────── functions ───────────────────────────────

    #[test]
    fn test_function_call_and_return() {
        let source = r#"
            fun add(a, b) { return a + b; }
            print add(1, 2);
        "#;

        assert_eq!(output_of(source), "3\n");
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(output_of("fun f() { 1; } print f();"), "nil\n");
    }

    #[test]
    fn test_return_from_nested_loop() {
        let source = r#"
            fun first() {
                for (var i = 0; i < 10; i = i + 1) {
                    while (true) {
                        return i;
                    }
                }
            }
            print first();
        "#;

        assert_eq!(output_of(source), "0\n");
    }

    #[test]
    fn test_recursion() {
        let source = r#"
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(15);
        "#;

        assert_eq!(output_of(source), "610\n");
    }

    #[test]
    fn test_counter_closure() {
        let source = r#"
            fun makeCounter() {
                var i = 0;
                fun count() {
                    i = i + 1;
                    print i;
                }
                return count;
            }

            var counter = makeCounter();
            counter();
            counter();
        "#;

        assert_eq!(output_of(source), "1\n2\n");
    }

    #[test]
    fn test_counters_capture_independently() {
        let source = r#"
            fun makeCounter() {
                var i = 0;
                fun count() {
                    i = i + 1;
                    return i;
                }
                return count;
            }

            var a = makeCounter();
            var b = makeCounter();
            a();
            a();
            print a();
            print b();
            print a == b;
        "#;

        assert_eq!(output_of(source), "3\n1\nfalse\n");
    }

    #[test]
    fn test_recursion_depth() {
        let source = r#"
            fun down(n) {
                if (n == 0) return 0;
                return down(n - 1);
            }
            print down(150);
        "#;

        assert_eq!(output_of(source), "0\n");
    }

    #[test]
    fn test_closures_bind_lexically() {
        let source = r#"
            var a = "global";
            {
                fun showA() { print a; }
                showA();
                var a = "block";
                showA();
            }
        "#;

        assert_eq!(output_of(source), "global\nglobal\n");
    }

    #[test]
    fn test_arity_mismatch() {
        assert_eq!(
            runtime_message("fun f(a, b) {} f(1);"),
            "Expected 2 arguments but got 1."
        );
    }

    #[test]
    fn test_calling_a_non_callable() {
        assert_eq!(
            runtime_message("\"not a function\"();"),
            "Can only call functions and classes."
        );
    }

    #[test]
    fn test_clock_is_a_number() {
        assert_eq!(output_of("var t = clock(); print t >= 0;"), "true\n");
    }

    // ───────────────────────────── classes ─────────────────────────────────

    #[test]
    fn test_fields_and_methods() {
        let source = r#"
            class Counter {
                init(start) { this.count = start; }
                bump() { this.count = this.count + 1; return this; }
            }

            var c = Counter(5);
            c.bump().bump();
            print c.count;
        "#;

        assert_eq!(output_of(source), "7\n");
    }

    #[test]
    fn test_bound_method_remembers_instance() {
        let source = r#"
            class Person {
                init(name) { this.name = name; }
                greet() { print "hi " + this.name; }
            }

            var greet = Person("ada").greet;
            greet();
        "#;

        assert_eq!(output_of(source), "hi ada\n");
    }

    #[test]
    fn test_fields_shadow_methods() {
        let source = r#"
            class A { m() { return "method"; } }
            var a = A();
            a.m = "field";
            print a.m;
        "#;

        assert_eq!(output_of(source), "field\n");
    }

    #[test]
    fn test_init_returns_instance() {
        let source = r#"
            class Foo {
                init() {
                    this.x = 1;
                    return;
                }
            }

            var foo = Foo();
            print foo.init() == foo;
            print foo.x;
        "#;

        assert_eq!(output_of(source), "true\n1\n");
    }

    #[test]
    fn test_class_arity_follows_init() {
        assert_eq!(
            runtime_message("class P { init(x, y) {} } P(1);"),
            "Expected 2 arguments but got 1."
        );
        assert_eq!(
            runtime_message("class Q {} Q(1);"),
            "Expected 0 arguments but got 1."
        );
    }

    #[test]
    fn test_undefined_property() {
        assert_eq!(
            runtime_message("class A {} print A().nope;"),
            "Undefined property 'nope'."
        );
    }

    #[test]
    fn test_properties_on_non_instances() {
        assert_eq!(runtime_message("print 1.x;"), "Only instances have properties.");
        assert_eq!(runtime_message("var s = \"s\"; s.x = 1;"), "Only instances have fields.");
    }

    #[test]
    fn test_instances_compare_by_identity() {
        assert_eq!(
            output_of("class A {} var a = A(); var b = A(); print a == a; print a == b;"),
            "true\nfalse\n"
        );
    }

    // ───────────────────────────── compile errors ──────────────────────────

    #[test]
    fn test_syntax_errors_prevent_execution() {
        let outcome = run_program("print \"side effect\";\nprint ;\nvar = 2;");

        assert_eq!(outcome.status, Status::CompileError);
        assert_eq!(outcome.output, "");
        assert_eq!(outcome.diagnostics.len(), 2);
        assert_eq!(outcome.diagnostics[0].line(), Some(2));
        assert_eq!(outcome.diagnostics[1].line(), Some(3));
    }

    #[test]
    fn test_lex_and_parse_errors_are_reported_together() {
        let outcome = run_program("var a = @;\nprint ;");

        assert_eq!(outcome.status, Status::CompileError);
        assert_eq!(outcome.diagnostics.len(), 3);
        assert_eq!(
            outcome.diagnostics[0].to_string(),
            "[line 1] Error: Unexpected character."
        );
    }

    #[test]
    fn test_resolve_errors_prevent_execution() {
        let outcome = run_program("print 1;\n{ var a = 1; var a = 2; }");

        assert_eq!(outcome.status, Status::CompileError);
        assert_eq!(outcome.output, "");
        assert_eq!(outcome.diagnostics.len(), 1);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Status::Ok.exit_code(), 0);
        assert_eq!(Status::CompileError.exit_code(), 65);
        assert_eq!(Status::RuntimeError.exit_code(), 70);
        assert_eq!(
            serde_json::to_string(&Status::CompileError).unwrap(),
            "\"CompileError\""
        );
    }

    // ───────────────────────────── sessions ────────────────────────────────

    #[test]
    fn test_session_keeps_state_between_lines() {
        let mut session = Session::with_output(Box::new(std::io::sink()));

        assert_eq!(session.run("var a = 1;".to_string()).status, Status::Ok);
        assert_eq!(session.run("fun inc() { a = a + 1; return a; }".to_string()).status, Status::Ok);
        assert_eq!(session.run("print a = ;".to_string()).status, Status::CompileError);
        assert_eq!(session.run("print inc();".to_string()).status, Status::Ok);
        assert_eq!(session.run("print nope;".to_string()).status, Status::RuntimeError);
        assert_eq!(session.run("inc(); if (a != 3) nope();".to_string()).status, Status::Ok);
    }
}
