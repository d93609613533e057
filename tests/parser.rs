#[cfg(test)]
mod parser_tests {
    use treelox as lox;

    use lox::ast_printer::AstPrinter;
    use lox::error::LoxError;
    use lox::parser::{Expr, Parser, Stmt};
    use lox::scanner::Scanner;

    fn parse_expr(source: &str) -> Expr {
        let (tokens, diagnostics) = Scanner::new(source.as_bytes()).scan();
        assert!(diagnostics.is_empty(), "lex errors: {:?}", diagnostics);

        Parser::new(tokens)
            .parse_expression()
            .expect("expression should parse")
    }

    fn parse_program(source: &str) -> (Vec<Stmt>, Vec<LoxError>) {
        let (tokens, diagnostics) = Scanner::new(source.as_bytes()).scan();
        assert!(diagnostics.is_empty(), "lex errors: {:?}", diagnostics);

        Parser::new(tokens).parse()
    }

    fn printed(source: &str) -> String {
        AstPrinter::print(&parse_expr(source))
    }

    #[test]
    fn test_parser_01_precedence() {
        assert_eq!(printed("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
        assert_eq!(printed("1 * 2 + 3"), "(+ (* 1.0 2.0) 3.0)");
        assert_eq!(printed("1 < 2 == true"), "(== (< 1.0 2.0) true)");
    }

    #[test]
    fn test_parser_02_grouping() {
        assert_eq!(printed("(1 + 2) * 3"), "(* (group (+ 1.0 2.0)) 3.0)");
    }

    #[test]
    fn test_parser_03_unary_nesting() {
        assert_eq!(printed("!!true"), "(! (! true))");
        assert_eq!(printed("--1"), "(- (- 1.0))");
    }

    #[test]
    fn test_parser_04_assignment_is_right_associative() {
        assert_eq!(printed("a = b = 1"), "(= a (= b 1.0))");
    }

    #[test]
    fn test_parser_05_logical_operators() {
        assert_eq!(printed("a or b and c"), "(or a (and b c))");
    }

    #[test]
    fn test_parser_06_property_access_and_set() {
        assert_eq!(printed("a.b.c"), "(. (. a b) c)");
        assert_eq!(printed("a.b = 1"), "(= (. a b) 1.0)");
    }

    #[test]
    fn test_parser_07_calls() {
        assert_eq!(printed("f(1, 2)"), "(call f 1.0 2.0)");
        assert_eq!(printed("f()()"), "(call (call f))");
    }

    #[test]
    fn test_parser_08_var_declaration() {
        let (statements, diagnostics) = parse_program("var answer = 42;");

        assert!(diagnostics.is_empty());
        assert_eq!(statements.len(), 1);

        match &statements[0] {
            Stmt::Var { name, initializer } => {
                assert_eq!(name.lexeme, "answer");
                assert!(initializer.is_some());
            }
            other => panic!("expected Var, got {:?}", other),
        }
    }

    #[test]
    fn test_parser_09_for_desugars_to_while() {
        let (statements, diagnostics) =
            parse_program("for (var i = 0; i < 3; i = i + 1) print i;");

        assert!(diagnostics.is_empty());
        assert_eq!(statements.len(), 1);

        // { var i = 0; while (i < 3) { print i; i = i + 1; } }
        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected Block, got {:?}", statements[0]);
        };
        assert_eq!(outer.len(), 2);
        assert!(matches!(outer[0], Stmt::Var { .. }));

        let Stmt::While { body, .. } = &outer[1] else {
            panic!("expected While, got {:?}", outer[1]);
        };

        let Stmt::Block(inner) = body.as_ref() else {
            panic!("expected Block body, got {:?}", body);
        };
        assert_eq!(inner.len(), 2);
        assert!(matches!(inner[0], Stmt::Print(_)));
        assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
    }

    #[test]
    fn test_parser_10_for_without_condition_loops_on_true() {
        let (statements, diagnostics) = parse_program("for (;;) print 1;");

        assert!(diagnostics.is_empty());

        let Stmt::While { condition, .. } = &statements[0] else {
            panic!("expected While, got {:?}", statements[0]);
        };
        assert_eq!(AstPrinter::print(condition), "true");
    }

    #[test]
    fn test_parser_11_if_else_binds_to_nearest() {
        let (statements, diagnostics) =
            parse_program("if (a) if (b) print 1; else print 2;");

        assert!(diagnostics.is_empty());

        let Stmt::If {
            then_branch,
            else_branch,
            ..
        } = &statements[0]
        else {
            panic!("expected If, got {:?}", statements[0]);
        };

        // The `else` attaches to the inner `if`.
        assert!(else_branch.is_none());
        assert!(matches!(
            then_branch.as_ref(),
            Stmt::If {
                else_branch: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_parser_12_class_declaration() {
        let (statements, diagnostics) = parse_program(
            "class Breakfast {\n  init(food) { this.food = food; }\n  serve() { print this.food; }\n}",
        );

        assert!(diagnostics.is_empty());
        assert_eq!(statements.len(), 1);

        let Stmt::Class { name, methods } = &statements[0] else {
            panic!("expected Class, got {:?}", statements[0]);
        };
        assert_eq!(name.lexeme, "Breakfast");
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].name.lexeme, "init");
        assert_eq!(methods[0].params.len(), 1);
        assert_eq!(methods[1].name.lexeme, "serve");
    }

    #[test]
    fn test_parser_13_return_statement() {
        let (statements, diagnostics) =
            parse_program("fun f() { return 1; }\nfun g() { return; }");

        assert!(diagnostics.is_empty());

        let Stmt::Function(f) = &statements[0] else {
            panic!("expected Function, got {:?}", statements[0]);
        };
        assert!(matches!(f.body[0], Stmt::Return { value: Some(_), .. }));

        let Stmt::Function(g) = &statements[1] else {
            panic!("expected Function, got {:?}", statements[1]);
        };
        assert!(matches!(g.body[0], Stmt::Return { value: None, .. }));
    }

    #[test]
    fn test_parser_14_error_recovery_keeps_later_statements() {
        let (statements, diagnostics) = parse_program("var;\nprint 1;\n+;\nprint 2;");

        // Both malformed statements are reported, both healthy ones survive.
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(statements.len(), 2);
        assert!(matches!(statements[0], Stmt::Print(_)));
        assert!(matches!(statements[1], Stmt::Print(_)));
    }

    #[test]
    fn test_parser_15_invalid_assignment_target_is_nonfatal() {
        let (statements, diagnostics) = parse_program("1 = 2;\nprint 3;");

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0]
            .to_string()
            .contains("Invalid assignment target"));

        // The statement parses through to the RHS value; parsing continues.
        assert_eq!(statements.len(), 2);
        assert!(matches!(statements[0], Stmt::Expression(_)));
    }

    #[test]
    fn test_parser_16_argument_cap_is_reported_not_fatal() {
        let args: String = (0..256)
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let source = format!("f({});", args);

        let (statements, diagnostics) = parse_program(&source);

        assert_eq!(statements.len(), 1);
        assert!(diagnostics
            .iter()
            .any(|e| e.to_string().contains("Cannot have more than 255 arguments")));

        let Stmt::Expression(Expr::Call { arguments, .. }) = &statements[0] else {
            panic!("expected call, got {:?}", statements[0]);
        };
        assert_eq!(arguments.len(), 256);
    }

    #[test]
    fn test_parser_17_parse_expression_rejects_garbage() {
        let (tokens, _) = Scanner::new(b"var +".as_ref()).scan();

        assert!(Parser::new(tokens).parse_expression().is_err());
    }
}
