use lox::error::{CollectedDiagnostics, Severity};
use lox::evaluator::Evaluator;
use lox::lexer::lex;
use lox::parser::{parse, parse_expression};
use lox::runner::{run_source, RunSummary};
use lox::value::Value;
use pretty_assertions::assert_eq;

/// Evaluate a standalone expression, returning its value or the error message.
fn eval(source: &str) -> Result<Value, String> {
    let mut sink = CollectedDiagnostics::new();
    let (tokens, lex_errors) = lex(source, &mut sink);
    assert_eq!(lex_errors, 0, "unexpected lex errors in {:?}", source);

    let (expr, parse_errors) = parse_expression(&tokens, &mut sink);
    assert_eq!(parse_errors, 0, "unexpected parse errors in {:?}", source);
    let expr = expr.expect("expression should parse");

    let mut evaluator = Evaluator::new(Vec::new());
    evaluator
        .evaluate_expression(&expr)
        .map(|value| (*value).clone())
        .map_err(|error| error.message)
}

fn number(n: f64) -> Result<Value, String> {
    Ok(Value::Number(n))
}

fn boolean(b: bool) -> Result<Value, String> {
    Ok(Value::Bool(b))
}

/// Run a program, returning what it printed plus the per-stage error counts.
fn run(source: &str) -> (String, RunSummary, CollectedDiagnostics) {
    let mut sink = CollectedDiagnostics::new();
    let mut out = Vec::new();
    let summary = run_source(source, &mut out, &mut sink);
    let printed = String::from_utf8(out).expect("output is utf-8");
    (printed, summary, sink)
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn arithmetic() {
    assert_eq!(eval("10 + 20"), number(30.0));
    assert_eq!(eval("10 - 20"), number(-10.0));
    assert_eq!(eval("2 * 3"), number(6.0));
    assert_eq!(eval("2 / 5"), number(2.0 / 5.0));
}

#[test]
fn precedence_and_left_associativity() {
    assert_eq!(
        eval("1 + 30 / 5 * 8 + 2 - 30 * 3"),
        number(1.0 + 30.0 / 5.0 * 8.0 + 2.0 - 30.0 * 3.0)
    );
    assert_eq!(eval("10 - 4 - 3"), number(3.0));
    assert_eq!(eval("64 / 4 / 2"), number(8.0));
}

#[test]
fn grouping_overrides_precedence() {
    assert_eq!(eval("(1 + 3) * 7"), number(28.0));
}

#[test]
fn string_concatenation() {
    assert_eq!(eval("\"abcd\" + \"ef\""), Ok(Value::String("abcdef".to_string())));
    assert_eq!(eval("\"a\" + \"b\" + \"c\""), Ok(Value::String("abc".to_string())));
}

#[test]
fn comparisons() {
    assert_eq!(eval("3.0 > 2.9"), boolean(true));
    assert_eq!(eval("3.0 <= 2.9"), boolean(false));
    assert_eq!(eval("3.1 < 15.001"), boolean(true));
    assert_eq!(eval("4.001 >= 4.001"), boolean(true));
}

#[test]
fn unary_operators() {
    assert_eq!(eval("-10 + 20"), number(10.0));
    assert_eq!(eval("--3"), number(3.0));
    assert_eq!(eval("!(10.4 < 10.5)"), boolean(false));
    assert_eq!(eval("!nil"), boolean(true));
    assert_eq!(eval("!false"), boolean(true));
}

#[test]
fn numbers_and_strings_are_truthy() {
    assert_eq!(eval("!(\"a\" + \"b\")"), boolean(false));
    assert_eq!(eval("!(10 + 30)"), boolean(false));
    assert_eq!(eval("!0"), boolean(false));
    assert_eq!(eval("!\"\""), boolean(false));
}

#[test]
fn equality_is_total() {
    assert_eq!(eval("nil == nil"), boolean(true));
    assert_eq!(eval("nil == false"), boolean(false));
    assert_eq!(eval("1 == \"1\""), boolean(false));
    assert_eq!(eval("\"a\" != \"b\""), boolean(true));
    assert_eq!(eval("2 + 2 == 4"), boolean(true));
    assert_eq!(eval("true != true"), boolean(false));
}

#[test]
fn type_errors_are_reported_not_panicked() {
    assert_eq!(eval("\"a\" - 1"), Err("Operands must be a number".to_string()));
    assert_eq!(
        eval("1 + true"),
        Err("Operands must be a number or string".to_string())
    );
    assert_eq!(eval("\"a\" < \"b\""), Err("Operands must be a number".to_string()));
    assert_eq!(eval("-\"a\""), Err("Operand must be a number".to_string()));
}

#[test]
fn undefined_variable_in_expression() {
    assert_eq!(eval("a + 1"), Err("Undefined variable: a".to_string()));
}

#[test]
fn failed_expression_counts_an_error() {
    let mut sink = CollectedDiagnostics::new();
    let (tokens, _) = lex("1 - nil", &mut sink);
    let (expr, _) = parse_expression(&tokens, &mut sink);

    let mut evaluator = Evaluator::new(Vec::new());
    assert!(evaluator.evaluate_expression(&expr.unwrap()).is_err());
    assert_eq!(evaluator.error_count(), 1);
}

#[test]
fn trailing_tokens_after_expression_are_rejected() {
    let mut sink = CollectedDiagnostics::new();
    let (tokens, _) = lex("1 2", &mut sink);
    let (expr, errors) = parse_expression(&tokens, &mut sink);

    assert!(expr.is_none());
    assert_eq!(errors, 1);
    assert_eq!(
        sink.messages(),
        vec!["Unexpected token. expected eof, got number"]
    );
}

// ============================================================================
// Programs
// ============================================================================

#[test]
fn print_number() {
    let (out, summary, _) = run("print 1 + 2;");
    assert!(summary.succeeded());
    assert_eq!(out, "3.000000\n");
}

#[test]
fn print_strings_in_order() {
    let (out, summary, _) = run("print \"hello\";\nprint \"world\";\nprint \"!\";\n");
    assert!(summary.succeeded());
    assert_eq!(out, "hello\nworld\n!\n");
}

#[test]
fn print_other_values() {
    let (out, _, _) = run("print true; print nil; print 1 / 0; print 0.5;");
    assert_eq!(out, "true\nnil\ninf\n0.500000\n");
}

#[test]
fn variable_declaration_and_assignment() {
    let (out, summary, _) = run("var a = 10;\nprint a;\na = a + 10;\nprint a;\n");
    assert!(summary.succeeded());
    assert_eq!(out, "10.000000\n20.000000\n");
}

#[test]
fn declaration_without_initializer_is_nil() {
    let (out, _, _) = run("var a; print a;");
    assert_eq!(out, "nil\n");
}

#[test]
fn assignment_is_an_expression() {
    let (out, summary, _) = run("var a = 1; var b = a = 5; print a; print b;");
    assert!(summary.succeeded());
    assert_eq!(out, "5.000000\n5.000000\n");
}

#[test]
fn chained_assignment_is_right_associative() {
    let (out, _, _) = run("var x; var y; x = y = 3; print x; print y;");
    assert_eq!(out, "3.000000\n3.000000\n");
}

#[test]
fn undefined_variable_is_a_runtime_error() {
    let (out, summary, sink) = run("print a;");
    assert_eq!(out, "");
    assert_eq!(summary.runtime_errors, 1);
    assert!(!summary.succeeded());
    assert_eq!(sink.messages(), vec!["Undefined variable: a"]);
}

#[test]
fn assignment_never_declares() {
    let (out, summary, _) = run("b = 1; print b;");
    assert_eq!(out, "");
    assert_eq!(summary.runtime_errors, 2);
}

#[test]
fn runtime_error_only_skips_its_statement() {
    let (out, summary, _) = run("print \"a\" - 1;\nprint 2;\n");
    assert_eq!(out, "2.000000\n");
    assert_eq!(summary.runtime_errors, 1);
    assert_eq!(summary.parse_errors, 0);
}

#[test]
fn later_statements_run_after_syntax_errors() {
    let (out, summary, _) = run("print 1 print 2;\nvar 1;\nprint 3;\n");
    assert_eq!(out, "1.000000\n2.000000\n3.000000\n");
    assert_eq!(summary.parse_errors, 2);
    assert!(summary.has_compile_errors());
}

#[test]
fn left_operand_error_short_circuits_right() {
    // Only the first undefined name is reported
    let (_, summary, sink) = run("print a + b;");
    assert_eq!(summary.runtime_errors, 1);
    assert_eq!(sink.messages(), vec!["Undefined variable: a"]);
}

#[test]
fn block_shadowing_restores_outer_binding() {
    let (out, summary, _) = run("var a = 1; { var a = 2; print a; } print a;");
    assert!(summary.succeeded());
    assert_eq!(out, "2.000000\n1.000000\n");
}

#[test]
fn block_assignment_reaches_outer_scope() {
    let (out, summary, _) = run("var a = 1; { a = 3; var b = 4; } print a; print b;");
    assert_eq!(out, "3.000000\n");
    assert_eq!(summary.runtime_errors, 1);
}

#[test]
fn scope_is_left_when_block_fails() {
    let mut sink = CollectedDiagnostics::new();
    let source = "var a = 1; { var a = 2; print missing; print a; } print a;";
    let (tokens, _) = lex(source, &mut sink);
    let (program, _) = parse(&tokens, &mut sink);

    let mut evaluator = Evaluator::new(Vec::new());
    let errors = evaluator.execute_program(&program, &mut sink);

    assert_eq!(errors, 1);
    assert_eq!(evaluator.environment().depth(), 1);
    assert_eq!(
        String::from_utf8(evaluator.into_output()).unwrap(),
        "2.000000\n1.000000\n"
    );
}

#[test]
fn every_failing_statement_in_a_block_is_reported() {
    let (out, summary, sink) = run("{ print a; print b; print 1; }");
    assert_eq!(out, "1.000000\n");
    assert_eq!(summary.runtime_errors, 2);
    assert_eq!(
        sink.messages(),
        vec!["Undefined variable: a", "Undefined variable: b"]
    );
}

#[test]
fn block_errors_match_top_level_errors() {
    let (flat_out, flat, _) = run("print a; print b; print 1;");
    let (block_out, block, _) = run("{ print a; { print b; } print 1; }");
    assert_eq!(block_out, flat_out);
    assert_eq!(block.runtime_errors, flat.runtime_errors);
}

#[test]
fn redeclaration_overwrites_with_a_note() {
    let (out, summary, sink) = run("var a = 1; var a = 2; print a;");
    assert!(summary.succeeded());
    assert_eq!(out, "2.000000\n");
    assert_eq!(sink.diagnostics.len(), 1);
    assert_eq!(sink.diagnostics[0].severity, Severity::Note);
}

#[test]
fn string_escapes() {
    let (out, _, _) = run(r#"print "say \"hi\"\tnow\n";"#);
    assert_eq!(out, "say \"hi\"\tnow\n\n");
}

#[test]
fn comments_are_ignored() {
    let (out, summary, _) = run("// leading\nprint 1; // trailing\n");
    assert!(summary.succeeded());
    assert_eq!(out, "1.000000\n");
}

#[test]
fn evaluator_state_persists_between_programs() {
    let mut sink = CollectedDiagnostics::new();
    let mut evaluator = Evaluator::new(Vec::new());

    for source in ["var count = 1;", "count = count + 1;", "print count;"] {
        let (tokens, _) = lex(source, &mut sink);
        let (program, _) = parse(&tokens, &mut sink);
        evaluator.execute_program(&program, &mut sink);
    }

    assert_eq!(evaluator.output().as_slice(), b"2.000000\n");
    assert_eq!(evaluator.error_count(), 0);
}

// ============================================================================
// Canonical printer
// ============================================================================

fn print_expression(source: &str) -> String {
    let mut sink = CollectedDiagnostics::new();
    let (tokens, _) = lex(source, &mut sink);
    let (expr, errors) = parse_expression(&tokens, &mut sink);
    assert_eq!(errors, 0);
    expr.expect("expression should parse").to_string()
}

#[test]
fn binary_expression_prints_parenthesized() {
    assert_eq!(print_expression("12 - 32"), "(12 - 32)");
    assert_eq!(print_expression("1 + 2"), "(1 + 2)");
    assert_eq!(print_expression("1 * 2"), "(1 * 2)");
}

#[test]
fn precedence_is_visible_in_printed_tree() {
    assert_eq!(
        print_expression("1 + 2 * 3 + 4 / 5 / ( 6 - 8 ) - (-9) + !10"),
        "((((1 + (2 * 3)) + ((4 / 5) / ((6 - 8)))) - (-9)) + !10)"
    );
}

#[test]
fn printer_keeps_literals_and_assignments() {
    assert_eq!(print_expression("x = \"hi\" == nil"), "x = (\"hi\" == nil)");
    assert_eq!(print_expression("a = b = true"), "a = b = true");
}

#[test]
fn printed_form_reparses_to_the_same_value() {
    let sources = [
        "1 + 30 / 5 * 8 + 2 - 30 * 3",
        "(1 + 3) * 7",
        "-(-9) - -2",
        "!(3.0 > 2.9) == false",
        "\"a\" + \"b\" + \"c\"",
        "\"esc\\\"aped\" + \"!\"",
        "1 < 2 != 3 >= 4",
    ];

    for source in sources {
        let printed = print_expression(source);
        assert_eq!(eval(&printed), eval(source), "round trip of {:?} via {:?}", source, printed);
        assert_eq!(print_expression(&printed), printed);
    }
}

#[test]
fn program_prints_statement_per_line() {
    let mut sink = CollectedDiagnostics::new();
    let source = "var a = 1; var b; print a + 2; { a = 3; } a;";
    let (tokens, _) = lex(source, &mut sink);
    let (program, errors) = parse(&tokens, &mut sink);

    assert_eq!(errors, 0);
    assert_eq!(
        program.to_string(),
        "var a = 1;\nvar b;\nprint (a + 2);\n{ a = 3; }\na;\n"
    );
}
