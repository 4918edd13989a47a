//! Diagnostic quality: messages, hints, suggestions, and source ranges.

use carve::{evaluate, parse, FileSystemDelegate, ImportDelegate, ProgramError, RuntimeErrorKind, Value};

fn run_err(source: &str) -> carve::RuntimeError {
    let program = parse(source).expect("parse failed");
    evaluate(&program, &FileSystemDelegate, None, &|| false).expect_err("expected a runtime error")
}

#[test]
fn parse_errors_carry_a_range_into_the_source() {
    let error = parse("group {\ncube\n").expect_err("expected parse error");
    let range = error.range();
    assert!(range.start <= "group {\ncube\n".len());
    assert!(error.message().contains("expected closing brace"), "{}", error.message());
}

#[test]
fn lexer_error_for_bad_color() {
    let error = parse("color #12345").expect_err("expected lex error");
    let ProgramError::Lexer(error) = error else {
        panic!("expected lexer error, got {error:?}");
    };
    assert!(error.message().contains("#12345"));
    assert!(error.hint().is_some());
}

#[test]
fn alternatives_table_beats_edit_distance() {
    // `box` is nowhere near `cube` by edit distance, but users mean it.
    let error = run_err("box { }");
    assert_eq!(error.suggestion().as_deref(), Some("cube"));
    let error = run_err("subtract { cube }");
    assert_eq!(error.suggestion().as_deref(), Some("difference"));
}

#[test]
fn type_mismatch_message_names_the_symbol() {
    let error = run_err("opacity \"solid\"");
    let RuntimeErrorKind::TypeMismatch { for_name, expected, got, .. } = &error.kind else {
        panic!("expected type mismatch, got {error:?}");
    };
    assert_eq!(for_name, "opacity");
    assert_eq!(expected, "number");
    assert_eq!(got, "string");
    assert!(error.message().contains("opacity"));
}

#[test]
fn missing_argument_for_property() {
    let error = run_err("color");
    assert!(matches!(error.kind, RuntimeErrorKind::MissingArgument { .. }));
}

#[test]
fn unexpected_argument_for_constant() {
    let error = run_err("pi 4");
    let RuntimeErrorKind::UnexpectedArgument { for_name, max } = &error.kind else {
        panic!("expected unexpected argument, got {error:?}");
    };
    assert_eq!(for_name, "pi");
    assert_eq!(*max, 0);
}

#[test]
fn missing_function_argument_reports_position() {
    let error = run_err("print pow(2)");
    let RuntimeErrorKind::MissingArgument { for_name, index, .. } = &error.kind else {
        panic!("expected missing argument, got {error:?}");
    };
    assert_eq!(for_name, "pow");
    assert_eq!(*index, 1);
}

#[test]
fn extra_function_argument_reports_maximum() {
    let error = run_err("print pow(2 3 4)");
    let RuntimeErrorKind::UnexpectedArgument { max, .. } = &error.kind else {
        panic!("expected unexpected argument, got {error:?}");
    };
    assert_eq!(*max, 2);
}

#[test]
fn unknown_font_lists_known_fonts() {
    struct Fonts;
    impl ImportDelegate for Fonts {
        fn font_names(&self) -> Vec<String> {
            vec!["Helvetica".to_owned(), "Courier".to_owned()]
        }
    }
    let program = parse("font \"Helvetika\"").expect("parse failed");
    let error = evaluate(&program, &Fonts, None, &|| false).expect_err("expected font error");
    let RuntimeErrorKind::UnknownFont { name, options } = &error.kind else {
        panic!("expected unknown font, got {error:?}");
    };
    assert_eq!(name, "Helvetika");
    assert_eq!(options.len(), 2);
    assert_eq!(error.suggestion().as_deref(), Some("Helvetica"));
}

#[test]
fn blank_font_is_rejected_without_validation_list() {
    let error = run_err("font \"  \"");
    assert!(matches!(error.kind, RuntimeErrorKind::UnknownFont { .. }));
    assert!(error.message().contains("blank"));
}

#[test]
fn annotate_renders_message_hint_suggestion_and_line() {
    let source = "cube\ncuube { }\n";
    let program = parse(source).expect("parse failed");
    let error = evaluate(&program, &FileSystemDelegate, None, &|| false).expect_err("expected error");
    let rendered = ProgramError::from(error).annotate(source);
    assert!(rendered.contains("Unknown symbol 'cuube'"), "{rendered}");
    assert!(rendered.contains("Did you mean 'cube'?"), "{rendered}");
    assert!(rendered.contains("cuube { }"), "{rendered}");
}

#[test]
fn runtime_error_ranges_point_at_the_offender() {
    let source = "cube\nnope\n";
    let error = run_err(source);
    let range = error.range.clone();
    assert_eq!(&source[range], "nope");
}

#[test]
fn print_values_are_not_errors() {
    // `print` accepts anything, including void.
    let program = parse("print ()").expect("parse failed");
    let log = carve::CollectLog::new();
    evaluate(&program, &log, None, &|| false).expect("print never fails");
    assert_eq!(log.entries(), vec![vec![] as Vec<Value>]);
}
