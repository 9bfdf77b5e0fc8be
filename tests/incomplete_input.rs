//! The parser's incomplete-input verdict: the signal an interactive
//! driver uses to keep reading lines instead of reporting an error.

use rill_lang::parser::{parse, ParseError};

fn is_incomplete(source: &str) -> bool {
    matches!(parse(source), Err(ParseError::Incomplete(_)))
}

#[test]
fn open_constructs_are_incomplete() {
    assert!(is_incomplete("func f() {"));
    assert!(is_incomplete("if x {"));
    assert!(is_incomplete("while x {\n print 1"));
    assert!(is_incomplete("var xs = [1, 2,"));
    assert!(is_incomplete("print(1 + "));
    assert!(is_incomplete("var d = { \"a\": "));
    assert!(is_incomplete("struct P {"));
    assert!(is_incomplete("1 +"));
    assert!(is_incomplete("var x ="));
}

#[test]
fn complete_submissions_parse() {
    assert!(parse("func f() {\n print 1\n}").is_ok());
    assert!(parse("if x {\n} else {\n}").is_ok());
    assert!(parse("var xs = [1, 2]").is_ok());
}

#[test]
fn syntax_errors_are_not_incomplete() {
    assert!(matches!(
        parse("var = 1"),
        Err(ParseError::Syntax { .. })
    ));
    assert!(matches!(
        parse("print )"),
        Err(ParseError::Syntax { .. })
    ));
    assert!(matches!(
        parse("func f(x int) { }"),
        Err(ParseError::Syntax { .. })
    ));
}

#[test]
fn growing_a_buffer_line_by_line_eventually_parses() {
    // the way the REPL drives the parser: accumulate while incomplete
    let lines = ["func add(a: int, b: int) -> int {", "return a + b", "}"];
    let mut buffer = String::new();

    let mut verdicts = vec![];
    for line in lines {
        buffer.push_str(line);
        buffer.push('\n');
        verdicts.push(parse(&buffer).is_ok());
    }
    assert_eq!(verdicts, vec![false, false, true]);
}

#[test]
fn incomplete_error_positions_are_absent_but_syntax_positions_exist() {
    let Err(ParseError::Syntax { span, .. }) = parse("print )") else {
        panic!("expected syntax error");
    };
    assert_eq!(span.line, 1);
}
