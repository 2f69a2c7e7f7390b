use gibberish::line::LineStore;
use gibberish::scanner::{ScanError, ScanResult, scan};
use gibberish::value::Value;
use pretty_assertions::assert_eq;

fn scan_text(text: &str, offset: usize) -> ScanResult {
    let store = LineStore::from_texts([text]);
    scan(&store[0], offset)
}

#[test]
fn finds_command_at_start() {
    match scan_text("repeat 3", 0) {
        ScanResult::Found(command, next) => {
            assert_eq!(command.line, 0);
            assert_eq!(command.column, 0);
            assert_eq!(command.count, Value::Numeric(3));
            assert_eq!(next, 8);
        }
        other => panic!("expected a command, got {:?}", other),
    }
}

#[test]
fn finds_command_mid_line() {
    match scan_text(">>say repeat 12 please", 2) {
        ScanResult::Found(command, next) => {
            assert_eq!(command.column, 6);
            assert_eq!(command.count, Value::Numeric(12));
            assert_eq!(next, 15);
        }
        other => panic!("expected a command, got {:?}", other),
    }
}

#[test]
fn multiple_spaces_and_tabs_before_count() {
    let result = scan_text("repeat \t  7", 0);
    assert_eq!(result.into_command().unwrap().unwrap().count, Value::Numeric(7));
}

#[test]
fn zero_is_a_valid_count() {
    let command = scan_text("repeat 0", 0).into_command().unwrap().unwrap();
    assert_eq!(command.count, Value::Numeric(0));
}

#[test]
fn plain_text_is_not_found() {
    assert_eq!(scan_text("hello world", 0), ScanResult::NotFound(11));
    assert_eq!(scan_text("", 0), ScanResult::NotFound(0));
}

#[test]
fn keyword_glued_to_a_word_is_not_a_command() {
    assert_eq!(scan_text("repeated 3", 0), ScanResult::NotFound(10));
    assert_eq!(scan_text("repeat3", 0), ScanResult::NotFound(7));
}

#[test]
fn keyword_later_on_the_line_still_matches() {
    let command = scan_text("repeats and repeat 4", 0)
        .into_command()
        .unwrap()
        .unwrap();
    assert_eq!(command.column, 12);
    assert_eq!(command.count, Value::Numeric(4));
}

#[test]
fn bare_keyword_is_malformed() {
    assert_eq!(
        scan_text("repeat", 0),
        ScanResult::ParseError(ScanError::MalformedCount { line: 0, column: 0 })
    );
}

#[test]
fn keyword_followed_by_text_is_malformed() {
    assert_eq!(
        scan_text(">repeat many", 1),
        ScanResult::ParseError(ScanError::MalformedCount { line: 0, column: 1 })
    );
    assert_eq!(
        scan_text("repeat -2", 0),
        ScanResult::ParseError(ScanError::MalformedCount { line: 0, column: 0 })
    );
}

#[test]
fn huge_count_overflows() {
    let result = scan_text("repeat 99999999999999999999999", 0);
    match result {
        ScanResult::ParseError(ScanError::CountOverflow { digits, .. }) => {
            assert_eq!(digits, "99999999999999999999999");
        }
        other => panic!("expected overflow, got {:?}", other),
    }
}

#[test]
fn trailing_content_after_count_is_ignored() {
    match scan_text("repeat 2 repeat", 0) {
        ScanResult::Found(command, next) => {
            assert_eq!(command.count, Value::Numeric(2));
            assert_eq!(next, 8);
        }
        other => panic!("expected a command, got {:?}", other),
    }
}

#[test]
fn offset_past_keyword_skips_it() {
    assert_eq!(scan_text("repeat 2", 1), ScanResult::NotFound(8));
    assert_eq!(scan_text("repeat 2", 40), ScanResult::NotFound(8));
}

#[test]
fn non_ascii_text_is_stepped_over() {
    let command = scan_text("héllo ✓ repeat 5", 0)
        .into_command()
        .unwrap()
        .unwrap();
    assert_eq!(command.count, Value::Numeric(5));
}

#[test]
fn scan_error_reports_line_and_column() {
    let store = LineStore::from_texts(["ok", "x repeat"]);
    let error = scan(&store[1], 0).into_command().unwrap_err();
    assert_eq!(error.line(), 1);
    assert_eq!(error.column(), 2);
    assert!(error.to_string().contains("malformed repeat count on line 1"));
}
