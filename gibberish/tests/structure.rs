use gibberish::Program;
use gibberish::collector::{collect, collect_block};
use gibberish::line::LineStore;
use gibberish::outline::outline;
use gibberish::parser::Parser;
use gibberish::scanner::scan;
use gibberish::value::{Value, ValueTag};
use pretty_assertions::assert_eq;

fn texts(store: &LineStore) -> Vec<&str> {
    store.iter().map(|l| l.text.as_str()).collect()
}

// --- Line store ---

#[test]
fn depth_counts_leading_markers_only() {
    let store = LineStore::from_texts([">>a>b", "plain", ">"]);
    assert_eq!(store[0].depth(), 2);
    assert_eq!(store[1].depth(), 0);
    assert_eq!(store[2].depth(), 1);
}

#[test]
fn content_strips_up_to_depth_markers() {
    let store = LineStore::from_texts([">>>x"]);
    assert_eq!(store[0].content_at(1), ">>x");
    assert_eq!(store[0].content_at(3), "x");
    assert_eq!(store[0].content_at(9), "x");
}

#[test]
fn from_texts_lays_out_spans() {
    let store = LineStore::from_texts(["ab", "cde"]);
    assert_eq!(store[0].span, 0..2);
    assert_eq!(store[1].span, 3..6);
    assert_eq!(store[1].source_line, 2);
    assert_eq!(store[1].index, 1);
}

// --- Preprocessing ---

#[test]
fn parser_drops_comments_and_blank_lines() {
    let source = "# header\n\n  repeat 2\n\t>body\n   # indented comment\n   \n>tail\n";
    let program = Parser::new(source.to_string(), 7).parse();
    assert_eq!(program.source_id, 7);
    assert_eq!(texts(&program.lines), vec!["repeat 2", ">body", ">tail"]);
    let source_lines: Vec<usize> = program.lines.iter().map(|l| l.source_line).collect();
    assert_eq!(source_lines, vec![3, 4, 7]);
}

#[test]
fn parser_spans_point_at_cleaned_text() {
    let source = "\n  repeat 2\r\n>x";
    let program = Parser::new(source.to_string(), 0).parse();
    for line in &program.lines {
        assert_eq!(&source[line.span.clone()], line.text);
    }
    assert_eq!(program.lines[0].text, "repeat 2");
}

#[test]
fn parser_ignores_byte_order_mark() {
    let source = "\u{feff}repeat 1\n>x";
    let program = Parser::new(source.to_string(), 0).parse();
    assert_eq!(texts(&program.lines), vec!["repeat 1", ">x"]);
    assert_eq!(&source[program.lines[0].span.clone()], "repeat 1");
}

#[test]
fn empty_source_is_an_empty_program() {
    let program = Parser::new("# only comments\n\n".to_string(), 0).parse();
    assert!(program.lines.is_empty());
}

// --- Block collector ---

#[test]
fn collect_stops_at_first_shallower_line() {
    let store = LineStore::from_texts(["repeat 2", ">a", ">>b", ">c", "d", ">e"]);
    assert_eq!(collect(&store, 1, 1), 1..4);
    assert_eq!(collect(&store, 2, 2), 2..3);
}

#[test]
fn collect_allows_empty_bodies() {
    let store = LineStore::from_texts(["repeat 2", "next"]);
    assert_eq!(collect(&store, 1, 1), 1..1);
    assert_eq!(collect(&store, 2, 1), 2..2);
    assert_eq!(collect(&store, 10, 1), 2..2);
}

#[test]
fn collect_block_starts_after_command() {
    let store = LineStore::from_texts(["repeat 3", ">hello", "after"]);
    let command = scan(&store[0], 0).into_command().unwrap().unwrap();
    let block = collect_block(&store, command, 1);
    assert_eq!(block.body, 1..2);
    assert_eq!(block.depth, 1);
    assert_eq!(store[block.body.start].text, ">hello");
    assert!(!block.is_empty());
}

// --- Value model ---

#[test]
fn value_tags() {
    assert_eq!(Value::default().tag(), ValueTag::Nothing);
    assert_eq!(Value::Numeric(3).tag(), ValueTag::Numeric);
    assert_eq!(Value::Reference("x".into()).type_name(), "Reference");
    assert_eq!(Value::Numeric(3).as_numeric(), Some(3));
    assert_eq!(Value::Reference("x".into()).as_numeric(), None);
    assert_eq!(Value::Numeric(42).to_string(), "42");
    assert_eq!(Value::Nothing.to_string(), "nothing");
}

// --- Outline ---

#[test]
fn outline_builds_nested_tree() {
    let program = Program::from_lines(["repeat 2", ">start", ">repeat 3", ">>leaf", ">end", "repeat 1", ">x"]);
    let outline = outline(&program).expect("well-formed");

    assert_eq!(outline.roots().len(), 2);
    let first = outline.node(outline.roots()[0]);
    assert_eq!(first.count(), 2);
    assert_eq!(first.body, 1..5);
    assert_eq!(first.leaf_lines, 2);
    assert_eq!(first.children.len(), 1);

    let inner = outline.node(first.children[0]);
    assert_eq!(inner.depth, 2);
    assert_eq!(inner.body, 3..4);

    // 2 * (2 + 3 * 1) + 1 * 1
    assert_eq!(outline.expected_output(), 11);

    let order: Vec<usize> = outline.walk().iter().map(|(_, n)| n.command.line).collect();
    assert_eq!(order, vec![0, 2, 5]);
}

#[test]
fn outline_reports_every_problem() {
    let program = Program::from_lines([">orphan", "repeat", ">skipped", "repeat 1", ">>deep", "repeat x"]);
    let errors = outline(&program).expect_err("malformed");
    let lines: Vec<usize> = errors.iter().map(|e| e.line).collect();
    assert_eq!(lines, vec![0, 1, 4, 5]);
    assert!(errors[0].message.contains("unbalanced depth"));
    assert!(errors[1].message.contains("malformed repeat count"));
    assert!(errors.iter().all(|e| e.is_error()));
}

#[test]
fn outline_warns_about_dead_bodies() {
    let program = Program::from_lines(["repeat 0", ">never"]);
    let outline = outline(&program).expect("well-formed");
    assert_eq!(outline.warnings.len(), 1);
    assert!(!outline.warnings[0].is_error());
    assert_eq!(outline.expected_output(), 0);
}

#[test]
fn outline_expected_output_saturates() {
    let program = Program::from_lines([
        "repeat 18446744073709551615",
        ">repeat 18446744073709551615",
        ">>x",
    ]);
    let outline = outline(&program).expect("well-formed");
    assert_eq!(outline.expected_output(), u64::MAX);
}

#[test]
fn parse_checked_returns_program_and_outline() {
    let (program, outline) = Parser::new("repeat 2\n>hi\n".to_string(), 0)
        .parse_checked()
        .expect("well-formed");
    assert_eq!(program.lines.len(), 2);
    assert_eq!(outline.expected_output(), 2);
}

#[test]
fn scan_error_diagnostic_labels_from_keyword() {
    let program = Parser::new("say repeat\n".to_string(), 3).parse();
    let errors = outline(&program).expect_err("malformed");
    assert_eq!(errors[0].span, 4..10);
    assert_eq!(errors[0].file_id, 3);
    let diagnostic = errors[0].to_diagnostic();
    assert_eq!(diagnostic.labels.len(), 1);
    assert!(!diagnostic.notes.is_empty());
}
