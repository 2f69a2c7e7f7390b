use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use codespan_reporting::term::termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use serde::Deserialize;

use interpreter::{DiagnosticError, ExecutionOptions};

const TEST_SUFFIX: &str = ".test.gib";

#[derive(Debug, Deserialize)]
pub struct ExpectedDiagnostic {
    /// Substring that must appear in the diagnostic message.
    pub contains: String,

    /// If set, the diagnostic's span must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Expected exact stdout output (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Expected terminal error — the error's Display string must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// If true, the test expects the structural check to fail.
    #[serde(default)]
    pub expect_parse_error: bool,

    /// Expected per-command diagnostics. If absent, any diagnostic fails the test.
    #[serde(default)]
    pub expect_diagnostics: Option<Vec<ExpectedDiagnostic>>,

    /// Output line limit for the run.
    #[serde(default)]
    pub output_limit: Option<u64>,

    /// Nesting limit for the run.
    #[serde(default)]
    pub max_depth: Option<usize>,
}

impl TestConfig {
    fn options(&self) -> ExecutionOptions {
        let defaults = ExecutionOptions::default();
        ExecutionOptions {
            max_depth: self.max_depth.unwrap_or(defaults.max_depth),
            output_limit: self.output_limit,
        }
    }
}

/// Split a `.test.gib` file into its TOML config and program source.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}'); // strip BOM

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..]; // skip \n---
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_suffix(TEST_SUFFIX))
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };

    let description = config.description.clone();
    let outcome = match check_program(&config, source) {
        None => TestOutcome::Pass,
        Some(reason) => TestOutcome::Fail(reason),
    };

    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

/// Run `source` against the expectations in `config`. Returns `Some(reason)` on failure.
fn check_program(config: &TestConfig, source: &str) -> Option<String> {
    let parser = gibberish::parser::Parser::new(source.to_string(), 0);

    if config.expect_parse_error {
        return match parser.parse_checked() {
            Err(_) => None,
            Ok(_) => Some("expected a structural error, but the check passed".into()),
        };
    }

    let program = parser.parse();
    let mut output_buf = Vec::new();
    let result = interpreter::execute_program_with(&program, &mut output_buf, &config.options());

    let diagnostics = match (&config.expect_error, result) {
        (Some(expected), Err(error)) => {
            let message = error.to_string();
            if !message.contains(expected.as_str()) {
                return Some(format!(
                    "expected error containing \"{}\", got: {}",
                    expected, message
                ));
            }
            Vec::new()
        }
        (Some(expected), Ok(_)) => {
            return Some(format!(
                "expected error containing \"{}\", but execution succeeded",
                expected
            ));
        }
        (None, Err(error)) => return Some(format!("unexpected runtime error: {}", error)),
        (None, Ok(report)) => report.diagnostics,
    };

    if let Some(expected_output) = &config.expect_output {
        let actual = String::from_utf8_lossy(&output_buf);
        let actual_trimmed = actual.trim();
        let expected_trimmed = expected_output.trim();
        if actual_trimmed != expected_trimmed {
            return Some(format!(
                "output mismatch\n  expected: {}\n  actual:   {}",
                expected_trimmed.replace('\n', "\\n"),
                actual_trimmed.replace('\n', "\\n")
            ));
        }
    }

    match &config.expect_diagnostics {
        Some(expected) => check_diagnostics(source, &diagnostics, expected),
        None => diagnostics
            .first()
            .map(|d| format!("unexpected diagnostic: {}", d)),
    }
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Check that actual diagnostics match expectations. Returns `Some(reason)` on mismatch.
fn check_diagnostics(
    source: &str,
    actual: &[DiagnosticError],
    expected: &[ExpectedDiagnostic],
) -> Option<String> {
    if actual.len() != expected.len() {
        let actual_msgs: Vec<String> = actual.iter().map(|d| format!("  - {}", d)).collect();
        return Some(format!(
            "expected {} diagnostic(s), got {}\n  actual diagnostics:\n{}",
            expected.len(),
            actual.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in actual.iter().zip(expected.iter()).enumerate() {
        let msg = actual.to_string();

        if !msg.contains(&expected.contains) {
            return Some(format!(
                "diagnostic[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, msg
            ));
        }

        if let Some(expected_line) = expected.line {
            let Some(span) = &actual.span else {
                return Some(format!(
                    "diagnostic[{}]: expected on line {}, but it has no span",
                    i, expected_line
                ));
            };
            let actual_line = byte_offset_to_line(source, span.start);
            if actual_line != expected_line {
                return Some(format!(
                    "diagnostic[{}]: expected on line {}, but span is on line {}",
                    i, expected_line, actual_line
                ));
            }
        }
    }

    None
}

/// Test files grouped by the directory they live in, relative to the suite
/// root and joined with `/`. Files directly in the root are grouped under "".
struct Suite {
    groups: BTreeMap<String, Vec<PathBuf>>,
}

impl Suite {
    fn discover(root: &Path) -> Self {
        let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for path in entries.flatten().map(|entry| entry.path()) {
                if path.is_dir() {
                    pending.push(path);
                } else if is_test_file(&path) {
                    groups.entry(category_of(&dir, root)).or_default().push(path);
                }
            }
        }

        for files in groups.values_mut() {
            files.sort();
        }
        Suite { groups }
    }

    fn single(path: &Path) -> Self {
        Suite {
            groups: BTreeMap::from([(String::new(), vec![path.to_path_buf()])]),
        }
    }

    fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn names(&self) -> String {
        self.groups
            .keys()
            .map(|category| display_category(category))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Keep the requested categories and everything nested under them.
    fn select(self, requested: &[String]) -> Self {
        if requested.is_empty() {
            return self;
        }

        let wanted: Vec<&str> = requested.iter().map(|r| r.trim_matches('/')).collect();
        for name in &wanted {
            if !self.groups.keys().any(|category| in_category(category, name)) {
                eprintln!("warning: no category '{}' (have: {})", name, self.names());
            }
        }

        let groups = self
            .groups
            .into_iter()
            .filter(|(category, _)| wanted.iter().any(|name| in_category(category, name)))
            .collect();
        Suite { groups }
    }
}

fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(TEST_SUFFIX))
}

fn category_of(dir: &Path, root: &Path) -> String {
    dir.strip_prefix(root)
        .map(|relative| {
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}

fn in_category(category: &str, name: &str) -> bool {
    category
        .strip_prefix(name)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn display_category(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List the categories found under `path`.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("{} is a single test file", path.display());
        return;
    }

    let suite = Suite::discover(path);
    if suite.is_empty() {
        eprintln!("no *{} files under {}", TEST_SUFFIX, path.display());
        return;
    }

    eprintln!("categories:");
    for (category, files) in &suite.groups {
        eprintln!("  {} ({} tests)", display_category(category), files.len());
    }
}

/// Writes per-test status lines and the final tally to stderr.
struct Reporter {
    out: StandardStream,
}

impl Reporter {
    fn new(no_color: bool) -> Self {
        let choice = if no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        Reporter {
            out: StandardStream::stderr(choice),
        }
    }

    fn styled(&mut self, text: &str, spec: &ColorSpec) -> io::Result<()> {
        self.out.set_color(spec)?;
        write!(self.out, "{}", text)?;
        self.out.reset()
    }

    fn heading(&mut self, category: &str) -> io::Result<()> {
        writeln!(self.out)?;
        self.styled(display_category(category), ColorSpec::new().set_bold(true))?;
        writeln!(self.out)
    }

    fn result(&mut self, result: &TestResult) -> io::Result<()> {
        let (status, color) = match result.outcome {
            TestOutcome::Pass => ("PASS", Color::Green),
            TestOutcome::Fail(_) => ("FAIL", Color::Red),
        };
        write!(self.out, "  ")?;
        self.styled(status, ColorSpec::new().set_fg(Some(color)))?;
        writeln!(self.out, "  {}", result.label())
    }

    fn failures(&mut self, failures: &[TestResult]) -> io::Result<()> {
        if failures.is_empty() {
            return Ok(());
        }

        writeln!(self.out)?;
        writeln!(self.out, "failures:")?;
        for failure in failures {
            writeln!(self.out)?;
            writeln!(self.out, "  --- {} ---", failure.path.display())?;
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    writeln!(self.out, "    {}", line)?;
                }
            }
        }
        Ok(())
    }

    fn summary(&mut self, passed: usize, failed: usize) -> io::Result<()> {
        writeln!(self.out)?;
        write!(self.out, "test result: ")?;
        if failed == 0 {
            self.styled("ok", ColorSpec::new().set_fg(Some(Color::Green)))?;
            writeln!(self.out, ". {} passed, 0 failed", passed)
        } else {
            self.styled("FAILED", ColorSpec::new().set_fg(Some(Color::Red)))?;
            writeln!(
                self.out,
                ". {} passed, {} failed (of {})",
                passed,
                failed,
                passed + failed
            )
        }
    }
}

/// Run the `*.test.gib` files under `path`, or `path` itself if it is a file.
/// A non-empty `categories` restricts a directory run to those categories.
/// Returns the process exit code.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let single = path.is_file();
    let suite = if single {
        Suite::single(path)
    } else {
        let suite = Suite::discover(path);
        if suite.is_empty() {
            eprintln!("no *{} files under {}", TEST_SUFFIX, path.display());
            return 1;
        }
        suite.select(categories)
    };

    if suite.is_empty() {
        eprintln!("no matching categories");
        return 1;
    }

    let mut reporter = Reporter::new(no_color);
    match run_suite(&suite, single, &mut reporter) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            eprintln!("cannot write test report: {}", e);
            1
        }
    }
}

/// Returns whether every test passed.
fn run_suite(suite: &Suite, single: bool, reporter: &mut Reporter) -> io::Result<bool> {
    let mut passed = 0;
    let mut failures = Vec::new();

    for (category, files) in &suite.groups {
        if !single {
            reporter.heading(category)?;
        }
        for file in files {
            let result = run_single_test(file);
            reporter.result(&result)?;
            match result.outcome {
                TestOutcome::Pass => passed += 1,
                TestOutcome::Fail(_) => failures.push(result),
            }
        }
    }

    reporter.failures(&failures)?;
    reporter.summary(passed, failures.len())?;
    Ok(failures.is_empty())
}
