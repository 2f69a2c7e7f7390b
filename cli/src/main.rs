mod test_runner;

use std::path::Path;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use gibberish::Program;
use gibberish::outline::Outline;
use gibberish::parser::ParseError;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use interpreter::{DiagnosticError, ExecutionOptions};

const SUBCOMMANDS: &[&str] = &["run", "test", "help"];

#[derive(Parser)]
#[command(name = "gibberish", version, about = "Gibberish interpreter")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log more (-v debug, -vv trace). RUST_LOG overrides this.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a gibberish program
    Run(RunArgs),

    /// Run .test.gib test files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Source file to execute
    file: String,

    /// Check block structure only, don't execute (exit 0 if well-formed)
    #[arg(long)]
    check: bool,

    /// Print the block tree
    #[arg(long)]
    outline: bool,

    /// Dump the cleaned source lines
    #[arg(long)]
    lines: bool,

    /// Suppress program output (just check for errors)
    #[arg(short, long)]
    quiet: bool,

    /// Maximum repeat nesting depth
    #[arg(long, default_value_t = interpreter::executor::MAX_DEPTH)]
    max_depth: usize,

    /// Stop with an error after printing this many lines
    #[arg(long)]
    output_limit: Option<u64>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.gib file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `gibberish file.gib` works like `gibberish run file.gib`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args.iter().skip(1).position(|a| !a.starts_with('-')) {
        let pos = pos + 1;
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "run".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose, cli.no_color);

    match cli.command {
        Command::Run(run_args) => do_run(run_args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn init_logging(verbose: u8, no_color: bool) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .init();
}

fn do_run(args: RunArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();

    // Read source
    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    // Set up codespan file database
    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    let parser = gibberish::parser::Parser::new(source, file_id);

    if args.lines {
        print_lines(&parser.parse());
        return;
    }

    if args.check || args.outline {
        let (program, outline) = match parser.parse_checked() {
            Ok(checked) => checked,
            Err(errors) => {
                emit_parse_errors(&writer, &config, &files, &errors);
                process::exit(1);
            }
        };
        emit_parse_errors(&writer, &config, &files, &outline.warnings);

        if args.outline {
            print_outline(&program, &outline);
        } else {
            eprintln!("ok: {} is well-formed", args.file);
        }
        return;
    }

    let program = parser.parse();
    let options = ExecutionOptions {
        max_depth: args.max_depth,
        output_limit: args.output_limit,
    };

    let result = if args.quiet {
        let mut sink = std::io::sink();
        interpreter::execute_program_with(&program, &mut sink, &options)
    } else {
        let mut stdout = std::io::stdout().lock();
        interpreter::execute_program_with(&program, &mut stdout, &options)
    };

    match result {
        Ok(report) => {
            debug!(
                lines = report.lines_emitted,
                commands = report.commands_executed,
                "run finished"
            );
            for diag in &report.diagnostics {
                emit_diagnostic_error(&writer, &config, &files, diag);
            }
            if report.has_errors() {
                process::exit(1);
            }
        }
        Err(error) => {
            emit_diagnostic_error(&writer, &config, &files, &error);
            process::exit(1);
        }
    }
}

fn emit_parse_errors(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    errors: &[ParseError],
) {
    for error in errors {
        let diagnostic = error.to_diagnostic();
        let _ = term::emit_to_write_style(&mut writer.lock(), config, files, &diagnostic);
    }
}

fn emit_diagnostic_error(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    error: &DiagnosticError,
) {
    if let Some(span) = &error.span {
        let mut diagnostic = Diagnostic::error()
            .with_message(error.to_string())
            .with_labels(vec![Label::primary(error.source_id, span.clone())]);
        if let Some(line) = error.line {
            diagnostic = diagnostic.with_notes(vec![format!("line index {}", line)]);
        }
        let _ = term::emit_to_write_style(&mut writer.lock(), config, files, &diagnostic);
    } else {
        eprintln!("runtime error: {}", error);
    }
}

fn print_lines(program: &Program) {
    for line in &program.lines {
        println!(
            "{:>4} {:>4}:{:<3} {}",
            line.index,
            line.source_line,
            line.depth(),
            line.text
        );
    }
}

fn print_outline(program: &Program, outline: &Outline) {
    for (_, node) in outline.walk() {
        let pad = "  ".repeat(node.depth - 1);
        let source_line = program.lines[node.command.line].source_line;
        let plural = if node.body.len() == 1 { "" } else { "s" };
        println!(
            "{}repeat {} (line {}, {} body line{})",
            pad,
            node.count(),
            source_line,
            node.body.len(),
            plural
        );
    }
    println!("total: {} output line(s)", outline.expected_output());
}
