use gibberish::Program;
use gibberish::outline::outline;
use interpreter::{DepthTracker, ExecutionOptions, Executor};
use proptest::prelude::*;

fn body_line() -> impl Strategy<Value = String> {
    // Body text never contains the keyword or a leading marker.
    "[a-z ]{0,12}".prop_filter("no keyword", |s| !s.contains("repeat"))
}

fn execute(lines: &[String]) -> (Vec<String>, usize) {
    let program = Program::from_lines(lines.iter().cloned());
    let options = ExecutionOptions::default();
    let mut output = Vec::new();
    let mut tracker = DepthTracker::new();
    {
        let mut executor = Executor::new(&program, &mut output, &options);
        executor.run(&mut tracker).expect("execution failed");
    }
    let text = String::from_utf8(output).unwrap();
    (text.lines().map(str::to_string).collect(), tracker.depth())
}

proptest! {
    #[test]
    fn repeat_emits_count_times_body(count in 0u64..20, body in prop::collection::vec(body_line(), 0..6)) {
        let mut lines = vec![format!("repeat {}", count)];
        lines.extend(body.iter().map(|l| format!(">{}", l)));

        let (output, depth) = execute(&lines);

        prop_assert_eq!(output.len() as u64, count * body.len() as u64);
        prop_assert_eq!(depth, 0);
        for chunk in output.chunks(body.len().max(1)) {
            prop_assert_eq!(chunk, &body[..chunk.len()]);
        }
    }

    #[test]
    fn nested_counts_multiply(outer in 0u64..6, inner in 0u64..6, leaves in 1usize..4) {
        let mut lines = vec![format!("repeat {}", outer), format!(">repeat {}", inner)];
        lines.extend((0..leaves).map(|i| format!(">>leaf {}", i)));

        let (output, depth) = execute(&lines);

        prop_assert_eq!(output.len() as u64, outer * inner * leaves as u64);
        prop_assert_eq!(depth, 0);

        let program = Program::from_lines(lines.iter().cloned());
        let predicted = outline(&program).expect("well-formed").expected_output();
        prop_assert_eq!(predicted, output.len() as u64);
    }
}
