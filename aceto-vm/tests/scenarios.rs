//! End-to-end scenarios driving a full `Grid` + `Interpreter` over an
//! in-memory `Io` adapter, asserting on captured output.

use aceto_vm::io::MemoryIo;
use aceto_vm::{ExitOutcome, ExitReason, Interpreter};

fn run(src: &str) -> (ExitOutcome, String) {
    let mut interp = Interpreter::new(src, Some(1), MemoryIo::default());
    let outcome = interp.run();
    let io = interp.into_io();
    (outcome, io.output)
}

fn run_ok(src: &str) -> String {
    let (outcome, output) = run(src);
    assert!(matches!(outcome, ExitOutcome::Normal(ExitReason::CurveExhausted)), "unexpected outcome: {outcome:?}");
    output
}

#[test]
fn multiline_source_walks_from_the_bottom_left() {
    // The last source line is the bottom row, where the curve starts:
    // 3,7,+ -> 10; 6,* -> 60; +5 -> 65; c -> "A"; p prints it; 2,4,+ -> 6;
    // v jumps straight down to the final 'p', which prints it.
    assert_eq!(run_ok("5+24\n*cp+\n6+ v\n37 p"), "A6");
}

#[test]
fn addition_prints_sum() {
    assert_eq!(run_ok("32+p"), "5");
}

#[test]
fn subtraction_pops_operands_in_curve_order() {
    assert_eq!(run_ok("73-p"), "4");
}

#[test]
fn range_then_length_counts_pushed_values() {
    assert_eq!(run_ok("5z lp"), "5");
}

#[test]
fn string_literal_unescapes_newline() {
    // A string literal's cells follow curve distance, not row order, so the
    // characters are placed at the exact cells distance 0..6 visits. The
    // last source line sits at y=0, so the starting row comes last.
    assert_eq!(run_ok("Hi p\n\"\\n\"    "), "Hi\n");
}

#[test]
fn explicit_terminate_stops_the_run() {
    // Laid out so the curve hits '1' then 'p' then 'X', with '9' reachable
    // only by a path the terminate command cuts off. The last source line
    // sits at y=0, so the starting row comes last.
    let (outcome, output) = run("  \n  \n9X\n1p");
    assert!(matches!(outcome, ExitOutcome::Normal(ExitReason::Explicit)));
    assert_eq!(output, "1");
}

#[test]
fn uncaught_division_by_zero_is_a_runtime_error() {
    let (outcome, _) = run("10/p");
    assert!(matches!(outcome, ExitOutcome::Runtime(_)), "expected a runtime error, got {outcome:?}");
}

#[test]
fn unterminated_string_literal_is_a_load_error() {
    let (outcome, _) = run("\"unterminated");
    assert!(matches!(outcome, ExitOutcome::Load(_)), "expected a load error, got {outcome:?}");
}

#[test]
fn float_division_of_two_integers_yields_a_float() {
    assert_eq!(run_ok("52:p"), "2.5");
}

#[test]
fn quick_memory_round_trips_through_a_stack_switch() {
    // `4` pushes, `M` stores it in quick memory, `)` moves to a fresh stack,
    // `L` reads quick memory back onto the new active stack, `p` prints it.
    // The last source line sits at y=0, so the starting row comes last.
    assert_eq!(run_ok("p\nL)\n4M"), "4");
}
