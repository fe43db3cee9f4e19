//! Line-driven cooking mode over a saved recipe.

use gobble_core::cooking::{CookingPhase, CookingSession};
use std::fmt::Write as _;
use std::io::{self, BufRead, Write};

pub const HELP: &str = "commands: <n> toggle ingredient, start, next, back, done, restart, quit";

/// Checklist while gathering, the current step while cooking.
pub fn screen(session: &CookingSession) -> String {
    let mut out = String::new();
    let recipe = session.recipe();
    match session.phase() {
        CookingPhase::Prep => {
            let (gathered, total) = session.prep_progress();
            let _ = writeln!(out, "{} - gathered {gathered}/{total}", recipe.title);
            for (i, ingredient) in recipe.ingredients.iter().enumerate() {
                let mark = if session.is_gathered(i) { 'x' } else { ' ' };
                let _ = writeln!(out, "  {:>2}. [{mark}] {ingredient}", i + 1);
            }
        }
        CookingPhase::Cooking { .. } => {
            if let (Some((n, total)), Some(step)) = (session.step_progress(), session.current_step()) {
                let _ = writeln!(out, "Step {n} of {total}\n  {step}");
            }
        }
        CookingPhase::Done => {
            let _ = writeln!(out, "Done! Enjoy your {}.", recipe.title);
        }
    }
    out
}

/// Applies one command line; returns `false` when the user quits.
pub fn apply(session: &mut CookingSession, line: &str) -> bool {
    match line.trim() {
        "q" | "quit" => return false,
        "s" | "start" => session.start_cooking(),
        "n" | "next" | "" => session.next_step(),
        "b" | "back" => session.previous_step(),
        "d" | "done" => session.finish(),
        "r" | "restart" => session.restart(),
        other => {
            if let Ok(n) = other.parse::<usize>() {
                session.toggle_ingredient(n.saturating_sub(1));
            }
        }
    }
    true
}

/// Runs cooking mode until `quit`, end of input or the recipe is done.
pub fn run<R: BufRead, W: Write>(session: &mut CookingSession, input: R, mut output: W) -> io::Result<()> {
    writeln!(output, "{HELP}")?;
    write!(output, "{}", screen(session))?;
    for line in input.lines() {
        if !apply(session, &line?) {
            break;
        }
        write!(output, "{}", screen(session))?;
        if session.phase() == CookingPhase::Done {
            break;
        }
    }
    Ok(())
}
