//! Reads a specification as JSON (file argument or stdin), repairs it and
//! prints one line per round followed by the final specification.

use specloop_core::Specification;
use specloop_feedback::IterationController;
use std::error::Error;
use std::io::Read;

fn main() -> Result<(), Box<dyn Error>> {
    let raw = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let spec = Specification::from_value(serde_json::from_str(&raw)?)?;

    let controller: IterationController = IterationController::default();
    let run = controller.iterate(&spec, 3);
    for record in &run.history {
        let fixes: Vec<_> = record.feedback.fixes.iter().map(|f| f.as_str()).collect();
        println!(
            "round {}: {} -> {} [{}]",
            record.iteration,
            record.eval_before.spec_score,
            record.eval_after.spec_score,
            fixes.join(", ")
        );
    }
    println!("converged: {}", run.converged);
    println!("{}", serde_json::to_string_pretty(&run.final_spec)?);
    Ok(())
}
