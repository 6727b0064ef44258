//! Runs the `iterate_spec` example against the shared fixture.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn example_reports_rounds_and_final_spec() {
    let fixture = concat!(env!("CARGO_MANIFEST_DIR"), "/../../tests/fixtures/car_unknown_material.json");
    let mut cmd = Command::new("cargo");
    cmd.args([
        "run",
        "--quiet",
        "--package",
        "specloop-feedback",
        "--example",
        "iterate_spec",
        "--",
        fixture,
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("round 1: 4 -> 10"))
        .stdout(predicate::str::contains("converged: true"))
        .stdout(predicate::str::contains("\"transportation\""));
}
