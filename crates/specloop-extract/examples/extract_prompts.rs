//! Reads one prompt per line (file argument or stdin) and prints the
//! extracted type, confidence and spec score, tab separated.

use specloop_core::Scorer;
use specloop_extract::FieldExtractor;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

fn main() -> Result<(), Box<dyn Error>> {
    let path = std::env::args().nth(1);
    let reader: Box<dyn BufRead> = match path {
        Some(p) => Box::new(BufReader::new(File::open(p)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let extractor = FieldExtractor::default();
    let scorer = Scorer::default();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let spec = extractor.extract(&line);
        let confidence = spec.meta.map_or(0, |m| m.confidence);
        let score = scorer.score(&spec);
        println!("{}\t{confidence}\t{}\t{line}", spec.r#type, score.spec_score);
    }

    Ok(())
}
