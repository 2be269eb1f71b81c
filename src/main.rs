//! CNAB240 import CLI
//!
//! Decodes a CNAB240 return file and prints its statement lines as CSV.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- sicoob_240 retorno.ret > lines.csv
//! cargo run -- itau_cobranca_240 retorno.ret --strict
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity
//! - `CNAB240_MODE`: `strict` or `tolerant` (default), overridden by flags

use cnab240_import::{Cnab240Parser, CnabError, DecodeMode, ParserConfig, Result};
use std::env;
use std::fs::File;
use std::io;
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut config = ParserConfig::from_env()?;
    let mut positional = Vec::new();
    for arg in &args {
        match arg.as_str() {
            "--strict" => config.mode = DecodeMode::Strict,
            "--tolerant" => config.mode = DecodeMode::Tolerant,
            flag if flag.starts_with("--") => {
                return Err(CnabError::InvalidConfig(format!("unknown flag '{}'", flag)))
            }
            value => positional.push(value),
        }
    }

    let (layout_id, input_path) = match positional.as_slice() {
        [layout_id, input_path] => (*layout_id, *input_path),
        _ => return Err(CnabError::MissingArgument),
    };

    let parser = Cnab240Parser::new(config);
    // Resolve first so a bad layout fails before the file is opened.
    parser.registry().resolve(layout_id)?;

    let file = File::open(input_path)?;
    let outcome = parser.parse(file, layout_id)?;

    for skipped in &outcome.skipped {
        eprintln!(
            "Skipped record {} (segment {}): {}",
            skipped.record_index, skipped.segment_code, skipped.reason
        );
    }
    eprintln!(
        "{}: closing balance {} {}",
        outcome.statement.name,
        outcome.statement.balance_end_real,
        outcome.statement.currency_code
    );

    let stdout = io::stdout();
    let handle = stdout.lock();
    outcome.statement.write_csv(handle)?;

    Ok(())
}
