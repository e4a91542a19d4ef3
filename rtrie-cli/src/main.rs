//! # `rtrie-cli`
//!
//! A small command-line tool for evaluating interval-set expressions against
//! `rtrie` and persisting the results.
//!
//! Example usage:
//! ```sh
//! $ rtrie-cli eval '[0, 10) | [20, 30)'
//! $ rtrie-cli eval '{[0, 10) | [20, 30)} & [5, 25)'
//! $ rtrie-cli dump script.txt out.rtrie
//! $ rtrie-cli load out.rtrie
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::PathBuf;

mod expr;
use expr::eval;

use rtrie::IntervalSet;

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Evaluate and persist interval-set expressions
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a single interval-set expression and print its canonical form
    ///
    /// `|` union, `&` intersection, `^` symmetric difference, `-` difference,
    /// `~` complement (prefix), `{...}` grouping.
    Eval {
        /// The expression to evaluate
        expr: String,
    },

    /// Evaluate a script of `name = expr` assignments and persist the last
    /// one's set
    Dump {
        /// Script file path (defaults to `stdin`)
        #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
        script: Option<PathBuf>,

        /// Output file for the persisted trie
        #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
        out: PathBuf,
    },

    /// Read a persisted trie and print it formatted
    Load {
        #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,
    },
}

fn run_script<R: BufRead>(reader: R) -> anyhow::Result<IntervalSet> {
    let mut bindings: HashMap<String, IntervalSet> = HashMap::new();
    let mut last: Option<IntervalSet> = None;
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.context("failed to read script line")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (name, rhs) = line
            .split_once('=')
            .with_context(|| format!("line {}: expected `name = expr`", lineno + 1))?;
        let set = eval(rhs.trim(), &bindings).with_context(|| format!("line {}: failed to evaluate", lineno + 1))?;
        bindings.insert(name.trim().to_string(), set.clone());
        last = Some(set);
    }
    last.context("script assigned no sets")
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    match args.command {
        Command::Eval { expr } => {
            let set = eval(&expr, &HashMap::new()).context("failed to evaluate expression")?;
            println!("{set}");
        }
        Command::Dump { script, out } => {
            let set = match script {
                Some(path) => {
                    let reader = BufReader::new(File::open(&path).context("failed to open script")?);
                    run_script(reader)?
                }
                None => run_script(BufReader::new(std::io::stdin().lock()))?,
            };
            let out_file = BufWriter::new(File::create(&out).context("failed to create output file")?);
            set.dump(out_file).context("failed to write persisted trie")?;
        }
        Command::Load { file } => {
            let reader = BufReader::new(File::open(&file).context("failed to open persisted trie")?);
            let set = IntervalSet::load(reader).context("failed to read persisted trie")?;
            println!("{set}");
        }
    }
    Ok(())
}
