use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::Parser;

use rexl_compiler::compile;
use rexl_runtime::{run, Program};

/// Searches files for lines matching a rexl pattern.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Pattern to search for
    #[arg(value_name = "PATTERN")]
    pattern: String,

    /// Files to search; standard input is read when none are given
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Keep the match anchored to the start of each line
    #[arg(short, long)]
    anchored: bool,

    /// Print the compiled program before searching
    #[arg(short, long)]
    debug: bool,
}

fn main() -> ExitCode {
    match try_main(Args::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("rexl: {:#}", err);
            ExitCode::from(2)
        }
    }
}

fn try_main(args: Args) -> anyhow::Result<ExitCode> {
    let pattern = prepare_pattern(&args.pattern, args.anchored);
    let program = compile(&pattern)
        .map_err(|err| anyhow!("{}\n  {}\n  {}^", err, pattern, " ".repeat(err.pos)))?;

    if args.debug {
        eprint!("{}", program);
    }

    let mut all_loaded = true;
    if args.files.is_empty() {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line.context("failed to read standard input")?;
            if matches_line(&program, &line) {
                println!("{}", line);
            }
        }
    } else {
        for path in &args.files {
            match fs::read_to_string(path) {
                Ok(text) => search_file(&program, path, &text),
                Err(err) => {
                    eprintln!("rexl: {}: {}", path.display(), err);
                    all_loaded = false;
                }
            }
        }
    }

    Ok(if all_loaded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn search_file(program: &Program, path: &Path, text: &str) {
    for (number, line) in text.lines().enumerate() {
        if matches_line(program, line) {
            println!("{}:{}:{}", path.display(), number + 1, line);
        }
    }
}

/// The matcher rejects empty input by contract; an empty line cannot
/// match.
fn matches_line(program: &Program, line: &str) -> bool {
    !line.is_empty() && run(program, line).is_some()
}

/// Rewrites the anchor sugar the core leaves to callers: a leading `^` is
/// dropped (matching is already anchored there), a trailing `$` becomes
/// `{.}`, and `.*` is prepended otherwise so the pattern searches the
/// whole line.
fn prepare_pattern(pattern: &str, anchored: bool) -> String {
    if pattern.is_empty() {
        return String::new();
    }

    let (anchored, pattern) = match pattern.strip_prefix('^') {
        Some(rest) => (true, rest),
        None => (anchored, pattern),
    };

    let mut prepared = String::with_capacity(pattern.len() + 5);
    if !anchored && !pattern.starts_with(".*") {
        prepared.push_str(".*");
    }
    match pattern.strip_suffix('$') {
        Some(rest) => {
            prepared.push_str(rest);
            prepared.push_str("{.}");
        }
        None => prepared.push_str(pattern),
    }

    prepared
}
