//! Command-line driver for the prefix-completion automaton.
//!
//! Three subcommands over a word list file (one word per line):
//!
//! ```bash
//! # Build repeatedly and report timing plus automaton counters
//! autocomplete bench lists/58k.txt --repeat 25
//!
//! # Build once, then complete prefixes typed on stdin
//! autocomplete query lists/58k.txt
//!
//! # Build once and write the internal graph in GraphViz dot format
//! autocomplete dump lists/3k.txt --out viz.dot
//! ```

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use autocomplete::automaton::{Automaton, DotWriter};

/// Command-line interface for the autocomplete automaton.
#[derive(Parser)]
#[command(name = "autocomplete")]
#[command(about = "Prefix completion over a minimal acyclic word automaton")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the automaton repeatedly and report the average build time
    Bench {
        /// Word list file, one word per line
        wordlist: PathBuf,
        /// Number of builds to average over
        #[arg(long, default_value_t = 25)]
        repeat: u32,
    },
    /// Build once, then complete prefixes read from stdin
    Query {
        /// Word list file, one word per line
        wordlist: PathBuf,
    },
    /// Build once and write the graph in GraphViz dot format
    Dump {
        /// Word list file, one word per line
        wordlist: PathBuf,
        /// Output path for the dot file
        #[arg(long, default_value = "viz.dot")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench { wordlist, repeat } => bench(&wordlist, repeat),
        Commands::Query { wordlist } => query(&wordlist),
        Commands::Dump { wordlist, out } => dump(&wordlist, &out),
    }
}

/// Reads a word list: one word per line, trailing `\r`/`\n` trimmed, bytes
/// otherwise untouched. Empty lines are dropped.
fn read_word_list(path: &Path) -> Result<Vec<Vec<u8>>> {
    let file =
        File::open(path).with_context(|| format!("failed to open word list {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut words = Vec::new();

    // Read into one reusable buffer instead of allocating per line.
    let mut buf = Vec::with_capacity(80);
    loop {
        buf.clear();
        let bytes_read = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if bytes_read == 0 {
            break;
        }
        while matches!(buf.last(), Some(b'\r' | b'\n')) {
            buf.pop();
        }
        if !buf.is_empty() {
            words.push(buf.clone());
        }
    }
    Ok(words)
}

fn build(path: &Path) -> Result<Automaton> {
    let words = read_word_list(path)?;
    info!("read {} words from {}", words.len(), path.display());
    let mut automaton = Automaton::new();
    automaton.build_from_word_list(words);
    info!(
        "built automaton: {} states, {} words",
        automaton.number_of_states(),
        automaton.number_of_words()
    );
    Ok(automaton)
}

fn print_counters(automaton: &Automaton) {
    println!("states in automaton: {}", automaton.number_of_states());
    println!("words in automaton: {}", automaton.number_of_words());
    println!("symbols in automaton: {}", automaton.number_of_total_symbols());
    println!("registry collisions: {}", automaton.build_collisions());
}

fn bench(path: &Path, repeat: u32) -> Result<()> {
    let words = read_word_list(path)?;
    info!("read {} words from {}", words.len(), path.display());

    let mut automaton = Automaton::new();
    let mut total = Duration::ZERO;
    for _ in 0..repeat.max(1) {
        let started = Instant::now();
        automaton.build_from_word_list(words.clone());
        total += started.elapsed();
    }

    let average = total.as_secs_f64() * 1000.0 / f64::from(repeat.max(1));
    println!("average build time: {average:.2}ms over {} runs", repeat.max(1));
    print_counters(&automaton);

    anyhow::ensure!(automaton.verify(), "automaton failed verification");
    Ok(())
}

fn query(path: &Path) -> Result<()> {
    let automaton = build(path)?;
    print_counters(&automaton);

    println!("enter a prefix per line:");
    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        let prefix = line.trim_end_matches(['\r', '\n']);
        if prefix.is_empty() {
            continue;
        }

        let mut completions = BTreeSet::new();
        if !automaton.suffixes_for_prefix(prefix.as_bytes(), &mut completions) {
            writeln!(out, "> no matches")?;
            continue;
        }
        for suffix in &completions {
            writeln!(out, "{prefix}{}", String::from_utf8_lossy(suffix))?;
        }
        writeln!(out, "> {} completions", completions.len())?;
    }
    Ok(())
}

fn dump(path: &Path, out: &Path) -> Result<()> {
    let automaton = build(path)?;
    let mut writer = DotWriter::create(out)
        .with_context(|| format!("failed to create {}", out.display()))?;
    automaton.dump_graph(&mut writer);
    println!("wrote {}", out.display());
    Ok(())
}
