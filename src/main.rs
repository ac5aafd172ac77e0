use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use regvm::{Assembler, VM};

/// Assembles a source file and runs it to halt.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
  /// Assembly source file
  source: PathBuf,
}

fn run(args: &Args) -> Result<VM> {
  let text = fs::read_to_string(&args.source)
    .with_context(|| format!("failed to open file \"{}\"", args.source.display()))?;

  let mut assembler = Assembler::new();
  let program = assembler.assemble(&text)
    .with_context(|| format!("failed to assemble \"{}\"", args.source.display()))?;

  #[cfg(feature = "trace_computation")]
  {
    if let Ok(listing) = regvm::bytecode::disassemble(&program) {
      println!("# Assembled {} words\n{}", program.len(), listing);
    }
  }

  let mut machine = VM::new();
  machine.load(&program)?;
  machine.run()?;
  Ok(machine)
}

fn main() {
  let args = Args::parse();

  match run(&args) {
    Ok(machine) => {
      println!("{}", machine);
    }
    Err(e) => {
      eprintln!("error: {:#}", e);
      process::exit(1);
    }
  }
}
