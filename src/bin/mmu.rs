//! `mmu` - demand-paging simulator.
//!
//! Thin CLI driver over the library core: pick the replacement algorithm
//! and output options, load the reference trace and the random file, run
//! the instruction stream, print the collected output.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use osim::RandGen;
use osim::mmu::{Mmu, MmuOptions, Pager, load_input};

#[derive(Parser)]
#[command(name = "mmu")]
#[command(about = "Demand-paging simulator with pluggable page replacement")]
struct Cli {
    /// Number of physical frames (1..=128)
    #[arg(short = 'f', value_name = "frames")]
    frames: usize,

    /// Replacement algorithm: f=FIFO r=random c=clock e=NRU a=aging w=working-set
    #[arg(short = 'a', value_name = "algo")]
    algorithm: char,

    /// Output options, a subset of OPFS plus the debug flags xyaf
    #[arg(short = 'o', value_name = "opts", default_value = "OPFS")]
    options: String,

    /// Reference trace: process VMAs followed by `op value` instructions
    inputfile: PathBuf,

    /// Random file: a count followed by that many integers
    rfile: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let opts = MmuOptions::parse(&cli.options)?;
    let pager = Pager::from_code(cli.algorithm)?;
    let input = load_input(&cli.inputfile)?;
    let rand = RandGen::from_file(&cli.rfile)?;

    let mut mmu = Mmu::new(cli.frames, input.processes, pager, rand, opts)?;
    mmu.run(&input.instructions);
    mmu.render_final();

    let mut stdout = std::io::stdout().lock();
    for line in mmu.output() {
        writeln!(stdout, "{line}")?;
    }
    Ok(())
}
