//! `sched` - discrete-event process-scheduling simulator.
//!
//! Thin CLI driver over the library core: parse the policy spec, load the
//! random file and the process trace, run the simulation, print the
//! transition log and the summary.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use osim::RandGen;
use osim::scheduler::{SchedSpec, Simulator, load_processes};

#[derive(Parser)]
#[command(name = "sched")]
#[command(about = "Discrete-event process-scheduling simulator")]
struct Cli {
    /// Scheduler specification: F | L | S | R<q> | P<q>[:<maxprio>] | E<q>[:<maxprio>]
    #[arg(short = 's', value_name = "spec")]
    spec: String,

    /// Process trace: one `at tc cb io` line per process, in arrival order
    #[arg(long, value_name = "path")]
    inputfile: PathBuf,

    /// Random file: a count followed by that many integers
    #[arg(long, value_name = "path")]
    rfile: PathBuf,

    /// Also emit scheduling-decision lines (PrioPreempt) into the trace
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let spec = SchedSpec::parse(&cli.spec)?;
    let mut rand = RandGen::from_file(&cli.rfile)?;
    let procs = load_processes(&cli.inputfile, &mut rand, spec.maxprio())?;

    let mut sim = Simulator::new(spec, procs, rand).with_verbose(cli.verbose);
    sim.run();

    let mut stdout = std::io::stdout().lock();
    for line in sim.trace() {
        writeln!(stdout, "{line}")?;
    }
    write!(stdout, "{}", sim.render_summary())?;
    Ok(())
}
