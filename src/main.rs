use clap::Parser;
use std::{path::PathBuf, process::ExitCode, time::Instant};
use tomasulo::{
    config::HardwareConfig, cpu::ExecResult, error::Error, report::TextReport,
    tomasulo::Tomasulo, trace::Trace,
};

/// Cycle-accurate Tomasulo scheduling simulator.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Hardware config: load, store, add and mult station counts, then the FP register count.
    #[arg(default_value = "config.txt")]
    config: PathBuf,

    /// Instruction trace, one instruction per line.
    #[arg(default_value = "trace.txt")]
    trace: PathBuf,

    /// Where to write the register snapshots and the final status table.
    #[arg(short, long, default_value = "trace.out.txt")]
    output: PathBuf,

    /// Abort if the trace has not finished after this many cycles.
    #[arg(long)]
    max_cycles: Option<u64>,
}

fn simulate(args: &Args) -> Result<ExecResult, Error> {
    let config = std::fs::read_to_string(&args.config)?.parse::<HardwareConfig>()?;
    let trace = std::fs::read_to_string(&args.trace)?.parse::<Trace>()?;

    let mut sim = Tomasulo::new(config, trace)?;
    if let Some(limit) = args.max_cycles {
        sim = sim.with_cycle_limit(limit);
    }

    // Nothing is written unless the whole run succeeds.
    let mut report = TextReport::new(Vec::new());
    let res = sim.run(&mut report)?;
    std::fs::write(&args.output, report.into_inner())?;

    Ok(res)
}

fn main() -> ExitCode {
    env_logger::init();

    let start = Instant::now();
    let args = Args::parse();

    let res = match simulate(&args) {
        Ok(res) => res,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("    SIMULATION COMPLETED");
    println!("    ====================");
    println!("    Instructions written back: {}", res.insts_retired);
    println!("                 Cycles taken: {}", res.cycles_taken);
    println!(
        "       Instructions per clock: {:.2}",
        res.insts_retired as f32 / res.cycles_taken.max(1) as f32
    );
    println!("   Structural stalls (cycles): {}", res.stats.structural_stalls);
    println!("     Bus contention (cycles): {}", res.stats.bus_contention);
    println!("  Report written to {}", args.output.display());
    println!(
        "       Simulator time elapsed: {:.2}s",
        start.elapsed().as_secs_f32()
    );

    ExitCode::SUCCESS
}
