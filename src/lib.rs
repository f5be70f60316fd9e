use config::HardwareConfig;
use cpu::ExecResult;
use error::Error;
use report::ReportSink;
use tomasulo::Tomasulo;
use trace::Trace;

pub mod cdb;
pub mod config;
pub mod cpu;
pub mod error;
pub mod inst;
pub mod rat;
pub mod report;
pub mod reservation_station;
pub mod tomasulo;
pub mod trace;

/// Parses `traces/<name>.txt` and simulates it on `config`.
pub fn parse_and_exec<S: ReportSink>(
    name: &str,
    config: HardwareConfig,
    sink: &mut S,
) -> Result<ExecResult, Error> {
    let contents = std::fs::read_to_string(format!("traces/{name}.txt"))?;
    let trace = contents.parse::<Trace>()?;
    Ok(Tomasulo::new(config, trace)?.run(sink)?)
}
