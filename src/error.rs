use crate::inst::{Cycle, FpReg, Stage, Tag};
use thiserror::Error;

/// Errors produced while loading a hardware configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing value for {0}")]
    Missing(&'static str),

    #[error("invalid value for {field}: '{value}'")]
    NotAnInteger { field: &'static str, value: String },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: i64 },

    #[error("unexpected trailing value '{0}'")]
    Trailing(String),
}

/// Errors produced while parsing a single trace line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("empty instruction")]
    Empty,

    #[error("unknown instruction: '{0}'")]
    UnknownOp(String),

    #[error("'{op}' takes 3 operands, found {found}")]
    ArgCount { op: String, found: usize },

    #[error("invalid register: '{0}'")]
    BadRegister(String),

    #[error("invalid immediate: '{0}'")]
    BadImmediate(String),

    #[error("error parsing instruction '{text}' on line {line}: {source}")]
    Line {
        line: usize,
        text: String,
        #[source]
        source: Box<TraceError>,
    },
}

/// Fatal errors raised by the scheduler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("register file must hold at least one register")]
    NoRegisters,

    #[error("instruction {tag} names {reg}, but only {available} registers are configured")]
    RegisterOutOfRange {
        tag: Tag,
        reg: FpReg,
        available: usize,
    },

    #[error("deadlock at cycle {cycle}: no progress with instructions {pending:?} outstanding")]
    Deadlock { cycle: Cycle, pending: Vec<Tag> },

    #[error("cycle limit of {0} exceeded")]
    CycleLimitExceeded(Cycle),

    #[error("{stage} cycle of instruction {tag} already recorded as {previous}, tried {cycle}")]
    StatusOverwrite {
        tag: Tag,
        stage: Stage,
        previous: Cycle,
        cycle: Cycle,
    },

    #[error("report sink failed: {0}")]
    Report(String),
}

/// Any error of a full run, from reading inputs to writing the report.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("trace: {0}")]
    Trace(#[from] TraceError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
