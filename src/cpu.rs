use crate::inst::{Cycle, InstRecord};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CpuState {
    Running,
    Stopped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub broadcasts: u64,
    /// Cycles in which the next instruction found no free station.
    pub structural_stalls: u64,
    /// Station-cycles spent waiting on a pending operand.
    pub data_stalls: u64,
    /// Cycles in which more than one completed station wanted the bus.
    pub bus_contention: u64,
}

#[derive(Debug, Clone)]
pub struct ExecResult {
    pub records: Vec<InstRecord>,
    pub cycles_taken: Cycle,
    pub insts_retired: u64,
    pub stats: Stats,
}
