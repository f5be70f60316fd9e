use crate::{
    cdb::{Broadcast, CommonDataBus},
    config::HardwareConfig,
    cpu::{CpuState, ExecResult, Stats},
    error::SimError,
    inst::{Cycle, Inst, InstRecord, Stage, Tag, ValueOrTag},
    rat::RegisterAliasTable,
    report::{ReportSink, SNAPSHOT_INTERVAL},
    reservation_station::{ReservationStations, StationId, TickSummary},
    trace::Trace,
};
use log::{debug, info, log_enabled, trace, Level};

mod phases {
    use super::*;

    #[derive(Debug, Clone, Default)]
    pub struct Advance {
        pub summary: TickSummary,
    }

    #[derive(Debug, Clone, Default)]
    pub struct WriteResult {
        pub broadcast: Option<Broadcast>,
    }

    #[derive(Debug, Clone, Default)]
    pub struct Issue {
        pub issued: Option<(Tag, StationId)>,
    }
}

/// Cycle-by-cycle Tomasulo scheduler over a fixed instruction trace.
///
/// Every cycle runs the same phases in order: advance ready stations and
/// note completions, broadcast one result on the CDB, issue at most one
/// instruction, then emit the periodic register snapshot.
#[derive(Debug, Clone)]
pub struct Tomasulo {
    records: Vec<InstRecord>,
    reservation_stations: ReservationStations,
    rat: RegisterAliasTable,
    cdb: CommonDataBus,
    next_issue: usize,
    cycles: Cycle,
    cycle_limit: Option<Cycle>,
    stats: Stats,
}

impl Tomasulo {
    pub fn new(config: HardwareConfig, trace: Trace) -> Result<Self, SimError> {
        if config.fp_registers == 0 {
            return Err(SimError::NoRegisters);
        }
        trace.validate(config.fp_registers)?;

        info!("{} instructions, hardware:\n{config}", trace.len());

        Ok(Self {
            records: trace.into_records(),
            reservation_stations: ReservationStations::new(&config),
            rat: RegisterAliasTable::new(config.fp_registers),
            cdb: CommonDataBus::new(),
            next_issue: 0,
            cycles: 0,
            cycle_limit: None,
            stats: Stats::default(),
        })
    }

    /// Fails the run once `limit` cycles have elapsed without finishing.
    pub fn with_cycle_limit(mut self, limit: Cycle) -> Self {
        self.cycle_limit = Some(limit);
        self
    }

    pub fn cycles(&self) -> Cycle {
        self.cycles
    }

    pub fn records(&self) -> &[InstRecord] {
        &self.records
    }

    pub fn reservation_stations(&self) -> &ReservationStations {
        &self.reservation_stations
    }

    pub fn rat(&self) -> &RegisterAliasTable {
        &self.rat
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn is_done(&self) -> bool {
        self.records.iter().all(|r| r.status.is_retired())
    }

    fn pending(&self) -> Vec<Tag> {
        self.records
            .iter()
            .filter(|r| !r.status.is_retired())
            .map(|r| r.tag)
            .collect()
    }

    /// Simulates one cycle.
    pub fn step<S: ReportSink>(&mut self, sink: &mut S) -> Result<CpuState, SimError> {
        if self.is_done() {
            return Ok(CpuState::Stopped);
        }
        if let Some(limit) = self.cycle_limit.filter(|&limit| self.cycles >= limit) {
            return Err(SimError::CycleLimitExceeded(limit));
        }

        self.cycles += 1;
        debug!("---- cycle {} ----", self.cycles);

        let advance = self.phase_advance()?;
        let write_result = self.phase_write_result()?;
        let issue = self.phase_issue()?;

        if self.cycles % SNAPSHOT_INTERVAL == 0 {
            sink.register_snapshot(self.cycles, &self.rat)
                .map_err(|e| SimError::Report(e.to_string()))?;
        }

        if log_enabled!(Level::Trace) {
            trace!("stations after cycle {}:\n{}", self.cycles, self.reservation_stations);
        }

        if self.is_done() {
            return Ok(CpuState::Stopped);
        }

        let progressed = advance.summary.advanced > 0
            || write_result.broadcast.is_some()
            || issue.issued.is_some();
        if !progressed {
            return Err(SimError::Deadlock {
                cycle: self.cycles,
                pending: self.pending(),
            });
        }

        Ok(CpuState::Running)
    }

    /// Runs until every instruction has written its result, then sends the
    /// final status table to `sink`.
    pub fn run<S: ReportSink>(mut self, sink: &mut S) -> Result<ExecResult, SimError> {
        while self.step(sink)? == CpuState::Running {}

        sink.final_status(&self.records)
            .map_err(|e| SimError::Report(e.to_string()))?;

        info!(
            "all {} instructions written back after {} cycles ({:?})",
            self.records.len(),
            self.cycles,
            self.stats
        );

        Ok(ExecResult {
            insts_retired: self.records.len() as u64,
            cycles_taken: self.cycles,
            records: self.records,
            stats: self.stats,
        })
    }

    fn mark(&mut self, tag: Tag, stage: Stage) -> Result<(), SimError> {
        let cycle = self.cycles;
        self.records[usize::from(tag)]
            .status
            .mark(stage, cycle)
            .map_err(|previous| SimError::StatusOverwrite {
                tag,
                stage,
                previous,
                cycle,
            })
    }

    // Count down every ready station and record the ones that just finished.
    fn phase_advance(&mut self) -> Result<phases::Advance, SimError> {
        let summary = self.reservation_stations.tick_ready();
        self.stats.data_stalls += summary.stalled as u64;

        for &(id, tag) in &summary.finished {
            debug!("{id} completed {tag}");
            self.mark(tag, Stage::Complete)?;
        }

        Ok(phases::Advance { summary })
    }

    // Put the oldest completed result on the CDB.
    fn phase_write_result(&mut self) -> Result<phases::WriteResult, SimError> {
        let arbitration = self.cdb.arbitrate(&self.reservation_stations);

        if !arbitration.losers.is_empty() {
            self.stats.bus_contention += 1;
            debug!("{} completed station(s) wait for the CDB", arbitration.losers.len());
        }

        let Some(event) = arbitration.winner else {
            return Ok(phases::WriteResult::default());
        };

        self.mark(event.tag, Stage::WriteResult)?;
        self.cdb
            .broadcast(event, &mut self.reservation_stations, &mut self.rat);
        self.stats.broadcasts += 1;

        Ok(phases::WriteResult {
            broadcast: Some(event),
        })
    }

    // Issue the next instruction in program order if its unit has a free station.
    fn phase_issue(&mut self) -> Result<phases::Issue, SimError> {
        let Some(record) = self.records.get(self.next_issue) else {
            return Ok(phases::Issue::default());
        };
        let (tag, inst) = (record.tag, record.inst);

        let Some(id) = self.reservation_stations.find_free(inst.fu_type()) else {
            debug!("{tag} ({inst}) stalled: no free {} station", inst.fu_type());
            self.stats.structural_stalls += 1;
            return Ok(phases::Issue::default());
        };

        let operands = self.resolve_operands(&inst);
        if let Some(dst) = inst.dest_reg() {
            self.rat.rename(dst, id);
        }
        self.reservation_stations.issue(id, tag, inst, operands);
        self.mark(tag, Stage::Issue)?;
        self.next_issue += 1;

        debug!("issued {tag} ({inst}) to {id}");

        Ok(phases::Issue {
            issued: Some((tag, id)),
        })
    }

    fn resolve_operands(&self, inst: &Inst) -> [ValueOrTag; 2] {
        match *inst {
            Inst::Load(..) => [ValueOrTag::Valid; 2],
            Inst::Store(src, _, _) => {
                let value = self.rat.get(src);
                [value, value]
            }
            Inst::Add(_, src1, src2)
            | Inst::Sub(_, src1, src2)
            | Inst::Mult(_, src1, src2)
            | Inst::Div(_, src1, src2) => [self.rat.get(src1), self.rat.get(src2)],
        }
    }
}
