use crate::{
    inst::{Cycle, FpReg, InstRecord, InstStatus},
    rat::{RatEntry, RegisterAliasTable},
};
use std::io::{self, Write};

/// Cycles between two register status snapshots.
pub const SNAPSHOT_INTERVAL: Cycle = 5;

/// Receives the periodic register snapshots and the final status table.
pub trait ReportSink {
    fn register_snapshot(&mut self, cycle: Cycle, rat: &RegisterAliasTable) -> io::Result<()>;

    fn final_status(&mut self, records: &[InstRecord]) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn register_snapshot(&mut self, _cycle: Cycle, _rat: &RegisterAliasTable) -> io::Result<()> {
        Ok(())
    }

    fn final_status(&mut self, _records: &[InstRecord]) -> io::Result<()> {
        Ok(())
    }
}

/// Keeps everything it is sent.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub snapshots: Vec<(Cycle, Vec<(FpReg, RatEntry)>)>,
    pub statuses: Option<Vec<InstStatus>>,
}

impl ReportSink for Recorder {
    fn register_snapshot(&mut self, cycle: Cycle, rat: &RegisterAliasTable) -> io::Result<()> {
        let regs = rat.iter().map(|(reg, entry)| (reg, *entry)).collect();
        self.snapshots.push((cycle, regs));
        Ok(())
    }

    fn final_status(&mut self, records: &[InstRecord]) -> io::Result<()> {
        self.statuses = Some(records.iter().map(|r| r.status).collect());
        Ok(())
    }
}

/// Writes the plain text report.
#[derive(Debug, Default)]
pub struct TextReport<W: Write> {
    out: W,
}

impl<W: Write> TextReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn cycle_or_unset(cycle: Option<Cycle>) -> String {
    cycle.map_or_else(|| "-1".to_owned(), |c| c.to_string())
}

impl<W: Write> ReportSink for TextReport<W> {
    fn register_snapshot(&mut self, cycle: Cycle, rat: &RegisterAliasTable) -> io::Result<()> {
        writeln!(self.out, "Cycle {cycle}:")?;
        for (reg, entry) in rat.iter() {
            let producer = entry.producer.map(|id| id.to_string()).unwrap_or_default();
            let ready = if entry.ready { "Y" } else { "N" };
            writeln!(self.out, "{reg}: {producer}, dataRdy: {ready}, ")?;
        }
        writeln!(self.out)
    }

    fn final_status(&mut self, records: &[InstRecord]) -> io::Result<()> {
        writeln!(self.out, "Instruction Status:")?;
        for record in records {
            let status = &record.status;
            writeln!(
                self.out,
                "Instr{}: Issued: {}, Completed: {}, Write Result: {}, ",
                record.tag.0,
                cycle_or_unset(status.issued),
                cycle_or_unset(status.completed),
                cycle_or_unset(status.write_result),
            )?;
        }
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        inst::{FuType, Imm, Inst, Tag},
        reservation_station::StationId,
    };

    #[test]
    fn test_snapshot_text() {
        let mut rat = RegisterAliasTable::new(3);
        rat.rename(FpReg(0), StationId::new(FuType::Load, 0));
        rat.rename(FpReg(2), StationId::new(FuType::MultDiv, 1));
        rat.mark_ready(StationId::new(FuType::MultDiv, 1));

        let mut report = TextReport::new(Vec::new());
        report.register_snapshot(5, &rat).unwrap();
        let text = String::from_utf8(report.into_inner()).unwrap();

        assert_eq!(
            text,
            "Cycle 5:\n\
             F0: Load0, dataRdy: N, \n\
             F1: , dataRdy: N, \n\
             F2: Mult1, dataRdy: Y, \n\
             \n"
        );
    }

    #[test]
    fn test_final_text() {
        let mut done = InstRecord::new(Tag(0), Inst::Load(FpReg(0), Imm(0), Imm(4)));
        done.status = InstStatus {
            issued: Some(1),
            completed: Some(3),
            write_result: Some(3),
        };
        let pending = InstRecord::new(Tag(1), Inst::Load(FpReg(1), Imm(0), Imm(8)));

        let mut report = TextReport::new(Vec::new());
        report.final_status(&[done, pending]).unwrap();
        let text = String::from_utf8(report.into_inner()).unwrap();

        assert_eq!(
            text,
            "Instruction Status:\n\
             Instr0: Issued: 1, Completed: 3, Write Result: 3, \n\
             Instr1: Issued: -1, Completed: -1, Write Result: -1, \n"
        );
    }

    #[test]
    fn test_recorder() {
        let mut rec = Recorder::default();
        rec.register_snapshot(10, &RegisterAliasTable::new(2)).unwrap();
        assert_eq!(rec.snapshots.len(), 1);
        assert_eq!(rec.snapshots[0].0, 10);
        assert_eq!(rec.snapshots[0].1.len(), 2);
        assert!(rec.statuses.is_none());
    }
}
