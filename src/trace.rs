use crate::{
    error::{SimError, TraceError},
    inst::{Inst, InstRecord, Tag},
};
use std::str::FromStr;

/// Instructions in program order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    pub insts: Vec<Inst>,
}

impl FromStr for Trace {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut insts = Vec::default();

        for (i, line) in s.lines().enumerate() {
            // Strip comments and empty lines
            let line = line.trim();
            let line = &line[..line.find(';').unwrap_or(line.len())];
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }

            match Inst::from_str(line) {
                Ok(inst) => insts.push(inst),
                Err(e) => {
                    return Err(TraceError::Line {
                        line: i + 1,
                        text: line.to_owned(),
                        source: Box::new(e),
                    })
                }
            }
        }

        Ok(Trace { insts })
    }
}

impl Trace {
    pub fn len(&self) -> usize {
        self.insts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    /// Checks every named register fits in a file of `fp_registers`.
    pub fn validate(&self, fp_registers: usize) -> Result<(), SimError> {
        for (i, inst) in self.insts.iter().enumerate() {
            if let Some(reg) = inst.regs().find(|r| r.0 >= fp_registers) {
                return Err(SimError::RegisterOutOfRange {
                    tag: Tag(i),
                    reg,
                    available: fp_registers,
                });
            }
        }
        Ok(())
    }

    pub fn into_records(self) -> Vec<InstRecord> {
        self.insts
            .into_iter()
            .enumerate()
            .map(|(i, inst)| InstRecord::new(Tag(i), inst))
            .collect()
    }
}

impl FromIterator<Inst> for Trace {
    fn from_iter<I: IntoIterator<Item = Inst>>(iter: I) -> Self {
        Self {
            insts: iter.into_iter().collect(),
        }
    }
}
