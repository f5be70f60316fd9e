use crate::{
    inst::{FpReg, ValueOrTag},
    reservation_station::StationId,
};

/// Which station will produce a register's next value.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RatEntry {
    pub producer: Option<StationId>,
    /// Only meaningful while `producer` is set.
    pub ready: bool,
}

impl RatEntry {
    pub fn lookup(&self) -> ValueOrTag {
        match self.producer {
            Some(id) if !self.ready => ValueOrTag::Invalid(id),
            _ => ValueOrTag::Valid,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterAliasTable {
    entries: Vec<RatEntry>,
}

impl RegisterAliasTable {
    pub fn new(fp_registers: usize) -> Self {
        Self {
            entries: vec![RatEntry::default(); fp_registers],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, reg: FpReg) -> RatEntry {
        self.entries.get(reg.0).copied().unwrap_or_default()
    }

    /// Resolved if nobody is producing `reg` or the producer already broadcast.
    pub fn get(&self, reg: FpReg) -> ValueOrTag {
        self.entry(reg).lookup()
    }

    /// Renames `reg` to `producer`, discarding the previous alias.
    pub fn rename(&mut self, reg: FpReg, producer: StationId) {
        if let Some(entry) = self.entries.get_mut(reg.0) {
            *entry = RatEntry {
                producer: Some(producer),
                ready: false,
            };
        }
    }

    /// Marks every register aliased to `producer` as ready. Returns how many
    /// entries changed.
    pub fn mark_ready(&mut self, producer: StationId) -> usize {
        let mut changed = 0;
        for entry in &mut self.entries {
            if entry.producer == Some(producer) && !entry.ready {
                entry.ready = true;
                changed += 1;
            }
        }
        changed
    }

    pub fn iter(&self) -> impl Iterator<Item = (FpReg, &RatEntry)> {
        self.entries.iter().enumerate().map(|(i, e)| (FpReg(i), e))
    }
}
