use crate::{
    config::HardwareConfig,
    inst::{FuType, Inst, Tag, ValueOrTag},
};
use hashbrown::HashMap;
use std::fmt;
use strum::IntoEnumIterator;

/// Name of a reservation station, e.g. `Add1`. Stable for the station's lifetime.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationId {
    pub fu: FuType,
    pub index: usize,
}

impl StationId {
    pub fn new(fu: FuType, index: usize) -> Self {
        Self { fu, index }
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.fu, self.index)
    }
}

/// State of an occupied station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupant {
    pub tag: Tag,
    pub inst: Inst,
    pub operands: [ValueOrTag; 2],
    pub remaining: u32,
}

impl Occupant {
    pub fn is_ready(&self) -> bool {
        self.operands.iter().all(ValueOrTag::is_valid)
    }

    pub fn is_completed(&self) -> bool {
        self.remaining == 0
    }
}

#[derive(Debug, Clone)]
pub struct ReservationStation {
    pub id: StationId,
    slot: Option<Occupant>,
}

impl ReservationStation {
    pub fn new(id: StationId) -> Self {
        Self { id, slot: None }
    }

    pub fn is_busy(&self) -> bool {
        self.slot.is_some()
    }

    pub fn occupant(&self) -> Option<&Occupant> {
        self.slot.as_ref()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}

/// What happened during one call to [`ReservationStations::tick_ready`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Stations whose countdown moved this cycle.
    pub advanced: usize,
    /// Busy stations held back by a pending operand.
    pub stalled: usize,
    /// Stations whose countdown reached zero this cycle.
    pub finished: Vec<(StationId, Tag)>,
}

/// Every reservation station of the machine, grouped by functional unit.
#[derive(Debug, Clone)]
pub struct ReservationStations {
    stations: HashMap<FuType, Vec<ReservationStation>>,
}

impl ReservationStations {
    pub fn new(config: &HardwareConfig) -> Self {
        let stations = FuType::iter()
            .map(|fu| {
                let rs = (0..config.stations_for(fu))
                    .map(|i| ReservationStation::new(StationId::new(fu, i)))
                    .collect();
                (fu, rs)
            })
            .collect();

        Self { stations }
    }

    fn category(&self, fu: FuType) -> &[ReservationStation] {
        self.stations.get(&fu).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Stations in a fixed order: by category, then by slot index.
    pub fn iter(&self) -> impl Iterator<Item = &ReservationStation> + '_ {
        FuType::iter().flat_map(move |fu| self.category(fu).iter())
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut ReservationStation> + '_ {
        self.stations.values_mut().flat_map(|rs| rs.iter_mut())
    }

    pub fn get(&self, id: StationId) -> Option<&ReservationStation> {
        self.category(id.fu).get(id.index)
    }

    fn get_mut(&mut self, id: StationId) -> Option<&mut ReservationStation> {
        self.stations.get_mut(&id.fu)?.get_mut(id.index)
    }

    /// First free station of the category, `None` on a structural hazard.
    pub fn find_free(&self, fu: FuType) -> Option<StationId> {
        self.category(fu).iter().find(|rs| !rs.is_busy()).map(|rs| rs.id)
    }

    pub fn issue(&mut self, id: StationId, tag: Tag, inst: Inst, operands: [ValueOrTag; 2]) {
        let rs = self
            .get_mut(id)
            .unwrap_or_else(|| panic!("issued to unknown station {id}"));
        debug_assert!(!rs.is_busy(), "issued to busy station {id}");
        debug_assert_eq!(inst.fu_type(), id.fu);

        rs.slot = Some(Occupant {
            tag,
            inst,
            operands,
            remaining: inst.latency(),
        });
    }

    /// Advances every busy station whose operands are all resolved.
    pub fn tick_ready(&mut self) -> TickSummary {
        let mut summary = TickSummary::default();

        for rs in self.iter_mut() {
            let id = rs.id;
            let Some(occ) = rs.slot.as_mut() else {
                continue;
            };

            if !occ.is_ready() {
                summary.stalled += 1;
            } else if occ.remaining > 0 {
                occ.remaining -= 1;
                summary.advanced += 1;
                if occ.remaining == 0 {
                    summary.finished.push((id, occ.tag));
                }
            }
        }

        // Map iteration order is unspecified.
        summary.finished.sort_by_key(|&(_, tag)| tag);
        summary
    }

    /// Busy stations whose countdown has reached zero.
    pub fn completed(&self) -> impl Iterator<Item = (StationId, Tag)> + '_ {
        self.iter().filter_map(|rs| {
            rs.occupant()
                .filter(|occ| occ.is_completed())
                .map(|occ| (rs.id, occ.tag))
        })
    }

    pub fn clear(&mut self, id: StationId) {
        if let Some(rs) = self.get_mut(id) {
            rs.clear();
        }
    }

    /// Resolves every operand waiting on `producer`. Returns how many were resolved.
    pub fn forward(&mut self, producer: StationId) -> usize {
        let mut resolved = 0;
        for occ in self.iter_mut().filter_map(|rs| rs.slot.as_mut()) {
            for operand in occ.operands.iter_mut().filter(|op| op.waits_on(producer)) {
                *operand = ValueOrTag::Valid;
                resolved += 1;
            }
        }
        resolved
    }

    pub fn busy_count(&self) -> usize {
        self.iter().filter(|rs| rs.is_busy()).count()
    }
}

impl fmt::Display for ReservationStations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operand = |op: &ValueOrTag| match op {
            ValueOrTag::Valid => ("V".to_owned(), "-".to_owned()),
            ValueOrTag::Invalid(id) => ("-".to_owned(), id.to_string()),
        };

        write!(f, "Name\tBusy\tOp\tVj\tVk\tQj\tQk\tRemain")?;
        for rs in self.iter() {
            write!(f, "\n{}\t", rs.id)?;
            match rs.occupant() {
                None => write!(f, "No\t-\t-\t-\t-\t-\t-")?,
                Some(occ) => {
                    let (vj, qj) = operand(&occ.operands[0]);
                    let (vk, qk) = operand(&occ.operands[1]);
                    write!(
                        f,
                        "Yes\t{}\t{vj}\t{vk}\t{qj}\t{qk}\t{}",
                        occ.inst.mnemonic(),
                        occ.remaining
                    )?
                }
            }
        }
        Ok(())
    }
}
