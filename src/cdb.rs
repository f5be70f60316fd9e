use crate::{
    inst::Tag,
    rat::RegisterAliasTable,
    reservation_station::{ReservationStations, StationId},
};
use log::debug;

/// The single result published on the bus during one cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Broadcast {
    pub station: StationId,
    pub tag: Tag,
}

/// Outcome of one round of bus arbitration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arbitration {
    pub winner: Option<Broadcast>,
    /// Completed stations left waiting for a later cycle.
    pub losers: Vec<Broadcast>,
}

/// Common data bus. Carries at most one result per cycle; among completed
/// stations the oldest instruction in program order wins.
#[derive(Debug, Clone, Default)]
pub struct CommonDataBus;

impl CommonDataBus {
    pub fn new() -> Self {
        Self
    }

    pub fn arbitrate(&self, rss: &ReservationStations) -> Arbitration {
        let mut candidates = rss
            .completed()
            .map(|(station, tag)| Broadcast { station, tag })
            .collect::<Vec<_>>();
        candidates.sort_by_key(|b| b.tag);

        let mut candidates = candidates.into_iter();
        Arbitration {
            winner: candidates.next(),
            losers: candidates.collect(),
        }
    }

    /// Frees the winning station and wakes up everything waiting on it.
    pub fn broadcast(
        &self,
        event: Broadcast,
        rss: &mut ReservationStations,
        rat: &mut RegisterAliasTable,
    ) {
        rss.clear(event.station);
        let operands = rss.forward(event.station);
        let regs = rat.mark_ready(event.station);

        debug!(
            "CDB {} ({}) -> {operands} operand(s), {regs} register(s)",
            event.station, event.tag
        );
    }
}
