use tomasulo::{
    config::HardwareConfig,
    cpu::ExecResult,
    inst::{Cycle, InstStatus},
    parse_and_exec,
    report::{NullSink, Recorder, ReportSink, TextReport},
};

fn default_config() -> HardwareConfig {
    std::fs::read_to_string("traces/default.cfg")
        .unwrap()
        .parse()
        .unwrap()
}

fn minimal_config() -> HardwareConfig {
    HardwareConfig {
        load_stations: 1,
        store_stations: 1,
        add_stations: 1,
        mult_stations: 1,
        fp_registers: 16,
    }
}

fn status(issued: Cycle, completed: Cycle, write_result: Cycle) -> InstStatus {
    InstStatus {
        issued: Some(issued),
        completed: Some(completed),
        write_result: Some(write_result),
    }
}

fn statuses(res: &ExecResult) -> Vec<InstStatus> {
    res.records.iter().map(|r| r.status).collect()
}

/// Timestamps are ordered and the bus carries one result per cycle.
fn check_invariants(res: &ExecResult) {
    let mut write_cycles = Vec::new();

    for record in &res.records {
        let InstStatus {
            issued: Some(issued),
            completed: Some(completed),
            write_result: Some(write_result),
        } = record.status
        else {
            panic!("{} never finished: {:?}", record.tag, record.status);
        };

        assert!(issued < completed, "{}: {:?}", record.tag, record.status);
        assert!(completed <= write_result, "{}: {:?}", record.tag, record.status);
        assert!(
            completed >= issued + u64::from(record.inst.latency()),
            "{} finished faster than its latency",
            record.tag
        );
        write_cycles.push(write_result);
    }

    let broadcasts = write_cycles.len();
    write_cycles.sort_unstable();
    write_cycles.dedup();
    assert_eq!(write_cycles.len(), broadcasts, "two results shared a bus cycle");

    // One issue per cycle, in program order.
    for pair in res.records.windows(2) {
        assert!(pair[0].status.issued < pair[1].status.issued);
    }
}

#[generic_tests::define]
mod t {
    use super::*;

    #[test]
    fn test_single_load<S: ReportSink + Default>() {
        let cfg = HardwareConfig {
            fp_registers: 4,
            ..minimal_config()
        };
        let res = parse_and_exec("single_load", cfg, &mut S::default()).unwrap();
        assert_eq!(statuses(&res), vec![status(1, 3, 3)]);
        assert_eq!(res.cycles_taken, 3);
    }

    #[test]
    fn test_classic<S: ReportSink + Default>() {
        let res = parse_and_exec("classic", default_config(), &mut S::default()).unwrap();
        assert_eq!(
            statuses(&res),
            vec![
                status(1, 3, 3),
                status(2, 4, 4),
                status(3, 14, 14),
                status(4, 6, 6),
                status(5, 54, 54),
                status(6, 8, 8),
                status(7, 10, 10),
            ]
        );
        assert_eq!(res.cycles_taken, 54);
        check_invariants(&res);
    }

    #[test]
    fn test_hazard_raw<S: ReportSink + Default>() {
        let res = parse_and_exec("hazard_raw", default_config(), &mut S::default()).unwrap();
        let load_write = res.records[0].status.write_result.unwrap();
        let mult_complete = res.records[1].status.completed.unwrap();
        assert!(mult_complete >= load_write + 10);
        assert_eq!(
            statuses(&res),
            vec![status(1, 3, 3), status(2, 13, 13), status(3, 15, 15)]
        );
    }

    #[test]
    fn test_hazard_waw<S: ReportSink + Default>() {
        let res = parse_and_exec("hazard_waw", default_config(), &mut S::default()).unwrap();
        assert_eq!(
            statuses(&res),
            vec![
                status(1, 41, 41),
                status(2, 43, 43),
                status(3, 5, 5),
                status(4, 7, 7),
            ]
        );
    }

    #[test]
    fn test_contention<S: ReportSink + Default>() {
        let res = parse_and_exec("contention", default_config(), &mut S::default()).unwrap();
        // Two adds finish together; the younger one waits a cycle.
        assert_eq!(res.records[1].status.completed, res.records[2].status.completed);
        assert_eq!(
            statuses(&res),
            vec![status(1, 3, 3), status(2, 5, 5), status(3, 5, 6), status(4, 6, 7)]
        );
        assert_eq!(res.stats.bus_contention, 2);
    }

    #[test]
    fn test_structural<S: ReportSink + Default>() {
        let res = parse_and_exec("structural", default_config(), &mut S::default()).unwrap();
        assert_eq!(
            statuses(&res),
            vec![status(1, 3, 3), status(2, 4, 4), status(3, 5, 5), status(4, 6, 6)]
        );
        assert_eq!(res.stats.structural_stalls, 0);

        let res = parse_and_exec("structural", minimal_config(), &mut S::default()).unwrap();
        assert_eq!(
            statuses(&res),
            vec![status(1, 3, 3), status(3, 5, 5), status(5, 7, 7), status(7, 9, 9)]
        );
        assert_eq!(res.stats.structural_stalls, 3);
    }

    #[test]
    fn test_mixed<S: ReportSink + Default>() {
        for cfg in [default_config(), minimal_config()] {
            let res = parse_and_exec("mixed", cfg, &mut S::default()).unwrap();
            assert_eq!(res.insts_retired, 17);
            check_invariants(&res);
        }
    }

    #[instantiate_tests(<NullSink>)]
    mod null {}

    #[instantiate_tests(<Recorder>)]
    mod recorder {}

    #[instantiate_tests(<TextReport<Vec<u8>>>)]
    mod text {}
}

#[cfg(test)]
mod report {
    use super::*;

    #[test]
    fn test_classic_report() {
        let mut report = TextReport::new(Vec::new());
        parse_and_exec("classic", default_config(), &mut report).unwrap();
        let text = String::from_utf8(report.into_inner()).unwrap();

        let snapshots = text.matches("Cycle ").count();
        assert_eq!(snapshots, 10);

        let cycle5 = text
            .split("\n\n")
            .find(|block| block.starts_with("Cycle 5:"))
            .unwrap();
        assert!(cycle5.contains("F0: Mult0, dataRdy: N, "));
        assert!(cycle5.contains("F2: Load1, dataRdy: Y, "));
        assert!(cycle5.contains("F4: , dataRdy: N, "));
        assert!(cycle5.contains("F6: Load0, dataRdy: Y, "));
        assert!(cycle5.contains("F8: Add0, dataRdy: N, "));
        assert!(cycle5.contains("F10: Mult1, dataRdy: N, "));

        assert!(text.ends_with(
            "Instruction Status:\n\
             Instr0: Issued: 1, Completed: 3, Write Result: 3, \n\
             Instr1: Issued: 2, Completed: 4, Write Result: 4, \n\
             Instr2: Issued: 3, Completed: 14, Write Result: 14, \n\
             Instr3: Issued: 4, Completed: 6, Write Result: 6, \n\
             Instr4: Issued: 5, Completed: 54, Write Result: 54, \n\
             Instr5: Issued: 6, Completed: 8, Write Result: 8, \n\
             Instr6: Issued: 7, Completed: 10, Write Result: 10, \n"
        ));
        assert!(!text.contains("-1"));
    }

    #[test]
    fn test_snapshot_cycles() {
        let mut rec = Recorder::default();
        let res = parse_and_exec("mixed", default_config(), &mut rec).unwrap();
        let cycles = rec.snapshots.iter().map(|(c, _)| *c).collect::<Vec<_>>();
        let expected = (1..=res.cycles_taken / 5).map(|i| i * 5).collect::<Vec<_>>();
        assert_eq!(cycles, expected);
        assert_eq!(rec.statuses, Some(statuses(&res)));
    }

    #[test]
    fn test_missing_trace() {
        assert!(parse_and_exec("does_not_exist", default_config(), &mut NullSink).is_err());
    }
}
