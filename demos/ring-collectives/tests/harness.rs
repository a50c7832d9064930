// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use std::fs;

use arcol_engine::engine::Engine;
use arcol_engine::test_helpers::start_test;
use arcol_offload::config::Deployment;
use arcol_track::builder::{TrackerConfig, TrackersConfig, setup_trackers};
use ring_collectives::config::{CollectiveKind, ElementKind, Settings};
use ring_collectives::run;

#[test]
fn bcast_over_links() {
    let mut engine = start_test(file!());
    let settings = Settings {
        size: 8,
        link_latency_ticks: 4,
        datatype: ElementKind::F64,
        count: 6,
        root: 3,
        iterations: 3,
        ..Settings::default()
    };
    let report = run(&mut engine, &settings).unwrap();
    assert!(report.passed(), "{report:?}");
    assert_eq!(report.errors, vec![0; 8]);
    assert!(report.time_ns > 0.0);
}

#[test]
fn p2p_every_datatype() {
    for datatype in [
        ElementKind::F32,
        ElementKind::F64,
        ElementKind::I32,
        ElementKind::U32,
        ElementKind::I64,
        ElementKind::U64,
    ] {
        let mut engine = start_test(file!());
        let settings = Settings {
            size: 5,
            collective: CollectiveKind::P2p,
            datatype,
            root: 4,
            dest: 2,
            iterations: 2,
            ..Settings::default()
        };
        let report = run(&mut engine, &settings).unwrap();
        assert!(report.passed(), "{datatype:?}: {report:?}");
    }
}

#[test]
fn direct_barrier() {
    let mut engine = start_test(file!());
    let settings = Settings {
        size: 3,
        deployment: Deployment::Direct,
        collective: CollectiveKind::Barrier,
        iterations: 4,
        ..Settings::default()
    };
    let report = run(&mut engine, &settings).unwrap();
    assert!(report.passed(), "{report:?}");
}

#[test]
fn absent_rank_deadlocks_barrier() {
    let mut engine = start_test(file!());
    let settings = Settings {
        size: 4,
        collective: CollectiveKind::Barrier,
        absent_rank: Some(2),
        ..Settings::default()
    };
    let report = run(&mut engine, &settings).unwrap();
    assert!(!report.passed());
    assert_eq!(report.deadlocked, vec![0, 1, 3]);
}

#[test]
fn invalid_ring_rejected() {
    let mut engine = start_test(file!());
    let settings = Settings {
        size: 4,
        deployment: Deployment::Direct,
        ..Settings::default()
    };
    let result = run(&mut engine, &settings);
    assert_eq!(
        result.err().map(|e| e.to_string()),
        Some("Error: direct deployment supports at most 3 ranks, not 4".to_string())
    );
}

#[test]
fn trace_file_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ring.log");
    let path_str = path.to_str().unwrap();
    let tracker = setup_trackers(&TrackersConfig {
        stdout: TrackerConfig {
            enable: false,
            ..TrackerConfig::default()
        },
        file: TrackerConfig {
            enable: true,
            level: log::Level::Info,
            filter_regex: "",
            file: Some(path_str),
        },
    })
    .unwrap();

    let mut engine = Engine::new(&tracker);
    let settings = Settings {
        size: 2,
        iterations: 1,
        ..Settings::default()
    };
    assert!(run(&mut engine, &settings).unwrap().passed());
    tracker.shutdown();

    let trace = fs::read_to_string(&path).unwrap();
    assert!(trace.contains("built staged ring of 2 ranks"), "{trace}");
}
