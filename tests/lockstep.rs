use std::collections::HashSet;
use std::fs;

use game_of_life_rows::{
    run_threaded, ConfigError, LifeError, MemorySink, Placement, Shape, SimulationConfig, TextSink,
};

fn config_at(width: usize, height: usize, iterations: u32, shape: Shape, row: usize, col: usize) -> SimulationConfig {
    SimulationConfig {
        width,
        height,
        iterations,
        pattern: Placement { shape, row, col },
        output_every: Some(1),
    }
}

fn live_after(config: &SimulationConfig, workers: usize, generation: u32) -> HashSet<(usize, usize)> {
    let mut sink = MemorySink::default();
    run_threaded(config, workers, &mut sink).unwrap();
    let (_, grid) = sink
        .snapshots
        .iter()
        .find(|(g, _)| *g == generation)
        .unwrap_or_else(|| panic!("no snapshot for generation {generation}"));
    grid.live_cells().into_iter().collect()
}

fn set(cells: &[(usize, usize)]) -> HashSet<(usize, usize)> {
    cells.iter().copied().collect()
}

#[test]
fn glider_moves_one_cell_diagonally_every_four_generations() {
    // 20 rows over 3 workers: [0, 7), [7, 14), [14, 20). The glider starts
    // across the first boundary.
    let config = config_at(20, 20, 8, Shape::Glider, 6, 6);
    for workers in [1, 3] {
        assert_eq!(
            live_after(&config, workers, 4),
            set(&[(7, 8), (8, 9), (9, 7), (9, 8), (9, 9)]),
            "{workers} workers"
        );
        assert_eq!(
            live_after(&config, workers, 8),
            set(&[(8, 9), (9, 10), (10, 8), (10, 9), (10, 10)]),
            "{workers} workers"
        );
    }
}

#[test]
fn block_across_a_boundary_never_changes() {
    // 16 rows over 4 workers: the block sits on rows 3 and 4, owned by
    // ranks 0 and 1.
    let config = config_at(12, 16, 30, Shape::Block, 3, 5);
    let mut sink = MemorySink::default();
    let report = run_threaded(&config, 4, &mut sink).unwrap();
    assert_eq!(report.alive, 4);
    assert_eq!(sink.snapshots.len(), 30);
    let block = set(&[(3, 5), (3, 6), (4, 5), (4, 6)]);
    for (generation, grid) in &sink.snapshots {
        let live: HashSet<_> = grid.live_cells().into_iter().collect();
        assert_eq!(live, block, "generation {generation}");
    }
}

#[test]
fn blinker_oscillates_across_worker_boundaries() {
    // Vertical blinker on rows 4..7 with one row per worker.
    let vertical = Shape::Custom {
        rows: vec!["1".into(), "1".into(), "1".into()],
    };
    let config = config_at(7, 9, 2, vertical, 4, 3);
    assert_eq!(live_after(&config, 9, 1), set(&[(5, 2), (5, 3), (5, 4)]));
    assert_eq!(live_after(&config, 9, 2), set(&[(4, 3), (5, 3), (6, 3)]));
}

#[test]
fn edge_columns_have_no_outside_neighbours() {
    let vertical = || Shape::Custom {
        rows: vec!["1".into(), "1".into(), "1".into()],
    };
    // With wraparound the cell across the edge would be born as well.
    let left = config_at(10, 12, 1, vertical(), 5, 0);
    assert_eq!(live_after(&left, 2, 1), set(&[(6, 0), (6, 1)]));

    let right = config_at(10, 12, 1, vertical(), 5, 9);
    assert_eq!(live_after(&right, 2, 1), set(&[(6, 8), (6, 9)]));
}

#[test]
fn top_and_bottom_rows_have_no_outside_neighbours() {
    let horizontal = Shape::Blinker;
    let top = config_at(8, 8, 1, horizontal.clone(), 0, 2);
    assert_eq!(live_after(&top, 4, 1), set(&[(0, 3), (1, 3)]));

    let bottom = config_at(8, 8, 1, horizontal, 7, 2);
    assert_eq!(live_after(&bottom, 4, 1), set(&[(6, 3), (7, 3)]));
}

#[test]
fn invalid_worker_counts_fail_before_running() {
    let config = SimulationConfig::centered(10, 10, 1, Shape::Glider);
    let mut sink = MemorySink::default();

    let err = run_threaded(&config, 0, &mut sink).unwrap_err();
    assert!(matches!(err, LifeError::Config(ConfigError::NoWorkers)), "{err}");

    let err = run_threaded(&config, 11, &mut sink).unwrap_err();
    assert!(
        matches!(
            err,
            LifeError::Config(ConfigError::TooManyWorkers {
                height: 10,
                workers: 11
            })
        ),
        "{err}"
    );
    assert_eq!(err.exit_code(), 2);
    assert!(sink.report.is_none());
}

#[test]
fn misplaced_pattern_is_a_config_error() {
    let config = config_at(10, 10, 1, Shape::Glider, 9, 0);
    let err = run_threaded(&config, 2, &mut MemorySink::default()).unwrap_err();
    assert!(matches!(err, LifeError::Config(ConfigError::PatternOutOfBounds { .. })));
}

#[test]
fn snapshots_are_written_as_text() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let mut config = config_at(4, 4, 2, Shape::Block, 1, 1);
    config.output_every = Some(2);
    let mut sink = TextSink::new(Box::new(std::io::sink())).with_snapshots(Box::new(file.reopen().unwrap()));
    let report = run_threaded(&config, 2, &mut sink).unwrap();
    drop(sink);

    assert_eq!(report.alive, 4);
    let text = fs::read_to_string(file.path()).unwrap();
    assert_eq!(text, "Generation 2:\n0000\n0110\n0110\n0000\n");
}
