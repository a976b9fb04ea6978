use fpsmc::error::EngineError;
use fpsmc::grid::{ANCIENT_EPSIZE, T_INF, TimeGrid};

#[test]
fn generated_grid_is_strictly_increasing_with_sentinels() {
    let grid = TimeGrid::new(5, 15.0, 0.01, None, None).expect("grid init failed");
    let tk = grid.tk();
    assert_eq!(tk.len(), 7); // n + 2 boundaries
    assert_eq!(grid.n_states(), 6);
    assert_eq!(tk[0], 0.0);
    assert_eq!(tk[5], 15.0);
    assert_eq!(tk[6], T_INF);
    for i in 0..tk.len() - 1 {
        assert!(
            tk[i] < tk[i + 1],
            "boundaries not strictly increasing at {i}: {} vs {}",
            tk[i],
            tk[i + 1]
        );
    }
}

#[test]
fn generated_grid_is_denser_near_zero() {
    let grid = TimeGrid::new(8, 15.0, 0.1, None, None).expect("grid init failed");
    let tk = grid.tk();
    // Log-spaced schedule: widths grow along the finite part of the grid.
    for i in 1..7 {
        assert!(tk[i + 1] - tk[i] > tk[i] - tk[i - 1]);
    }
}

#[test]
fn default_epsize_is_uniform_with_ancient_sentinel() {
    let grid = TimeGrid::new(4, 15.0, 0.01, None, None).expect("grid init failed");
    let eps = grid.epsize();
    assert_eq!(eps.len(), 5);
    for v in &eps[..4] {
        assert_eq!(*v, 1.0);
    }
    assert_eq!(eps[4], ANCIENT_EPSIZE);
}

#[test]
fn explicit_sizes_keep_ancient_sentinel() {
    let sizes = [2.0, 3.0, 4.0, 5.0];
    let grid = TimeGrid::new(4, 15.0, 0.01, None, Some(&sizes)).expect("grid init failed");
    let eps = grid.epsize();
    assert_eq!(&eps[..4], &[2.0, 3.0, 4.0, 5.0]);
    // Last entry is forced regardless of input.
    assert_eq!(eps[4], ANCIENT_EPSIZE);
}

#[test]
fn explicit_times_are_copied_and_horizon_forced() {
    let times = [0.0, 0.5, 1.0, 2.0, 4.0, 8.0];
    let grid = TimeGrid::new(5, 15.0, 0.01, Some(&times), None).expect("grid init failed");
    let tk = grid.tk();
    assert_eq!(&tk[..5], &[0.0, 0.5, 1.0, 2.0, 4.0]);
    assert_eq!(tk[5], 15.0);
    assert_eq!(tk[6], T_INF);
}

#[test]
fn invalid_grid_parameters_are_rejected() {
    assert!(matches!(
        TimeGrid::new(0, 15.0, 0.01, None, None),
        Err(EngineError::InvalidParameter(_))
    ));
    assert!(matches!(
        TimeGrid::new(5, -1.0, 0.01, None, None),
        Err(EngineError::InvalidParameter(_))
    ));
    assert!(matches!(
        TimeGrid::new(5, 15.0, 0.0, None, None),
        Err(EngineError::InvalidParameter(_))
    ));
    // Wrong number of explicit boundaries.
    assert!(matches!(
        TimeGrid::new(5, 15.0, 0.01, Some(&[0.0, 1.0, 2.0]), None),
        Err(EngineError::InvalidParameter(_))
    ));
    // Not strictly increasing.
    assert!(matches!(
        TimeGrid::new(3, 15.0, 0.01, Some(&[0.0, 2.0, 1.0, 3.0]), None),
        Err(EngineError::InvalidParameter(_))
    ));
    // Nonzero first boundary.
    assert!(matches!(
        TimeGrid::from_boundaries(vec![1.0, 2.0, T_INF], None),
        Err(EngineError::InvalidParameter(_))
    ));
    // Nonpositive effective size.
    assert!(matches!(
        TimeGrid::new(3, 15.0, 0.01, None, Some(&[1.0, 0.0, 1.0])),
        Err(EngineError::InvalidParameter(_))
    ));
}

#[test]
fn horizon_at_or_beyond_sentinel_is_rejected() {
    let err = TimeGrid::new(5, T_INF, 0.01, None, None).expect_err("expected horizon rejection");
    assert!(matches!(err, EngineError::InvalidParameter(_)));
    assert!(err.to_string().contains("sentinel"));
    assert!(matches!(
        TimeGrid::new(5, T_INF + 1.0, 0.01, None, None),
        Err(EngineError::InvalidParameter(_))
    ));
}

#[test]
fn single_state_grid_is_accepted() {
    let grid = TimeGrid::from_boundaries(vec![0.0, T_INF], None).expect("grid init failed");
    assert_eq!(grid.n_states(), 1);
    assert_eq!(grid.epsize(), &[ANCIENT_EPSIZE]);
}
