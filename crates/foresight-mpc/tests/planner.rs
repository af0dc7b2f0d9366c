//! Integration tests: MPC planner selection, cold start, and failure paths.
//!
//! Candidate batches come from a [`FixedSampler`] wherever the winning
//! sequence must be known in advance; the arithmetic in those scenarios
//! uses small integers so every return is exact in `f32`.

use std::sync::atomic::Ordering;

use foresight_core::{ActionBounds, CollaboratorError, DynamicsModel, PlanError};
use foresight_mpc::{ConfigError, EnsembleExecution, MpcPlanner, PlannerConfig};
use foresight_test_utils::fixtures::{
    ActionIntegratorModel, BadShapeReward, CountingModel, FailingModel, FirstObsReward,
    ObsSumReward, PanickingModel, ShiftModel, WrongShapeModel,
};
use foresight_test_utils::{identity_stats, FixedSampler};
use ndarray::{array, Array3};

fn boxed(model: impl DynamicsModel + 'static) -> Box<dyn DynamicsModel> {
    Box::new(model)
}

fn small_config(obs_dim: usize, n: usize, horizon: usize) -> PlannerConfig {
    PlannerConfig {
        horizon,
        num_sequences: n,
        seed: Some(7),
        ..PlannerConfig::new(obs_dim)
    }
}

/// Three one-dimensional candidates over three steps:
/// `[1, 1, 1]`, `[2, 0, 0]`, `[0, 0, 5]`.
fn three_candidates() -> Array3<f32> {
    array![[[1.0], [1.0], [1.0]], [[2.0], [0.0], [0.0]], [[0.0], [0.0], [5.0]]]
}

// ── Cold start ──────────────────────────────────────────────────────

#[test]
fn cold_start_returns_in_bounds_action_without_touching_models() {
    let counting = CountingModel::new(ShiftModel::new("shift", 1.0));
    let calls = counting.counter();
    let failing = FailingModel::new("never");
    let failing_calls = failing.counter();
    let bounds = ActionBounds::new(vec![-1.0, 0.0], vec![1.0, 0.5]).unwrap();
    let mut planner = MpcPlanner::new(
        small_config(3, 32, 4),
        bounds.clone(),
        vec![boxed(counting), boxed(failing)],
        FirstObsReward::new(),
    )
    .unwrap();

    for _ in 0..20 {
        let action = planner.plan(array![0.0, 1.0, 2.0].view()).unwrap();
        assert_eq!(action.shape(), &[1, 2]);
        assert!(bounds.contains(action.row(0)), "{action:?} out of bounds");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(failing_calls.load(Ordering::SeqCst), 0);

    let metrics = planner.last_metrics().unwrap();
    assert!(metrics.cold_start);
    assert!(metrics.member_us.is_empty());
    assert_eq!(metrics.best_index, None);
}

#[test]
fn cold_start_still_validates_observation_shape() {
    let mut planner = MpcPlanner::new(
        small_config(3, 8, 2),
        ActionBounds::new(vec![-1.0], vec![1.0]).unwrap(),
        vec![boxed(ShiftModel::new("shift", 0.0))],
        FirstObsReward::new(),
    )
    .unwrap();
    let err = planner.plan(array![0.0, 1.0].view()).unwrap_err();
    assert!(matches!(
        err,
        PlanError::ShapeMismatch {
            context: "observation",
            ..
        }
    ));
}

#[test]
fn clearing_statistics_returns_to_cold_start() {
    let failing = FailingModel::new("never");
    let calls = failing.counter();
    let mut planner = MpcPlanner::new(
        small_config(1, 4, 3),
        ActionBounds::new(vec![-1.0], vec![1.0]).unwrap(),
        vec![boxed(failing)],
        FirstObsReward::new(),
    )
    .unwrap();

    planner.set_data_statistics(identity_stats(1, 1)).unwrap();
    assert!(planner.plan(array![0.0].view()).is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert!(planner.clear_data_statistics().is_some());
    assert!(planner.data_statistics().is_none());
    assert!(planner.plan(array![0.0].view()).is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ── Selection ───────────────────────────────────────────────────────

#[test]
fn selects_first_action_of_best_sequence() {
    // Integrator with gain 1 and reward = obs[0], starting from 0:
    // returns are 0+1+2 = 3, 0+2+2 = 4 and 0+0+0 = 0.
    let mut planner = MpcPlanner::with_sampler(
        small_config(1, 3, 3),
        vec![boxed(ActionIntegratorModel::new("integrator", 1.0))],
        FirstObsReward::new(),
        FixedSampler::new(three_candidates()),
    )
    .unwrap();
    planner.set_data_statistics(identity_stats(1, 1)).unwrap();

    let action = planner.plan(array![0.0].view()).unwrap();
    assert_eq!(action, array![[2.0]]);

    let metrics = planner.last_metrics().unwrap();
    assert!(!metrics.cold_start);
    assert_eq!(metrics.best_index, Some(1));
    assert_eq!(metrics.best_return, Some(4.0));
    assert_eq!(metrics.member_us.len(), 1);
}

#[test]
fn ensemble_mean_decides_the_winner() {
    // Member returns, candidate order [0, 1, 2]:
    //   gain  1.0: [3, 4, 0]
    //   gain -3.0: [-9, -12, 0]
    // mean: [-3, -4, 0] -> candidate 2 wins even though member 0 prefers 1.
    let mut planner = MpcPlanner::with_sampler(
        small_config(1, 3, 3),
        vec![
            boxed(ActionIntegratorModel::new("up", 1.0)),
            boxed(ActionIntegratorModel::new("down", -3.0)),
        ],
        FirstObsReward::new(),
        FixedSampler::new(three_candidates()),
    )
    .unwrap();
    planner.set_data_statistics(identity_stats(1, 1)).unwrap();

    let action = planner.plan(array![0.0].view()).unwrap();
    assert_eq!(action, array![[0.0]]);
    assert_eq!(planner.last_metrics().unwrap().best_index, Some(2));
    assert_eq!(planner.last_metrics().unwrap().best_return, Some(0.0));
}

#[test]
fn ties_resolve_to_lowest_index() {
    // Opposite gains cancel: every mean return is zero.
    let mut planner = MpcPlanner::with_sampler(
        small_config(1, 3, 3),
        vec![
            boxed(ActionIntegratorModel::new("up", 1.0)),
            boxed(ActionIntegratorModel::new("down", -1.0)),
        ],
        FirstObsReward::new(),
        FixedSampler::new(three_candidates()),
    )
    .unwrap();
    planner.set_data_statistics(identity_stats(1, 1)).unwrap();

    let action = planner.plan(array![0.0].view()).unwrap();
    assert_eq!(action, array![[1.0]]);
    assert_eq!(planner.last_metrics().unwrap().best_index, Some(0));
}

#[test]
fn done_flags_do_not_truncate_rollouts() {
    let mut planner = MpcPlanner::with_sampler(
        small_config(1, 3, 3),
        vec![boxed(ActionIntegratorModel::new("integrator", 1.0))],
        FirstObsReward::always_done(),
        FixedSampler::new(three_candidates()),
    )
    .unwrap();
    planner.set_data_statistics(identity_stats(1, 1)).unwrap();

    let action = planner.plan(array![0.0].view()).unwrap();
    assert_eq!(action, array![[2.0]]);
    assert_eq!(planner.last_metrics().unwrap().best_return, Some(4.0));
}

#[test]
fn horizon_one_never_calls_the_model() {
    let counting = CountingModel::new(ShiftModel::new("shift", 1.0));
    let calls = counting.counter();
    let mut planner = MpcPlanner::new(
        small_config(2, 16, 1),
        ActionBounds::new(vec![-1.0, -1.0], vec![1.0, 1.0]).unwrap(),
        vec![boxed(counting)],
        ObsSumReward,
    )
    .unwrap();
    planner.set_data_statistics(identity_stats(2, 2)).unwrap();

    let action = planner.plan(array![0.5, 0.5].view()).unwrap();
    assert_eq!(action.shape(), &[1, 2]);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn each_member_is_called_horizon_minus_one_times() {
    let a = CountingModel::new(ShiftModel::new("a", 0.1));
    let b = CountingModel::new(ShiftModel::new("b", -0.1));
    let (ca, cb) = (a.counter(), b.counter());
    let mut planner = MpcPlanner::new(
        small_config(2, 16, 5),
        ActionBounds::new(vec![-1.0], vec![1.0]).unwrap(),
        vec![boxed(a), boxed(b)],
        ObsSumReward,
    )
    .unwrap();
    planner.set_data_statistics(identity_stats(2, 1)).unwrap();

    planner.plan(array![0.0, 0.0].view()).unwrap();
    assert_eq!(ca.load(Ordering::SeqCst), 4);
    assert_eq!(cb.load(Ordering::SeqCst), 4);
}

// ── Reproducibility ─────────────────────────────────────────────────

fn integrator_ensemble() -> Vec<Box<dyn DynamicsModel>> {
    vec![
        boxed(ActionIntegratorModel::new("slow", 0.5)),
        boxed(ActionIntegratorModel::new("mid", 1.0)),
        boxed(ActionIntegratorModel::new("fast", 1.5)),
    ]
}

fn seeded_planner(execution: EnsembleExecution) -> MpcPlanner<ObsSumReward> {
    let config = PlannerConfig {
        execution,
        ..small_config(2, 64, 6)
    };
    let bounds = ActionBounds::new(vec![-1.0, -2.0], vec![1.0, 2.0]).unwrap();
    let mut planner = MpcPlanner::new(config, bounds, integrator_ensemble(), ObsSumReward).unwrap();
    planner.set_data_statistics(identity_stats(2, 2)).unwrap();
    planner
}

#[test]
fn same_seed_gives_same_actions() {
    let mut a = seeded_planner(EnsembleExecution::Sequential);
    let mut b = seeded_planner(EnsembleExecution::Sequential);
    let obs = array![0.25, -0.5];
    for _ in 0..5 {
        assert_eq!(a.plan(obs.view()).unwrap(), b.plan(obs.view()).unwrap());
    }
}

#[test]
fn reseeding_replays_the_candidate_stream() {
    let mut planner = seeded_planner(EnsembleExecution::Sequential);
    let obs = array![0.0, 0.0];
    let first = planner.plan(obs.view()).unwrap();
    planner.sampler_mut().reseed(7);
    assert_eq!(planner.plan(obs.view()).unwrap(), first);
}

#[test]
fn threaded_matches_sequential() {
    let mut seq = seeded_planner(EnsembleExecution::Sequential);
    let mut par = seeded_planner(EnsembleExecution::Threaded);
    let obs = array![1.0, -1.0];
    for _ in 0..5 {
        assert_eq!(seq.plan(obs.view()).unwrap(), par.plan(obs.view()).unwrap());
        let (ms, mp) = (seq.last_metrics().unwrap(), par.last_metrics().unwrap());
        assert_eq!(ms.best_index, mp.best_index);
        assert_eq!(ms.best_return, mp.best_return);
        assert_eq!(mp.member_us.len(), 3);
    }
}

// ── Failures ────────────────────────────────────────────────────────

#[test]
fn failing_member_reports_its_index() {
    for execution in [EnsembleExecution::Sequential, EnsembleExecution::Threaded] {
        let config = PlannerConfig {
            execution,
            ..small_config(1, 8, 3)
        };
        let mut planner = MpcPlanner::new(
            config,
            ActionBounds::new(vec![-1.0], vec![1.0]).unwrap(),
            vec![
                boxed(ShiftModel::new("ok", 0.0)),
                boxed(FailingModel::new("broken")),
            ],
            FirstObsReward::new(),
        )
        .unwrap();
        planner.set_data_statistics(identity_stats(1, 1)).unwrap();

        match planner.plan(array![0.0].view()).unwrap_err() {
            PlanError::ModelFailed { member, name, .. } => {
                assert_eq!(member, 1);
                assert_eq!(name, "broken");
            }
            other => panic!("expected ModelFailed, got {other:?}"),
        }
        assert!(planner.last_metrics().is_none());
    }
}

#[test]
fn panicking_member_is_reported_in_both_modes() {
    for execution in [EnsembleExecution::Sequential, EnsembleExecution::Threaded] {
        let config = PlannerConfig {
            execution,
            ..small_config(1, 4, 2)
        };
        let mut planner = MpcPlanner::new(
            config,
            ActionBounds::new(vec![-1.0], vec![1.0]).unwrap(),
            vec![boxed(ShiftModel::new("ok", 0.0)), boxed(PanickingModel)],
            FirstObsReward::new(),
        )
        .unwrap();
        planner.set_data_statistics(identity_stats(1, 1)).unwrap();

        let err = planner.plan(array![0.0].view()).unwrap_err();
        assert!(
            matches!(
                err,
                PlanError::ModelFailed {
                    member: 1,
                    reason: CollaboratorError::ExecutionFailed { .. },
                    ..
                }
            ),
            "{execution:?}: {err:?}"
        );
    }
}

#[test]
fn wrong_reward_shape_is_rejected() {
    let mut planner = MpcPlanner::new(
        small_config(1, 8, 2),
        ActionBounds::new(vec![-1.0], vec![1.0]).unwrap(),
        vec![boxed(ShiftModel::new("ok", 0.0))],
        BadShapeReward,
    )
    .unwrap();
    planner.set_data_statistics(identity_stats(1, 1)).unwrap();

    let err = planner.plan(array![0.0].view()).unwrap_err();
    match err {
        PlanError::ShapeMismatch {
            context,
            expected,
            actual,
        } => {
            assert_eq!(context, "rewards");
            assert_eq!(expected.as_slice(), &[8]);
            assert_eq!(actual.as_slice(), &[9]);
        }
        other => panic!("expected ShapeMismatch, got {other:?}"),
    }
}

#[test]
fn wrong_prediction_shape_is_rejected() {
    let mut planner = MpcPlanner::new(
        small_config(2, 8, 2),
        ActionBounds::new(vec![-1.0], vec![1.0]).unwrap(),
        vec![boxed(WrongShapeModel)],
        FirstObsReward::new(),
    )
    .unwrap();
    planner.set_data_statistics(identity_stats(2, 1)).unwrap();

    let err = planner.plan(array![0.0, 0.0].view()).unwrap_err();
    assert!(matches!(
        err,
        PlanError::ShapeMismatch {
            context: "predicted observations",
            ..
        }
    ));
}

#[test]
fn oversized_request_from_sampler_surfaces() {
    let mut planner = MpcPlanner::with_sampler(
        small_config(1, 10, 3),
        vec![boxed(ShiftModel::new("ok", 0.0))],
        FirstObsReward::new(),
        FixedSampler::new(three_candidates()),
    )
    .unwrap();
    planner.set_data_statistics(identity_stats(1, 1)).unwrap();
    assert!(matches!(
        planner.plan(array![0.0].view()),
        Err(PlanError::InvalidArgument { .. })
    ));
}

// ── Construction ────────────────────────────────────────────────────

#[test]
fn empty_ensemble_is_rejected() {
    let result = MpcPlanner::new(
        small_config(1, 8, 2),
        ActionBounds::new(vec![-1.0], vec![1.0]).unwrap(),
        Vec::new(),
        FirstObsReward::new(),
    );
    assert!(matches!(result, Err(ConfigError::EmptyEnsemble)));
}

#[test]
fn invalid_config_is_rejected() {
    let config = PlannerConfig {
        horizon: 0,
        ..PlannerConfig::new(1)
    };
    let result = MpcPlanner::new(
        config,
        ActionBounds::new(vec![-1.0], vec![1.0]).unwrap(),
        vec![boxed(ShiftModel::new("ok", 0.0))],
        FirstObsReward::new(),
    );
    assert!(matches!(result, Err(ConfigError::ZeroHorizon)));
}

#[test]
fn statistics_with_wrong_dims_are_rejected() {
    let mut planner = MpcPlanner::new(
        small_config(3, 8, 2),
        ActionBounds::new(vec![-1.0], vec![1.0]).unwrap(),
        vec![boxed(ShiftModel::new("ok", 0.0))],
        FirstObsReward::new(),
    )
    .unwrap();

    let err = planner.set_data_statistics(identity_stats(3, 2)).unwrap_err();
    assert!(matches!(err, PlanError::ShapeMismatch { .. }));
    assert!(planner.data_statistics().is_none());

    planner.set_data_statistics(identity_stats(3, 1)).unwrap();
    assert_eq!(planner.data_statistics().unwrap().obs_dim(), 3);
    assert_eq!(planner.ensemble_len(), 1);
}
