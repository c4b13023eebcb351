//! End-to-end scenarios for the runner, free-play and the quiz
//!
#![cfg(not(feature = "strict-debug"))]

use labkit_engine::{
    match_step, Action, AssessmentAttempt, ContractViolation, Effects, EngineConfig, LabSession,
    MatchResult, NarrationBuffer, ProcedureRunner, RunPhase,
};
use labkit_model::ResourceId;
use labkit_test_utils::{
    correct_actions, scenario_procedure, setup_session, two_question_assessment,
};
use pretty_assertions::assert_eq;

#[test]
fn test_full_procedure_in_order_completes() {
    let procedure = scenario_procedure();
    let mut runner = ProcedureRunner::new(procedure.clone());
    runner.start();

    for action in correct_actions(&procedure) {
        assert!(runner.submit(&action).result.is_accepted());
    }

    assert!(runner.is_complete());
    assert_eq!(
        runner.resource_log(),
        &[ResourceId::new("fe"), ResourceId::new("hcl")]
    );
}

#[test]
fn test_wrong_first_action_is_rejected_with_tool_prompt() {
    let mut runner = ProcedureRunner::new(scenario_procedure());
    runner.start();

    let outcome = runner.submit(&Action::add_resource("fe"));

    assert_eq!(runner.current_step_index(), Some(0));
    assert!(runner.resource_log().is_empty());
    match outcome.result {
        MatchResult::Rejected { retry_narration } => {
            assert!(retry_narration.contains("Select a test tube from the rack."));
        }
        MatchResult::Accepted { .. } => panic!("addResource(fe) must not satisfy a tool step"),
    }
}

#[test]
fn test_quiz_scoring() {
    let mut perfect = AssessmentAttempt::start(two_question_assessment());
    perfect.answer(0, 1).unwrap();
    perfect.answer(1, 0).unwrap();
    assert_eq!(perfect.score(), 2);
    assert!(perfect.is_finished());

    let mut one_wrong = AssessmentAttempt::start(two_question_assessment());
    one_wrong.answer(0, 1).unwrap();
    one_wrong.answer(1, 1).unwrap();
    assert_eq!(one_wrong.score(), 1);
    assert!(one_wrong.is_finished());
}

#[test]
fn test_free_play_accepts_everything_without_state() {
    let actions = [
        Action::select_tool("beaker"),
        Action::add_resource("hcl"),
        Action::add_resource("unknown-powder"),
        Action::Observe,
        Action::ApplyHeat,
    ];
    for action in &actions {
        assert_eq!(
            match_step(action, None),
            MatchResult::Accepted {
                effects: Effects::none()
            }
        );
    }

    let mut session = LabSession::free_play(EngineConfig::default(), NarrationBuffer::new());
    for action in &actions {
        assert!(session.submit(action).result.is_accepted());
    }
    assert!(session.runner().is_none());
    assert!(session.attempt().is_none());
    assert_eq!(session.journal().len(), actions.len());
    assert!(session.sink().lines().is_empty());
}

#[test]
fn test_reanswering_keeps_score() {
    let mut attempt = AssessmentAttempt::start(two_question_assessment());
    attempt.answer(0, 1).unwrap();
    let before = attempt.score();

    let err = attempt.answer(0, 2).unwrap_err();

    assert_eq!(err, ContractViolation::AlreadyAnswered { question: 0 });
    assert_eq!(attempt.score(), before);
    assert_eq!(attempt.answers().get(&0), Some(&1));
}

#[test]
fn test_session_end_to_end() {
    let mut session = setup_session(EngineConfig::default());
    assert_eq!(session.start().as_deref(), Some("Select a test tube from the rack."));

    let procedure = scenario_procedure();
    for action in correct_actions(&procedure) {
        session.submit(&action);
    }
    assert_eq!(
        session.runner().map(ProcedureRunner::phase),
        Some(RunPhase::Complete)
    );

    let first = session.answer(0, 1).unwrap().unwrap();
    assert!(first.correct);
    assert_eq!(first.explanation, "Iron displaces hydrogen from the acid.");
    session.answer(1, 0).unwrap();

    let award = session.award().unwrap();
    assert_eq!(award.total_xp(), 50 + 2 * 10);
    assert_eq!(session.sink().lines().len(), 1 + procedure.step_count());
}

#[test]
fn test_timed_streak_points_flow_into_award() {
    let config = EngineConfig::default().with_strategy("timed_streak");
    let mut session = setup_session(config);
    session.start();
    for action in correct_actions(&scenario_procedure()) {
        session.submit(&action);
    }
    session
        .answer_timed(0, 1, std::time::Duration::from_secs(10))
        .unwrap();
    session
        .answer_timed(1, 0, std::time::Duration::from_secs(40))
        .unwrap();

    // 100 + 20 * 5, then 100 + 0 + 50 streak
    assert_eq!(session.award().map(|a| a.points), Some(200 + 150));
    assert_eq!(session.ledger().map(|l| l.best_streak()), Some(2));
}

#[test]
fn test_journal_export_lists_rejections() {
    let mut session = setup_session(EngineConfig::default());
    session.start();
    session.submit(&Action::Observe);
    session.submit(&Action::select_tool("test_tube"));

    let exported = session.journal().to_json().unwrap();
    let json: serde_json::Value = serde_json::from_str(&exported).unwrap();
    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["outcome"], "rejected");
    assert_eq!(entries[0]["step_index"], 0);
    assert_eq!(entries[1]["outcome"], "accepted");
    assert_eq!(session.journal().rejections(), 1);
}
