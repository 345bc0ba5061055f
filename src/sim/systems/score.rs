//! Goals, serves and match end

use glam::Vec2;

use crate::Side;
use crate::sim::events::{EventKind, GameEvent};
use crate::sim::state::{ContextKind, GamePhase, GameState};
use crate::sim::system::{FrameDelta, System};
use crate::sim::tasks::TaskAction;

pub struct ScoreSystem;

impl System for ScoreSystem {
    fn name(&self) -> &'static str {
        "score"
    }

    fn update(&mut self, state: &mut GameState, _delta: &FrameDelta) {
        for event in state.events.claim(|e| e.kind == EventKind::Goal) {
            let Some(scorer) = event.side else {
                log::debug!("Goal event without a scorer");
                continue;
            };
            score_goal(state, scorer);
        }
    }
}

fn score_goal(state: &mut GameState, scorer: Side) {
    let total = state.score.add(scorer);
    log::info!(
        "Goal for {}: {} - {}",
        scorer.as_str(),
        state.score.left,
        state.score.right
    );

    let conceding = scorer.opponent();
    let mouth = Vec2::new(
        match conceding {
            Side::Left => 0.0,
            Side::Right => state.tuning.arena_width,
        },
        state.tuning.arena_height / 2.0,
    );
    for burst in 0..state.tuning.firework_bursts {
        state.tasks.schedule(
            state.tuning.firework_stagger * burst as f32,
            TaskAction::Firework {
                origin: mouth,
                burst,
            },
        );
    }

    if state.context == ContextKind::Match && total >= state.tuning.winning_score {
        state.phase = GamePhase::GameOver;
        state
            .events
            .push(GameEvent::new(EventKind::MatchOver).with_side(scorer));
        log::info!("Match over, {} wins", scorer.as_str());
        return;
    }

    // Other balls may still be live after a multiply
    let serve_pending = state
        .tasks
        .has_pending(|a| matches!(a, TaskAction::Serve { .. }));
    if state.good_ball_count() == 0 && !serve_pending {
        state.phase = GamePhase::Serve;
        state
            .tasks
            .schedule(state.tuning.serve_delay, TaskAction::Serve { toward: conceding });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tuning;
    use crate::sim::ball::BallKind;
    use crate::sim::paddle::Controller;

    fn arena(winning_score: u32) -> GameState {
        let tuning = Tuning {
            winning_score,
            ..Tuning::default()
        };
        let mut state = GameState::empty(4, tuning, ContextKind::Match);
        state.spawn_paddle(Side::Left, Controller::Ai);
        state.spawn_paddle(Side::Right, Controller::Ai);
        state.phase = GamePhase::Playing;
        state
    }

    fn goal(state: &mut GameState, scorer: Side) {
        state
            .events
            .push(GameEvent::new(EventKind::Goal).with_side(scorer));
        ScoreSystem.update(state, &FrameDelta::new(1.0, 0.0));
    }

    #[test]
    fn test_goal_scores_and_schedules_serve() {
        let mut state = arena(11);
        goal(&mut state, Side::Left);

        assert_eq!(state.score.left, 1);
        assert_eq!(state.score.right, 0);
        assert_eq!(state.phase, GamePhase::Serve);
        assert!(
            state
                .tasks
                .has_pending(|a| *a == TaskAction::Serve { toward: Side::Right })
        );
        assert!(
            state
                .tasks
                .has_pending(|a| matches!(a, TaskAction::Firework { .. }))
        );
    }

    #[test]
    fn test_no_serve_while_a_ball_is_live() {
        let mut state = arena(11);
        state.spawn_ball(BallKind::Multiply, Vec2::new(400.0, 300.0), None, None);
        goal(&mut state, Side::Right);

        assert_eq!(state.score.right, 1);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(
            !state
                .tasks
                .has_pending(|a| matches!(a, TaskAction::Serve { .. }))
        );
    }

    #[test]
    fn test_winning_score_ends_match() {
        let mut state = arena(2);
        goal(&mut state, Side::Right);
        goal(&mut state, Side::Right);

        assert_eq!(state.phase, GamePhase::GameOver);
        let over = state
            .events
            .iter()
            .find(|e| e.kind == EventKind::MatchOver)
            .unwrap();
        assert_eq!(over.side, Some(Side::Right));
    }

    #[test]
    fn test_menu_play_never_ends() {
        let mut state = arena(1);
        state.context = ContextKind::Menu;
        goal(&mut state, Side::Left);
        goal(&mut state, Side::Left);
        assert_eq!(state.score.left, 2);
        assert_ne!(state.phase, GamePhase::GameOver);
    }
}
