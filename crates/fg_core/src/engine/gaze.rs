//! Hypnotic gaze: shut down an adjacent opponent's tacklezones for a
//! turn, at the cost of a turnover if the stare fails.

use super::dice::DiceRoller;
use super::events::{emit, EventKind, GameEvent};
use super::helpers::count_tacklezones;
use super::match_state::MatchState;
use super::player::Skill;
use super::resolver::ActionOutcome;

pub fn resolve_hypnotic_gaze(
    state: &mut MatchState,
    gazer_id: i32,
    target_id: i32,
    dice: &mut dyn DiceRoller,
    events: Option<&mut Vec<GameEvent>>,
) -> ActionOutcome {
    state.player_mut(gazer_id).has_acted = true;

    let gazer_pos = state.player(gazer_id).position;
    let gazer_side = state.player(gazer_id).side;
    let tz = count_tacklezones(state, gazer_pos, gazer_side, -1);
    let gaze_target = (2 + tz).min(6);

    let roll = dice.d6();
    let target_pos = state.player(target_id).position;
    emit(
        events,
        GameEvent::new(EventKind::SkillUsed, gazer_id, target_id)
            .at(gazer_pos, target_pos)
            .with_roll(Skill::HypnoticGaze as i32, roll >= gaze_target),
    );

    if roll >= gaze_target {
        state.player_mut(target_id).lost_tacklezones = true;
        ActionOutcome::ok()
    } else {
        ActionOutcome::turnover()
    }
}
