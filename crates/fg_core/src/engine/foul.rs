//! Fouling a downed opponent: two separate d6 (doubles draw the ref's
//! eye), assist differential on the armour total, and the usual injury
//! ladder on a break.

use super::ball_handling::handle_ball_on_player_down;
use super::dice::DiceRoller;
use super::events::{emit, EventKind, GameEvent};
use super::helpers::count_assists;
use super::match_state::MatchState;
use super::player::{PlayerState, Skill};
use super::position::Position;
use super::resolver::ActionOutcome;

pub fn resolve_foul(
    state: &mut MatchState,
    fouler_id: i32,
    target_id: i32,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) -> ActionOutcome {
    let target_state = state.player(target_id).state;
    if target_state != PlayerState::Prone && target_state != PlayerState::Stunned {
        return ActionOutcome::fail();
    }

    let fouler = state.player(fouler_id).clone();
    let target = state.player(target_id).clone();

    let friendly_assists =
        count_assists(state, target.position, fouler.side, fouler_id, target_id, -1);
    let enemy_assists =
        count_assists(state, fouler.position, target.side, fouler_id, target_id, -1);
    let mut assist_mod = friendly_assists - enemy_assists;

    if fouler.has_skill(Skill::DirtyPlayer) {
        assist_mod += 1;
    }

    // Two dice rolled apart so doubles are visible.
    let die1 = dice.d6();
    let die2 = dice.d6();
    let armour_roll = die1 + die2 + assist_mod;
    let is_doubles = die1 == die2;

    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::Foul, fouler_id, target_id)
            .at(fouler.position, target.position)
            .with_roll(armour_roll, true),
    );

    if armour_roll > target.stats.armour as i32 {
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::ArmourBreak, target_id, -1)
                .at(target.position, Position::OFF_PITCH)
                .with_roll(armour_roll, true),
        );

        let has_stakes = fouler.has_skill(Skill::Stakes);

        let mut injury_roll = dice.d2d6();
        if target.has_skill(Skill::Stunty) {
            injury_roll += 1;
        }

        if injury_roll <= 7 {
            state.player_mut(target_id).state = PlayerState::Stunned;
        } else if injury_roll <= 9 {
            let mut ko = true;
            if target.has_skill(Skill::ThickSkull) {
                let ts_roll = dice.d6();
                if ts_roll >= 4 {
                    state.player_mut(target_id).state = PlayerState::Stunned;
                    ko = false;
                }
            }
            if ko {
                let p = state.player_mut(target_id);
                p.state = PlayerState::Ko;
                p.position = Position::OFF_PITCH;
            }
        } else {
            let mut casualty = true;
            if target.has_skill(Skill::Regeneration) && !has_stakes {
                let regen_roll = dice.d6();
                if regen_roll >= 4 {
                    state.player_mut(target_id).state = PlayerState::Stunned;
                    casualty = false;
                }
            }
            if casualty {
                let p = state.player_mut(target_id);
                p.state = PlayerState::Injured;
                p.position = Position::OFF_PITCH;
            }
        }

        handle_ball_on_player_down(state, target_id, dice, events.as_deref_mut());
    }

    // Doubles: the ref saw it. Sneaky Git talks their way out.
    if is_doubles && !fouler.has_skill(Skill::SneakyGit) {
        let p = state.player_mut(fouler_id);
        p.state = PlayerState::Ejected;
        p.position = Position::OFF_PITCH;
        handle_ball_on_player_down(state, fouler_id, dice, events.as_deref_mut());
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::Injury, fouler_id, -1).with_roll(0, false),
        );
    }

    state.player_mut(fouler_id).has_acted = true;
    let side = state.player(fouler_id).side;
    state.team_mut(side).foul_used_this_turn = true;

    ActionOutcome::ok()
}
