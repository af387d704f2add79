//! Pre-action discipline checks for the unreliable players: Bone-head,
//! Really Stupid, Wild Animal, Take Root and Bloodlust. These resolve
//! before the declared action does anything.

use super::dice::DiceRoller;
use super::events::{emit, EventKind, GameEvent};
use super::match_state::MatchState;
use super::player::{PlayerState, Skill};
use super::position::Position;
use super::resolver::ActionKind;

#[derive(Debug, Clone, Copy)]
pub struct BigGuyCheck {
    /// The declared action cannot proceed.
    pub action_blocked: bool,
    /// Bloodlust bite: the action still proceeds afterwards.
    pub proceed: bool,
}

impl Default for BigGuyCheck {
    fn default() -> Self {
        BigGuyCheck {
            action_blocked: false,
            proceed: true,
        }
    }
}

pub fn has_big_guy_skill(state: &MatchState, player_id: i32) -> bool {
    let p = state.player(player_id);
    p.has_skill(Skill::BoneHead)
        || p.has_skill(Skill::ReallyStupid)
        || p.has_skill(Skill::WildAnimal)
        || p.has_skill(Skill::TakeRoot)
        || p.has_skill(Skill::Bloodlust)
}

pub fn resolve_big_guy_check(
    state: &mut MatchState,
    player_id: i32,
    action: ActionKind,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) -> BigGuyCheck {
    let mut result = BigGuyCheck::default();

    // Bone-head: 1 and the lights go out, tacklezones included.
    if state.player(player_id).has_skill(Skill::BoneHead) {
        let roll = dice.d6();
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::SkillUsed, player_id, -1)
                .with_roll(Skill::BoneHead as i32, roll >= 2),
        );
        if roll == 1 {
            let p = state.player_mut(player_id);
            p.lost_tacklezones = true;
            p.has_acted = true;
            p.has_moved = true;
            result.action_blocked = true;
            result.proceed = false;
            return result;
        }
    }

    // Really Stupid: 2+ with an adjacent helper, 4+ alone.
    if state.player(player_id).has_skill(Skill::ReallyStupid) {
        let player = state.player(player_id).clone();
        let has_adjacent_ally = player.position.adjacent().iter().any(|pos| {
            pos.is_on_pitch()
                && state.player_at(*pos).is_some_and(|ally| {
                    ally.side == player.side && ally.state.can_act() && !ally.lost_tacklezones
                })
        });

        let target = if has_adjacent_ally { 2 } else { 4 };
        let roll = dice.d6();
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::SkillUsed, player_id, -1)
                .with_roll(Skill::ReallyStupid as i32, roll >= target),
        );
        if roll < target {
            let p = state.player_mut(player_id);
            p.lost_tacklezones = true;
            p.has_acted = true;
            p.has_moved = true;
            result.action_blocked = true;
            result.proceed = false;
            return result;
        }
    }

    // Wild Animal: calm only for violence; 1-2 fails anything else.
    if state.player(player_id).has_skill(Skill::WildAnimal)
        && action != ActionKind::Block
        && action != ActionKind::Blitz
    {
        let roll = dice.d6();
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::SkillUsed, player_id, -1)
                .with_roll(Skill::WildAnimal as i32, roll >= 3),
        );
        if roll < 3 {
            // Keeps its tacklezones, unlike the stupidity traits.
            let p = state.player_mut(player_id);
            p.has_acted = true;
            p.has_moved = true;
            result.action_blocked = true;
            result.proceed = false;
            return result;
        }
    }

    // Take Root: only movement is at risk.
    if state.player(player_id).has_skill(Skill::TakeRoot)
        && (action == ActionKind::Move || action == ActionKind::Blitz)
    {
        let roll = dice.d6();
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::SkillUsed, player_id, -1)
                .with_roll(Skill::TakeRoot as i32, roll >= 2),
        );
        if roll == 1 {
            let p = state.player_mut(player_id);
            p.has_acted = true;
            p.has_moved = true;
            result.action_blocked = true;
            result.proceed = false;
            return result;
        }
    }

    // Bloodlust: a failed check bites a nearby thrall; the action still
    // happens. With nobody to bite, the player leaves to feed.
    if state.player(player_id).has_skill(Skill::Bloodlust) {
        let roll = dice.d6();
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::SkillUsed, player_id, -1)
                .with_roll(Skill::Bloodlust as i32, roll >= 2),
        );
        if roll == 1 {
            let player = state.player(player_id).clone();
            let thrall_id = player.position.adjacent().iter().find_map(|pos| {
                if !pos.is_on_pitch() {
                    return None;
                }
                state.player_at(*pos).and_then(|ally| {
                    if ally.side == player.side
                        && ally.state.can_act()
                        && !ally.has_skill(Skill::Bloodlust)
                    {
                        Some(ally.id)
                    } else {
                        None
                    }
                })
            });

            if let Some(thrall_id) = thrall_id {
                super::ball_handling::handle_ball_on_player_down(
                    state,
                    thrall_id,
                    dice,
                    events.as_deref_mut(),
                );
                let thrall = state.player_mut(thrall_id);
                thrall.state = PlayerState::Ko;
                thrall.position = Position::OFF_PITCH;
                emit(
                    events.as_deref_mut(),
                    GameEvent::new(EventKind::Injury, thrall_id, player_id),
                );
                result.action_blocked = false;
                result.proceed = true;
            } else {
                super::ball_handling::handle_ball_on_player_down(
                    state,
                    player_id,
                    dice,
                    events.as_deref_mut(),
                );
                let p = state.player_mut(player_id);
                p.state = PlayerState::Ko;
                p.position = Position::OFF_PITCH;
                result.action_blocked = true;
                result.proceed = false;
            }
            return result;
        }
    }

    result
}
