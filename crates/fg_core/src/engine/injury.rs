//! Armour and injury resolution, plus the crowd-surf variant used when a
//! player is shoved off the pitch.

use super::dice::DiceRoller;
use super::events::{emit, EventKind, GameEvent};
use super::match_state::MatchState;
use super::player::{PlayerState, Skill};
use super::position::Position;

/// Modifiers and skill flags feeding one armour+injury sequence. The
/// attacker's skills are sampled into flags up front so the injury roll
/// needs no second look at the attacker.
#[derive(Debug, Clone, Copy, Default)]
pub struct InjuryContext {
    pub armour_modifier: i32,
    pub injury_modifier: i32,
    /// Armour also breaks on a raw 8+.
    pub has_claw: bool,
    /// Blocks Regeneration.
    pub has_stakes: bool,
    /// Injury rolled twice, worse kept.
    pub has_decay: bool,
    pub has_nurgles_rot: bool,
}

fn resolve_injury_roll(
    state: &mut MatchState,
    player_id: i32,
    dice: &mut dyn DiceRoller,
    ctx: &InjuryContext,
    mut events: Option<&mut Vec<GameEvent>>,
) -> i32 {
    let mut injury_roll = dice.d2d6() + ctx.injury_modifier;

    if ctx.has_decay {
        let second = dice.d2d6() + ctx.injury_modifier;
        injury_roll = injury_roll.max(second);
    }

    if state.player(player_id).has_skill(Skill::Stunty) {
        injury_roll += 1;
    }

    if injury_roll <= 7 {
        state.player_mut(player_id).state = PlayerState::Stunned;
        let pos = state.player(player_id).position;
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::Injury, player_id, -1)
                .at(pos, Position::OFF_PITCH)
                .with_roll(injury_roll, false),
        );
    } else if injury_roll <= 9 {
        // KO, unless Thick Skull keeps them on the pitch.
        if state.player(player_id).has_skill(Skill::ThickSkull) {
            let ts_roll = dice.d6();
            if ts_roll >= 4 {
                state.player_mut(player_id).state = PlayerState::Stunned;
                emit(
                    events.as_deref_mut(),
                    GameEvent::new(EventKind::SkillUsed, player_id, -1)
                        .with_roll(Skill::ThickSkull as i32, true),
                );
                return injury_roll;
            }
        }
        let p = state.player_mut(player_id);
        p.state = PlayerState::Ko;
        p.position = Position::OFF_PITCH;
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::Injury, player_id, -1).with_roll(injury_roll, false),
        );
    } else {
        // Casualty; Regeneration saves on a 4+ unless staked.
        if state.player(player_id).has_skill(Skill::Regeneration) && !ctx.has_stakes {
            let regen_roll = dice.d6();
            emit(
                events.as_deref_mut(),
                GameEvent::new(EventKind::Regeneration, player_id, -1)
                    .with_roll(regen_roll, regen_roll >= 4),
            );
            if regen_roll >= 4 {
                state.player_mut(player_id).state = PlayerState::Stunned;
                return injury_roll;
            }
        }
        let p = state.player_mut(player_id);
        p.state = PlayerState::Injured;
        p.position = Position::OFF_PITCH;
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::Casualty, player_id, -1).with_roll(injury_roll, false),
        );

        if ctx.has_nurgles_rot {
            emit(
                events.as_deref_mut(),
                GameEvent::new(EventKind::SkillUsed, player_id, -1)
                    .with_roll(Skill::NurglesRot as i32, true),
            );
        }
    }

    injury_roll
}

/// Roll armour, and injury on a break. Returns whether armour broke.
pub fn resolve_armour_and_injury(
    state: &mut MatchState,
    player_id: i32,
    dice: &mut dyn DiceRoller,
    ctx: &InjuryContext,
    mut events: Option<&mut Vec<GameEvent>>,
) -> bool {
    let av = state.player(player_id).stats.armour as i32;
    let armour_roll = dice.d2d6() + ctx.armour_modifier;

    let broken = if ctx.has_claw {
        armour_roll >= 8 || armour_roll > av
    } else {
        armour_roll > av
    };

    let pos = state.player(player_id).position;
    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::ArmourBreak, player_id, -1)
            .at(pos, Position::OFF_PITCH)
            .with_roll(armour_roll, broken),
    );

    if broken {
        resolve_injury_roll(state, player_id, dice, ctx, events);
    }

    broken
}

/// Crowd injury: no armour roll, injury at +1, and the victim never stays
/// on the pitch: a stunned result demotes to KO in the dugout.
pub fn resolve_crowd_surf(
    state: &mut MatchState,
    player_id: i32,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) {
    let pos = state.player(player_id).position;
    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::Injury, player_id, -1)
            .at(pos, Position::OFF_PITCH)
            .with_roll(0, true),
    );

    let ctx = InjuryContext {
        injury_modifier: 1,
        has_decay: state.player(player_id).has_skill(Skill::Decay),
        ..InjuryContext::default()
    };

    resolve_injury_roll(state, player_id, dice, &ctx, events);

    let p = state.player_mut(player_id);
    if p.state.is_on_pitch() {
        p.state = PlayerState::Ko;
        p.position = Position::OFF_PITCH;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dice::FixedDice;
    use crate::engine::player::PlayerStats;

    fn setup(armour: i8) -> MatchState {
        let mut state = MatchState::new();
        let p = state.player_mut(1);
        p.state = PlayerState::Standing;
        p.position = Position::new(10, 7);
        p.stats = PlayerStats::new(6, 3, 3, armour);
        state
    }

    #[test]
    fn test_armour_holds() {
        let mut state = setup(9);
        let mut dice = FixedDice::new(vec![4, 4]); // 2d6 = 8 vs AV 9
        let broken = resolve_armour_and_injury(
            &mut state,
            1,
            &mut dice,
            &InjuryContext::default(),
            None,
        );
        assert!(!broken);
        assert_eq!(state.player(1).state, PlayerState::Standing);
    }

    #[test]
    fn test_armour_break_stun() {
        let mut state = setup(8);
        // Armour 5+5=10 breaks, injury 3+3=6 -> stunned.
        let mut dice = FixedDice::new(vec![5, 5, 3, 3]);
        let broken = resolve_armour_and_injury(
            &mut state,
            1,
            &mut dice,
            &InjuryContext::default(),
            None,
        );
        assert!(broken);
        assert_eq!(state.player(1).state, PlayerState::Stunned);
        assert!(state.player(1).position.is_on_pitch());
    }

    #[test]
    fn test_injury_ko_removes_from_pitch() {
        let mut state = setup(7);
        // Armour 9 breaks, injury 4+4=8 -> KO.
        let mut dice = FixedDice::new(vec![4, 5, 4, 4]);
        resolve_armour_and_injury(&mut state, 1, &mut dice, &InjuryContext::default(), None);
        assert_eq!(state.player(1).state, PlayerState::Ko);
        assert!(!state.player(1).position.is_on_pitch());
    }

    #[test]
    fn test_thick_skull_downgrades_ko() {
        let mut state = setup(7);
        state.player_mut(1).skills.add(Skill::ThickSkull);
        // Armour 9 breaks, injury 8, thick skull 5 -> stunned instead.
        let mut dice = FixedDice::new(vec![4, 5, 4, 4, 5]);
        resolve_armour_and_injury(&mut state, 1, &mut dice, &InjuryContext::default(), None);
        assert_eq!(state.player(1).state, PlayerState::Stunned);
    }

    #[test]
    fn test_regeneration_saves_casualty() {
        let mut state = setup(7);
        state.player_mut(1).skills.add(Skill::Regeneration);
        // Armour 9 breaks, injury 6+5=11 casualty, regen 4 saves.
        let mut dice = FixedDice::new(vec![4, 5, 6, 5, 4]);
        resolve_armour_and_injury(&mut state, 1, &mut dice, &InjuryContext::default(), None);
        assert_eq!(state.player(1).state, PlayerState::Stunned);
    }

    #[test]
    fn test_stakes_blocks_regeneration() {
        let mut state = setup(7);
        state.player_mut(1).skills.add(Skill::Regeneration);
        let ctx = InjuryContext {
            has_stakes: true,
            ..InjuryContext::default()
        };
        // Armour 9 breaks, injury 11 casualty; no regen roll consumed.
        let mut dice = FixedDice::new(vec![4, 5, 6, 5]);
        resolve_armour_and_injury(&mut state, 1, &mut dice, &ctx, None);
        assert_eq!(state.player(1).state, PlayerState::Injured);
        assert_eq!(dice.remaining(), 0);
    }

    #[test]
    fn test_claw_breaks_on_eight() {
        let mut state = setup(10);
        let ctx = InjuryContext {
            has_claw: true,
            ..InjuryContext::default()
        };
        // 4+4=8 would hold AV10, but claw breaks on 8+; injury 6 stuns.
        let mut dice = FixedDice::new(vec![4, 4, 3, 3]);
        let broken = resolve_armour_and_injury(&mut state, 1, &mut dice, &ctx, None);
        assert!(broken);
    }

    #[test]
    fn test_decay_takes_worse_injury() {
        let mut state = setup(7);
        let ctx = InjuryContext {
            has_decay: true,
            ..InjuryContext::default()
        };
        // Armour 9 breaks; first injury 6 (stun), second 10 (casualty).
        let mut dice = FixedDice::new(vec![4, 5, 3, 3, 5, 5]);
        resolve_armour_and_injury(&mut state, 1, &mut dice, &ctx, None);
        assert_eq!(state.player(1).state, PlayerState::Injured);
    }

    #[test]
    fn test_crowd_surf_minimum_ko() {
        let mut state = setup(8);
        // Injury 2+2 +1 = 5: stunned, then demoted to KO off pitch.
        let mut dice = FixedDice::new(vec![2, 2]);
        resolve_crowd_surf(&mut state, 1, &mut dice, None);
        assert_eq!(state.player(1).state, PlayerState::Ko);
        assert!(!state.player(1).position.is_on_pitch());
    }
}
