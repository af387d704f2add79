//! The authoritative match state. Plain data throughout: the decision
//! search clones it on every iteration, so there is no heap indirection
//! beyond what a memcpy-style clone can carry.

use serde::{Deserialize, Serialize};

use super::ball::BallState;
use super::player::{Player, PlayerState, TeamSide};
use super::position::Position;
use super::team::TeamState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    CoinToss,
    Setup,
    Kickoff,
    Play,
    Touchdown,
    HalfTime,
    GameOver,
}

impl GamePhase {
    pub fn is_playable(self) -> bool {
        matches!(self, GamePhase::Play | GamePhase::Kickoff)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weather {
    SwelteringHeat,
    VerySunny,
    Nice,
    PouringRain,
    Blizzard,
}

/// Weather table on 2d6: 2-3 heat, 4 very sunny, 5-10 nice, 11 rain,
/// 12 blizzard.
pub fn weather_from_roll(roll: i32) -> Weather {
    if roll <= 3 {
        Weather::SwelteringHeat
    } else if roll == 4 {
        Weather::VerySunny
    } else if roll <= 10 {
        Weather::Nice
    } else if roll == 11 {
        Weather::PouringRain
    } else {
        Weather::Blizzard
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchState {
    pub half: i32,
    pub phase: GamePhase,
    pub active_team: TeamSide,
    pub home_team: TeamState,
    pub away_team: TeamState,
    /// Indices 0-10 hold home ids 1-11, indices 11-21 hold away ids 12-22.
    pub players: [Player; 22],
    pub ball: BallState,
    pub turnover_pending: bool,
    pub kicking_team: TeamSide,
    pub weather: Weather,
}

impl MatchState {
    pub fn new() -> Self {
        let players = std::array::from_fn(|i| {
            if i < 11 {
                Player::new(i as i32 + 1, TeamSide::Home)
            } else {
                Player::new(i as i32 + 1, TeamSide::Away)
            }
        });

        MatchState {
            half: 1,
            phase: GamePhase::CoinToss,
            active_team: TeamSide::Home,
            home_team: TeamState::new(TeamSide::Home),
            away_team: TeamState::new(TeamSide::Away),
            players,
            ball: BallState::off_pitch(),
            turnover_pending: false,
            kicking_team: TeamSide::Away,
            weather: Weather::Nice,
        }
    }

    fn index_of(id: i32) -> usize {
        debug_assert!((1..=22).contains(&id), "player id out of range: {}", id);
        (id - 1) as usize
    }

    pub fn player(&self, id: i32) -> &Player {
        &self.players[Self::index_of(id)]
    }

    pub fn player_mut(&mut self, id: i32) -> &mut Player {
        &mut self.players[Self::index_of(id)]
    }

    /// Id of the on-pitch player occupying a square, if any.
    pub fn player_id_at(&self, pos: Position) -> Option<i32> {
        self.players
            .iter()
            .find(|p| p.is_on_pitch() && p.position == pos)
            .map(|p| p.id)
    }

    pub fn player_at(&self, pos: Position) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.is_on_pitch() && p.position == pos)
    }

    pub fn team(&self, side: TeamSide) -> &TeamState {
        match side {
            TeamSide::Home => &self.home_team,
            TeamSide::Away => &self.away_team,
        }
    }

    pub fn team_mut(&mut self, side: TeamSide) -> &mut TeamState {
        match side {
            TeamSide::Home => &mut self.home_team,
            TeamSide::Away => &mut self.away_team,
        }
    }

    /// Ids of one side's players, in stable (side, slot) order.
    pub fn side_ids(side: TeamSide) -> std::ops::RangeInclusive<i32> {
        match side {
            TeamSide::Home => 1..=11,
            TeamSide::Away => 12..=22,
        }
    }

    pub fn players_of(&self, side: TeamSide) -> impl Iterator<Item = &Player> {
        let range = match side {
            TeamSide::Home => 0..11,
            TeamSide::Away => 11..22,
        };
        self.players[range].iter()
    }

    pub fn on_pitch_of(&self, side: TeamSide) -> impl Iterator<Item = &Player> {
        self.players_of(side).filter(|p| p.is_on_pitch())
    }

    pub fn reset_players_for_new_turn(&mut self, side: TeamSide) {
        for id in Self::side_ids(side) {
            self.player_mut(id).reset_for_new_turn();
        }
    }

    /// Debug guard for the structural invariants every resolution must
    /// preserve. Cheap enough for test sweeps, not called in release paths.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        for (i, p) in self.players.iter().enumerate() {
            let expected_id = i as i32 + 1;
            if p.id != expected_id {
                return Err(format!("player slot {} holds id {}", i, p.id));
            }
            if p.is_on_pitch() != p.position.is_on_pitch() {
                return Err(format!(
                    "player {} state {:?} disagrees with position {:?}",
                    p.id, p.state, p.position
                ));
            }
        }
        for a in 0..22 {
            for b in (a + 1)..22 {
                let (pa, pb) = (&self.players[a], &self.players[b]);
                if pa.is_on_pitch() && pb.is_on_pitch() && pa.position == pb.position {
                    return Err(format!(
                        "players {} and {} share square {:?}",
                        pa.id, pb.id, pa.position
                    ));
                }
            }
        }
        if self.ball.is_held {
            let carrier = self.player(self.ball.carrier_id);
            if carrier.position != self.ball.position {
                return Err("held ball away from its carrier".to_string());
            }
            if carrier.state != PlayerState::Standing {
                return Err(format!(
                    "carrier {} is {:?}, not standing",
                    carrier.id, carrier.state
                ));
            }
        }
        if self.home_team.rerolls < 0 || self.away_team.rerolls < 0 {
            return Err("negative reroll pool".to_string());
        }
        if self.home_team.score < 0 || self.away_team.score < 0 {
            return Err("negative score".to_string());
        }
        if self.home_team.turn_number < 0 || self.away_team.turn_number < 0 {
            return Err("negative turn number".to_string());
        }
        Ok(())
    }
}

impl Default for MatchState {
    fn default() -> Self {
        MatchState::new()
    }
}
