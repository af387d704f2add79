//! Player entity: base stats, skill bitset, per-turn flags and the
//! on/off-pitch state machine.

use serde::{Deserialize, Serialize};

use super::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamSide {
    Home,
    Away,
}

impl TeamSide {
    pub fn opponent(self) -> TeamSide {
        match self {
            TeamSide::Home => TeamSide::Away,
            TeamSide::Away => TeamSide::Home,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    Standing,
    Prone,
    Stunned,
    Ko,
    Injured,
    Dead,
    Ejected,
    OffPitch,
}

impl PlayerState {
    pub fn is_on_pitch(self) -> bool {
        matches!(
            self,
            PlayerState::Standing | PlayerState::Prone | PlayerState::Stunned
        )
    }

    pub fn can_act(self) -> bool {
        self == PlayerState::Standing
    }

    pub fn exerts_tacklezone(self) -> bool {
        self == PlayerState::Standing
    }
}

/// The closed skill roster. Discriminant values index the `SkillSet`
/// bitset and are stable: trained feature weights depend on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Skill {
    Block = 0,
    Catch,
    Dodge,
    Frenzy,
    Guard,
    MightyBlow,
    Pass,
    SideStep,
    StandFirm,
    StripBall,
    SureHands, // 10
    Tackle,
    SureFeet,
    NervesOfSteel,
    Pro,
    Regeneration,
    ThickSkull,
    Horns,
    Dauntless,
    BigHand,
    Loner, // 20
    BoneHead,
    ReallyStupid,
    WildAnimal,
    ThrowTeamMate,
    RightStuff,
    Stunty,
    PrehensileTail,
    TakeRoot,
    JumpUp,
    Sprint, // 30
    BreakTackle,
    DirtyPlayer,
    Juggernaut,
    NoHands,
    SecretWeapon,
    Wrestle,
    Claw,
    Grab,
    Tentacles,
    DisturbingPresence, // 40
    DivingTackle,
    Leap,
    Accurate,
    StrongArm,
    SafeThrow,
    TwoHeads,
    ExtraArms,
    SneakyGit,
    Fend,
    PilingOn, // 50
    Kick,
    KickOffReturn,
    Leader,
    HailMaryPass,
    DumpOff,
    DivingCatch,
    Shadowing,
    Stab,
    Bombardier,
    Bloodlust, // 60
    HypnoticGaze,
    BallAndChain,
    Decay,
    Chainsaw,
    FoulAppearance,
    AlwaysHungry,
    VeryLongLegs,
    Animosity,
    PassBlock,
    NurglesRot, // 70
    Titchy,
    Stakes,
    MultipleBlock, // 73
}

pub const SKILL_COUNT: usize = 74;

/// Fixed-size skill bitset. Plain data so the match state stays trivially
/// cloneable in the search hot loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSet {
    bits: u128,
}

impl SkillSet {
    pub const fn empty() -> Self {
        SkillSet { bits: 0 }
    }

    pub fn from_slice(skills: &[Skill]) -> Self {
        let mut set = SkillSet::empty();
        for &s in skills {
            set.add(s);
        }
        set
    }

    pub fn has(&self, skill: Skill) -> bool {
        self.bits & (1u128 << (skill as u8)) != 0
    }

    pub fn add(&mut self, skill: Skill) {
        self.bits |= 1u128 << (skill as u8);
    }

    pub fn remove(&mut self, skill: Skill) {
        self.bits &= !(1u128 << (skill as u8));
    }

    pub fn count(&self) -> u32 {
        self.bits.count_ones()
    }

    pub fn clear(&mut self) {
        self.bits = 0;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub movement: i8,
    pub strength: i8,
    pub agility: i8,
    pub armour: i8,
}

impl PlayerStats {
    pub const fn new(movement: i8, strength: i8, agility: i8, armour: i8) -> Self {
        PlayerStats {
            movement,
            strength,
            agility,
            armour,
        }
    }
}

/// One of the 22 figures in a match. Figures are never created or
/// destroyed mid-match; only their state changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Player {
    /// 1-11 home, 12-22 away.
    pub id: i32,
    pub side: TeamSide,
    pub state: PlayerState,
    pub position: Position,
    pub stats: PlayerStats,
    pub skills: SkillSet,
    /// May go negative while spending go-for-it squares.
    pub movement_remaining: i8,
    pub has_moved: bool,
    pub has_acted: bool,
    pub used_blitz: bool,
    pub lost_tacklezones: bool,
    pub pro_used_this_turn: bool,
}

impl Player {
    pub fn new(id: i32, side: TeamSide) -> Self {
        Player {
            id,
            side,
            state: PlayerState::OffPitch,
            position: Position::OFF_PITCH,
            stats: PlayerStats::default(),
            skills: SkillSet::empty(),
            movement_remaining: 0,
            has_moved: false,
            has_acted: false,
            used_blitz: false,
            lost_tacklezones: false,
            pro_used_this_turn: false,
        }
    }

    pub fn has_skill(&self, skill: Skill) -> bool {
        self.skills.has(skill)
    }

    pub fn is_on_pitch(&self) -> bool {
        self.state.is_on_pitch()
    }

    pub fn can_act(&self) -> bool {
        self.state.can_act() && !self.has_acted && !self.lost_tacklezones
    }

    pub fn reset_for_new_turn(&mut self) {
        if self.state == PlayerState::Stunned {
            self.state = PlayerState::Prone;
        }
        self.has_moved = false;
        self.has_acted = false;
        self.used_blitz = false;
        self.lost_tacklezones = false;
        self.pro_used_this_turn = false;
        self.movement_remaining = self.stats.movement;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_set_add_remove() {
        let mut set = SkillSet::empty();
        assert!(!set.has(Skill::Block));
        set.add(Skill::Block);
        set.add(Skill::Dodge);
        assert!(set.has(Skill::Block));
        assert!(set.has(Skill::Dodge));
        assert_eq!(set.count(), 2);
        set.remove(Skill::Block);
        assert!(!set.has(Skill::Block));
        assert_eq!(set.count(), 1);
    }

    #[test]
    fn test_skill_indices_stable() {
        // The bitset layout is a data contract; spot-check anchors.
        assert_eq!(Skill::Block as u8, 0);
        assert_eq!(Skill::SureHands as u8, 10);
        assert_eq!(Skill::Loner as u8, 20);
        assert_eq!(Skill::Sprint as u8, 30);
        assert_eq!(Skill::DisturbingPresence as u8, 40);
        assert_eq!(Skill::PilingOn as u8, 50);
        assert_eq!(Skill::Bloodlust as u8, 60);
        assert_eq!(Skill::NurglesRot as u8, 70);
        assert_eq!(Skill::MultipleBlock as u8, 73);
    }

    #[test]
    fn test_player_state_predicates() {
        assert!(PlayerState::Standing.is_on_pitch());
        assert!(PlayerState::Prone.is_on_pitch());
        assert!(PlayerState::Stunned.is_on_pitch());
        assert!(!PlayerState::Ko.is_on_pitch());
        assert!(!PlayerState::Ejected.is_on_pitch());
        assert!(PlayerState::Standing.exerts_tacklezone());
        assert!(!PlayerState::Prone.exerts_tacklezone());
    }

    #[test]
    fn test_reset_for_new_turn() {
        let mut p = Player::new(3, TeamSide::Home);
        p.stats = PlayerStats::new(6, 3, 3, 8);
        p.state = PlayerState::Stunned;
        p.has_acted = true;
        p.used_blitz = true;
        p.pro_used_this_turn = true;
        p.movement_remaining = -2;

        p.reset_for_new_turn();

        assert_eq!(p.state, PlayerState::Prone, "stunned recovers to prone");
        assert!(!p.has_acted);
        assert!(!p.used_blitz);
        assert!(!p.pro_used_this_turn);
        assert_eq!(p.movement_remaining, 6);
    }
}
