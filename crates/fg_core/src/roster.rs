//! Team rosters: positional templates, reroll cost and apothecary
//! access for the 26 playable teams. Read-only data; team placement
//! lives in the simulator.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::engine::player::{PlayerStats, Skill, SkillSet};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerTemplate {
    pub stats: PlayerStats,
    pub skills: SkillSet,
    /// Maximum number of this positional on a roster.
    pub quantity: i8,
}

impl PlayerTemplate {
    fn new(stats: (i8, i8, i8, i8), skills: &[Skill], quantity: i8) -> Self {
        PlayerTemplate {
            stats: PlayerStats::new(stats.0, stats.1, stats.2, stats.3),
            skills: SkillSet::from_slice(skills),
            quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamRoster {
    pub name: &'static str,
    /// Linemen first; specialists follow.
    pub positionals: Vec<PlayerTemplate>,
    /// Reroll price in thousands.
    pub reroll_cost: i32,
    pub has_apothecary: bool,
}

impl TeamRoster {
    fn new(
        name: &'static str,
        positionals: Vec<PlayerTemplate>,
        reroll_cost: i32,
        has_apothecary: bool,
    ) -> Self {
        TeamRoster {
            name,
            positionals,
            reroll_cost,
            has_apothecary,
        }
    }
}

use crate::engine::player::Skill::*;

pub static HUMAN: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Human",
        vec![
            PlayerTemplate::new((6, 3, 3, 8), &[], 16),
            PlayerTemplate::new((8, 2, 3, 7), &[Catch, Dodge], 4),
            PlayerTemplate::new((6, 3, 3, 8), &[SureHands, Pass], 2),
            PlayerTemplate::new((7, 3, 3, 8), &[Block], 4),
            PlayerTemplate::new(
                (5, 5, 2, 9),
                &[Loner, BoneHead, MightyBlow, ThickSkull, ThrowTeamMate],
                1,
            ),
        ],
        50,
        true,
    )
});

pub static ORC: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Orc",
        vec![
            PlayerTemplate::new((5, 3, 3, 9), &[], 16),
            PlayerTemplate::new((6, 2, 3, 7), &[Dodge, RightStuff, Stunty], 4),
            PlayerTemplate::new((5, 3, 3, 8), &[SureHands, Pass], 2),
            PlayerTemplate::new((4, 4, 2, 9), &[], 4),
            PlayerTemplate::new((6, 3, 3, 9), &[Block], 4),
            PlayerTemplate::new(
                (4, 5, 1, 9),
                &[
                    Loner,
                    AlwaysHungry,
                    MightyBlow,
                    ReallyStupid,
                    Regeneration,
                    ThrowTeamMate,
                ],
                1,
            ),
        ],
        60,
        true,
    )
});

pub static SKAVEN: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Skaven",
        vec![
            PlayerTemplate::new((7, 3, 3, 7), &[], 16),
            PlayerTemplate::new((7, 3, 3, 7), &[SureHands, Pass], 2),
            PlayerTemplate::new((9, 2, 4, 7), &[Dodge], 4),
            PlayerTemplate::new((7, 3, 3, 8), &[Block], 2),
            PlayerTemplate::new(
                (6, 5, 2, 8),
                &[Loner, Frenzy, MightyBlow, WildAnimal, PrehensileTail],
                1,
            ),
        ],
        60,
        true,
    )
});

pub static DWARF: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Dwarf",
        vec![
            PlayerTemplate::new((4, 3, 2, 9), &[Block, Tackle, ThickSkull], 16),
            PlayerTemplate::new((6, 3, 3, 8), &[SureHands, ThickSkull], 2),
            PlayerTemplate::new((5, 3, 3, 9), &[Block, ThickSkull], 2),
            PlayerTemplate::new((5, 3, 2, 8), &[Block, Frenzy, ThickSkull, Dauntless], 2),
            PlayerTemplate::new(
                (4, 7, 1, 10),
                &[
                    Loner,
                    BreakTackle,
                    DirtyPlayer,
                    Juggernaut,
                    MightyBlow,
                    NoHands,
                    SecretWeapon,
                    StandFirm,
                ],
                1,
            ),
        ],
        40,
        true,
    )
});

pub static WOOD_ELF: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Wood Elf",
        vec![
            PlayerTemplate::new((7, 3, 4, 7), &[], 16),
            PlayerTemplate::new((8, 2, 4, 7), &[Catch, Dodge, Sprint], 4),
            PlayerTemplate::new((7, 3, 4, 7), &[Pass], 2),
            PlayerTemplate::new((8, 3, 4, 7), &[Block, Dodge, Leap], 2),
            PlayerTemplate::new(
                (2, 6, 1, 10),
                &[Loner, TakeRoot, StandFirm, MightyBlow, ThickSkull],
                1,
            ),
        ],
        50,
        true,
    )
});

pub static CHAOS: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Chaos",
        vec![
            PlayerTemplate::new((6, 3, 3, 8), &[Horns], 16),
            PlayerTemplate::new((5, 4, 3, 9), &[], 4),
            PlayerTemplate::new(
                (5, 5, 2, 8),
                &[Loner, Horns, Frenzy, WildAnimal, MightyBlow],
                1,
            ),
        ],
        70,
        true,
    )
});

pub static UNDEAD: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Undead",
        vec![
            PlayerTemplate::new((5, 3, 2, 7), &[Regeneration, ThickSkull], 16),
            PlayerTemplate::new((4, 3, 2, 8), &[Regeneration], 16),
            PlayerTemplate::new((7, 3, 3, 7), &[Dodge], 4),
            PlayerTemplate::new((6, 3, 3, 8), &[Block, Regeneration], 2),
            PlayerTemplate::new((3, 5, 1, 9), &[MightyBlow, Regeneration], 2),
        ],
        70,
        false,
    )
});

pub static LIZARDMEN: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Lizardmen",
        vec![
            PlayerTemplate::new((8, 2, 3, 7), &[Dodge, Stunty], 16),
            PlayerTemplate::new((6, 4, 1, 9), &[], 6),
            PlayerTemplate::new(
                (6, 5, 1, 9),
                &[Loner, BoneHead, MightyBlow, PrehensileTail, ThickSkull],
                1,
            ),
        ],
        60,
        true,
    )
});

pub static DARK_ELF: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Dark Elf",
        vec![
            PlayerTemplate::new((6, 3, 4, 8), &[], 16),
            PlayerTemplate::new((7, 3, 4, 7), &[DumpOff], 2),
            PlayerTemplate::new((6, 3, 4, 7), &[Stab, Shadowing], 2),
            PlayerTemplate::new((7, 3, 4, 8), &[Block], 4),
            PlayerTemplate::new((7, 3, 4, 7), &[Dodge, Frenzy, JumpUp], 2),
        ],
        50,
        true,
    )
});

pub static HALFLING: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Halfling",
        vec![
            PlayerTemplate::new((5, 2, 3, 6), &[Dodge, RightStuff, Stunty], 16),
            PlayerTemplate::new(
                (2, 6, 1, 10),
                &[
                    Loner,
                    TakeRoot,
                    StandFirm,
                    MightyBlow,
                    ThickSkull,
                    ThrowTeamMate,
                ],
                2,
            ),
        ],
        60,
        true,
    )
});

pub static NORSE: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Norse",
        vec![
            PlayerTemplate::new((6, 3, 3, 7), &[Block], 16),
            PlayerTemplate::new((6, 3, 3, 7), &[Block, Pass], 2),
            PlayerTemplate::new((7, 3, 3, 7), &[Block, Dauntless], 2),
            PlayerTemplate::new((6, 3, 3, 7), &[Block, Frenzy, JumpUp], 2),
            PlayerTemplate::new((6, 4, 2, 8), &[Frenzy], 2),
            PlayerTemplate::new(
                (5, 5, 1, 8),
                &[Loner, WildAnimal, Frenzy, DisturbingPresence, Claw],
                1,
            ),
        ],
        60,
        true,
    )
});

pub static HIGH_ELF: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "High Elf",
        vec![
            PlayerTemplate::new((6, 3, 4, 8), &[], 16),
            PlayerTemplate::new((8, 3, 4, 7), &[Catch], 4),
            PlayerTemplate::new((6, 3, 4, 8), &[Pass, SureHands], 2),
            PlayerTemplate::new((7, 3, 4, 8), &[Block], 4),
        ],
        50,
        true,
    )
});

pub static VAMPIRE: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Vampire",
        vec![
            PlayerTemplate::new((6, 3, 3, 7), &[], 16),
            PlayerTemplate::new((6, 4, 4, 8), &[HypnoticGaze, Regeneration, Bloodlust], 4),
        ],
        70,
        true,
    )
});

pub static AMAZON: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Amazon",
        vec![
            PlayerTemplate::new((6, 3, 3, 7), &[Dodge], 16),
            PlayerTemplate::new((6, 3, 3, 7), &[Dodge, Catch], 2),
            PlayerTemplate::new((6, 3, 3, 7), &[Dodge, Pass], 2),
            PlayerTemplate::new((6, 3, 3, 7), &[Dodge, Block], 4),
        ],
        50,
        true,
    )
});

pub static NECROMANTIC: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Necromantic",
        vec![
            PlayerTemplate::new((4, 3, 2, 8), &[Regeneration], 16),
            PlayerTemplate::new((7, 3, 3, 7), &[Dodge], 2),
            PlayerTemplate::new((6, 3, 3, 8), &[Block, Regeneration], 2),
            PlayerTemplate::new((4, 4, 2, 9), &[StandFirm, Regeneration, Decay], 2),
            PlayerTemplate::new((8, 3, 3, 8), &[Claw, Frenzy, Regeneration], 2),
        ],
        70,
        false,
    )
});

pub static BRETONNIAN: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Bretonnian",
        vec![
            PlayerTemplate::new((6, 3, 3, 7), &[], 16),
            PlayerTemplate::new((6, 3, 3, 8), &[Wrestle], 4),
            PlayerTemplate::new((7, 3, 3, 8), &[Block, Fend, Catch], 4),
        ],
        60,
        true,
    )
});

pub static KHEMRI: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Khemri",
        vec![
            PlayerTemplate::new((5, 3, 2, 7), &[Regeneration, ThickSkull], 16),
            PlayerTemplate::new((6, 3, 2, 7), &[Pass, Regeneration, SureHands], 2),
            PlayerTemplate::new((6, 3, 2, 8), &[Block, Regeneration], 2),
            PlayerTemplate::new((3, 5, 1, 9), &[Decay, Regeneration], 4),
        ],
        70,
        false,
    )
});

pub static GOBLIN: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Goblin",
        vec![
            PlayerTemplate::new((6, 2, 3, 7), &[Dodge, RightStuff, Stunty], 16),
            PlayerTemplate::new((6, 2, 3, 7), &[Bombardier, Dodge, SecretWeapon, Stunty], 1),
            PlayerTemplate::new((6, 2, 3, 7), &[Chainsaw, SecretWeapon, Stunty], 1),
            PlayerTemplate::new(
                (3, 7, 3, 7),
                &[BallAndChain, NoHands, SecretWeapon, Stunty],
                1,
            ),
            PlayerTemplate::new((7, 2, 3, 7), &[Dodge, Leap, VeryLongLegs, Stunty], 1),
            PlayerTemplate::new(
                (4, 5, 1, 9),
                &[
                    Loner,
                    AlwaysHungry,
                    MightyBlow,
                    ReallyStupid,
                    Regeneration,
                    ThrowTeamMate,
                ],
                2,
            ),
        ],
        60,
        true,
    )
});

pub static CHAOS_DWARF: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Chaos Dwarf",
        vec![
            PlayerTemplate::new((6, 3, 3, 7), &[], 16),
            PlayerTemplate::new((4, 3, 2, 9), &[Block, Tackle, ThickSkull], 6),
            PlayerTemplate::new((6, 4, 2, 9), &[Sprint, SureFeet, ThickSkull], 2),
            PlayerTemplate::new(
                (5, 5, 2, 8),
                &[Loner, Horns, Frenzy, WildAnimal, MightyBlow],
                1,
            ),
        ],
        70,
        true,
    )
});

pub static OGRE: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Ogre",
        vec![
            PlayerTemplate::new((5, 1, 3, 5), &[Dodge, RightStuff, Stunty, Titchy], 16),
            PlayerTemplate::new(
                (5, 5, 2, 9),
                &[Loner, BoneHead, MightyBlow, ThickSkull, ThrowTeamMate],
                6,
            ),
        ],
        70,
        true,
    )
});

pub static NURGLE: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Nurgle",
        vec![
            PlayerTemplate::new((5, 3, 3, 8), &[Decay, NurglesRot], 16),
            PlayerTemplate::new((6, 3, 3, 8), &[Horns, Regeneration, NurglesRot], 4),
            PlayerTemplate::new(
                (4, 4, 2, 9),
                &[FoulAppearance, Regeneration, DisturbingPresence],
                4,
            ),
            PlayerTemplate::new(
                (4, 5, 1, 9),
                &[
                    Loner,
                    FoulAppearance,
                    MightyBlow,
                    NurglesRot,
                    Regeneration,
                    Tentacles,
                    DisturbingPresence,
                ],
                1,
            ),
        ],
        70,
        false,
    )
});

pub static PRO_ELF: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Pro Elf",
        vec![
            PlayerTemplate::new((6, 3, 4, 7), &[], 16),
            PlayerTemplate::new((8, 3, 4, 7), &[NervesOfSteel, Catch], 4),
            PlayerTemplate::new((6, 3, 4, 7), &[Pass], 2),
            PlayerTemplate::new((7, 3, 4, 8), &[Block, SideStep], 2),
        ],
        50,
        true,
    )
});

pub static SLANN: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Slann",
        vec![
            PlayerTemplate::new((6, 3, 3, 8), &[Leap, VeryLongLegs], 16),
            PlayerTemplate::new((7, 3, 4, 7), &[Leap, VeryLongLegs, DivingCatch], 4),
            PlayerTemplate::new((7, 3, 3, 8), &[Leap, VeryLongLegs, JumpUp], 4),
            PlayerTemplate::new(
                (6, 5, 1, 9),
                &[Loner, BoneHead, MightyBlow, PrehensileTail, ThickSkull],
                1,
            ),
        ],
        50,
        true,
    )
});

pub static UNDERWORLD: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Underworld",
        vec![
            PlayerTemplate::new((6, 2, 3, 7), &[Animosity, Dodge, RightStuff, Stunty], 12),
            PlayerTemplate::new((7, 3, 3, 7), &[Animosity], 12),
            PlayerTemplate::new((7, 3, 3, 7), &[Animosity, Pass, SureHands], 2),
            PlayerTemplate::new((7, 3, 3, 8), &[Animosity, Block], 2),
            PlayerTemplate::new(
                (4, 5, 1, 9),
                &[
                    Loner,
                    AlwaysHungry,
                    MightyBlow,
                    ReallyStupid,
                    Regeneration,
                    ThrowTeamMate,
                ],
                1,
            ),
            PlayerTemplate::new(
                (4, 5, 1, 9),
                &[
                    Loner,
                    AlwaysHungry,
                    MightyBlow,
                    ReallyStupid,
                    Regeneration,
                    ThrowTeamMate,
                    Tentacles,
                ],
                1,
            ),
        ],
        70,
        true,
    )
});

pub static KHORNE: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Khorne",
        vec![
            PlayerTemplate::new((6, 3, 3, 8), &[Frenzy], 16),
            PlayerTemplate::new((6, 3, 3, 8), &[Horns, Regeneration, Juggernaut], 4),
            PlayerTemplate::new((6, 3, 3, 8), &[Frenzy, Juggernaut, Horns], 2),
            PlayerTemplate::new(
                (6, 5, 1, 9),
                &[
                    Loner,
                    Frenzy,
                    Horns,
                    MightyBlow,
                    ThickSkull,
                    WildAnimal,
                    Regeneration,
                    Claw,
                ],
                1,
            ),
        ],
        70,
        true,
    )
});

pub static CHAOS_PACT: Lazy<TeamRoster> = Lazy::new(|| {
    TeamRoster::new(
        "Chaos Pact",
        vec![
            PlayerTemplate::new((6, 3, 3, 8), &[], 12),
            PlayerTemplate::new((6, 3, 4, 8), &[Animosity], 1),
            PlayerTemplate::new((6, 2, 3, 7), &[Animosity, Stunty, RightStuff], 1),
            PlayerTemplate::new((7, 3, 3, 7), &[Animosity], 1),
            PlayerTemplate::new(
                (4, 5, 1, 9),
                &[
                    Loner,
                    Animosity,
                    AlwaysHungry,
                    MightyBlow,
                    ReallyStupid,
                    Regeneration,
                    ThrowTeamMate,
                ],
                1,
            ),
            PlayerTemplate::new(
                (5, 5, 2, 9),
                &[
                    Loner,
                    Animosity,
                    BoneHead,
                    MightyBlow,
                    ThickSkull,
                    ThrowTeamMate,
                ],
                1,
            ),
            PlayerTemplate::new(
                (5, 5, 2, 8),
                &[Loner, Animosity, Horns, Frenzy, WildAnimal, MightyBlow],
                1,
            ),
        ],
        70,
        true,
    )
});

static ALL_ROSTERS: Lazy<Vec<&'static Lazy<TeamRoster>>> = Lazy::new(|| {
    vec![
        &HUMAN,
        &ORC,
        &SKAVEN,
        &DWARF,
        &WOOD_ELF,
        &CHAOS,
        &UNDEAD,
        &LIZARDMEN,
        &DARK_ELF,
        &HALFLING,
        &NORSE,
        &HIGH_ELF,
        &VAMPIRE,
        &AMAZON,
        &NECROMANTIC,
        &BRETONNIAN,
        &KHEMRI,
        &GOBLIN,
        &CHAOS_DWARF,
        &OGRE,
        &NURGLE,
        &PRO_ELF,
        &SLANN,
        &UNDERWORLD,
        &KHORNE,
        &CHAOS_PACT,
    ]
});

pub fn roster_names() -> Vec<&'static str> {
    ALL_ROSTERS.iter().map(|r| r.name).collect()
}

/// As `roster_by_name`, but an unknown name is an error.
pub fn require_roster(name: &str) -> crate::error::Result<&'static TeamRoster> {
    roster_by_name(name).ok_or_else(|| crate::error::EngineError::UnknownRoster(name.to_string()))
}

/// Lookup by name, ignoring case, spaces, dashes and underscores.
pub fn roster_by_name(name: &str) -> Option<&'static TeamRoster> {
    let normalized: String = name
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(|c| c.to_lowercase())
        .collect();

    ALL_ROSTERS
        .iter()
        .find(|r| {
            let rn: String = r
                .name
                .chars()
                .filter(|c| !matches!(c, ' ' | '_' | '-'))
                .flat_map(|c| c.to_lowercase())
                .collect();
            rn == normalized
        })
        .map(|r| &***r)
}
