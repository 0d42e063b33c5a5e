use crate::types::MonsterKind;

pub const WALL_NOISE: i32 = 18;
pub const TEMPORARY_WALL_NOISE: i32 = 13;
pub const BARK_NOISE: i32 = 13;
pub const HIT_NOISE: i32 = 11;

pub struct MonsterStats {
    pub max_hp: i32,
    pub attack: i32,
    pub movement_delay: i32,
    pub attack_delay: i32,
}

pub fn monster_stats(kind: MonsterKind) -> MonsterStats {
    match kind {
        MonsterKind::Goblin => {
            MonsterStats { max_hp: 15, attack: 7, movement_delay: 10, attack_delay: 10 }
        }
        MonsterKind::Hound => {
            MonsterStats { max_hp: 15, attack: 9, movement_delay: 8, attack_delay: 10 }
        }
        MonsterKind::Ogre => {
            MonsterStats { max_hp: 28, attack: 15, movement_delay: 10, attack_delay: 12 }
        }
        MonsterKind::GiantBee => {
            MonsterStats { max_hp: 11, attack: 10, movement_delay: 6, attack_delay: 10 }
        }
        MonsterKind::EarthDragon => {
            MonsterStats { max_hp: 40, attack: 14, movement_delay: 10, attack_delay: 10 }
        }
    }
}

impl MonsterKind {
    /// Diggers path through walls and turn them into floor as they go.
    pub fn digs(self) -> bool {
        self == MonsterKind::EarthDragon
    }

    pub fn barks(self) -> bool {
        self == MonsterKind::Hound
    }

    pub fn forms_bands(self) -> bool {
        matches!(self, MonsterKind::Goblin | MonsterKind::Hound)
    }

    pub fn glyph(self) -> char {
        match self {
            MonsterKind::Goblin => 'g',
            MonsterKind::Hound => 'h',
            MonsterKind::Ogre => 'O',
            MonsterKind::GiantBee => 'b',
            MonsterKind::EarthDragon => 'D',
        }
    }

    pub fn from_glyph(glyph: char) -> Option<MonsterKind> {
        match glyph {
            'g' => Some(MonsterKind::Goblin),
            'h' => Some(MonsterKind::Hound),
            'O' => Some(MonsterKind::Ogre),
            'b' => Some(MonsterKind::GiantBee),
            'D' => Some(MonsterKind::EarthDragon),
            _ => None,
        }
    }
}
