//! ASCII dungeon layouts.
//!
//! One character per cell, one line per row. Blank lines and trailing
//! whitespace are ignored.
//!
//! | glyph | meaning |
//! |-------|---------|
//! | `#` | wall |
//! | `.` | floor |
//! | `+` | closed door |
//! | `"` | foliage |
//! | `>` | stairs |
//! | `!` | item |
//! | `@` | player start |
//! | `g h O b D` | goblin, hound, ogre, giant bee, earth dragon |

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use crate::error::LayoutError;
use crate::state::Map;
use crate::types::{Feature, MonsterKind, Pos, Terrain};

#[derive(Clone, Debug)]
pub struct Layout {
    pub map: Map,
    pub player: Pos,
    pub doors: BTreeSet<Pos>,
    pub foliage: BTreeSet<Pos>,
    pub features: BTreeMap<Pos, Feature>,
    /// Monsters in row-major order of their glyphs.
    pub monsters: Vec<(MonsterKind, Pos)>,
}

impl Layout {
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let rows: Vec<&str> = text.lines().map(str::trim_end).filter(|l| !l.is_empty()).collect();
        let Some(first) = rows.first() else {
            return Err(LayoutError::Empty);
        };
        let width = first.chars().count();
        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(LayoutError::Ragged { row, expected: width, found });
            }
        }

        let mut map = Map::open(width, rows.len());
        let mut player = None;
        let mut doors = BTreeSet::new();
        let mut foliage = BTreeSet::new();
        let mut features = BTreeMap::new();
        let mut monsters = Vec::new();
        for (y, line) in rows.iter().enumerate() {
            for (x, glyph) in line.chars().enumerate() {
                let pos = Pos { y: y as i32, x: x as i32 };
                match glyph {
                    '#' => map.set_terrain(pos, Terrain::Wall),
                    '.' => {}
                    '+' => {
                        doors.insert(pos);
                    }
                    '"' => {
                        foliage.insert(pos);
                    }
                    '>' => {
                        features.insert(pos, Feature::Stairs);
                    }
                    '!' => {
                        features.insert(pos, Feature::Item);
                    }
                    '@' => {
                        if player.replace(pos).is_some() {
                            return Err(LayoutError::DuplicatePlayer);
                        }
                    }
                    other => match MonsterKind::from_glyph(other) {
                        Some(kind) => monsters.push((kind, pos)),
                        None => return Err(LayoutError::UnknownGlyph { glyph: other, pos }),
                    },
                }
            }
        }
        let player = player.ok_or(LayoutError::MissingPlayer)?;
        Ok(Self { map, player, doors, foliage, features, monsters })
    }
}

impl FromStr for Layout {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
