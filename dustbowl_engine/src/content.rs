//! Read-only content tables used while a run is in progress.
//!
//! The mutable part of the content (the story graph, whose pickups are consumed) is split off
//! into a [`StoryGraph`] when the tables are built.
use std::collections::HashMap;

use dustbowl_data::{ClassDef, ClassEdgeDef, ContentDef, EnemyDef, GameDef, LoadoutDef, WeaponDef};

use crate::enemy::Enemy;
use crate::error::{EngineError, EngineResult};
use crate::navigator::StoryGraph;

#[derive(Debug, Clone)]
pub struct Content {
    pub game: GameDef,
    /// Kept in file order for the class menu.
    pub classes: Vec<ClassDef>,
    pub weapons: HashMap<String, WeaponDef>,
    pub enemies: HashMap<String, EnemyDef>,
    pub loadouts: HashMap<String, LoadoutDef>,
    pub class_edges: Vec<ClassEdgeDef>,
}

impl Content {
    /// Split a content definition into lookup tables and the story graph.
    pub fn build(def: ContentDef) -> (Content, StoryGraph) {
        let graph = StoryGraph::from_defs(def.locations, &def.game.start, &def.game.game_over);
        let content = Content {
            weapons: def.weapons.into_iter().map(|w| (w.key.clone(), w)).collect(),
            enemies: def.enemies.into_iter().map(|e| (e.key.clone(), e)).collect(),
            loadouts: def.loadouts.into_iter().map(|l| (l.class.clone(), l)).collect(),
            classes: def.classes,
            class_edges: def.class_edges,
            game: def.game,
        };
        (content, graph)
    }

    /// # Errors
    /// `UnknownContent` if no weapon has this key.
    pub fn weapon(&self, key: &str) -> EngineResult<&WeaponDef> {
        self.weapons.get(key).ok_or_else(|| unknown("weapon", key))
    }

    /// # Errors
    /// `UnknownContent` if the class has no loadout.
    pub fn loadout(&self, class_key: &str) -> EngineResult<&LoadoutDef> {
        self.loadouts
            .get(class_key)
            .ok_or_else(|| unknown("loadout", class_key))
    }

    /// Instantiate a fresh enemy at full health.
    ///
    /// # Errors
    /// `UnknownContent` if no enemy has this key.
    pub fn spawn_enemy(&self, key: &str) -> EngineResult<Enemy> {
        self.enemies
            .get(key)
            .map(Enemy::from_def)
            .ok_or_else(|| unknown("enemy", key))
    }
}

fn unknown(kind: &'static str, key: &str) -> EngineError {
    EngineError::UnknownContent {
        kind,
        key: key.to_string(),
    }
}
