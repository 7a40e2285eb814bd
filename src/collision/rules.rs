//! Type-compatibility table for the broad phase
//!
//! Each entity type lists the types it may collide with. Lookups are
//! symmetric: a pair qualifies if either side lists the other, so each
//! relationship only needs to be written once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::entity::EntityType;

/// Static mapping from entity type to the set of types it collides with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<EntityType, Vec<EntityType>>",
    into = "BTreeMap<EntityType, Vec<EntityType>>"
)]
pub struct CollisionRules {
    /// Bit `t` of `masks[s]` set means `s` lists `t`
    masks: [u8; EntityType::COUNT],
}

impl CollisionRules {
    /// A table that allows nothing
    pub fn empty() -> Self {
        Self {
            masks: [0; EntityType::COUNT],
        }
    }

    /// Allow `from` to collide with `to`
    pub fn allow(mut self, from: EntityType, to: EntityType) -> Self {
        self.masks[from.index()] |= 1 << to.index();
        self
    }

    /// Whether the pair may interact, in either direction
    #[inline]
    pub fn can_collide(&self, a: EntityType, b: EntityType) -> bool {
        (self.masks[a.index()] & (1 << b.index())) != 0
            || (self.masks[b.index()] & (1 << a.index())) != 0
    }

    /// Types directly listed for `from` (one direction only)
    pub fn targets_of(&self, from: EntityType) -> Vec<EntityType> {
        EntityType::ALL
            .iter()
            .copied()
            .filter(|t| (self.masks[from.index()] & (1 << t.index())) != 0)
            .collect()
    }
}

impl Default for CollisionRules {
    fn default() -> Self {
        Self::empty()
            .allow(EntityType::Player, EntityType::Enemy)
            .allow(EntityType::Player, EntityType::EnemyProjectile)
            .allow(EntityType::Player, EntityType::XpOrb)
            .allow(EntityType::Projectile, EntityType::Enemy)
    }
}

impl From<BTreeMap<EntityType, Vec<EntityType>>> for CollisionRules {
    fn from(table: BTreeMap<EntityType, Vec<EntityType>>) -> Self {
        let mut rules = Self::empty();
        for (from, targets) in table {
            for to in targets {
                rules = rules.allow(from, to);
            }
        }
        rules
    }
}

impl From<CollisionRules> for BTreeMap<EntityType, Vec<EntityType>> {
    fn from(rules: CollisionRules) -> Self {
        EntityType::ALL
            .iter()
            .map(|&t| (t, rules.targets_of(t)))
            .filter(|(_, targets)| !targets.is_empty())
            .collect()
    }
}
