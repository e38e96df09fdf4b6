#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Immutable archetype tables for towers and enemies.
//!
//! Catalogs are parsed from TOML documents and validated eagerly so malformed
//! entries fail at load time instead of surfacing mid-simulation. The shipped
//! tables are embedded in the crate and exposed through [`Catalogs::builtin`].

use crystal_defence_core::{Ability, Cost, EnemyKind, GameError, Skill, TowerKind};
use serde::Deserialize;

const BUILTIN_TOWERS: &str = include_str!("../data/towers.toml");
const BUILTIN_ENEMIES: &str = include_str!("../data/enemies.toml");

/// Errors raised while loading or validating catalog documents.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The document is not valid TOML or does not match the schema.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    /// A tower archetype is missing from the document.
    #[error("tower catalog is missing `{0}`")]
    MissingTower(TowerKind),
    /// A tower archetype is listed more than once.
    #[error("tower catalog lists `{0}` more than once")]
    DuplicateTower(TowerKind),
    /// An enemy archetype is missing from the document.
    #[error("enemy catalog is missing `{0}`")]
    MissingEnemy(EnemyKind),
    /// An enemy archetype is listed more than once.
    #[error("enemy catalog lists `{0}` more than once")]
    DuplicateEnemy(EnemyKind),
    /// A numeric stat is non-finite or out of range.
    #[error("`{archetype}` has invalid {field}: {value}")]
    InvalidStat {
        /// Archetype owning the stat.
        archetype: &'static str,
        /// Name of the offending field.
        field: &'static str,
        /// Offending value.
        value: f64,
    },
    /// Ability parameters are out of range.
    #[error("`{kind}` has an invalid ability: {reason}")]
    InvalidAbility {
        /// Archetype owning the ability.
        kind: TowerKind,
        /// Description of the violated constraint.
        reason: &'static str,
    },
}

impl From<CatalogError> for GameError {
    fn from(error: CatalogError) -> Self {
        GameError::Configuration(error.to_string())
    }
}

/// Base statistics of a tower archetype.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TowerArchetype {
    /// Archetype identifier.
    pub kind: TowerKind,
    /// Damage dealt per projectile at upgrade level one.
    pub damage: f32,
    /// Targeting range in world units.
    pub range: f32,
    /// Seconds between volleys.
    pub fire_rate: f32,
    /// Projectile travel speed in world units per second.
    pub projectile_speed: f32,
    /// Crystal cost of placing the tower.
    pub cost: u32,
    /// Indicates whether the tower is available from the start.
    pub unlocked: bool,
    /// Currencies required to unlock a locked archetype.
    #[serde(default)]
    pub unlock_cost: Cost,
    /// Special abilities applied on hit, in resolution order.
    #[serde(default)]
    pub abilities: Vec<Ability>,
}

/// Base statistics of an enemy archetype.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnemyArchetype {
    /// Archetype identifier.
    pub kind: EnemyKind,
    /// Health at spawn.
    pub health: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Crystals granted on death.
    pub reward: u32,
    /// Collision radius in world units.
    pub size: f32,
    /// Damage dealt to the base on escape.
    pub base_damage: u32,
}

/// Level cap and per-level multiplier of a tower skill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkillDefinition {
    /// Highest level the skill can reach.
    pub max_level: u32,
    /// Multiplier applied to the governed stat per level.
    pub multiplier: f32,
}

/// Returns the progression parameters of a skill.
///
/// The special skill's multiplier applies only to archetypes without an
/// enhanceable ability, which fold it into damage instead.
#[must_use]
pub const fn skill_definition(skill: Skill) -> SkillDefinition {
    match skill {
        Skill::Damage => SkillDefinition {
            max_level: 5,
            multiplier: 1.10,
        },
        Skill::Range => SkillDefinition {
            max_level: 5,
            multiplier: 1.05,
        },
        Skill::FireRate => SkillDefinition {
            max_level: 5,
            multiplier: 0.95,
        },
        Skill::Special => SkillDefinition {
            max_level: 3,
            multiplier: 1.10,
        },
    }
}

/// Validated table of tower archetypes indexed by kind.
#[derive(Clone, Debug)]
pub struct TowerCatalog {
    entries: Vec<TowerArchetype>,
}

impl TowerCatalog {
    /// Parses and validates a tower catalog document.
    pub fn from_toml(source: &str) -> Result<Self, CatalogError> {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Document {
            tower: Vec<TowerArchetype>,
        }

        let document: Document = toml::from_str(source)?;
        let mut slots: Vec<Option<TowerArchetype>> = vec![None; TowerKind::ALL.len()];
        for archetype in document.tower {
            validate_tower(&archetype)?;
            let slot = &mut slots[archetype.kind as usize];
            if slot.is_some() {
                return Err(CatalogError::DuplicateTower(archetype.kind));
            }
            *slot = Some(archetype);
        }

        let mut entries = Vec::with_capacity(slots.len());
        for (kind, slot) in TowerKind::ALL.into_iter().zip(slots) {
            entries.push(slot.ok_or(CatalogError::MissingTower(kind))?);
        }
        Ok(Self { entries })
    }

    /// Retrieves the archetype of a tower kind.
    #[must_use]
    pub fn get(&self, kind: TowerKind) -> &TowerArchetype {
        &self.entries[kind as usize]
    }

    /// Iterator over every archetype in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerArchetype> {
        self.entries.iter()
    }
}

/// Validated table of enemy archetypes indexed by kind.
#[derive(Clone, Debug)]
pub struct EnemyCatalog {
    entries: Vec<EnemyArchetype>,
}

impl EnemyCatalog {
    /// Parses and validates an enemy catalog document.
    pub fn from_toml(source: &str) -> Result<Self, CatalogError> {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Document {
            enemy: Vec<EnemyArchetype>,
        }

        let document: Document = toml::from_str(source)?;
        let mut slots: Vec<Option<EnemyArchetype>> = vec![None; EnemyKind::ALL.len()];
        for archetype in document.enemy {
            validate_enemy(&archetype)?;
            let slot = &mut slots[archetype.kind as usize];
            if slot.is_some() {
                return Err(CatalogError::DuplicateEnemy(archetype.kind));
            }
            *slot = Some(archetype);
        }

        let mut entries = Vec::with_capacity(slots.len());
        for (kind, slot) in EnemyKind::ALL.into_iter().zip(slots) {
            entries.push(slot.ok_or(CatalogError::MissingEnemy(kind))?);
        }
        Ok(Self { entries })
    }

    /// Retrieves the archetype of an enemy kind.
    #[must_use]
    pub fn get(&self, kind: EnemyKind) -> &EnemyArchetype {
        &self.entries[kind as usize]
    }

    /// Iterator over every archetype in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemyArchetype> {
        self.entries.iter()
    }
}

/// Tower and enemy catalogs loaded together.
#[derive(Clone, Debug)]
pub struct Catalogs {
    /// Tower archetypes.
    pub towers: TowerCatalog,
    /// Enemy archetypes.
    pub enemies: EnemyCatalog,
}

impl Catalogs {
    /// Loads the catalogs shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml(BUILTIN_TOWERS, BUILTIN_ENEMIES)
    }

    /// Loads catalogs from caller-supplied TOML documents.
    pub fn from_toml(towers: &str, enemies: &str) -> Result<Self, CatalogError> {
        Ok(Self {
            towers: TowerCatalog::from_toml(towers)?,
            enemies: EnemyCatalog::from_toml(enemies)?,
        })
    }
}

fn validate_tower(archetype: &TowerArchetype) -> Result<(), CatalogError> {
    let name = archetype.kind.as_str();
    positive(name, "damage", f64::from(archetype.damage))?;
    positive(name, "range", f64::from(archetype.range))?;
    positive(name, "fire_rate", f64::from(archetype.fire_rate))?;
    positive(name, "projectile_speed", f64::from(archetype.projectile_speed))?;
    positive(name, "cost", f64::from(archetype.cost))?;
    for (_, amount) in archetype.unlock_cost.iter() {
        positive(name, "unlock_cost", amount)?;
    }

    for ability in &archetype.abilities {
        validate_ability(archetype.kind, ability)?;
    }
    Ok(())
}

fn validate_ability(kind: TowerKind, ability: &Ability) -> Result<(), CatalogError> {
    let invalid = |reason| Err(CatalogError::InvalidAbility { kind, reason });
    match *ability {
        Ability::Splash { radius } if !(radius.is_finite() && radius > 0.0) => {
            invalid("splash radius must be positive")
        }
        Ability::Chain { count: 0 } => invalid("chain count must be at least one"),
        Ability::Piercing { damage_multiplier }
            if !(damage_multiplier.is_finite() && damage_multiplier > 0.0) =>
        {
            invalid("piercing damage multiplier must be positive")
        }
        Ability::Slow { effect, .. } if !(effect > 0.0 && effect <= 1.0) => {
            invalid("slow effect must lie in (0, 1]")
        }
        Ability::Slow { duration, .. } if !(duration.is_finite() && duration > 0.0) => {
            invalid("slow duration must be positive")
        }
        Ability::Dot { damage, duration }
            if !(damage.is_finite() && damage > 0.0 && duration.is_finite() && duration > 0.0) =>
        {
            invalid("dot damage and duration must be positive")
        }
        Ability::Multishot { count: 0 } => invalid("multishot count must be at least one"),
        _ => Ok(()),
    }
}

fn validate_enemy(archetype: &EnemyArchetype) -> Result<(), CatalogError> {
    let name = archetype.kind.as_str();
    positive(name, "health", f64::from(archetype.health))?;
    positive(name, "speed", f64::from(archetype.speed))?;
    positive(name, "size", f64::from(archetype.size))?;
    positive(name, "reward", f64::from(archetype.reward))?;
    positive(name, "base_damage", f64::from(archetype.base_damage))?;
    Ok(())
}

fn positive(archetype: &'static str, field: &'static str, value: f64) -> Result<(), CatalogError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CatalogError::InvalidStat {
            archetype,
            field,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crystal_defence_core::Currency;

    #[test]
    fn builtin_catalogs_load() {
        let catalogs = Catalogs::builtin().expect("builtin catalogs are valid");
        let laser = catalogs.towers.get(TowerKind::Laser);
        assert_eq!(laser.cost, 100);
        assert_eq!(laser.damage, 20.0);
        assert!(laser.unlocked);
        assert!(laser.abilities.is_empty());

        let scout = catalogs.enemies.get(EnemyKind::Scout);
        assert_eq!(scout.health, 50.0);
        assert_eq!(scout.reward, 10);
    }

    #[test]
    fn catalog_order_matches_kind_order() {
        let catalogs = Catalogs::builtin().expect("builtin catalogs are valid");
        let kinds: Vec<TowerKind> = catalogs.towers.iter().map(|entry| entry.kind).collect();
        assert_eq!(kinds, TowerKind::ALL.to_vec());
        let kinds: Vec<EnemyKind> = catalogs.enemies.iter().map(|entry| entry.kind).collect();
        assert_eq!(kinds, EnemyKind::ALL.to_vec());
    }

    #[test]
    fn shipped_tower_abilities_are_mutually_exclusive() {
        let catalogs = Catalogs::builtin().expect("builtin catalogs are valid");
        for archetype in catalogs.towers.iter() {
            assert!(archetype.abilities.len() <= 1, "{:?}", archetype.kind);
        }
        let venom = catalogs.towers.get(TowerKind::Venom);
        assert_eq!(venom.unlock_cost.amount(Currency::Essences), 2.0);
        assert_eq!(
            venom.abilities,
            vec![Ability::Dot {
                damage: 5.0,
                duration: 4.0
            }]
        );
    }

    #[test]
    fn missing_tower_fails_fast() {
        let source = BUILTIN_TOWERS.replacen("kind = \"orbital\"", "kind = \"laser\"", 1);
        let error = TowerCatalog::from_toml(&source).expect_err("duplicate laser");
        assert!(matches!(error, CatalogError::DuplicateTower(TowerKind::Laser)));

        let truncated = r#"
            [[tower]]
            kind = "laser"
            damage = 20.0
            range = 150.0
            fire_rate = 1.0
            projectile_speed = 400.0
            cost = 100
            unlocked = true
        "#;
        let error = TowerCatalog::from_toml(truncated).expect_err("missing kinds");
        assert!(matches!(error, CatalogError::MissingTower(TowerKind::Plasma)));
    }

    #[test]
    fn non_positive_stats_are_rejected() {
        let source = BUILTIN_ENEMIES.replace("health = 50.0", "health = -1.0");
        let error = EnemyCatalog::from_toml(&source).expect_err("negative health");
        assert!(matches!(
            error,
            CatalogError::InvalidStat {
                archetype: "scout",
                field: "health",
                ..
            }
        ));
    }

    #[test]
    fn zero_rewards_and_base_damage_are_rejected() {
        for (field, source) in [
            ("reward", BUILTIN_ENEMIES.replacen("reward = 10", "reward = 0", 1)),
            (
                "base_damage",
                BUILTIN_ENEMIES.replacen("base_damage = 1", "base_damage = 0", 1),
            ),
        ] {
            let error = EnemyCatalog::from_toml(&source).expect_err(field);
            assert!(
                matches!(
                    error,
                    CatalogError::InvalidStat {
                        archetype: "scout",
                        field: rejected,
                        value,
                    } if rejected == field && value == 0.0
                ),
                "{field}: {error:?}"
            );
        }
    }

    #[test]
    fn invalid_ability_parameters_are_rejected() {
        let source = BUILTIN_TOWERS.replace("radius = 60.0", "radius = 0.0");
        let error = TowerCatalog::from_toml(&source).expect_err("zero splash radius");
        assert!(matches!(
            error,
            CatalogError::InvalidAbility {
                kind: TowerKind::Plasma,
                ..
            }
        ));

        let source = BUILTIN_TOWERS.replace("effect = 0.5", "effect = 1.5");
        assert!(TowerCatalog::from_toml(&source).is_err());
    }

    #[test]
    fn malformed_documents_surface_as_configuration_errors() {
        let error = EnemyCatalog::from_toml("[[enemy]]\nkind = \"ghost\"").expect_err("bad kind");
        assert!(matches!(error, CatalogError::Parse(_)));
        let converted: GameError = error.into();
        assert!(matches!(converted, GameError::Configuration(_)));
    }

    #[test]
    fn skill_caps_differ_between_skills() {
        assert_eq!(skill_definition(Skill::Damage).max_level, 5);
        assert_eq!(skill_definition(Skill::Special).max_level, 3);
        assert!(skill_definition(Skill::FireRate).multiplier < 1.0);
    }
}
