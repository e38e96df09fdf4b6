//! Authoritative tower state management utilities.

use crystal_defence_catalog::{skill_definition, TowerArchetype};
use crystal_defence_core::{
    Ability, Cost, EnemyId, GameError, Skill, TowerId, TowerKind, TowerSnapshot, Vec2,
    SELL_REFUND_PERCENT,
};

const UPGRADE_DAMAGE_SCALE: f32 = 1.2;
const UPGRADE_RANGE_SCALE: f32 = 1.1;
const UPGRADE_FIRE_RATE_SCALE: f32 = 0.9;
const INITIAL_XP_TO_NEXT_LEVEL: u32 = 100;

/// State of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    pub(crate) id: TowerId,
    pub(crate) kind: TowerKind,
    pub(crate) position: Vec2,
    base_cost: u32,
    damage: f32,
    range: f32,
    fire_rate: f32,
    projectile_speed: f32,
    upgrade_level: u32,
    level: u32,
    xp: u32,
    xp_to_next_level: u32,
    skill_points: u32,
    skill_levels: [u32; 4],
    kill_count: u32,
    damage_dealt: f32,
    /// Seconds until the tower may fire again.
    pub(crate) ready_in: f32,
    pub(crate) target: Option<EnemyId>,
    abilities: Vec<Ability>,
}

impl TowerState {
    /// Creates a level one tower from its archetype.
    pub(crate) fn new(id: TowerId, archetype: &TowerArchetype, position: Vec2) -> Self {
        Self {
            id,
            kind: archetype.kind,
            position,
            base_cost: archetype.cost,
            damage: archetype.damage,
            range: archetype.range,
            fire_rate: archetype.fire_rate,
            projectile_speed: archetype.projectile_speed,
            upgrade_level: 1,
            level: 1,
            xp: 0,
            xp_to_next_level: INITIAL_XP_TO_NEXT_LEVEL,
            skill_points: 0,
            skill_levels: [0; 4],
            kill_count: 0,
            damage_dealt: 0.0,
            ready_in: 0.0,
            target: None,
            abilities: archetype.abilities.clone(),
        }
    }

    /// Crystals required for the next generic upgrade.
    pub(crate) fn upgrade_cost(&self) -> Cost {
        Cost::crystals(f64::from(self.base_cost) * f64::from(self.upgrade_level))
    }

    pub(crate) fn apply_upgrade(&mut self) {
        self.upgrade_level = self.upgrade_level.saturating_add(1);
        self.damage *= UPGRADE_DAMAGE_SCALE;
        self.range *= UPGRADE_RANGE_SCALE;
        self.fire_rate *= UPGRADE_FIRE_RATE_SCALE;
    }

    /// Crystals returned when the tower is sold, rounded down.
    pub(crate) fn refund(&self) -> u32 {
        let invested = u64::from(self.base_cost) * u64::from(self.upgrade_level);
        u32::try_from(invested * SELL_REFUND_PERCENT / 100).unwrap_or(u32::MAX)
    }

    pub(crate) fn record_damage(&mut self, amount: f32) {
        self.damage_dealt += amount;
    }

    pub(crate) fn record_kill(&mut self) {
        self.kill_count = self.kill_count.saturating_add(1);
    }

    /// Adds experience and returns every level reached as a result.
    pub(crate) fn grant_xp(&mut self, amount: u32) -> Vec<u32> {
        let mut reached = Vec::new();
        self.xp = self.xp.saturating_add(amount);
        while self.xp >= self.xp_to_next_level {
            self.xp -= self.xp_to_next_level;
            self.level += 1;
            self.skill_points += 1;
            self.xp_to_next_level = self.xp_to_next_level.saturating_mul(3) / 2;
            reached.push(self.level);
        }
        reached
    }

    /// Spends a skill point and returns the new level of the skill.
    pub(crate) fn spend_skill_point(&mut self, skill: Skill) -> Result<u32, GameError> {
        if self.skill_points == 0 {
            return Err(GameError::NoSkillPoints { tower: self.id });
        }

        let definition = skill_definition(skill);
        let slot = skill_slot(skill);
        if self.skill_levels[slot] >= definition.max_level {
            return Err(GameError::SkillMaxed {
                tower: self.id,
                skill,
            });
        }

        self.skill_points -= 1;
        self.skill_levels[slot] += 1;
        match skill {
            Skill::Damage => self.damage *= definition.multiplier,
            Skill::Range => self.range *= definition.multiplier,
            Skill::FireRate => self.fire_rate *= definition.multiplier,
            Skill::Special => self.enhance_special(definition.multiplier),
        }
        Ok(self.skill_levels[slot])
    }

    fn enhance_special(&mut self, fallback_damage_scale: f32) {
        let mut enhanced = false;
        for ability in &mut self.abilities {
            enhanced |= enhance(ability);
        }
        if !enhanced {
            self.damage *= fallback_damage_scale;
        }
    }

    /// Captures the tower with its fire interval scaled by active boosts.
    pub(crate) fn snapshot(&self, fire_rate_scale: f32) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            damage: self.damage,
            range: self.range,
            fire_rate: self.fire_rate * fire_rate_scale,
            projectile_speed: self.projectile_speed,
            upgrade_level: self.upgrade_level,
            level: self.level,
            xp: self.xp,
            skill_points: self.skill_points,
            kill_count: self.kill_count,
            damage_dealt: self.damage_dealt,
            ready_in: self.ready_in.max(0.0),
            target: self.target,
            abilities: self.abilities.clone(),
        }
    }
}

const fn skill_slot(skill: Skill) -> usize {
    match skill {
        Skill::Damage => 0,
        Skill::Range => 1,
        Skill::FireRate => 2,
        Skill::Special => 3,
    }
}

/// Applies the special-skill enhancement to an ability, reporting whether the
/// ability has one.
fn enhance(ability: &mut Ability) -> bool {
    match ability {
        Ability::Splash { radius } => *radius *= 1.2,
        Ability::Chain { count } | Ability::Multishot { count } => *count += 1,
        Ability::Piercing { damage_multiplier } => *damage_multiplier += 0.15,
        Ability::Slow { duration, .. } => *duration *= 1.2,
        Ability::Dot { damage, .. } => *damage *= 1.3,
        Ability::Beam | Ability::Orbital => return false,
    }
    true
}
