//! Damage-over-time records and global ability timers.

use std::collections::BTreeMap;

use crystal_defence_core::{EnemyId, GameError, GlobalAbility, TowerId};

/// Slow strength applied by the freeze ability.
pub(crate) const FREEZE_SLOW_EFFECT: f32 = 0.5;
/// Flat damage dealt by the bomb ability.
pub(crate) const BOMB_DAMAGE: f32 = 100.0;
/// Fire interval multiplier while a boost is active.
pub(crate) const BOOST_FIRE_RATE_SCALE: f32 = 0.5;

/// Damage applied once per whole second for a fixed duration.
#[derive(Clone, Debug)]
pub(crate) struct DamageOverTime {
    pub(crate) target: EnemyId,
    pub(crate) damage_per_tick: f32,
    pub(crate) source: Option<TowerId>,
    duration: f32,
    elapsed: f32,
    ticks_applied: u32,
}

impl DamageOverTime {
    pub(crate) fn new(
        target: EnemyId,
        damage_per_tick: f32,
        duration: f32,
        source: Option<TowerId>,
    ) -> Self {
        Self {
            target,
            damage_per_tick,
            source,
            duration: duration.max(0.0),
            elapsed: 0.0,
            ticks_applied: 0,
        }
    }

    /// Advances the effect and returns the number of ticks that fell due.
    ///
    /// Elapsed time never exceeds the duration, so an effect applies exactly
    /// `floor(duration)` ticks over its lifetime.
    pub(crate) fn advance(&mut self, dt: f32) -> u32 {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        let due = (self.elapsed.floor() as u32).saturating_sub(self.ticks_applied);
        self.ticks_applied += due;
        due
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Global ability effect that stays in force for a while.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimedEffect {
    /// Ability that produced the effect.
    pub ability: GlobalAbility,
    /// Simulation seconds until the effect ends.
    pub remaining: f32,
}

/// Cooldowns and timed effects of the global abilities.
#[derive(Clone, Debug, Default)]
pub(crate) struct AbilityClock {
    cooldowns: BTreeMap<GlobalAbility, f32>,
    effects: Vec<TimedEffect>,
}

impl AbilityClock {
    /// Starts the ability's cooldown and timed effect, failing while the
    /// previous activation is still cooling down.
    pub(crate) fn activate(&mut self, ability: GlobalAbility) -> Result<(), GameError> {
        let remaining = self.cooldown(ability);
        if remaining > 0.0 {
            return Err(GameError::OnCooldown { ability, remaining });
        }

        let _ = self.cooldowns.insert(ability, ability.cooldown_secs());
        let duration = ability.duration_secs();
        if duration > 0.0 {
            self.effects.retain(|effect| effect.ability != ability);
            self.effects.push(TimedEffect {
                ability,
                remaining: duration,
            });
        }
        Ok(())
    }

    pub(crate) fn advance(&mut self, dt: f32) {
        self.cooldowns.retain(|_, remaining| {
            *remaining -= dt;
            *remaining > 0.0
        });
        self.effects.retain_mut(|effect| {
            effect.remaining -= dt;
            effect.remaining > 0.0
        });
    }

    /// Seconds of cooldown left; zero when the ability is ready.
    pub(crate) fn cooldown(&self, ability: GlobalAbility) -> f32 {
        self.cooldowns.get(&ability).copied().unwrap_or(0.0)
    }

    pub(crate) fn effects(&self) -> &[TimedEffect] {
        &self.effects
    }

    pub(crate) fn fire_rate_scale(&self) -> f32 {
        if self
            .effects
            .iter()
            .any(|effect| effect.ability == GlobalAbility::Boost)
        {
            BOOST_FIRE_RATE_SCALE
        } else {
            1.0
        }
    }
}
