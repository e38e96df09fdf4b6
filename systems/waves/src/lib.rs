#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave director responsible for starting waves, spawning
//! their enemies and rewarding cleared waves.

use std::time::Duration;

use crystal_defence_core::{Command, EnemyKind, EnemyView, Event, GameError, WavePhase};
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Enemy archetypes gated by wave number, checked in order.
///
/// Each entry holds the kind, the wave the kind first exceeds, and the roll
/// threshold below which it is selected.
const SELECTION_GATES: [(EnemyKind, u32, f64); 4] = [
    (EnemyKind::Boss, 10, 0.10),
    (EnemyKind::Tank, 7, 0.20),
    (EnemyKind::Speedster, 5, 0.30),
    (EnemyKind::Fighter, 3, 0.50),
];

/// Configuration parameters required to construct the wave director.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Seed of the enemy selection RNG.
    pub seed: u64,
    /// Milliseconds between two spawns of the same wave.
    pub spawn_interval_ms: u64,
    /// Milliseconds between a cleared wave and the next one.
    pub reward_delay_ms: u64,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed_0f_5eed,
            spawn_interval_ms: 1_000,
            reward_delay_ms: 5_000,
        }
    }
}

/// Number of enemies spawned by the provided wave.
#[must_use]
pub const fn enemies_per_wave(wave: u32) -> u32 {
    5 + 2 * wave
}

/// Maps a uniform roll in `[0, 1)` to the enemy kind spawned in a wave.
#[must_use]
pub fn select_enemy_kind(wave: u32, roll: f64) -> EnemyKind {
    SELECTION_GATES
        .iter()
        .find(|(_, after_wave, threshold)| wave > *after_wave && roll < *threshold)
        .map_or(EnemyKind::Scout, |(kind, _, _)| *kind)
}

/// Pure state machine that drives waves from elapsed simulation time.
#[derive(Debug)]
pub struct WaveDirector {
    spawn_interval: Duration,
    reward_delay: Duration,
    phase: WavePhase,
    wave: u32,
    to_spawn: u32,
    spawned: u32,
    timer: Duration,
    rng: ChaCha8Rng,
}

impl WaveDirector {
    /// Creates a new idle director using the supplied configuration.
    #[must_use]
    pub fn new(config: &WaveConfig) -> Self {
        Self {
            spawn_interval: Duration::from_millis(config.spawn_interval_ms),
            reward_delay: Duration::from_millis(config.reward_delay_ms),
            phase: WavePhase::Idle,
            wave: 0,
            to_spawn: 0,
            spawned: 0,
            timer: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
        }
    }

    /// Current phase of the state machine.
    #[must_use]
    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Current wave number, zero before the first wave.
    #[must_use]
    pub fn wave(&self) -> u32 {
        self.wave
    }

    /// Leaves `Idle` by starting the first wave.
    pub fn start(&mut self, out: &mut Vec<Command>) -> Result<(), GameError> {
        if self.phase != WavePhase::Idle {
            return Err(GameError::WavesAlreadyStarted);
        }
        self.start_wave(1, out);
        Ok(())
    }

    /// Consumes the tick's events and the enemy view to emit wave commands.
    pub fn handle(&mut self, events: &[Event], enemies: &EnemyView, out: &mut Vec<Command>) {
        if self.phase == WavePhase::Idle {
            return;
        }

        let mut accumulated = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                accumulated = accumulated.saturating_add(*dt);
            }
        }

        match self.phase {
            WavePhase::Idle => {}
            WavePhase::Spawning => {
                self.timer = self.timer.saturating_add(accumulated);
                while self.spawned < self.to_spawn && self.timer >= self.spawn_interval {
                    self.timer -= self.spawn_interval;
                    self.spawned += 1;
                    let kind = select_enemy_kind(self.wave, self.rng.gen::<f64>());
                    debug!(
                        "wave {} spawning {kind} ({}/{})",
                        self.wave, self.spawned, self.to_spawn
                    );
                    out.push(Command::SpawnEnemy { kind });
                }
                if self.spawned >= self.to_spawn {
                    self.phase = WavePhase::AwaitingClear;
                }
            }
            WavePhase::AwaitingClear => {
                if enemies.active().next().is_none() {
                    info!("wave {} cleared", self.wave);
                    out.push(Command::CompleteWave { wave: self.wave });
                    self.phase = WavePhase::Rewarding;
                    self.timer = Duration::ZERO;
                }
            }
            WavePhase::Rewarding => {
                self.timer = self.timer.saturating_add(accumulated);
                if self.timer >= self.reward_delay {
                    self.start_wave(self.wave + 1, out);
                }
            }
        }
    }

    fn start_wave(&mut self, wave: u32, out: &mut Vec<Command>) {
        self.wave = wave;
        self.to_spawn = enemies_per_wave(wave);
        self.spawned = 0;
        // The first enemy is due on the first spawning tick.
        self.timer = self.spawn_interval;
        self.phase = WavePhase::Spawning;
        out.push(Command::StartWave {
            wave,
            enemies: self.to_spawn,
        });
    }
}
