#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Crystal Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that collaborators (rendering, audio, telemetry) consume as pure
//! notifications. Systems query immutable snapshots and respond exclusively
//! with new command batches.

use std::{collections::BTreeMap, fmt, str::FromStr, time::Duration};

pub use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Longest simulated interval a single tick may cover.
pub const MAX_TICK: Duration = Duration::from_millis(100);

/// Percentage of the invested cost returned when a tower is sold.
pub const SELL_REFUND_PERCENT: u64 = 70;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock, cooldowns and timed effects.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests placement of a new tower at the provided world position.
    PlaceTower {
        /// Archetype of the tower to construct.
        kind: TowerKind,
        /// Centre of the tower in world units.
        position: Vec2,
    },
    /// Requests a currency-gated generic upgrade of a tower.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
    },
    /// Requests that a tower be sold for a partial refund.
    SellTower {
        /// Identifier of the tower to sell.
        tower: TowerId,
    },
    /// Requests that a locked tower archetype be unlocked.
    UnlockTower {
        /// Archetype to unlock.
        kind: TowerKind,
    },
    /// Spends one of the tower's skill points on the provided skill.
    SpendSkillPoint {
        /// Tower whose skill point is spent.
        tower: TowerId,
        /// Skill that receives the point.
        skill: Skill,
    },
    /// Activates one of the global player abilities.
    ActivateAbility {
        /// Ability to activate.
        ability: GlobalAbility,
    },
    /// Collects every resource drop within pickup range of the position.
    CollectDrops {
        /// Point around which drops are collected.
        position: Vec2,
    },
    /// Announces the start of a wave.
    StartWave {
        /// One-based wave number.
        wave: u32,
        /// Number of enemies the wave will spawn.
        enemies: u32,
    },
    /// Spawns a single enemy at the head of the path.
    SpawnEnemy {
        /// Archetype of the enemy to spawn.
        kind: EnemyKind,
    },
    /// Grants the completion reward for a cleared wave.
    CompleteWave {
        /// Wave that was cleared.
        wave: u32,
    },
    /// Assigns (or clears) the target tracked by a tower.
    SetTowerTarget {
        /// Tower whose target changes.
        tower: TowerId,
        /// Enemy to track, or `None` to clear the current target.
        enemy: Option<EnemyId>,
    },
    /// Fires one projectile per listed target and restarts the tower cooldown.
    FireVolley {
        /// Tower that fires.
        tower: TowerId,
        /// Targets of the volley; the first entry is the primary target.
        targets: Vec<EnemyId>,
    },
    /// Moves enemies along the path and resolves slow timers and escapes.
    AdvanceEnemies {
        /// Simulated time covered by the movement step.
        dt: Duration,
    },
    /// Moves projectiles toward their targets and detects hits.
    AdvanceProjectiles {
        /// Simulated time covered by the movement step.
        dt: Duration,
    },
    /// Applies damage-over-time ticks.
    AdvanceEffects {
        /// Simulated time covered by the effect step.
        dt: Duration,
    },
    /// Ages resource drops and removes expired ones.
    AdvanceDrops {
        /// Simulated time covered by the lifetime step.
        dt: Duration,
    },
    /// Applies damage to an enemy on behalf of an optional source tower.
    DamageEnemy {
        /// Enemy receiving the damage.
        enemy: EnemyId,
        /// Amount of damage to apply.
        amount: f32,
        /// Tower credited with the damage, if it still exists.
        source: Option<TowerId>,
    },
    /// Slows an enemy, refreshing any slow already applied.
    SlowEnemy {
        /// Enemy to slow.
        enemy: EnemyId,
        /// Fraction of speed removed while slowed.
        effect: f32,
        /// Duration of the slow in seconds.
        duration: f32,
    },
    /// Registers a damage-over-time effect on an enemy.
    AttachDamageOverTime {
        /// Enemy afflicted by the effect.
        enemy: EnemyId,
        /// Damage applied per whole second.
        damage_per_tick: f32,
        /// Total duration of the effect in seconds.
        duration: f32,
        /// Tower credited with the damage, if it still exists.
        source: Option<TowerId>,
    },
    /// Keeps a projectile alive after a hit and points it at a new target.
    RetargetProjectile {
        /// Projectile that continues travelling.
        projectile: ProjectileId,
        /// New target of the projectile.
        enemy: EnemyId,
        /// Damage carried to the next hit.
        damage: f32,
    },
    /// Resolves dead enemies, spent projectiles and expired effects.
    SweepDead,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy entered the path.
    EnemySpawned {
        /// Snapshot of the spawned enemy.
        enemy: EnemySnapshot,
    },
    /// Reports damage applied to an enemy.
    EnemyDamaged {
        /// Snapshot of the enemy after the damage was applied.
        enemy: EnemySnapshot,
        /// Amount of damage applied before clamping.
        amount: f32,
        /// Tower credited with the damage, if any.
        source: Option<TowerId>,
    },
    /// Reports that an enemy died and its rewards were granted.
    EnemyKilled {
        /// Snapshot of the enemy at the moment of death.
        enemy: EnemySnapshot,
        /// Tower credited with the kill, if it still exists.
        killer: Option<TowerId>,
        /// Crystals granted for the kill.
        reward: u32,
    },
    /// Reports that an enemy reached the end of the path.
    EnemyEscaped {
        /// Snapshot of the enemy that escaped.
        enemy: EnemySnapshot,
    },
    /// Confirms that a projectile was launched.
    ProjectileFired {
        /// Snapshot of the launched projectile.
        projectile: ProjectileSnapshot,
    },
    /// Reports that a projectile reached its target.
    ProjectileHit {
        /// Snapshot of the projectile at impact.
        projectile: ProjectileSnapshot,
        /// Enemy struck by the projectile.
        enemy: EnemyId,
        /// World position of the impact.
        impact: Vec2,
    },
    /// Confirms that a tower was placed.
    TowerPlaced {
        /// Snapshot of the new tower.
        tower: TowerSnapshot,
    },
    /// Confirms that a tower completed a generic upgrade.
    TowerUpgraded {
        /// Snapshot of the tower after the upgrade.
        tower: TowerSnapshot,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Snapshot of the tower before removal.
        tower: TowerSnapshot,
        /// Crystals refunded to the player.
        refund: u32,
    },
    /// Confirms that a tower archetype became available.
    TowerUnlocked {
        /// Archetype that was unlocked.
        kind: TowerKind,
    },
    /// Reports that a tower gained an experience level.
    TowerLeveledUp {
        /// Tower that levelled up.
        tower: TowerId,
        /// New experience level of the tower.
        level: u32,
    },
    /// Reports that a tower spent a skill point.
    SkillUpgraded {
        /// Tower that spent the point.
        tower: TowerId,
        /// Skill that was improved.
        skill: Skill,
        /// New level of the skill.
        level: u32,
    },
    /// Announces the start of a wave.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
        /// Number of enemies the wave will spawn.
        enemies: u32,
    },
    /// Announces that a wave was cleared and rewarded.
    WaveCompleted {
        /// Wave that was cleared.
        wave: u32,
        /// Crystal bonus granted for the wave.
        bonus: u32,
    },
    /// Reports that a resource drop appeared.
    ResourceDropped {
        /// Snapshot of the drop.
        drop: DropSnapshot,
    },
    /// Reports that a resource drop was collected.
    ResourceCollected {
        /// Snapshot of the drop at pickup.
        drop: DropSnapshot,
    },
    /// Reports that a kill granted a tech point.
    TechPointAwarded {
        /// Tech point balance after the award.
        total: f64,
    },
    /// Confirms that a global ability was activated.
    AbilityActivated {
        /// Ability that was activated.
        ability: GlobalAbility,
    },
    /// Reports that an escaping enemy damaged the base.
    BaseDamaged {
        /// Remaining base health.
        health: u32,
    },
    /// Reports that the base health reached zero.
    BaseDestroyed,
}

/// Errors surfaced by player-facing commands and configuration loading.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GameError {
    /// The ledger cannot cover the requested cost.
    #[error("insufficient {currency}: {required} required, {available} available")]
    InsufficientFunds {
        /// First currency found short.
        currency: Currency,
        /// Amount requested.
        required: f64,
        /// Balance at the time of the request.
        available: f64,
    },
    /// The requested tower position is not buildable.
    #[error("cannot place tower at {position}: {reason}")]
    InvalidPlacement {
        /// Requested tower position.
        position: Vec2,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// A global ability was invoked before its cooldown elapsed.
    #[error("{ability} is on cooldown for another {remaining:.1}s")]
    OnCooldown {
        /// Ability that was invoked.
        ability: GlobalAbility,
        /// Seconds of cooldown left.
        remaining: f32,
    },
    /// Static configuration failed validation.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The requested tower archetype has not been unlocked.
    #[error("{kind} towers are locked")]
    TowerLocked {
        /// Locked archetype.
        kind: TowerKind,
    },
    /// The requested tower archetype is already unlocked.
    #[error("{kind} towers are already unlocked")]
    AlreadyUnlocked {
        /// Archetype that was already available.
        kind: TowerKind,
    },
    /// No tower with the provided identifier exists.
    #[error("tower {tower:?} does not exist")]
    UnknownTower {
        /// Identifier that failed to resolve.
        tower: TowerId,
    },
    /// The tower has no unspent skill points.
    #[error("tower {tower:?} has no skill points")]
    NoSkillPoints {
        /// Tower without points.
        tower: TowerId,
    },
    /// The skill already reached its maximum level.
    #[error("{skill:?} skill of tower {tower:?} is at its maximum level")]
    SkillMaxed {
        /// Tower owning the skill.
        tower: TowerId,
        /// Skill that cannot be raised further.
        skill: Skill,
    },
    /// Waves were already started.
    #[error("waves have already started")]
    WavesAlreadyStarted,
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum PlacementError {
    /// The position lies on the enemy path.
    #[error("position lies on the enemy path")]
    OnPath,
    /// The position is within one grid cell of an existing tower.
    #[error("position overlaps tower {0:?}")]
    Overlaps(TowerId),
    /// The position lies outside the playing field.
    #[error("position lies outside the field")]
    OutOfBounds,
}

/// Scalar counters held by the economy ledger.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    /// Primary building currency.
    Crystals,
    /// Accumulated score.
    Score,
    /// Score multiplier applied to kill rewards.
    Multiplier,
    /// Points spent on unlocking towers.
    TechPoints,
    /// Rare currency dropped by speedsters and bosses.
    Essences,
    /// Rare currency dropped by tanks.
    Fragments,
    /// Rare currency dropped by bosses.
    Cores,
}

impl Currency {
    /// Every currency in ledger order.
    pub const ALL: [Currency; 7] = [
        Currency::Crystals,
        Currency::Score,
        Currency::Multiplier,
        Currency::TechPoints,
        Currency::Essences,
        Currency::Fragments,
        Currency::Cores,
    ];

    /// Lowercase name of the currency.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Crystals => "crystals",
            Self::Score => "score",
            Self::Multiplier => "multiplier",
            Self::TechPoints => "tech_points",
            Self::Essences => "essences",
            Self::Fragments => "fragments",
            Self::Cores => "cores",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from currencies to the amounts requested by a purchase.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cost {
    amounts: BTreeMap<Currency, f64>,
}

impl Cost {
    /// Creates an empty cost.
    #[must_use]
    pub fn free() -> Self {
        Self::default()
    }

    /// Creates a cost consisting solely of crystals.
    #[must_use]
    pub fn crystals(amount: f64) -> Self {
        Self::free().with(Currency::Crystals, amount)
    }

    /// Adds (or replaces) the amount requested for a currency.
    #[must_use]
    pub fn with(mut self, currency: Currency, amount: f64) -> Self {
        let _ = self.amounts.insert(currency, amount);
        self
    }

    /// Amount requested for a currency; zero when unlisted.
    #[must_use]
    pub fn amount(&self, currency: Currency) -> f64 {
        self.amounts.get(&currency).copied().unwrap_or(0.0)
    }

    /// Iterator over the listed currencies in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (Currency, f64)> + '_ {
        self.amounts.iter().map(|(currency, amount)| (*currency, *amount))
    }

    /// Reports whether the cost lists no currencies.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.amounts.is_empty()
    }
}

/// Tower archetypes that can be constructed.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Baseline single-target tower.
    Laser,
    /// Area damage around the impact point.
    Plasma,
    /// Slows struck enemies.
    Cryo,
    /// Chains damage between nearby enemies.
    Tesla,
    /// Damage over time.
    Venom,
    /// Projectiles pierce through to further enemies.
    Railgun,
    /// Fires several projectiles per volley.
    Missile,
    /// Very fast low-damage fire.
    Beam,
    /// Long-range heavy strikes.
    Orbital,
}

impl TowerKind {
    /// Every tower archetype in catalog order.
    pub const ALL: [TowerKind; 9] = [
        TowerKind::Laser,
        TowerKind::Plasma,
        TowerKind::Cryo,
        TowerKind::Tesla,
        TowerKind::Venom,
        TowerKind::Railgun,
        TowerKind::Missile,
        TowerKind::Beam,
        TowerKind::Orbital,
    ];

    /// Lowercase catalog identifier of the archetype.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Laser => "laser",
            Self::Plasma => "plasma",
            Self::Cryo => "cryo",
            Self::Tesla => "tesla",
            Self::Venom => "venom",
            Self::Railgun => "railgun",
            Self::Missile => "missile",
            Self::Beam => "beam",
            Self::Orbital => "orbital",
        }
    }
}

impl fmt::Display for TowerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TowerKind {
    type Err = UnknownKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownKind(value.to_owned()))
    }
}

/// Enemy archetypes that waves can spawn.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Weak default enemy.
    Scout,
    /// Sturdier enemy from wave 4 onward.
    Fighter,
    /// Fast enemy from wave 6 onward.
    Speedster,
    /// Slow heavily armoured enemy from wave 8 onward.
    Tank,
    /// Rare boss from wave 11 onward.
    Boss,
}

impl EnemyKind {
    /// Every enemy archetype in catalog order.
    pub const ALL: [EnemyKind; 5] = [
        EnemyKind::Scout,
        EnemyKind::Fighter,
        EnemyKind::Speedster,
        EnemyKind::Tank,
        EnemyKind::Boss,
    ];

    /// Lowercase catalog identifier of the archetype.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scout => "scout",
            Self::Fighter => "fighter",
            Self::Speedster => "speedster",
            Self::Tank => "tank",
            Self::Boss => "boss",
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown archetype name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown archetype `{0}`")]
pub struct UnknownKind(pub String);

/// Special ability carried by a tower, with its parameters.
///
/// Archetypes list their abilities explicitly; a tower with no abilities deals
/// direct damage only.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ability {
    /// Area damage with linear falloff around the impact point.
    Splash {
        /// Radius of the area in world units.
        radius: f32,
    },
    /// Damage hopping to nearby enemies that were not struck yet.
    Chain {
        /// Maximum number of hops.
        count: u32,
    },
    /// Projectiles continue to the next enemy after a hit.
    Piercing {
        /// Multiplier applied to the damage carried after each pierce.
        damage_multiplier: f32,
    },
    /// Slows the struck enemy.
    Slow {
        /// Fraction of speed removed while slowed.
        effect: f32,
        /// Duration of the slow in seconds.
        duration: f32,
    },
    /// Damage over time applied once per second.
    Dot {
        /// Damage per one-second tick.
        damage: f32,
        /// Duration of the effect in seconds.
        duration: f32,
    },
    /// Several projectiles per volley.
    Multishot {
        /// Number of projectiles per volley.
        count: u32,
    },
    /// Continuous beam; no on-hit effect.
    Beam,
    /// Orbital strike; no on-hit effect.
    Orbital,
}

/// Skills that a tower's experience points can be spent on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    /// Multiplies tower damage.
    Damage,
    /// Multiplies tower range.
    Range,
    /// Shortens the interval between shots.
    FireRate,
    /// Archetype-specific enhancement.
    Special,
}

impl Skill {
    /// Every skill in display order.
    pub const ALL: [Skill; 4] = [Skill::Damage, Skill::Range, Skill::FireRate, Skill::Special];
}

/// Global abilities the player may trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalAbility {
    /// Slows every active enemy.
    Freeze,
    /// Flat damage to every active enemy.
    Bomb,
    /// Halves the fire interval of every tower.
    Boost,
}

impl GlobalAbility {
    /// Every global ability.
    pub const ALL: [GlobalAbility; 3] = [
        GlobalAbility::Freeze,
        GlobalAbility::Bomb,
        GlobalAbility::Boost,
    ];

    /// Seconds that must elapse between activations.
    #[must_use]
    pub const fn cooldown_secs(self) -> f32 {
        match self {
            Self::Freeze => 10.0,
            Self::Bomb => 15.0,
            Self::Boost => 20.0,
        }
    }

    /// Seconds the ability stays in effect; zero for instant abilities.
    #[must_use]
    pub const fn duration_secs(self) -> f32 {
        match self {
            Self::Freeze => 3.0,
            Self::Bomb => 0.0,
            Self::Boost => 5.0,
        }
    }
}

impl fmt::Display for GlobalAbility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Freeze => "freeze",
            Self::Bomb => "bomb",
            Self::Boost => "boost",
        };
        f.write_str(name)
    }
}

/// Kinds of collectible resources dropped by dying enemies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Crystal pickup.
    Crystal,
    /// Essence pickup.
    Essence,
    /// Fragment pickup.
    Fragment,
    /// Core pickup.
    Core,
}

impl ResourceKind {
    /// Ledger currency credited when the resource is collected.
    #[must_use]
    pub const fn currency(self) -> Currency {
        match self {
            Self::Crystal => Currency::Crystals,
            Self::Essence => Currency::Essences,
            Self::Fragment => Currency::Fragments,
            Self::Core => Currency::Cores,
        }
    }
}

/// Phases of the wave state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WavePhase {
    /// No wave has been started yet.
    Idle,
    /// Enemies of the current wave are being spawned.
    Spawning,
    /// Every enemy spawned; waiting for the field to clear.
    AwaitingClear,
    /// Wave cleared; counting down to the next wave.
    Rewarding,
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a resource drop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DropId(u32);

impl DropId {
    /// Creates a new drop identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a damage-over-time effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u32);

impl EffectId {
    /// Creates a new effect identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Archetype of the tower.
    pub kind: TowerKind,
    /// Centre of the tower in world units.
    pub position: Vec2,
    /// Damage carried by each projectile.
    pub damage: f32,
    /// Targeting range in world units.
    pub range: f32,
    /// Effective seconds between volleys, including active boosts.
    pub fire_rate: f32,
    /// Projectile travel speed in world units per second.
    pub projectile_speed: f32,
    /// Generic upgrade level, starting at one.
    pub upgrade_level: u32,
    /// Experience level, starting at one.
    pub level: u32,
    /// Experience accumulated toward the next level.
    pub xp: u32,
    /// Unspent skill points.
    pub skill_points: u32,
    /// Number of kills credited to the tower.
    pub kill_count: u32,
    /// Cumulative damage dealt by the tower.
    pub damage_dealt: f32,
    /// Seconds until the tower may fire again.
    pub ready_in: f32,
    /// Enemy currently tracked by the tower.
    pub target: Option<EnemyId>,
    /// Special abilities, including skill enhancements.
    pub abilities: Vec<Ability>,
}

impl TowerSnapshot {
    /// Number of projectiles launched per volley.
    #[must_use]
    pub fn shots_per_volley(&self) -> u32 {
        self.abilities
            .iter()
            .filter_map(|ability| match ability {
                Ability::Multishot { count } => Some(*count),
                _ => None,
            })
            .max()
            .unwrap_or(1)
            .max(1)
    }
}

/// Read-only snapshot describing all towers placed on the field.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a tower.
    #[must_use]
    pub fn get(&self, tower: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&tower, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of towers captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Archetype of the enemy.
    pub kind: EnemyKind,
    /// Position in world units.
    pub position: Vec2,
    /// Index of the path point the enemy last passed.
    pub path_index: usize,
    /// Remaining health, never negative.
    pub health: f32,
    /// Health at spawn.
    pub max_health: f32,
    /// Indicates whether a slow is active.
    pub slowed: bool,
    /// Seconds left on the active slow.
    pub slow_remaining: f32,
    /// Tower that most recently damaged the enemy.
    pub last_damage_source: Option<TowerId>,
}

impl EnemySnapshot {
    /// Reports whether the enemy can still be targeted and damaged.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.health > 0.0
    }
}

/// Read-only snapshot describing all enemies on the field.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over enemies that can still be targeted.
    pub fn active(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter().filter(|snapshot| snapshot.is_active())
    }

    /// Looks up the snapshot of an enemy.
    #[must_use]
    pub fn get(&self, enemy: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&enemy, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Looks up an enemy only if it is still active.
    #[must_use]
    pub fn get_active(&self, enemy: EnemyId) -> Option<&EnemySnapshot> {
        self.get(enemy).filter(|snapshot| snapshot.is_active())
    }

    /// Number of enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable representation of a projectile.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile.
    pub id: ProjectileId,
    /// Tower that fired the projectile.
    pub owner: TowerId,
    /// Enemy the projectile homes in on.
    pub target: EnemyId,
    /// Position in world units.
    pub position: Vec2,
    /// Damage dealt on impact.
    pub damage: f32,
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Enemies already struck by this projectile.
    pub struck: Vec<EnemyId>,
}

/// Immutable representation of a resource drop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DropSnapshot {
    /// Identifier allocated to the drop.
    pub id: DropId,
    /// Resource contained in the drop.
    pub kind: ResourceKind,
    /// Position in world units.
    pub position: Vec2,
    /// Amount credited on collection.
    pub value: f64,
    /// Seconds until the drop expires.
    pub remaining: f32,
}

/// Tower-to-enemy assignment produced by the targeting system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerTarget {
    /// Tower acquiring the target.
    pub tower: TowerId,
    /// Enemy selected, or `None` when nothing is in range.
    pub enemy: Option<EnemyId>,
}

#[cfg(test)]
mod tests {
    use super::{
        Ability, Cost, Currency, EnemyKind, GlobalAbility, PlacementError, Skill, TowerId,
        TowerKind, TowerSnapshot, Vec2,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn tower_id_round_trips_through_bincode() {
        assert_round_trip(&TowerId::new(42));
    }

    #[test]
    fn kinds_round_trip_through_bincode() {
        for kind in TowerKind::ALL {
            assert_round_trip(&kind);
        }
        for kind in EnemyKind::ALL {
            assert_round_trip(&kind);
        }
        assert_round_trip(&Skill::Special);
        assert_round_trip(&GlobalAbility::Boost);
    }

    #[test]
    fn placement_error_round_trips_through_bincode() {
        assert_round_trip(&PlacementError::Overlaps(TowerId::new(3)));
    }

    #[test]
    fn cost_round_trips_and_defaults_missing_currencies() {
        let cost = Cost::crystals(500.0).with(Currency::TechPoints, 2.0);
        assert_round_trip(&cost);
        assert_eq!(cost.amount(Currency::Crystals), 500.0);
        assert_eq!(cost.amount(Currency::Cores), 0.0);
        assert!(Cost::free().is_free());
    }

    #[test]
    fn tower_kind_parses_case_insensitively() {
        assert_eq!("Railgun".parse::<TowerKind>(), Ok(TowerKind::Railgun));
        assert!("catapult".parse::<TowerKind>().is_err());
    }

    #[test]
    fn ability_tags_parse_from_toml_tables() {
        #[derive(serde::Deserialize)]
        struct Holder {
            abilities: Vec<Ability>,
        }

        let holder: Holder = toml::from_str(
            r#"
            abilities = [
                { kind = "splash", radius = 60.0 },
                { kind = "beam" },
            ]
            "#,
        )
        .expect("parse");
        assert_eq!(
            holder.abilities,
            vec![Ability::Splash { radius: 60.0 }, Ability::Beam]
        );
    }

    #[test]
    fn multishot_volley_size_defaults_to_one() {
        let mut snapshot = TowerSnapshot {
            id: TowerId::new(1),
            kind: TowerKind::Laser,
            position: Vec2::ZERO,
            damage: 20.0,
            range: 150.0,
            fire_rate: 1.0,
            projectile_speed: 400.0,
            upgrade_level: 1,
            level: 1,
            xp: 0,
            skill_points: 0,
            kill_count: 0,
            damage_dealt: 0.0,
            ready_in: 0.0,
            target: None,
            abilities: Vec::new(),
        };
        assert_eq!(snapshot.shots_per_volley(), 1);

        snapshot.abilities.push(Ability::Multishot { count: 3 });
        assert_eq!(snapshot.shots_per_volley(), 3);
    }
}
