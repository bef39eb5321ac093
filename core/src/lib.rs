#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Ember Keep simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable views, and respond exclusively with new command batches.

mod arena;

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use arena::{
    fire_interval, AlchemyConfig, ArenaConfig, BuildSlotConfig, ChestConfig, DragonTemplate,
    EnemyTemplate, HatcheryConfig, LootTable, OreNodeConfig, PotionEffect, PotionRecipe,
    ProjectilePayload, ProjectileSpec, TowerBlueprint, TowerLevel, DEFAULT_BURN_TICK_INTERVAL,
};

/// Whether the simulation still accepts gameplay commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayState {
    /// Time advances and gameplay commands are honoured.
    Active,
    /// A win or loss was recorded; time no longer advances.
    Concluded(Outcome),
}

/// Final result of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Every wave was cleared before the base fell.
    Victory,
    /// The base was destroyed.
    Defeat,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Installs an arena and resets all runtime state.
    ConfigureArena {
        /// Static layout and rules of the arena.
        arena: Box<ArenaConfig>,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that an enemy enter the arena on behalf of a wave.
    SpawnEnemy {
        /// Wave the enemy belongs to.
        wave: WaveIndex,
        /// Template, route and multipliers of the enemy.
        spawn: EnemySpawn,
    },
    /// Requests construction of a tower on an empty build slot.
    BuildTower {
        /// Slot receiving the tower.
        slot: SlotId,
        /// Blueprint to construct.
        blueprint: BlueprintId,
    },
    /// Requests that a built tower advance to its next level.
    UpgradeTower {
        /// Tower to upgrade.
        tower: TowerId,
    },
    /// Requests that a tower be sold for its refund.
    SellTower {
        /// Tower to sell.
        tower: TowerId,
    },
    /// Requests that a tower or dragon launch one projectile per target.
    FireVolley {
        /// Shooter launching the volley.
        source: ProjectileSource,
        /// Enemies targeted by the volley, nearest or preferred first.
        targets: Vec<EnemyId>,
    },
    /// Sets the enemy a dragon pursues and restarts its retarget timer.
    AssignDragonTarget {
        /// Dragon receiving the assignment.
        dragon: DragonId,
        /// New target, or `None` to leave the dragon idle.
        target: Option<EnemyId>,
    },
    /// Credits gems to the player's wallet.
    GrantGems {
        /// Number of gems credited.
        amount: u32,
        /// Origin of the gems.
        source: GemSource,
    },
    /// Adds potions to the player's inventory.
    GrantPotions {
        /// Kind of potion granted.
        kind: PotionKind,
        /// Number of potions granted.
        count: u32,
    },
    /// Strikes an ore node once.
    MineOre {
        /// Node being mined.
        node: OreNodeId,
    },
    /// Starts brewing a potion at the alchemy station.
    CraftPotion {
        /// Recipe to brew.
        recipe: RecipeId,
    },
    /// Consumes a potion from the inventory.
    UsePotion {
        /// Kind of potion consumed.
        kind: PotionKind,
    },
    /// Places a dragon egg into the hatchery.
    PlaceEgg,
    /// Opens a loot chest.
    OpenChest {
        /// Chest to open.
        chest: ChestId,
    },
    /// Records the final outcome of the game.
    ConcludeGame {
        /// Outcome to record.
        outcome: Outcome,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that an arena was installed.
    ArenaConfigured {
        /// Health of the base at the start of the game.
        base_max_health: f32,
        /// Gems held at the start of the game.
        gems: u32,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy entered the arena.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Wave the enemy belongs to.
        wave: WaveIndex,
        /// Position where the enemy appeared.
        position: Vec2,
        /// Health of the enemy after wave multipliers.
        max_health: f32,
    },
    /// Reports that a spawn request could not be honoured.
    EnemySpawnRejected {
        /// Wave that issued the request.
        wave: WaveIndex,
        /// Reason the spawn failed.
        reason: SpawnError,
    },
    /// Reports damage dealt to a live enemy.
    EnemyDamaged {
        /// Enemy that took damage.
        enemy: EnemyId,
        /// Damage dealt.
        amount: f32,
        /// Health left after the hit.
        remaining: f32,
    },
    /// Reports that an enemy was killed and removed.
    EnemyDied {
        /// Enemy that died.
        enemy: EnemyId,
        /// Wave the enemy belonged to.
        wave: WaveIndex,
        /// Gems credited for the kill.
        gem_reward: u32,
    },
    /// Reports that an enemy reached the base and was removed.
    EnemyReachedBase {
        /// Enemy that leaked.
        enemy: EnemyId,
        /// Wave the enemy belonged to.
        wave: WaveIndex,
        /// Damage dealt to the base.
        damage: f32,
    },
    /// Reports the base health after it took damage.
    BaseHealthChanged {
        /// Remaining health.
        current: f32,
        /// Maximum health.
        max: f32,
    },
    /// Reports that the base health reached zero for the first time.
    BaseDestroyed,
    /// Reports a change to the wallet.
    GemsChanged {
        /// Gems held after the change.
        total: u32,
        /// Signed change applied to the wallet.
        delta: i64,
    },
    /// Confirms that a tower began construction, either fresh or as an upgrade.
    TowerConstructionStarted {
        /// Tower under construction.
        tower: TowerId,
        /// Slot the tower occupies.
        slot: SlotId,
        /// Blueprint the tower was built from.
        blueprint: BlueprintId,
        /// Level being constructed.
        level: u32,
    },
    /// Confirms that construction finished and the tower is active.
    TowerBuilt {
        /// Tower that finished construction.
        tower: TowerId,
        /// Level that became active.
        level: u32,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Tower that was sold.
        tower: TowerId,
        /// Slot freed by the sale.
        slot: SlotId,
        /// Gems refunded.
        refund: u32,
    },
    /// Reports that a build request was rejected.
    BuildRejected {
        /// Slot named by the request.
        slot: SlotId,
        /// Blueprint named by the request.
        blueprint: BlueprintId,
        /// Reason the request failed.
        reason: BuildError,
    },
    /// Reports that an upgrade request was rejected.
    UpgradeRejected {
        /// Tower named by the request.
        tower: TowerId,
        /// Reason the request failed.
        reason: UpgradeError,
    },
    /// Reports that a sell request was rejected.
    SellRejected {
        /// Tower named by the request.
        tower: TowerId,
        /// Reason the request failed.
        reason: SellError,
    },
    /// Reports that a volley could not be launched.
    VolleyRejected {
        /// Shooter named by the request.
        source: ProjectileSource,
        /// Reason the request failed.
        reason: FireError,
    },
    /// Confirms that a projectile left its shooter.
    ProjectileLaunched {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Shooter that launched it.
        source: ProjectileSource,
        /// Enemy the projectile was aimed at.
        target: EnemyId,
    },
    /// Reports that a projectile resolved its payload.
    ProjectileImpact {
        /// Projectile that resolved.
        projectile: ProjectileId,
        /// Position of the impact.
        position: Vec2,
        /// Number of enemies affected.
        hits: u32,
    },
    /// Reports that a projectile vanished without resolving.
    ProjectileExpired {
        /// Projectile that vanished.
        projectile: ProjectileId,
    },
    /// Confirms a successful strike on an ore node.
    OreMined {
        /// Node that was struck.
        node: OreNodeId,
        /// Gems dropped by the strike.
        gems: u32,
        /// Strikes left before the node is depleted.
        hits_remaining: u32,
    },
    /// Reports that an ore node ran out.
    OreDepleted {
        /// Node that was depleted.
        node: OreNodeId,
    },
    /// Reports that a mining request was rejected.
    OreRejected {
        /// Node named by the request.
        node: OreNodeId,
        /// Reason the request failed.
        reason: OreError,
    },
    /// Confirms that the alchemy station started brewing.
    CraftStarted {
        /// Recipe being brewed.
        recipe: RecipeId,
        /// Time until the potion is ready.
        duration: Duration,
    },
    /// Confirms that a potion finished brewing.
    PotionCrafted {
        /// Kind of potion produced.
        kind: PotionKind,
    },
    /// Reports that a crafting request was rejected.
    CraftRejected {
        /// Recipe named by the request.
        recipe: RecipeId,
        /// Reason the request failed.
        reason: CraftError,
    },
    /// Reports a change to the potion inventory.
    PotionsChanged {
        /// Kind of potion whose count changed.
        kind: PotionKind,
        /// Potions of that kind held after the change.
        total: u32,
    },
    /// Confirms that a potion was consumed.
    PotionUsed {
        /// Kind of potion consumed.
        kind: PotionKind,
        /// Number of enemies affected.
        affected: u32,
    },
    /// Reports that a potion could not be used.
    PotionRejected {
        /// Kind of potion named by the request.
        kind: PotionKind,
        /// Reason the request failed.
        reason: PotionError,
    },
    /// Confirms that an egg was placed and hatching began.
    HatchStarted {
        /// Time until the dragon hatches.
        duration: Duration,
    },
    /// Reports that an egg could not be placed.
    HatchRejected {
        /// Reason the request failed.
        reason: HatchError,
    },
    /// Confirms that a dragon hatched.
    DragonHatched {
        /// Identifier assigned to the dragon.
        dragon: DragonId,
        /// Position where the dragon is stationed.
        position: Vec2,
    },
    /// Confirms that a dragon received a new target.
    DragonRetargeted {
        /// Dragon that was retargeted.
        dragon: DragonId,
        /// New target, if any.
        target: Option<EnemyId>,
    },
    /// Confirms that a loot chest was opened.
    ChestOpened {
        /// Chest that opened.
        chest: ChestId,
        /// Loot table to roll.
        loot: LootTable,
    },
    /// Reports that a chest could not be opened.
    ChestRejected {
        /// Chest named by the request.
        chest: ChestId,
        /// Reason the request failed.
        reason: ChestError,
    },
    /// Announces that a wave began spawning.
    WaveStarted {
        /// Wave that started.
        wave: WaveIndex,
    },
    /// Announces that a wave finished spawning and every enemy was removed.
    WaveCleared {
        /// Wave that was cleared.
        wave: WaveIndex,
        /// Number of waves cleared so far, including this one.
        waves_cleared: u32,
    },
    /// Announces that the final wave was cleared.
    AllWavesCleared,
    /// Confirms that the game reached its outcome.
    GameConcluded {
        /// Recorded outcome.
        outcome: Outcome,
    },
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
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
    };
}

identifier! {
    /// Unique identifier assigned to an enemy.
    EnemyId
}

identifier! {
    /// Unique identifier assigned to a tower.
    TowerId
}

identifier! {
    /// Index of a build slot within the arena.
    SlotId
}

identifier! {
    /// Index of a tower blueprint within the arena.
    BlueprintId
}

identifier! {
    /// Index of an enemy path within the arena.
    PathId
}

identifier! {
    /// Index of an ore node within the arena.
    OreNodeId
}

identifier! {
    /// Index of a loot chest within the arena.
    ChestId
}

identifier! {
    /// Index of a potion recipe at the alchemy station.
    RecipeId
}

identifier! {
    /// Unique identifier assigned to a hatched dragon.
    DragonId
}

identifier! {
    /// Unique identifier assigned to a projectile in flight.
    ProjectileId
}

identifier! {
    /// Zero-based position of a wave in the schedule.
    WaveIndex
}

/// Parameters of a single enemy spawn request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySpawn {
    /// Base stats of the enemy.
    pub template: EnemyTemplate,
    /// Route the enemy follows.
    pub path: PathId,
    /// Entry position; the first waypoint of the path when absent.
    pub spawn_point: Option<Vec2>,
    /// Wave speed multiplier.
    pub speed_multiplier: f32,
    /// Wave health multiplier.
    pub health_multiplier: f32,
}

impl EnemySpawn {
    /// Creates a spawn request at the path start without multipliers.
    #[must_use]
    pub const fn new(template: EnemyTemplate, path: PathId) -> Self {
        Self {
            template,
            path,
            spawn_point: None,
            speed_multiplier: 1.0,
            health_multiplier: 1.0,
        }
    }
}

/// Shooter responsible for a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileSource {
    /// Projectile launched by a tower.
    Tower(TowerId),
    /// Projectile launched by a dragon.
    Dragon(DragonId),
}

/// Origin of gems credited to the wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GemSource {
    /// Reward for killing an enemy.
    Enemy,
    /// Ore mining.
    Ore,
    /// Wave reward chest.
    WaveChest,
    /// Loot chest.
    LootChest(ChestId),
    /// Refund from selling a tower.
    Refund,
    /// Granted directly by a scenario script.
    Script,
}

/// Kinds of potions the player can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PotionKind {
    /// Damages and paralyses every enemy in the arena.
    Lightning,
}

/// Reasons an enemy spawn may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnError {
    /// The requested path does not exist or has no waypoints.
    UnknownPath,
    /// The game already concluded.
    GameOver,
}

/// Reasons a tower build request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildError {
    /// No slot with the provided identifier exists.
    MissingSlot,
    /// The slot already holds a tower.
    Occupied,
    /// The slot does not offer the requested blueprint.
    BlueprintUnavailable,
    /// The wallet cannot cover the build cost.
    InsufficientGems,
    /// The game already concluded.
    GameOver,
}

/// Reasons a tower upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeError {
    /// No tower with the provided identifier exists.
    MissingTower,
    /// The tower is still under construction.
    UnderConstruction,
    /// The tower already reached its final level.
    MaxLevel,
    /// The wallet cannot cover the upgrade cost.
    InsufficientGems,
    /// The game already concluded.
    GameOver,
}

/// Reasons a tower sale may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SellError {
    /// No tower with the provided identifier exists.
    MissingTower,
    /// The game already concluded.
    GameOver,
}

/// Reasons a volley may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FireError {
    /// The shooter does not exist.
    MissingSource,
    /// The tower is still under construction.
    UnderConstruction,
    /// The shooter's cooldown has not elapsed.
    CoolingDown,
    /// None of the requested targets is alive.
    NoTargets,
    /// The game already concluded.
    GameOver,
}

/// Reasons a mining request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OreError {
    /// No node with the provided identifier exists.
    MissingNode,
    /// The node has no hits left.
    Depleted,
}

/// Reasons a crafting request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CraftError {
    /// The arena has no alchemy station.
    MissingStation,
    /// The station is already brewing.
    Busy,
    /// The station has no such recipe.
    UnknownRecipe,
    /// The wallet cannot cover the recipe cost.
    InsufficientGems,
}

/// Reasons a potion may not be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PotionError {
    /// No potion of the requested kind is held.
    NoneHeld,
    /// The game already concluded.
    GameOver,
}

/// Reasons an egg may not be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HatchError {
    /// The arena has no hatchery.
    MissingHatchery,
    /// An egg is already hatching.
    Busy,
    /// The wallet cannot cover the hatching cost.
    InsufficientGems,
}

/// Reasons a chest may not be opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChestError {
    /// No chest with the provided identifier exists.
    MissingChest,
    /// The chest was opened before.
    AlreadyOpened,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Wave the enemy belongs to.
    pub wave: WaveIndex,
    /// Current position.
    pub position: Vec2,
    /// Current health.
    pub health: f32,
    /// Maximum health after wave multipliers.
    pub max_health: f32,
    /// Speed after status effects.
    pub speed: f32,
}

/// Read-only snapshot describing all live enemies.
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

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a single enemy by identifier.
    #[must_use]
    pub fn get(&self, enemy: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&enemy, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Number of live enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no enemy is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Slot the tower occupies.
    pub slot: SlotId,
    /// Blueprint the tower was built from.
    pub blueprint: BlueprintId,
    /// Active level index.
    pub level: u32,
    /// Position of the tower.
    pub position: Vec2,
    /// Whether construction of the active level finished.
    pub built: bool,
    /// Time until the tower may fire again.
    pub ready_in: Duration,
    /// Targeting radius.
    pub range: f32,
    /// Maximum number of enemies engaged per volley.
    pub targets_per_shot: u32,
}

impl TowerSnapshot {
    /// Reports whether the tower may fire right now.
    #[must_use]
    pub fn can_fire(&self) -> bool {
        self.built && self.ready_in.is_zero()
    }
}

/// Read-only snapshot describing all towers in the arena.
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

    /// Looks up a single tower by identifier.
    #[must_use]
    pub fn get(&self, tower: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&tower, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single dragon's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragonSnapshot {
    /// Identifier allocated to the dragon by the world.
    pub id: DragonId,
    /// Position the dragon is stationed at.
    pub position: Vec2,
    /// Enemy currently pursued.
    pub target: Option<EnemyId>,
    /// Time until the dragon may fire again.
    pub ready_in: Duration,
    /// Time until an idle dragon looks for a new target.
    pub retarget_in: Duration,
}

/// Read-only snapshot describing all hatched dragons.
#[derive(Clone, Debug, Default)]
pub struct DragonView {
    snapshots: Vec<DragonSnapshot>,
}

impl DragonView {
    /// Creates a new dragon view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<DragonSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured dragon snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &DragonSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<DragonSnapshot> {
        self.snapshots
    }
}

/// Targets selected for a tower during the current frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TowerTarget {
    /// Tower that acquired the targets.
    pub tower: TowerId,
    /// Enemies within range, nearest first.
    pub enemies: Vec<EnemyId>,
}
