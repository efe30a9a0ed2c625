//! Per-player in-memory quest state.
//!
//! The cache is never the source of truth: it can be cleared at any time and
//! is rebuilt from the durable store on the next read. Entries are values,
//! every update produces a new [`CachedPlayerState`] and swaps it in under the
//! entry's lock so readers never see a half-applied change.

use dashmap::{DashMap, mapref::entry::Entry};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    state::stage::{GameStage, StarType},
};

/// One boolean per star, indexed by [`StarType::index`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StarFlags([bool; StarType::COUNT]);

impl StarFlags {
    /// Flag value for `star`.
    pub fn get(&self, star: StarType) -> bool {
        self.0[star.index()]
    }

    /// Copy of the flags with `star` set to `value`.
    pub fn with(mut self, star: StarType, value: bool) -> Self {
        self.0[star.index()] = value;
        self
    }

    /// Whether every star is flagged.
    pub fn all(&self) -> bool {
        self.0.iter().all(|flag| *flag)
    }

    /// Stars whose flag is set, in narrative order.
    pub fn stars(&self) -> Vec<StarType> {
        StarType::ALL
            .into_iter()
            .filter(|star| self.get(*star))
            .collect()
    }
}

impl FromIterator<StarType> for StarFlags {
    fn from_iter<I: IntoIterator<Item = StarType>>(iter: I) -> Self {
        iter.into_iter()
            .fold(StarFlags::default(), |flags, star| flags.with(star, true))
    }
}

/// Snapshot of a player's progress as held in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedPlayerState {
    /// Current narrative stage.
    pub stage: GameStage,
    /// Stars picked up.
    pub collected: StarFlags,
    /// Stars handed over.
    pub delivered: StarFlags,
}

impl CachedPlayerState {
    /// State of a player who has not done anything yet.
    pub fn fresh() -> Self {
        Self::at_stage(GameStage::INITIAL)
    }

    /// State at `stage` with no star collected or delivered.
    pub fn at_stage(stage: GameStage) -> Self {
        Self {
            stage,
            collected: StarFlags::default(),
            delivered: StarFlags::default(),
        }
    }

    /// Copy of the state moved to `stage`.
    pub fn with_stage(self, stage: GameStage) -> Self {
        Self { stage, ..self }
    }

    /// Copy of the state with both flags of `star` replaced.
    pub fn with_star(self, star: StarType, collected: bool, delivered: bool) -> Self {
        Self {
            collected: self.collected.with(star, collected),
            delivered: self.delivered.with(star, delivered),
            ..self
        }
    }

    /// Whether `star` has been picked up.
    pub fn is_collected(&self, star: StarType) -> bool {
        self.collected.get(star)
    }

    /// Whether `star` has been handed over.
    pub fn is_delivered(&self, star: StarType) -> bool {
        self.delivered.get(star)
    }
}

impl Default for CachedPlayerState {
    fn default() -> Self {
        Self::fresh()
    }
}

/// Transition applied to a cached entry while its lock is held.
pub type StateTransition<'a> =
    &'a (dyn Fn(CachedPlayerState) -> Result<CachedPlayerState, ServiceError> + Send + Sync);

/// Concurrent, per-player store of [`CachedPlayerState`].
///
/// Every mutation is atomic per player. Updates on a missing player start
/// from [`CachedPlayerState::fresh`] unless the caller passes a seed, so
/// callers never pre-create entries.
pub trait StateCache: Send + Sync {
    /// Cached state for `player_id`, `None` when the player is not cached yet.
    fn get(&self, player_id: Uuid) -> Option<CachedPlayerState>;

    /// Replace the player's entry with a fresh state at `initial_stage`.
    fn put(&self, player_id: Uuid, initial_stage: GameStage);

    /// Insert `state` unless an entry already exists, returning the entry that won.
    fn populate(&self, player_id: Uuid, state: CachedPlayerState) -> CachedPlayerState;

    /// Run `transition` on the player's entry and store its result.
    ///
    /// When the transition fails the entry is left untouched (and not created).
    fn apply(
        &self,
        player_id: Uuid,
        transition: StateTransition<'_>,
    ) -> Result<CachedPlayerState, ServiceError> {
        self.apply_or(player_id, CachedPlayerState::fresh(), transition)
    }

    /// Like [`StateCache::apply`], but a missing entry starts from `seed`.
    fn apply_or(
        &self,
        player_id: Uuid,
        seed: CachedPlayerState,
        transition: StateTransition<'_>,
    ) -> Result<CachedPlayerState, ServiceError>;

    /// Drop the player's entry, returning whether one existed.
    fn clear(&self, player_id: Uuid) -> bool;

    /// Number of cached players.
    fn size(&self) -> usize;

    /// Whether the player has a cached entry.
    fn contains(&self, player_id: Uuid) -> bool;

    /// Move the player to `stage`.
    fn update_stage(&self, player_id: Uuid, stage: GameStage) -> CachedPlayerState {
        let transition = |state: CachedPlayerState| Ok(state.with_stage(stage));
        self.apply(player_id, &transition)
            .unwrap_or_else(|_| CachedPlayerState::at_stage(stage))
    }

    /// Overwrite both flags of `star`.
    fn update_star_state(
        &self,
        player_id: Uuid,
        star: StarType,
        collected: bool,
        delivered: bool,
    ) -> CachedPlayerState {
        let transition = |state: CachedPlayerState| Ok(state.with_star(star, collected, delivered));
        self.apply(player_id, &transition).unwrap_or_else(|_| {
            CachedPlayerState::fresh().with_star(star, collected, delivered)
        })
    }
}

/// [`StateCache`] backed by a sharded concurrent map.
#[derive(Debug, Default)]
pub struct DashMapStateCache {
    entries: DashMap<Uuid, CachedPlayerState>,
}

impl DashMapStateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateCache for DashMapStateCache {
    fn get(&self, player_id: Uuid) -> Option<CachedPlayerState> {
        self.entries.get(&player_id).map(|entry| *entry)
    }

    fn put(&self, player_id: Uuid, initial_stage: GameStage) {
        self.entries
            .insert(player_id, CachedPlayerState::at_stage(initial_stage));
    }

    fn populate(&self, player_id: Uuid, state: CachedPlayerState) -> CachedPlayerState {
        *self.entries.entry(player_id).or_insert(state)
    }

    fn apply_or(
        &self,
        player_id: Uuid,
        seed: CachedPlayerState,
        transition: StateTransition<'_>,
    ) -> Result<CachedPlayerState, ServiceError> {
        match self.entries.entry(player_id) {
            Entry::Occupied(mut occupied) => {
                let next = transition(*occupied.get())?;
                occupied.insert(next);
                Ok(next)
            }
            Entry::Vacant(vacant) => {
                let next = transition(seed)?;
                vacant.insert(next);
                Ok(next)
            }
        }
    }

    fn clear(&self, player_id: Uuid) -> bool {
        self.entries.remove(&player_id).is_some()
    }

    fn size(&self) -> usize {
        self.entries.len()
    }

    fn contains(&self, player_id: Uuid) -> bool {
        self.entries.contains_key(&player_id)
    }
}
