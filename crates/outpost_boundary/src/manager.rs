//! # Boundary Manager
//!
//! Periodically verifies that every tracked actor's position lies within
//! the configured region and issues a corrective relocation when it does
//! not, while respecting bypass permissions, suppressing re-triggers during
//! an active grace window, and tolerating actors that have become
//! unreachable mid-sweep.
//!
//! The grace window is the core anti-thrash mechanism: without it, an actor
//! oscillating near the region edge, or whose relocation target is itself
//! computed imprecisely, could be relocated every sweep indefinitely.
//!
//! `tick()` is intended to be invoked repeatedly by an external scheduler
//! (the world-update loop); the manager is not self-scheduling and none of
//! its operations suspend or block on I/O.

use crate::actor::{ActorHandle, PositionSource};
use crate::error::BoundaryError;
use crate::events::ActorRelocatedEvent;
use crate::settings::SettingsSource;
use dashmap::DashMap;
use outpost_event_system::{current_timestamp, EventBus, PlayerId, Position, RegionBounds};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Suppression window opened after each corrective relocation.
///
/// While active, further boundary violations by the same actor are ignored,
/// which prevents a relocation feedback loop.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(3000);

/// `last_sweep_ms` sentinel: no sweep has executed yet.
const NEVER_SWEPT: u64 = u64::MAX;

/// Keeps tracked actors inside the permitted region.
///
/// All synchronization is internal; `register_actor`/`unregister_actor`
/// may be called from connection-handling contexts concurrently with the
/// world-update context driving [`tick`](BoundaryManager::tick).
pub struct BoundaryManager {
    settings: Arc<dyn SettingsSource>,
    /// Actor handles, keyed by identity. Kept consistent with `positions`:
    /// entries are added and removed together.
    actors: DashMap<PlayerId, Arc<dyn ActorHandle>>,
    positions: DashMap<PlayerId, Arc<dyn PositionSource>>,
    /// Instant of each actor's last corrective relocation
    grace: DashMap<PlayerId, Instant>,
    grace_period: Duration,
    started: Instant,
    /// Milliseconds since `started` of the last executed sweep
    last_sweep_ms: AtomicU64,
    events: Option<Arc<EventBus>>,
}

impl BoundaryManager {
    /// Creates a manager that reads live settings from `settings`.
    pub fn new(settings: Arc<dyn SettingsSource>) -> Self {
        Self {
            settings,
            actors: DashMap::new(),
            positions: DashMap::new(),
            grace: DashMap::new(),
            grace_period: DEFAULT_GRACE_PERIOD,
            started: Instant::now(),
            last_sweep_ms: AtomicU64::new(NEVER_SWEPT),
            events: None,
        }
    }

    /// Publishes an [`ActorRelocatedEvent`] through `events` on every
    /// corrective relocation.
    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Overrides the suppression window opened after each relocation.
    ///
    /// Defaults to [`DEFAULT_GRACE_PERIOD`].
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Starts tracking an actor and checks it immediately.
    ///
    /// The immediate containment check keeps a newly joined actor from
    /// lingering out of bounds until the next scheduled sweep: if its
    /// current position is known and outside the region (and it holds no
    /// bypass), it is relocated right away and a grace window opens. A
    /// position that cannot be read at registration time is not retried;
    /// the next sweep picks the actor up naturally.
    pub fn register_actor(
        &self,
        id: PlayerId,
        position: Arc<dyn PositionSource>,
        actor: Arc<dyn ActorHandle>,
    ) {
        self.positions.insert(id, position.clone());
        self.actors.insert(id, actor.clone());
        debug!("tracking actor {}", id);

        let settings = self.settings.boundary_settings();
        if !settings.enforce {
            return;
        }
        if let Err(e) = self.check_actor(id, &*actor, &*position, &settings.bounds, false) {
            debug!("registration check for {} skipped: {}", id, e);
        }
    }

    /// Stops tracking an actor and discards any grace window.
    ///
    /// Safe to call for identities that were never registered.
    pub fn unregister_actor(&self, id: PlayerId) {
        let known = self.actors.remove(&id).is_some();
        self.positions.remove(&id);
        self.grace.remove(&id);
        if known {
            debug!("stopped tracking actor {}", id);
        }
    }

    /// Opens or refreshes a grace window for `id`, timestamped now.
    pub fn grant_grace(&self, id: PlayerId) {
        self.grace.insert(id, Instant::now());
    }

    /// Returns the current number of tracked actors.
    pub fn tracked_count(&self) -> usize {
        self.actors.len()
    }

    /// Runs one rate-limited enforcement pass.
    ///
    /// Returns immediately when enforcement is disabled, or when less than
    /// the configured check interval has elapsed since the last executed
    /// sweep. The last-sweep timestamp only advances on sweeps that
    /// actually execute; a compare-exchange decides which of several
    /// concurrent callers runs the sweep.
    pub fn tick(&self) {
        let settings = self.settings.boundary_settings();
        if !settings.enforce {
            return;
        }

        let now_ms = self.started.elapsed().as_millis() as u64;
        let last = self.last_sweep_ms.load(Ordering::Acquire);
        if last != NEVER_SWEPT && now_ms.saturating_sub(last) < settings.check_interval_ms {
            return;
        }
        if self
            .last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // Another context won the race and is sweeping.
            return;
        }

        self.sweep(&settings.bounds);
    }

    /// Checks every tracked actor once.
    ///
    /// The actor set is snapshotted up front so collaborator calls (and
    /// any event handlers they trigger) run without a table guard held.
    /// One actor's failure never aborts the sweep for the rest.
    fn sweep(&self, bounds: &RegionBounds) {
        let tracked: Vec<(PlayerId, Arc<dyn ActorHandle>)> = self
            .actors
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        trace!("boundary sweep over {} actors", tracked.len());

        for (id, actor) in tracked {
            let Some(position) = self.positions.get(&id).map(|p| Arc::clone(p.value())) else {
                // Unregistered between snapshot and check.
                continue;
            };
            if let Err(e) = self.check_actor(id, &*actor, &*position, bounds, true) {
                // Expected after disconnects; not worth log noise.
                debug!("boundary check skipped for {}: {}", id, e);
            }
        }
    }

    /// The single-actor enforcement policy.
    ///
    /// Skips actors with the bypass permission, actors inside an active
    /// grace window (sweep-time only), and actors whose position is
    /// currently unknown. A known out-of-bounds position triggers one
    /// relocation and opens a grace window.
    fn check_actor(
        &self,
        id: PlayerId,
        actor: &dyn ActorHandle,
        position: &dyn PositionSource,
        bounds: &RegionBounds,
        consult_grace: bool,
    ) -> Result<(), BoundaryError> {
        if actor.has_bypass()? {
            return Ok(());
        }
        if consult_grace && self.grace_active(id) {
            return Ok(());
        }
        let Some(current) = position.position()? else {
            return Ok(());
        };
        if bounds.contains(current) {
            return Ok(());
        }

        actor.relocate()?;
        self.grace.insert(id, Instant::now());
        info!("relocated actor {} from out-of-bounds {:?}", id, current);
        self.notify_relocated(id, current);
        Ok(())
    }

    /// Whether `id` has an active grace window, lazily evicting it once
    /// expired.
    fn grace_active(&self, id: PlayerId) -> bool {
        self.grace
            .remove_if(&id, |_, opened| opened.elapsed() > self.grace_period);
        self.grace.contains_key(&id)
    }

    fn notify_relocated(&self, id: PlayerId, position: Position) {
        if let Some(events) = &self.events {
            events.publish(&ActorRelocatedEvent {
                player_id: id,
                position,
                timestamp: current_timestamp(),
            });
        }
    }
}

impl std::fmt::Debug for BoundaryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundaryManager")
            .field("tracked", &self.actors.len())
            .field("grace_windows", &self.grace.len())
            .field("grace_period", &self.grace_period)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{BoundarySettings, SharedSettings};
    use outpost_event_system::create_event_bus;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::sync::Mutex;
    use std::thread::sleep;

    struct MockActor {
        id: PlayerId,
        bypass: AtomicBool,
        reachable: AtomicBool,
        relocations: AtomicUsize,
    }

    impl MockActor {
        fn new(id: PlayerId) -> Arc<Self> {
            Arc::new(Self {
                id,
                bypass: AtomicBool::new(false),
                reachable: AtomicBool::new(true),
                relocations: AtomicUsize::new(0),
            })
        }

        fn with_bypass(id: PlayerId) -> Arc<Self> {
            let actor = Self::new(id);
            actor.bypass.store(true, Ordering::SeqCst);
            actor
        }

        fn relocations(&self) -> usize {
            self.relocations.load(Ordering::SeqCst)
        }
    }

    impl ActorHandle for MockActor {
        fn has_bypass(&self) -> Result<bool, BoundaryError> {
            if !self.reachable.load(Ordering::SeqCst) {
                return Err(BoundaryError::ActorUnreachable(self.id));
            }
            Ok(self.bypass.load(Ordering::SeqCst))
        }

        fn relocate(&self) -> Result<(), BoundaryError> {
            self.relocations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct MockPosition {
        current: Mutex<Option<Position>>,
        failing: AtomicBool,
    }

    impl MockPosition {
        fn at(position: Position) -> Arc<Self> {
            Arc::new(Self {
                current: Mutex::new(Some(position)),
                failing: AtomicBool::new(false),
            })
        }

        fn unknown() -> Arc<Self> {
            Arc::new(Self {
                current: Mutex::new(None),
                failing: AtomicBool::new(false),
            })
        }

        fn set(&self, position: Position) {
            *self.current.lock().unwrap() = Some(position);
        }

        fn start_failing(&self) {
            self.failing.store(true, Ordering::SeqCst);
        }
    }

    impl PositionSource for MockPosition {
        fn position(&self) -> Result<Option<Position>, BoundaryError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(BoundaryError::WorldQuery("chunk not loaded".to_string()));
            }
            Ok(*self.current.lock().unwrap())
        }
    }

    fn test_settings(check_interval_ms: u64) -> Arc<SharedSettings> {
        Arc::new(SharedSettings::new(BoundarySettings {
            enforce: true,
            check_interval_ms,
            bounds: RegionBounds {
                min_x: -100.0,
                max_x: 100.0,
                min_y: 0.0,
                max_y: 256.0,
                min_z: -100.0,
                max_z: 100.0,
            },
        }))
    }

    fn inside() -> Position {
        Position::new(0.0, 64.0, 0.0)
    }

    fn outside() -> Position {
        Position::new(500.0, 64.0, 0.0)
    }

    #[test]
    fn registration_corrects_out_of_bounds_actor_immediately() {
        let manager = BoundaryManager::new(test_settings(0));
        let id = PlayerId::new();
        let actor = MockActor::new(id);

        manager.register_actor(id, MockPosition::at(outside()), actor.clone());
        assert_eq!(actor.relocations(), 1);

        // The registration correction opened a grace window.
        manager.tick();
        assert_eq!(actor.relocations(), 1);
    }

    #[test]
    fn grace_window_suppresses_repeat_relocations() {
        let manager =
            BoundaryManager::new(test_settings(0)).with_grace_period(Duration::from_millis(500));
        let id = PlayerId::new();
        let actor = MockActor::new(id);
        let position = MockPosition::at(inside());

        manager.register_actor(id, position.clone(), actor.clone());
        assert_eq!(actor.relocations(), 0);

        position.set(outside());
        manager.tick();
        assert_eq!(actor.relocations(), 1);

        // Still out of bounds, still inside the grace window.
        manager.tick();
        assert_eq!(actor.relocations(), 1);

        sleep(Duration::from_millis(600));
        manager.tick();
        assert_eq!(actor.relocations(), 2);
    }

    #[test]
    fn rate_limited_tick_is_a_pure_noop() {
        let manager = BoundaryManager::new(test_settings(60_000));
        let id = PlayerId::new();
        let actor = MockActor::new(id);
        let position = MockPosition::at(inside());

        manager.register_actor(id, position.clone(), actor.clone());
        manager.tick();
        assert_eq!(actor.relocations(), 0);

        // Newly out of bounds, but the interval has not elapsed.
        position.set(outside());
        manager.tick();
        assert_eq!(actor.relocations(), 0);
    }

    #[test]
    fn bypass_actor_is_never_relocated() {
        let manager = BoundaryManager::new(test_settings(0));
        let id = PlayerId::new();
        let actor = MockActor::with_bypass(id);

        manager.register_actor(id, MockPosition::at(outside()), actor.clone());
        for _ in 0..5 {
            manager.tick();
        }
        assert_eq!(actor.relocations(), 0);
    }

    #[test]
    fn unknown_position_is_skipped() {
        let manager = BoundaryManager::new(test_settings(0));
        let id = PlayerId::new();
        let actor = MockActor::new(id);

        manager.register_actor(id, MockPosition::unknown(), actor.clone());
        manager.tick();
        assert_eq!(actor.relocations(), 0);
    }

    #[test]
    fn one_failing_actor_does_not_abort_the_sweep() {
        let manager = BoundaryManager::new(test_settings(0));

        let broken_id = PlayerId::new();
        let broken = MockActor::new(broken_id);
        let broken_position = MockPosition::at(inside());
        manager.register_actor(broken_id, broken_position.clone(), broken.clone());
        broken_position.start_failing();

        let healthy_id = PlayerId::new();
        let healthy = MockActor::new(healthy_id);
        let healthy_position = MockPosition::at(inside());
        manager.register_actor(healthy_id, healthy_position.clone(), healthy.clone());

        broken_position.set(outside());
        healthy_position.set(outside());
        manager.tick();
        assert_eq!(healthy.relocations(), 1);
        assert_eq!(broken.relocations(), 0);
    }

    #[test]
    fn unreachable_actor_is_skipped_without_aborting() {
        let manager = BoundaryManager::new(test_settings(0));
        let id = PlayerId::new();
        let actor = MockActor::new(id);
        let position = MockPosition::at(inside());
        manager.register_actor(id, position.clone(), actor.clone());

        actor.reachable.store(false, Ordering::SeqCst);
        position.set(outside());
        manager.tick();
        assert_eq!(actor.relocations(), 0);
        assert_eq!(manager.tracked_count(), 1);
    }

    #[test]
    fn unregister_is_idempotent() {
        let manager = BoundaryManager::new(test_settings(0));
        let id = PlayerId::new();
        manager.register_actor(id, MockPosition::at(inside()), MockActor::new(id));
        assert_eq!(manager.tracked_count(), 1);

        manager.unregister_actor(PlayerId::new());
        assert_eq!(manager.tracked_count(), 1);

        manager.unregister_actor(id);
        assert_eq!(manager.tracked_count(), 0);
        manager.unregister_actor(id);
        assert_eq!(manager.tracked_count(), 0);
    }

    #[test]
    fn unregister_discards_the_grace_window() {
        let manager = BoundaryManager::new(test_settings(0));
        let id = PlayerId::new();
        let actor = MockActor::new(id);
        let position = MockPosition::at(outside());

        manager.register_actor(id, position.clone(), actor.clone());
        assert_eq!(actor.relocations(), 1);

        manager.unregister_actor(id);
        manager.register_actor(id, position, actor.clone());
        // Fresh registration, no inherited grace: corrected again.
        assert_eq!(actor.relocations(), 2);
    }

    #[test]
    fn grant_grace_suppresses_the_next_sweep() {
        let manager =
            BoundaryManager::new(test_settings(0)).with_grace_period(Duration::from_millis(500));
        let id = PlayerId::new();
        let actor = MockActor::new(id);
        let position = MockPosition::at(inside());
        manager.register_actor(id, position.clone(), actor.clone());

        position.set(outside());
        manager.grant_grace(id);
        manager.tick();
        assert_eq!(actor.relocations(), 0);

        sleep(Duration::from_millis(600));
        manager.tick();
        assert_eq!(actor.relocations(), 1);
    }

    #[test]
    fn settings_changes_apply_on_the_next_tick() {
        let settings = test_settings(0);
        let manager = BoundaryManager::new(settings.clone());
        let id = PlayerId::new();
        let actor = MockActor::new(id);
        let position = MockPosition::at(outside());

        let mut disabled = settings.boundary_settings();
        disabled.enforce = false;
        settings.update(disabled.clone());

        manager.register_actor(id, position.clone(), actor.clone());
        manager.tick();
        assert_eq!(actor.relocations(), 0);

        disabled.enforce = true;
        settings.update(disabled);
        manager.tick();
        assert_eq!(actor.relocations(), 1);
    }

    #[test]
    fn relocation_publishes_a_notification() {
        let events = create_event_bus();
        let received = Arc::new(Mutex::new(Vec::new()));

        let log = received.clone();
        events.on("relocation_log", move |event: &ActorRelocatedEvent| {
            log.lock().unwrap().push((event.player_id, event.position));
            Ok(())
        });

        let manager = BoundaryManager::new(test_settings(0)).with_event_bus(events);
        let id = PlayerId::new();
        manager.register_actor(id, MockPosition::at(outside()), MockActor::new(id));

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].0, id);
        assert_eq!(received[0].1, outside());
    }

    #[test]
    fn default_grace_period_is_three_seconds() {
        assert_eq!(DEFAULT_GRACE_PERIOD, Duration::from_millis(3000));
    }
}
