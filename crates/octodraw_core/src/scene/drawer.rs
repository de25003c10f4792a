//! # Entity Drawer
//!
//! The central container for every drawable entity and its components.
//!
//! ## Frame Timeline
//!
//! ```text
//! simulation thread                      render thread
//! ─────────────────                      ─────────────
//! update_pos()          (swap buffers)
//! set_new_pos(e, p)     (per entity)
//! advance_simulation()  (facing)
//!                                        advance_render(dt)
//!                                          ├── resolve animation name
//!                                          ├── advance frame / end of clip
//!                                          └── transform + texture → backend
//! ```
//!
//! Every call takes the drawer lock for its whole duration, so a render pass
//! never observes a half-built entity graph.

use std::sync::Arc;

use parking_lot::Mutex;

use super::animation::{advance, finish_clip, resolve_name, ClipEnd, NameContext, Playback};
use super::component::{
    AnimName, AnimationState, DirectionalAnimation, DynamicAnimation, PositionIndex,
    RenderingInfo,
};
use super::direction::{Direction, DirectionHandler};
use super::entity::{EntityHandle, EntityRecord};
use super::payload::{EntityPayload, NoOpPayload};
use crate::backend::{FrameSource, RenderBackend, SurfaceRef, SurfaceTarget, TextureRef};
use crate::config::DrawerConfig;
use crate::error::{DrawerError, DrawerResult};
use crate::math::{Color, Vec2};
use crate::memory::{SlotHandle, SlotPool, Visit};

/// Statistics from one render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Entities pushed to the backend.
    pub drawn: usize,
    /// Entities without a drawable frame this tick.
    pub skipped: usize,
    /// One-shot entities destroyed at the end of their clip.
    pub destroyed: usize,
}

/// Alive slot counts of every drawer pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolCounts {
    /// Entity records.
    pub instances: usize,
    /// Animation states.
    pub animations: usize,
    /// Position slots.
    pub positions: usize,
    /// Direction handlers.
    pub dir_handlers: usize,
    /// Directional animations.
    pub dir_animations: usize,
    /// Dynamic animations.
    pub dyn_animations: usize,
    /// Picking surfaces.
    pub alt_infos: usize,
}

enum DrawOutcome {
    Drawn,
    Skipped,
    Destroyed,
    Gone,
}

/// Component handles copied out of a record for one draw.
#[derive(Clone, Copy)]
struct Parts {
    pos_idx: Option<SlotHandle>,
    animation: Option<SlotHandle>,
    dir_handler: Option<SlotHandle>,
    dir_animation: Option<SlotHandle>,
    dyn_animation: Option<SlotHandle>,
    alt_info: Option<SlotHandle>,
}

impl Parts {
    fn of(record: &EntityRecord) -> Self {
        Self {
            pos_idx: record.pos_idx,
            animation: record.animation,
            dir_handler: record.dir_handler,
            dir_animation: record.dir_animation,
            dyn_animation: record.dyn_animation,
            alt_info: record.alt_info,
        }
    }
}

struct DrawerState<B> {
    backend: B,
    config: DrawerConfig,

    instances: SlotPool<EntityRecord>,
    animations: SlotPool<AnimationState>,
    dir_handlers: SlotPool<DirectionHandler>,
    dir_animations: SlotPool<DirectionalAnimation>,
    dyn_animations: SlotPool<DynamicAnimation>,
    alt_infos: SlotPool<RenderingInfo>,
    pos_indexes: SlotPool<PositionIndex>,

    positions: crate::sync::PositionBuffers,
    /// Render time since creation.
    elapsed_all_time: f64,
    payload: Box<dyn EntityPayload>,
    /// Reused every pass so drawing does not allocate.
    draw_queue: Vec<SlotHandle>,
}

/// Draws and animates pooled sprite entities.
///
/// # Thread Safety
///
/// All state sits behind one mutex. Share the drawer with `Arc` between a
/// simulation thread and a render thread.
///
/// # Example
///
/// ```rust,ignore
/// let drawer = EntityDrawer::new(backend, DrawerConfig::default());
/// let body = drawer.add_instance(Vec2::ZERO, Vec2::ZERO, frames.clone(), "idle", "", false, false);
/// let hat = drawer.add_sub_instance(body, Vec2::new(0.0, -8.0), frames, "hat", "", false, true, true);
///
/// drawer.free_instance(body, false); // hat goes with it
/// ```
pub struct EntityDrawer<B: RenderBackend> {
    state: Mutex<DrawerState<B>>,
}

impl<B: RenderBackend> EntityDrawer<B> {
    /// Creates a drawer rendering through `backend`.
    #[must_use]
    pub fn new(backend: B, config: DrawerConfig) -> Self {
        let capacity = config.initial_capacity;
        Self {
            state: Mutex::new(DrawerState {
                backend,
                instances: SlotPool::with_capacity(capacity),
                animations: SlotPool::with_capacity(capacity),
                dir_handlers: SlotPool::with_capacity(capacity),
                dir_animations: SlotPool::with_capacity(capacity),
                dyn_animations: SlotPool::new(),
                alt_infos: SlotPool::new(),
                pos_indexes: SlotPool::with_capacity(capacity),
                positions: crate::sync::PositionBuffers::with_capacity(capacity),
                elapsed_all_time: 0.0,
                payload: Box::new(NoOpPayload),
                draw_queue: Vec::with_capacity(capacity),
                config,
            }),
        }
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Binds the payload side-table.
    ///
    /// # Errors
    ///
    /// [`DrawerError::PayloadRebind`] if any entity is alive; the current
    /// payload is kept.
    pub fn set_payload(&self, payload: Box<dyn EntityPayload>) -> DrawerResult<()> {
        let mut state = self.state.lock();
        let live = state.instances.len();
        if live > 0 {
            tracing::warn!(live, "refusing to rebind entity payload");
            return Err(DrawerError::PayloadRebind { live });
        }
        state.payload = payload;
        Ok(())
    }

    /// Runs `f` on the bound payload if it is a `P`.
    pub fn with_payload<P: EntityPayload, R>(&self, f: impl FnOnce(&mut P) -> R) -> Option<R> {
        let mut state = self.state.lock();
        state.payload.as_any_mut().downcast_mut::<P>().map(f)
    }

    /// Runs `f` on the rendering backend.
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        f(&mut self.state.lock().backend)
    }

    /// Sets the expected duration of a simulation tick. Non-positive and
    /// non-finite values are ignored.
    pub fn set_time_step(&self, time_step: f64) {
        if !(time_step.is_finite() && time_step > 0.0) {
            tracing::warn!(time_step, "ignoring invalid time step");
            return;
        }
        self.state.lock().config.time_step = time_step;
    }

    /// Sets the display scale applied to rendered positions.
    pub fn set_scale(&self, scale: f32) {
        self.state.lock().config.scale = scale;
    }

    /// Returns a copy of the current configuration.
    #[must_use]
    pub fn config(&self) -> DrawerConfig {
        self.state.lock().config.clone()
    }

    // =========================================================================
    // Creating instances
    // =========================================================================

    /// Creates a main instance with its own position slot.
    #[allow(clippy::too_many_arguments)]
    pub fn add_instance(
        &self,
        position: Vec2,
        offset: Vec2,
        frames: Arc<dyn FrameSource>,
        current_animation: impl Into<AnimName>,
        next_animation: impl Into<AnimName>,
        one_shot: bool,
        in_front: bool,
    ) -> EntityHandle {
        let mut state = self.state.lock();

        let pos_idx = state.pos_indexes.recycle_instance();
        let idx = pos_idx.index() as usize;
        if let Ok(slot) = state.pos_indexes.get_mut(pos_idx) {
            slot.idx = idx;
        }
        state.positions.place(idx, position);

        let animation = state.alloc_animation(
            offset,
            frames,
            current_animation.into(),
            next_animation.into(),
            one_shot,
            in_front,
        );

        state.insert_entity(EntityRecord {
            pos_idx: Some(pos_idx),
            animation: Some(animation),
            ..EntityRecord::default()
        })
    }

    /// Creates an attachment sharing the position of `parent`.
    ///
    /// Returns [`EntityHandle::NULL`] if `parent` is not alive.
    #[allow(clippy::too_many_arguments)]
    pub fn add_sub_instance(
        &self,
        parent: EntityHandle,
        offset: Vec2,
        frames: Arc<dyn FrameSource>,
        current_animation: impl Into<AnimName>,
        next_animation: impl Into<AnimName>,
        one_shot: bool,
        in_front: bool,
        inherit_direction: bool,
    ) -> EntityHandle {
        self.try_add_sub_instance(
            parent,
            offset,
            frames,
            current_animation,
            next_animation,
            one_shot,
            in_front,
            inherit_direction,
        )
        .unwrap_or_else(|err| {
            tracing::debug!(%err, "sub instance not created");
            EntityHandle::NULL
        })
    }

    /// Like [`add_sub_instance`](Self::add_sub_instance), reporting why
    /// creation failed.
    ///
    /// # Errors
    ///
    /// [`DrawerError::InvalidParent`] if `parent` is not alive.
    #[allow(clippy::too_many_arguments)]
    pub fn try_add_sub_instance(
        &self,
        parent: EntityHandle,
        offset: Vec2,
        frames: Arc<dyn FrameSource>,
        current_animation: impl Into<AnimName>,
        next_animation: impl Into<AnimName>,
        one_shot: bool,
        in_front: bool,
        inherit_direction: bool,
    ) -> DrawerResult<EntityHandle> {
        let mut state = self.state.lock();

        let Ok(parent_record) = state.instances.get(parent.slot()) else {
            return Err(DrawerError::InvalidParent {
                index: parent.index(),
                generation: parent.generation(),
            });
        };
        let pos_idx = parent_record.pos_idx;
        let dir_handler = parent_record
            .dir_handler
            .filter(|handle| inherit_direction && state.dir_handlers.is_valid(*handle));
        // Attachments start on the parent's directed names to render in sync
        let parent_base = parent_record
            .dir_animation
            .and_then(|handle| state.dir_animations.get(handle).ok())
            .map(|directed| Arc::clone(&directed.base_name));

        let current_animation = current_animation.into();
        let dir_animation = dir_handler.map(|_| {
            let base = parent_base.unwrap_or_else(|| Arc::clone(&current_animation));
            state
                .dir_animations
                .new_instance(DirectionalAnimation::new(base))
        });
        let animation = state.alloc_animation(
            offset,
            frames,
            current_animation,
            next_animation.into(),
            one_shot,
            in_front,
        );

        let handle = state.insert_entity(EntityRecord {
            pos_idx,
            animation: Some(animation),
            dir_handler,
            dir_animation,
            main_instance: Some(parent),
            ..EntityRecord::default()
        });
        if let Ok(parent_record) = state.instances.get_mut(parent.slot()) {
            parent_record.sub_instances.push(handle);
        }
        Ok(handle)
    }

    /// Frees an entity and, recursively, its attachments.
    ///
    /// `skip_unlink` leaves the main instance's attachment list untouched;
    /// it is set when the main instance itself is being torn down. Freeing a
    /// stale handle is a no-op.
    pub fn free_instance(&self, entity: EntityHandle, skip_unlink: bool) {
        self.state.lock().free_entity(entity, skip_unlink);
    }

    // =========================================================================
    // Direction handling
    // =========================================================================

    /// Sets the explicit facing intent of the entity's direction handler.
    pub fn set_direction(&self, entity: EntityHandle, direction: Vec2) {
        let mut state = self.state.lock();
        let Some(handler) = state.parts(entity).and_then(|parts| parts.dir_handler) else {
            return;
        };
        if let Ok(handler) = state.dir_handlers.get_mut(handler) {
            handler.direction = direction;
        }
    }

    /// Attaches a direction handler to a main instance.
    ///
    /// No-op if one is already attached or if `entity` is an attachment.
    pub fn add_direction_handler(&self, entity: EntityHandle, has_up_down: bool) {
        let mut state = self.state.lock();
        let state = &mut *state;
        let Ok(record) = state.instances.get(entity.slot()) else {
            tracing::debug!(?entity, "add_direction_handler on stale entity");
            return;
        };
        if record.is_sub_instance()
            || record
                .dir_handler
                .is_some_and(|handle| state.dir_handlers.is_valid(handle))
        {
            return;
        }
        let Some(current) = record
            .animation
            .and_then(|handle| state.animations.get(handle).ok())
            .map(|anim| Arc::clone(&anim.current_animation))
        else {
            return;
        };

        let handler = state
            .dir_handlers
            .new_instance(DirectionHandler::new(has_up_down, record.pos_idx));
        let dir_animation = match record.dir_animation {
            Some(handle) if state.dir_animations.is_valid(handle) => {
                if let Ok(directed) = state.dir_animations.get_mut(handle) {
                    directed.refresh(&current);
                }
                handle
            }
            _ => state
                .dir_animations
                .new_instance(DirectionalAnimation::new(current)),
        };

        if let Ok(record) = state.instances.get_mut(entity.slot()) {
            record.dir_handler = Some(handler);
            record.dir_animation = Some(dir_animation);
        }
    }

    /// Detaches the direction handler of a main instance.
    ///
    /// Attachments sharing it see a stale handle and stop using it.
    pub fn remove_direction_handler(&self, entity: EntityHandle) {
        let mut state = self.state.lock();
        let state = &mut *state;
        let Ok(record) = state.instances.get_mut(entity.slot()) else {
            return;
        };
        if record.is_sub_instance() {
            return;
        }
        let handler = record.dir_handler.take();
        let dir_animation = record.dir_animation.take();
        if let Some(handle) = handler {
            state.dir_handlers.free_instance(handle);
        }
        if let Some(handle) = dir_animation {
            state.dir_animations.free_instance(handle);
        }
    }

    // =========================================================================
    // Optional components
    // =========================================================================

    /// Attaches an idle/moving animation pair. No-op if one is attached.
    pub fn add_dynamic_animation(
        &self,
        entity: EntityHandle,
        idle_animation: impl Into<AnimName>,
        moving_animation: impl Into<AnimName>,
    ) {
        let mut state = self.state.lock();
        let Some(parts) = state.parts(entity) else {
            return;
        };
        if parts
            .dyn_animation
            .is_some_and(|handle| state.dyn_animations.is_valid(handle))
        {
            return;
        }
        let handle = state.dyn_animations.new_instance(DynamicAnimation::new(
            idle_animation.into(),
            moving_animation.into(),
        ));
        if let Ok(record) = state.instances.get_mut(entity.slot()) {
            record.dyn_animation = Some(handle);
        }
    }

    /// Attaches a picking surface colored with the entity index.
    /// No-op if one is attached or if the index has no pick color.
    pub fn add_pickable(&self, entity: EntityHandle) {
        let mut state = self.state.lock();
        let state = &mut *state;
        let Some(parts) = state.parts(entity) else {
            return;
        };
        if parts
            .alt_info
            .is_some_and(|handle| state.alt_infos.is_valid(handle))
        {
            return;
        }
        let Some(color) = Color::try_from_index(entity.index()) else {
            tracing::warn!(index = entity.index(), "entity index does not fit a pick color");
            return;
        };

        let handle = state.alt_infos.recycle_instance();
        let Ok(info) = state.alt_infos.get_mut(handle) else {
            return;
        };
        let surface = *info
            .surface
            .get_or_insert_with(|| state.backend.create_surface(SurfaceTarget::Picking));
        state.backend.set_pick_color(surface, color);

        if let Ok(record) = state.instances.get_mut(entity.slot()) {
            record.alt_info = Some(handle);
        }
    }

    /// Detaches the picking surface. No-op if none is attached.
    pub fn remove_pickable(&self, entity: EntityHandle) {
        let mut state = self.state.lock();
        let Ok(record) = state.instances.get_mut(entity.slot()) else {
            return;
        };
        if let Some(handle) = record.alt_info.take() {
            state.release_alt_info(handle);
        }
    }

    // =========================================================================
    // Animation getters/setters
    // =========================================================================

    /// Replaces the current and next animation and clears priority.
    pub fn set_animation(
        &self,
        entity: EntityHandle,
        current_animation: impl Into<AnimName>,
        next_animation: impl Into<AnimName>,
    ) {
        self.state.lock().restart_animation(
            entity,
            current_animation.into(),
            next_animation.into(),
            false,
            false,
        );
    }

    /// Replaces the current and next animation, taking precedence over the
    /// dynamic idle/moving pair.
    pub fn set_priority_animation(
        &self,
        entity: EntityHandle,
        current_animation: impl Into<AnimName>,
        next_animation: impl Into<AnimName>,
    ) {
        self.state.lock().restart_animation(
            entity,
            current_animation.into(),
            next_animation.into(),
            false,
            true,
        );
    }

    /// Plays an animation once, then destroys the entity.
    pub fn set_animation_one_shot(
        &self,
        entity: EntityHandle,
        current_animation: impl Into<AnimName>,
        priority: bool,
    ) {
        self.state.lock().restart_animation(
            entity,
            current_animation.into(),
            super::component::empty_name(),
            true,
            priority,
        );
    }

    /// Animation requested for the entity.
    ///
    /// # Errors
    ///
    /// [`DrawerError::InvalidHandle`] if the entity is not alive.
    pub fn get_animation(&self, entity: EntityHandle) -> DrawerResult<AnimName> {
        let state = self.state.lock();
        let anim = state.animation_of(entity)?;
        Ok(Arc::clone(&anim.current_animation))
    }

    /// Animation that would be displayed on the next render tick.
    ///
    /// # Errors
    ///
    /// [`DrawerError::InvalidHandle`] if the entity is not alive.
    pub fn displayed_animation(&self, entity: EntityHandle) -> DrawerResult<AnimName> {
        let state = self.state.lock();
        let parts = state
            .parts(entity)
            .ok_or_else(|| entity.slot().invalid_error())?;
        let anim = state.animation_of(entity)?;
        Ok(state.resolve(parts, anim))
    }

    /// Frame currently displayed by the entity.
    ///
    /// # Errors
    ///
    /// [`DrawerError::InvalidHandle`] if the entity is not alive.
    pub fn frame_index(&self, entity: EntityHandle) -> DrawerResult<usize> {
        Ok(self.state.lock().animation_of(entity)?.frame_index)
    }

    // =========================================================================
    // Position handling
    // =========================================================================

    /// Writes the position the entity reaches at the end of this tick.
    pub fn set_new_pos(&self, entity: EntityHandle, position: Vec2) {
        let mut state = self.state.lock();
        let Some(idx) = state.position_index(entity) else {
            tracing::debug!(?entity, "set_new_pos on stale entity");
            return;
        };
        state.positions.set_new(idx, position);
    }

    /// Position the entity had at the start of this tick.
    ///
    /// # Errors
    ///
    /// [`DrawerError::InvalidHandle`] if the entity is not alive.
    pub fn get_old_pos(&self, entity: EntityHandle) -> DrawerResult<Vec2> {
        let state = self.state.lock();
        state
            .position_index(entity)
            .and_then(|idx| state.positions.old(idx))
            .ok_or_else(|| entity.slot().invalid_error())
    }

    /// Starts a new interpolation interval. Call once per simulation tick,
    /// before writing the new positions.
    pub fn update_pos(&self) {
        self.state.lock().positions.swap();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Checks if an entity is alive.
    #[must_use]
    pub fn is_alive(&self, entity: EntityHandle) -> bool {
        self.state.lock().instances.is_valid(entity.slot())
    }

    /// Number of alive entities, attachments included.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.state.lock().instances.len()
    }

    /// Alive slot counts of every pool.
    #[must_use]
    pub fn pool_counts(&self) -> PoolCounts {
        let state = self.state.lock();
        PoolCounts {
            instances: state.instances.len(),
            animations: state.animations.len(),
            positions: state.pos_indexes.len(),
            dir_handlers: state.dir_handlers.len(),
            dir_animations: state.dir_animations.len(),
            dyn_animations: state.dyn_animations.len(),
            alt_infos: state.alt_infos.len(),
        }
    }

    /// Attachments of an entity, empty if it is not alive.
    #[must_use]
    pub fn sub_instances(&self, entity: EntityHandle) -> Vec<EntityHandle> {
        self.state
            .lock()
            .instances
            .get(entity.slot())
            .map(|record| record.sub_instances.clone())
            .unwrap_or_default()
    }

    /// Committed facing, `None` without a live direction handler.
    #[must_use]
    pub fn direction(&self, entity: EntityHandle) -> Option<Direction> {
        self.state.lock().handler_of(entity).map(|handler| handler.current)
    }

    /// Idle state, `None` without a live direction handler.
    #[must_use]
    pub fn is_idle(&self, entity: EntityHandle) -> Option<bool> {
        self.state.lock().handler_of(entity).map(|handler| handler.idle)
    }

    // =========================================================================
    // Ticks
    // =========================================================================

    /// Runs the direction classifier of every handler. Call once per
    /// simulation tick, after the new positions are written.
    pub fn advance_simulation(&self) {
        let mut state = self.state.lock();
        let DrawerState {
            dir_handlers,
            pos_indexes,
            positions,
            config,
            ..
        } = &mut *state;

        dir_handlers.for_each(|_, handler| {
            let movement = handler
                .pos_idx
                .and_then(|handle| pos_indexes.get(handle).ok())
                .map_or(Vec2::ZERO, |slot| positions.delta(slot.idx));
            handler.tick(
                movement,
                config.direction_commit_threshold,
                config.idle_commit_threshold,
            );
            Visit::Keep
        });
    }

    /// Advances every animation by `delta` seconds and draws the result.
    pub fn advance_render(&self, delta: f64) -> RenderStats {
        let mut state = self.state.lock();
        state.positions.advance(delta);
        state.elapsed_all_time += delta;

        let mut queue = std::mem::take(&mut state.draw_queue);
        queue.clear();
        queue.extend(state.instances.handles());

        let mut stats = RenderStats::default();
        for slot in &queue {
            match state.draw_entity(*slot) {
                DrawOutcome::Drawn => stats.drawn += 1,
                DrawOutcome::Skipped => stats.skipped += 1,
                DrawOutcome::Destroyed => stats.destroyed += 1,
                DrawOutcome::Gone => {}
            }
        }
        state.draw_queue = queue;

        tracing::trace!(
            drawn = stats.drawn,
            skipped = stats.skipped,
            destroyed = stats.destroyed,
            "render pass"
        );
        stats
    }
}

impl<B: RenderBackend> Drop for EntityDrawer<B> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        let surfaces = state
            .animations
            .storage_mut()
            .filter_map(|anim| anim.info.surface.take())
            .chain(
                state
                    .alt_infos
                    .storage_mut()
                    .filter_map(|info| info.surface.take()),
            )
            .collect::<Vec<SurfaceRef>>();
        for surface in surfaces {
            state.backend.destroy(surface);
        }
    }
}

impl<B: RenderBackend> DrawerState<B> {
    fn parts(&self, entity: EntityHandle) -> Option<Parts> {
        self.instances.get(entity.slot()).ok().map(Parts::of)
    }

    fn animation_of(&self, entity: EntityHandle) -> DrawerResult<&AnimationState> {
        let record = self.instances.get(entity.slot())?;
        let handle = record
            .animation
            .ok_or_else(|| entity.slot().invalid_error())?;
        self.animations.get(handle)
    }

    fn handler_of(&self, entity: EntityHandle) -> Option<&DirectionHandler> {
        let handle = self.parts(entity)?.dir_handler?;
        self.dir_handlers.get(handle).ok()
    }

    fn position_index(&self, entity: EntityHandle) -> Option<usize> {
        let handle = self.parts(entity)?.pos_idx?;
        self.pos_indexes.get(handle).ok().map(|slot| slot.idx)
    }

    fn resolve(&self, parts: Parts, anim: &AnimationState) -> AnimName {
        resolve_with(
            parts,
            anim,
            &self.dir_animations,
            &self.dyn_animations,
            &self.dir_handlers,
        )
    }

    fn alloc_animation(
        &mut self,
        offset: Vec2,
        frames: Arc<dyn FrameSource>,
        current: AnimName,
        next: AnimName,
        one_shot: bool,
        in_front: bool,
    ) -> SlotHandle {
        let now = self.elapsed_all_time;
        let handle = self.animations.recycle_instance();
        let Ok(anim) = self.animations.get_mut(handle) else {
            return handle;
        };

        anim.offset = offset;
        anim.frames = Some(frames);
        anim.restart(current, next, now);
        anim.one_shot = one_shot;
        anim.has_priority = false;

        let backend = &mut self.backend;
        let surface = *anim
            .info
            .surface
            .get_or_insert_with(|| backend.create_surface(SurfaceTarget::Main));
        backend.set_draw_in_front(surface, in_front);
        handle
    }

    fn insert_entity(&mut self, record: EntityRecord) -> EntityHandle {
        let handle = EntityHandle::from(self.instances.new_instance(record));
        self.payload.add_payload(handle.index());
        handle
    }

    fn release_alt_info(&mut self, handle: SlotHandle) {
        if let Ok(info) = self.alt_infos.get(handle) {
            if let Some(surface) = info.surface {
                self.backend.clear(surface);
            }
        }
        self.alt_infos.free_instance(handle);
    }

    fn free_entity(&mut self, entity: EntityHandle, skip_unlink: bool) {
        let Ok(record) = self.instances.get_mut(entity.slot()) else {
            tracing::debug!(?entity, "free_instance on stale entity");
            return;
        };
        let record = std::mem::take(record);

        if let Some(handle) = record.animation {
            if let Ok(anim) = self.animations.get_mut(handle) {
                anim.frames = None;
                if let Some(surface) = anim.info.surface {
                    self.backend.clear(surface);
                }
            }
            self.animations.free_instance(handle);
        }
        if let Some(handle) = record.dir_animation {
            self.dir_animations.free_instance(handle);
        }
        if let Some(handle) = record.dyn_animation {
            self.dyn_animations.free_instance(handle);
        }
        if let Some(handle) = record.alt_info {
            self.release_alt_info(handle);
        }

        for sub in &record.sub_instances {
            self.free_entity(*sub, true);
        }

        match record.main_instance {
            Some(main) => {
                if !skip_unlink {
                    if let Ok(main_record) = self.instances.get_mut(main.slot()) {
                        main_record.sub_instances.retain(|sub| *sub != entity);
                    }
                }
            }
            None => {
                if let Some(handle) = record.pos_idx {
                    self.pos_indexes.free_instance(handle);
                }
                if let Some(handle) = record.dir_handler {
                    self.dir_handlers.free_instance(handle);
                }
            }
        }

        self.payload.free_payload(entity.index());
        self.instances.free_instance(entity.slot());
    }

    fn restart_animation(
        &mut self,
        entity: EntityHandle,
        current: AnimName,
        next: AnimName,
        one_shot: bool,
        priority: bool,
    ) {
        let now = self.elapsed_all_time;
        let Some(parts) = self.parts(entity) else {
            tracing::debug!(?entity, "animation change on stale entity");
            return;
        };
        let Some(anim) = parts
            .animation
            .and_then(|handle| self.animations.get_mut(handle).ok())
        else {
            return;
        };

        anim.restart(current, next, now);
        anim.one_shot = one_shot;
        anim.has_priority = priority;

        if let Some(directed) = parts
            .dir_animation
            .and_then(|handle| self.dir_animations.get_mut(handle).ok())
        {
            directed.refresh(&anim.current_animation);
        }
    }

    fn draw_entity(&mut self, slot: SlotHandle) -> DrawOutcome {
        let entity = EntityHandle::from(slot);
        let Some(parts) = self.parts(entity) else {
            return DrawOutcome::Gone;
        };
        let Some(anim) = parts
            .animation
            .and_then(|handle| self.animations.get_mut(handle).ok())
        else {
            return DrawOutcome::Skipped;
        };
        let Some(frames) = anim.frames.clone() else {
            return DrawOutcome::Skipped;
        };
        let now = self.elapsed_all_time;

        let mut name = resolve_with(
            parts,
            anim,
            &self.dir_animations,
            &self.dyn_animations,
            &self.dir_handlers,
        );
        if frames.frame_count(&name) == 0 {
            return DrawOutcome::Skipped;
        }

        if advance(anim, frames.as_ref(), &name, now) == Playback::Finished {
            let has_dynamic = parts
                .dyn_animation
                .is_some_and(|handle| self.dyn_animations.is_valid(handle));
            match finish_clip(anim, has_dynamic, now) {
                ClipEnd::Destroy => {
                    self.free_entity(entity, false);
                    return DrawOutcome::Destroyed;
                }
                ClipEnd::Chain | ClipEnd::ResetDynamic => {
                    if let Some(directed) = parts
                        .dir_animation
                        .and_then(|handle| self.dir_animations.get_mut(handle).ok())
                    {
                        directed.refresh(&anim.current_animation);
                    }
                    name = resolve_with(
                        parts,
                        anim,
                        &self.dir_animations,
                        &self.dyn_animations,
                        &self.dir_handlers,
                    );
                    if frames.frame_count(&name) == 0 {
                        return DrawOutcome::Skipped;
                    }
                }
                ClipEnd::Loop => {}
            }
        }

        let texture = frames.frame_texture(&name, anim.frame_index);
        let offset = anim.offset;
        let surface = anim.info.surface;

        let position = parts
            .pos_idx
            .and_then(|handle| self.pos_indexes.get(handle).ok())
            .map_or(Vec2::ZERO, |slot| {
                self.positions.interpolate(slot.idx, self.config.time_step)
            })
            * self.config.scale;

        if let Some(surface) = surface {
            self.paint(surface, position, texture, offset);
        }
        let alt_surface = parts
            .alt_info
            .and_then(|handle| self.alt_infos.get(handle).ok())
            .and_then(|info| info.surface);
        if let Some(surface) = alt_surface {
            self.paint(surface, position, texture, offset);
        }
        DrawOutcome::Drawn
    }

    fn paint(
        &mut self,
        surface: SurfaceRef,
        position: Vec2,
        texture: Option<TextureRef>,
        offset: Vec2,
    ) {
        self.backend.set_transform(surface, position);
        self.backend.clear(surface);
        // Empty frames are legal in a sprite sheet
        if let Some(texture) = texture {
            self.backend.draw(surface, texture, offset);
        }
    }
}

fn resolve_with(
    parts: Parts,
    anim: &AnimationState,
    dir_animations: &SlotPool<DirectionalAnimation>,
    dyn_animations: &SlotPool<DynamicAnimation>,
    dir_handlers: &SlotPool<DirectionHandler>,
) -> AnimName {
    let context = NameContext {
        dir_animation: parts
            .dir_animation
            .and_then(|handle| dir_animations.get(handle).ok()),
        dyn_animation: parts
            .dyn_animation
            .and_then(|handle| dyn_animations.get(handle).ok()),
        handler: parts
            .dir_handler
            .and_then(|handle| dir_handlers.get(handle).ok()),
    };
    resolve_name(anim, &context)
}
