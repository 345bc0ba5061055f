//! Entities and their component stores
//!
//! Each entity owns a small arena of component slots. A component is
//! reachable two ways: by bare kind (the *primary* instance) or by kind plus
//! instance id. The first component added for a kind becomes its primary;
//! later named instances never displace it unless a replacement is asked for.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::ball::Ball;
use super::component::{Component, ComponentData, ComponentKind, Physics, RenderHandle};
use super::outbox::Outbox;
use super::paddle::Paddle;
use crate::Side;

/// Name of one component instance on an entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for InstanceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    kind: ComponentKind,
    /// `None` once the named entry was removed but the slot still backs the
    /// primary alias
    instance: Option<InstanceId>,
    /// Name the slot had before it was orphaned
    former: Option<InstanceId>,
    component: Component,
}

/// Arena of component slots addressed by integer handles
#[derive(Debug, Clone, Default)]
pub struct ComponentStore {
    slots: Vec<Option<Slot>>,
    free: Vec<usize>,
    primary: [Option<usize>; ComponentKind::COUNT],
    named: HashMap<(ComponentKind, InstanceId), usize>,
    next_instance: u32,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component, returning its instance id
    ///
    /// Generates an id when none is given. Becomes the primary instance if
    /// the kind has none yet. Re-using an existing id overwrites that
    /// instance in place.
    pub fn add_component(&mut self, component: Component, instance: Option<&str>) -> InstanceId {
        let kind = component.kind();
        let id = match instance {
            Some(name) => InstanceId::from(name),
            None => self.generate_id(kind),
        };

        if let Some(&idx) = self.named.get(&(kind, id.clone())) {
            if let Some(slot) = self.slots[idx].as_mut() {
                slot.component = component;
            }
            return id;
        }

        let idx = self.alloc(Slot {
            kind,
            instance: Some(id.clone()),
            former: None,
            component,
        });
        self.named.insert((kind, id.clone()), idx);
        match self.primary[kind.index()] {
            None => self.primary[kind.index()] = Some(idx),
            // Re-adding the removed instance behind the alias takes the alias back
            Some(prev) if self.slots[prev].as_ref().is_some_and(|s| s.former.as_ref() == Some(&id)) => {
                self.release(prev);
                self.primary[kind.index()] = Some(idx);
            }
            Some(_) => {}
        }
        id
    }

    /// Primary instance when `instance` is `None`, named instance otherwise
    pub fn get_component(&self, kind: ComponentKind, instance: Option<&str>) -> Option<&Component> {
        let idx = self.slot_index(kind, instance)?;
        self.slots[idx].as_ref().map(|slot| &slot.component)
    }

    pub fn get_component_mut(
        &mut self,
        kind: ComponentKind,
        instance: Option<&str>,
    ) -> Option<&mut Component> {
        let idx = self.slot_index(kind, instance)?;
        self.slots[idx].as_mut().map(|slot| &mut slot.component)
    }

    /// Every instance of a kind, primary and named. Order is unspecified.
    pub fn components_by_type(&self, kind: ComponentKind) -> Vec<&Component> {
        self.slots
            .iter()
            .flatten()
            .filter(|slot| slot.kind == kind)
            .map(|slot| &slot.component)
            .collect()
    }

    pub fn has_component(&self, kind: ComponentKind, instance: Option<&str>) -> bool {
        self.slot_index(kind, instance).is_some()
    }

    /// Remove one named instance, or every instance of the kind
    ///
    /// With an id, only that named entry goes away; if it backed the primary
    /// alias, the alias keeps resolving until the kind is removed without an
    /// id, replaced, or the same name is added again. Without an id, all
    /// instances and the alias go.
    pub fn remove_component(&mut self, kind: ComponentKind, instance: Option<&str>) -> bool {
        match instance {
            Some(name) => {
                let Some(idx) = self.named.remove(&(kind, InstanceId::from(name))) else {
                    return false;
                };
                if self.primary[kind.index()] == Some(idx) {
                    if let Some(slot) = self.slots[idx].as_mut() {
                        slot.former = slot.instance.take();
                    }
                } else {
                    self.release(idx);
                }
                true
            }
            None => {
                let mut removed = false;
                let indices: Vec<usize> = self
                    .slots
                    .iter()
                    .enumerate()
                    .filter_map(|(idx, slot)| slot.as_ref().filter(|s| s.kind == kind).map(|_| idx))
                    .collect();
                for idx in indices {
                    self.release(idx);
                    removed = true;
                }
                self.named.retain(|(k, _), _| *k != kind);
                self.primary[kind.index()] = None;
                removed
            }
        }
    }

    /// Swap a component for a new one, returning the old value
    ///
    /// Without an id the primary instance is swapped (or added if missing).
    /// With an id the named instance is swapped (or added), and it becomes the
    /// primary only when it is the sole surviving named instance of its kind.
    pub fn replace_component(
        &mut self,
        component: Component,
        instance: Option<&str>,
    ) -> Option<Component> {
        let kind = component.kind();
        let Some(name) = instance else {
            return match self.primary[kind.index()].and_then(|idx| self.slots[idx].as_mut()) {
                Some(slot) => Some(std::mem::replace(&mut slot.component, component)),
                None => {
                    self.add_component(component, None);
                    None
                }
            };
        };

        let id = InstanceId::from(name);
        let old = match self.named.get(&(kind, id.clone())).copied() {
            Some(idx) => self.slots[idx]
                .as_mut()
                .map(|slot| std::mem::replace(&mut slot.component, component)),
            None => {
                self.add_component(component, Some(name));
                None
            }
        };

        let survivors: Vec<usize> = self
            .named
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, &idx)| idx)
            .collect();
        if let [only] = survivors.as_slice() {
            let only = *only;
            if let Some(prev) = self.primary[kind.index()].filter(|&p| p != only) {
                // Drop an alias slot left behind by an earlier named removal
                if self.slots[prev].as_ref().is_some_and(|s| s.instance.is_none()) {
                    self.release(prev);
                }
            }
            self.primary[kind.index()] = Some(only);
        }
        old
    }

    /// Primary instance of a component type
    pub fn get<T: ComponentData>(&self) -> Option<&T> {
        self.get_component(T::KIND, None).and_then(T::from_component)
    }

    pub fn get_mut<T: ComponentData>(&mut self) -> Option<&mut T> {
        self.get_component_mut(T::KIND, None).and_then(T::from_component_mut)
    }

    pub fn get_instance<T: ComponentData>(&self, instance: &str) -> Option<&T> {
        self.get_component(T::KIND, Some(instance)).and_then(T::from_component)
    }

    /// Add a typed component as a new generated instance
    pub fn insert<T: ComponentData>(&mut self, value: T) -> InstanceId {
        self.add_component(value.into_component(), None)
    }

    /// Mutable access to the primaries of two different kinds at once
    pub fn get_pair_mut<A: ComponentData, B: ComponentData>(
        &mut self,
    ) -> (Option<&mut A>, Option<&mut B>) {
        let ia = self.primary[A::KIND.index()];
        let ib = self.primary[B::KIND.index()];
        match (ia, ib) {
            (Some(a), Some(b)) if a != b => {
                let (lo, hi, a_first) = if a < b { (a, b, true) } else { (b, a, false) };
                let (head, tail) = self.slots.split_at_mut(hi);
                let lo_slot = head[lo].as_mut().map(|s| &mut s.component);
                let hi_slot = tail[0].as_mut().map(|s| &mut s.component);
                let (ca, cb) = if a_first { (lo_slot, hi_slot) } else { (hi_slot, lo_slot) };
                (
                    ca.and_then(A::from_component_mut),
                    cb.and_then(B::from_component_mut),
                )
            }
            (Some(_), _) => (self.get_mut::<A>(), None),
            (None, _) => (None, self.get_mut::<B>()),
        }
    }

    /// Number of live slots, primary aliases included
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot_index(&self, kind: ComponentKind, instance: Option<&str>) -> Option<usize> {
        match instance {
            None => self.primary[kind.index()],
            Some(name) => self.named.get(&(kind, InstanceId::from(name))).copied(),
        }
    }

    fn generate_id(&mut self, kind: ComponentKind) -> InstanceId {
        loop {
            self.next_instance += 1;
            let id = InstanceId(format!("{}-{}", kind.as_str(), self.next_instance));
            if !self.named.contains_key(&(kind, id.clone())) {
                return id;
            }
        }
    }

    fn alloc(&mut self, slot: Slot) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(slot);
                idx
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, idx: usize) {
        if self.slots[idx].take().is_some() {
            self.free.push(idx);
        }
    }
}

/// Entity identifier, unique within a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rendering hint, opaque to gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layer {
    Background,
    Field,
    Foreground,
    Overlay,
}

/// What an entity is
#[derive(Debug, Clone)]
pub enum EntityKind {
    Ball(Ball),
    Paddle(Paddle),
    Pickup,
    Projectile { owner: Side },
    Obstacle,
    Particle,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub layer: Layer,
    pub kind: EntityKind,
    pub components: ComponentStore,
}

impl Entity {
    pub fn new(id: EntityId, layer: Layer, kind: EntityKind) -> Self {
        Self {
            id,
            layer,
            kind,
            components: ComponentStore::new(),
        }
    }

    pub fn with<T: ComponentData>(mut self, value: T) -> Self {
        self.components.insert(value);
        self
    }

    #[inline]
    pub fn physics(&self) -> Option<&Physics> {
        self.components.get::<Physics>()
    }

    #[inline]
    pub fn physics_mut(&mut self) -> Option<&mut Physics> {
        self.components.get_mut::<Physics>()
    }

    pub fn ball(&self) -> Option<&Ball> {
        match &self.kind {
            EntityKind::Ball(ball) => Some(ball),
            _ => None,
        }
    }

    pub fn ball_mut(&mut self) -> Option<&mut Ball> {
        match &mut self.kind {
            EntityKind::Ball(ball) => Some(ball),
            _ => None,
        }
    }

    pub fn paddle(&self) -> Option<&Paddle> {
        match &self.kind {
            EntityKind::Paddle(paddle) => Some(paddle),
            _ => None,
        }
    }

    pub fn paddle_mut(&mut self) -> Option<&mut Paddle> {
        match &mut self.kind {
            EntityKind::Paddle(paddle) => Some(paddle),
            _ => None,
        }
    }

    /// Ball data together with the component store, borrowed separately
    pub fn ball_parts_mut(&mut self) -> Option<(&mut Ball, &mut ComponentStore)> {
        match &mut self.kind {
            EntityKind::Ball(ball) => Some((ball, &mut self.components)),
            _ => None,
        }
    }

    pub fn paddle_parts_mut(&mut self) -> Option<(&mut Paddle, &mut ComponentStore)> {
        match &mut self.kind {
            EntityKind::Paddle(paddle) => Some((paddle, &mut self.components)),
            _ => None,
        }
    }
}

/// Live entity collection, iterated in id order
#[derive(Debug, Clone, Default)]
pub struct Entities {
    map: BTreeMap<EntityId, Entity>,
}

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        self.map.insert(id, entity);
        id
    }

    /// Remove immediately, asking the renderer to detach owned graphics
    pub fn remove(&mut self, id: EntityId, outbox: &mut Outbox) -> Option<Entity> {
        let entity = self.map.remove(&id)?;
        for component in entity.components.components_by_type(ComponentKind::Render) {
            if let Some(handle) = RenderHandle::from_component(component) {
                outbox.detached_graphics.push(handle.id);
            }
        }
        log::trace!("Removed entity {}", id);
        Some(entity)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.map.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.map.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.map.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.map.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.map.values_mut()
    }

    /// Snapshot of matching ids, safe to hold across mutations
    pub fn ids_where(&self, pred: impl Fn(&Entity) -> bool) -> Vec<EntityId> {
        self.map.values().filter(|e| pred(e)).map(|e| e.id).collect()
    }

    pub fn balls(&self) -> impl Iterator<Item = (&Entity, &Ball)> {
        self.map.values().filter_map(|e| e.ball().map(|b| (e, b)))
    }

    pub fn paddle_id(&self, side: Side) -> Option<EntityId> {
        self.map
            .values()
            .find(|e| e.paddle().is_some_and(|p| p.side == side))
            .map(|e| e.id)
    }

    pub fn paddle(&self, side: Side) -> Option<&Entity> {
        self.paddle_id(side).and_then(|id| self.map.get(&id))
    }

    pub fn paddle_mut(&mut self, side: Side) -> Option<&mut Entity> {
        let id = self.paddle_id(side)?;
        self.map.get_mut(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::component::{Despawn, Input, Lifetime};
    use glam::Vec2;

    fn physics_at(x: f32) -> Physics {
        Physics::new(Vec2::new(x, 0.0), Vec2::splat(10.0))
    }

    #[test]
    fn test_first_component_becomes_primary() {
        let mut store = ComponentStore::new();
        store.add_component(physics_at(1.0).into(), None);
        assert_eq!(store.get::<Physics>().unwrap().position.x, 1.0);
    }

    #[test]
    fn test_named_instances_do_not_replace_primary() {
        let mut store = ComponentStore::new();
        store.add_component(physics_at(1.0).into(), Some("a"));
        store.add_component(physics_at(2.0).into(), Some("b"));

        assert_eq!(store.get::<Physics>().unwrap().position.x, 1.0);
        assert_eq!(store.get_instance::<Physics>("b").unwrap().position.x, 2.0);
        assert_eq!(store.components_by_type(ComponentKind::Physics).len(), 2);
    }

    #[test]
    fn test_missing_lookups_return_none() {
        let store = ComponentStore::new();
        assert!(store.get_component(ComponentKind::Vfx, None).is_none());
        assert!(store.get_component(ComponentKind::Vfx, Some("x")).is_none());
        assert!(!store.has_component(ComponentKind::Input, None));
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let mut store = ComponentStore::new();
        let a = store.insert(Input::default());
        let b = store.insert(Input::default());
        assert_ne!(a, b);
        assert!(store.has_component(ComponentKind::Input, Some(a.as_str())));
    }

    #[test]
    fn test_remove_named_keeps_primary_alias() {
        let mut store = ComponentStore::new();
        store.add_component(physics_at(1.0).into(), Some("a"));
        store.add_component(physics_at(2.0).into(), Some("b"));

        assert!(store.remove_component(ComponentKind::Physics, Some("a")));
        assert!(!store.has_component(ComponentKind::Physics, Some("a")));
        // Bare lookup still resolves until the kind is removed without an id
        assert_eq!(store.get::<Physics>().unwrap().position.x, 1.0);
        assert!(store.has_component(ComponentKind::Physics, Some("b")));
    }

    #[test]
    fn test_readding_removed_name_takes_back_alias() {
        let mut store = ComponentStore::new();
        store.add_component(physics_at(1.0).into(), Some("a"));
        store.add_component(physics_at(2.0).into(), Some("b"));
        store.remove_component(ComponentKind::Physics, Some("a"));

        store.add_component(physics_at(5.0).into(), Some("a"));
        assert_eq!(store.get::<Physics>().unwrap().position.x, 5.0);
        assert_eq!(store.get_instance::<Physics>("a").unwrap().position.x, 5.0);
        // The stale alias slot is gone
        assert_eq!(store.components_by_type(ComponentKind::Physics).len(), 2);

        // A different name never steals the alias
        store.remove_component(ComponentKind::Physics, Some("a"));
        store.add_component(physics_at(7.0).into(), Some("c"));
        assert_eq!(store.get::<Physics>().unwrap().position.x, 5.0);
    }

    #[test]
    fn test_remove_without_id_clears_kind() {
        let mut store = ComponentStore::new();
        store.add_component(physics_at(1.0).into(), Some("a"));
        store.add_component(physics_at(2.0).into(), Some("b"));
        store.insert(Input::default());

        assert!(store.remove_component(ComponentKind::Physics, None));
        assert!(store.get::<Physics>().is_none());
        assert!(store.components_by_type(ComponentKind::Physics).is_empty());
        assert!(store.get::<Input>().is_some());
        assert!(!store.remove_component(ComponentKind::Physics, None));
    }

    #[test]
    fn test_replace_promotes_sole_survivor() {
        let mut store = ComponentStore::new();
        store.add_component(physics_at(1.0).into(), Some("a"));
        store.add_component(physics_at(2.0).into(), Some("b"));
        store.remove_component(ComponentKind::Physics, Some("a"));

        let old = store.replace_component(physics_at(3.0).into(), Some("b"));
        assert!(matches!(old, Some(Component::Physics(p)) if p.position.x == 2.0));
        assert_eq!(store.get::<Physics>().unwrap().position.x, 3.0);
        // The orphaned alias slot was released
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_replace_does_not_promote_with_siblings() {
        let mut store = ComponentStore::new();
        store.add_component(physics_at(1.0).into(), Some("a"));
        store.add_component(physics_at(2.0).into(), Some("b"));

        store.replace_component(physics_at(5.0).into(), Some("b"));
        assert_eq!(store.get::<Physics>().unwrap().position.x, 1.0);
        assert_eq!(store.get_instance::<Physics>("b").unwrap().position.x, 5.0);
    }

    #[test]
    fn test_replace_primary_without_id() {
        let mut store = ComponentStore::new();
        store.insert(physics_at(1.0));
        store.replace_component(physics_at(9.0).into(), None);
        assert_eq!(store.get::<Physics>().unwrap().position.x, 9.0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_pair_borrow() {
        let mut store = ComponentStore::new();
        store.insert(physics_at(1.0));
        store.insert(Lifetime::new(5.0, Despawn::Time));

        let (physics, lifetime) = store.get_pair_mut::<Physics, Lifetime>();
        physics.unwrap().position.x = 4.0;
        lifetime.unwrap().remaining = 1.0;
        assert_eq!(store.get::<Physics>().unwrap().position.x, 4.0);
        assert_eq!(store.get::<Lifetime>().unwrap().remaining, 1.0);

        let (physics, input) = store.get_pair_mut::<Physics, Input>();
        assert!(physics.is_some());
        assert!(input.is_none());
    }

    #[test]
    fn test_entities_remove_detaches_graphics() {
        use crate::sim::component::{GraphicDesc, RenderHandle};

        let mut entities = Entities::new();
        let mut outbox = Outbox::default();
        let desc = GraphicDesc { texture: "spark", tint: 0 };
        let entity = Entity::new(EntityId(7), Layer::Foreground, EntityKind::Particle)
            .with(RenderHandle::new(42, desc));
        entities.insert(entity);

        assert!(entities.remove(EntityId(7), &mut outbox).is_some());
        assert!(!entities.contains(EntityId(7)));
        assert_eq!(outbox.detached_graphics, vec![42]);
        assert!(entities.remove(EntityId(7), &mut outbox).is_none());
    }
}
