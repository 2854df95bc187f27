//! Log-once bookkeeping for per-entity runtime errors.
//!
//! Systems keep a `Local<ReportedEntities>` so a broken entity is logged
//! once instead of every frame. Entries go away when the entity recovers or
//! is despawned.
use bevy_ecs::prelude::Entity;
use rustc_hash::FxHashSet;

#[derive(Debug, Default)]
pub struct ReportedEntities(FxHashSet<Entity>);

impl ReportedEntities {
    /// Returns `true` the first time `entity` is reported since it last recovered.
    pub fn report(&mut self, entity: Entity) -> bool {
        self.0.insert(entity)
    }

    pub fn recover(&mut self, entity: Entity) {
        self.0.remove(&entity);
    }

    /// Keep only the entities for which `keep` holds.
    pub fn retain(&mut self, mut keep: impl FnMut(Entity) -> bool) {
        self.0.retain(|entity| keep(*entity));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::world::World;

    #[test]
    fn reports_once_until_recovered() {
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        let mut reported = ReportedEntities::default();

        assert!(reported.report(entity));
        assert!(!reported.report(entity));
        reported.recover(entity);
        assert!(reported.report(entity));
    }

    #[test]
    fn despawned_entities_are_forgotten() {
        let mut world = World::new();
        let kept = world.spawn_empty().id();
        let gone = world.spawn_empty().id();
        let mut reported = ReportedEntities::default();
        reported.report(kept);
        reported.report(gone);

        world.despawn(gone);
        reported.retain(|entity| world.get_entity(entity).is_ok());

        assert_eq!(reported.len(), 1);
        assert!(!reported.report(kept));
    }
}
