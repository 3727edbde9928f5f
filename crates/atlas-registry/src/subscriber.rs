//! Entity-creation subscriptions.

use crate::entity::{Entity, EntityId};

/// Callback interface for components that want to learn about entity
/// creation.
///
/// Register once via
/// [`EntityRegistry::subscribe`](crate::registry::EntityRegistry::subscribe);
/// afterwards every `add`/`insert` on the registry invokes
/// [`entity_registered`](Self::entity_registered) exactly once, in creation
/// order, with the freshly inserted entity.
///
/// The callback runs synchronously under the registry's read lock: the
/// received entity reflects its fully inserted state, but the callback must
/// not call mutating registry methods (the lock is not reentrant for
/// writers) and should return quickly.
pub trait EntitySubscriber: Send + Sync {
    /// A new entity was registered.
    fn entity_registered(&self, id: EntityId, entity: &Entity);
}
