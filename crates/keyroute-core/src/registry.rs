//! Context storage and ordering.
//!
//! Contexts live in an arena owned by the dispatcher and are addressed by
//! [`ContextId`]. Callers own a context through a [`ContextHandle`]; the
//! arena slot only keeps a weak reference to the handle's lease, so a context
//! expires as soon as its last handle is dropped. Expired contexts are
//! skipped during dispatch and swept out by [`Registry::prune`].

use std::rc::{Rc, Weak};

use slotmap::{SlotMap, new_key_type};

use crate::context::InputContext;
use crate::error::InputError;

new_key_type! {
    pub struct ContextId;
}

#[derive(Debug)]
struct Lease {
    id: ContextId,
}

/// Owning handle to a registered context. Clones share ownership.
#[derive(Clone, Debug)]
pub struct ContextHandle(Rc<Lease>);

impl ContextHandle {
    pub fn id(&self) -> ContextId {
        self.0.id
    }
}

impl From<&ContextHandle> for ContextId {
    fn from(handle: &ContextHandle) -> Self {
        handle.id()
    }
}

struct Slot {
    context: InputContext,
    lease: Weak<Lease>,
}

impl Slot {
    fn is_live(&self) -> bool {
        self.lease.strong_count() > 0
    }
}

#[derive(Default)]
pub(crate) struct Registry {
    contexts: SlotMap<ContextId, Slot>,
    /// Strictly descending priority; among equals, newest first.
    order: Vec<ContextId>,
    /// Owners for contexts registered by callers that cannot hold a handle.
    untracked: Vec<ContextHandle>,
}

impl Registry {
    pub fn register(&mut self, name: &str, priority: i32) -> ContextHandle {
        let id = self.contexts.insert(Slot {
            context: InputContext::new(name, priority),
            lease: Weak::new(),
        });
        let lease = Rc::new(Lease { id });
        if let Some(slot) = self.contexts.get_mut(id) {
            slot.lease = Rc::downgrade(&lease);
        }
        self.insert_sorted(id, priority);
        log::debug!("registered input context \"{name}\" at priority {priority}");
        ContextHandle(lease)
    }

    pub fn register_untracked(&mut self, name: &str, priority: i32) -> ContextId {
        let handle = self.register(name, priority);
        let id = handle.id();
        self.untracked.push(handle);
        id
    }

    pub fn unregister_untracked(&mut self, name: &str) -> Result<(), InputError> {
        let contexts = &self.contexts;
        let position = self.untracked.iter().position(|h| {
            contexts
                .get(h.id())
                .is_some_and(|slot| slot.context.name() == name)
        });
        match position {
            Some(i) => {
                self.untracked.remove(i);
                Ok(())
            }
            None => {
                log::warn!(
                    "failed to delete untracked input context \"{name}\": no context with that name"
                );
                Err(InputError::UnknownContext(name.to_string()))
            }
        }
    }

    /// Re-inserts `id` at the slot matching its new priority.
    pub fn set_priority(&mut self, id: ContextId, priority: i32) -> Result<(), InputError> {
        if !self.is_live(id) {
            return Err(InputError::ExpiredContext(id));
        }
        self.order.retain(|other| *other != id);
        self.insert_sorted(id, priority);
        if let Some(slot) = self.contexts.get_mut(id) {
            slot.context.set_priority(priority);
        }
        Ok(())
    }

    // First live slot whose priority is <= the new one; insert before it.
    fn insert_sorted(&mut self, id: ContextId, priority: i32) {
        let contexts = &self.contexts;
        let at = self.order.iter().position(|other| {
            contexts
                .get(*other)
                .is_some_and(|slot| slot.is_live() && slot.context.priority() <= priority)
        });
        match at {
            Some(i) => self.order.insert(i, id),
            None => self.order.push(id),
        }
    }

    pub fn is_live(&self, id: ContextId) -> bool {
        self.contexts.get(id).is_some_and(Slot::is_live)
    }

    pub fn get(&self, id: ContextId) -> Option<&InputContext> {
        self.contexts
            .get(id)
            .filter(|slot| slot.is_live())
            .map(|slot| &slot.context)
    }

    pub fn get_mut(&mut self, id: ContextId) -> Option<&mut InputContext> {
        self.contexts
            .get_mut(id)
            .filter(|slot| slot.is_live())
            .map(|slot| &mut slot.context)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// The id at registry position `index`, live or not.
    pub fn id_at(&self, index: usize) -> Option<ContextId> {
        self.order.get(index).copied()
    }

    /// Live context at registry position `index`.
    pub fn live_at_mut(&mut self, index: usize) -> Option<&mut InputContext> {
        let id = *self.order.get(index)?;
        self.get_mut(id)
    }

    /// Live contexts in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (ContextId, &InputContext)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.get(*id).map(|ctx| (*id, ctx)))
    }

    pub fn untracked(&self) -> impl Iterator<Item = &InputContext> + '_ {
        self.untracked.iter().filter_map(|h| self.get(h.id()))
    }

    /// Drops every context whose last owner has gone away.
    pub fn prune(&mut self) -> usize {
        let contexts = &self.contexts;
        self.order
            .retain(|id| contexts.get(*id).is_some_and(Slot::is_live));

        let mut pruned = 0;
        self.contexts.retain(|_, slot| {
            let live = slot.is_live();
            if !live {
                log::debug!("pruned expired input context \"{}\"", slot.context.name());
                pruned += 1;
            }
            live
        });
        pruned
    }

    pub fn clear(&mut self) {
        self.untracked.clear();
        self.order.clear();
        self.contexts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(reg: &Registry) -> Vec<String> {
        reg.iter().map(|(_, c)| c.name().to_string()).collect()
    }

    #[test]
    fn test_equal_priority_newest_first() {
        let mut reg = Registry::default();
        let _a = reg.register("a", 10);
        let _b = reg.register("b", 50);
        let _c = reg.register("c", 50);
        let _d = reg.register("d", 90);
        assert_eq!(names(&reg), vec!["d", "c", "b", "a"]);
    }

    #[test]
    fn test_dropped_handle_expires_and_prunes() {
        let mut reg = Registry::default();
        let keep = reg.register("keep", 1);
        let gone = reg.register("gone", 2);
        let gone_id = gone.id();

        let extra_owner = gone.clone();
        drop(gone);
        assert!(reg.is_live(gone_id));
        drop(extra_owner);

        assert!(!reg.is_live(gone_id));
        assert!(reg.get(gone_id).is_none());
        assert_eq!(reg.len(), 2, "expired slot stays until pruned");
        assert_eq!(names(&reg), vec!["keep"]);

        assert_eq!(reg.prune(), 1);
        assert_eq!(reg.len(), 1);
        assert!(reg.is_live(keep.id()));
    }

    #[test]
    fn test_untracked_lives_until_unregistered() {
        let mut reg = Registry::default();
        let id = reg.register_untracked("script", 5);
        reg.prune();
        assert!(reg.is_live(id));

        assert!(matches!(
            reg.unregister_untracked("nope"),
            Err(InputError::UnknownContext(_))
        ));
        reg.unregister_untracked("script").unwrap();
        assert!(!reg.is_live(id));
        reg.prune();
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn test_set_priority_reorders() {
        let mut reg = Registry::default();
        let a = reg.register("a", 10);
        let _b = reg.register("b", 20);
        let _c = reg.register("c", 30);

        reg.set_priority(a.id(), 20).unwrap();
        assert_eq!(names(&reg), vec!["c", "a", "b"]);
        assert_eq!(reg.get(a.id()).unwrap().priority(), 20);

        let id = a.id();
        drop(a);
        assert!(matches!(
            reg.set_priority(id, 1),
            Err(InputError::ExpiredContext(_))
        ));
    }
}
