use std::ops::Deref;
use std::sync::Arc;

/// Immutable value copy of an `EntityStore`'s contents at one point in time.
///
/// Clones share the same backing slice.
#[derive(Debug)]
pub struct Snapshot<E> {
    entities: Arc<[E]>,
}

impl<E> Snapshot<E> {
    pub(crate) fn new(entities: Vec<E>) -> Self {
        Self {
            entities: entities.into(),
        }
    }

    pub fn entities(&self) -> &[E] {
        &self.entities
    }
}

impl<E: Clone> Snapshot<E> {
    pub fn to_vec(&self) -> Vec<E> {
        self.entities.to_vec()
    }
}

impl<E> Clone for Snapshot<E> {
    fn clone(&self) -> Self {
        Self {
            entities: Arc::clone(&self.entities),
        }
    }
}

impl<E> Deref for Snapshot<E> {
    type Target = [E];

    fn deref(&self) -> &[E] {
        &self.entities
    }
}

impl<E: PartialEq> PartialEq for Snapshot<E> {
    fn eq(&self, other: &Self) -> bool {
        self.entities[..] == other.entities[..]
    }
}

impl<E: PartialEq> PartialEq<Vec<E>> for Snapshot<E> {
    fn eq(&self, other: &Vec<E>) -> bool {
        self.entities[..] == other[..]
    }
}
