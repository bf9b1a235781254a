use std::{iter::FusedIterator, marker::PhantomData};

use crate::{entity::Entity, error::Result, scroll::ScrollSession};

/// A scroll session that yields typed entities instead of raw hits.
///
/// A hit that does not fit `E` is reported as an error for that item only;
/// the underlying session keeps going.
pub struct ResultSet<E> {
    session: ScrollSession,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> ResultSet<E> {
    pub fn new(session: ScrollSession) -> Self {
        Self {
            session,
            _entity: PhantomData,
        }
    }

    pub fn total(&self) -> Option<u64> {
        self.session.total()
    }

    pub fn has_more(&self) -> bool {
        self.session.has_more()
    }

    /// The next entity, or `None` once the results are exhausted.
    pub fn next_entity(&mut self) -> Result<Option<E>> {
        match self.session.next_record()? {
            Some(hit) => E::from_hit(hit).map(Some),
            None => Ok(None),
        }
    }

    pub fn session(&self) -> &ScrollSession {
        &self.session
    }

    pub fn into_session(self) -> ScrollSession {
        self.session
    }
}

impl<E: Entity> Iterator for ResultSet<E> {
    type Item = Result<E>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entity().transpose()
    }
}

impl<E: Entity> FusedIterator for ResultSet<E> {}
