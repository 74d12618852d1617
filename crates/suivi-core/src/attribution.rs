//! Durable, de-duplicated authorship records for actions.

use crate::{
  Error, Result,
  action::{Action, Actor, ActorRef},
  store::{ActorStore, CounselorStore, PersonStore},
};

/// Resolves who authored an action.
pub struct ActorAttribution<'a, S> {
  store: &'a S,
}

impl<'a, S> ActorAttribution<'a, S>
where
  S: ActorStore + PersonStore + CounselorStore,
{
  pub fn new(store: &'a S) -> Self { Self { store } }

  /// Return the attribution record for `creator`, creating it on first use.
  ///
  /// Keyed on the `(creator id, kind)` pair, so repeated calls return the same
  /// record and only the first one writes.
  pub async fn ensure(&self, creator: &Actor) -> Result<ActorRef> {
    if let Some(existing) = self
      .store
      .find_actor(creator)
      .await
      .map_err(Error::store)?
    {
      return Ok(existing);
    }

    let created = self
      .store
      .find_or_create_actor(creator)
      .await
      .map_err(Error::store)?;
    tracing::debug!(
      actor_id = %created.actor_id,
      kind = %creator.kind(),
      creator_id = creator.creator_id(),
      "actor registered"
    );
    Ok(created)
  }

  /// Full name of whoever authored `action`.
  ///
  /// A dangling reference is a data-integrity problem and surfaces as
  /// [`Error::ActorNotFound`].
  pub async fn resolve_display_name(&self, action: &Action) -> Result<String> {
    let creator = &action.creator.creator;
    let missing = || Error::ActorNotFound {
      creator_id: creator.creator_id().to_owned(),
      kind:       creator.kind(),
    };

    match creator {
      Actor::Person(id) => self
        .store
        .get_person(id)
        .await
        .map_err(Error::store)?
        .map(|p| p.full_name())
        .ok_or_else(missing),
      Actor::Counselor(id) => self
        .store
        .get_counselor(id)
        .await
        .map_err(Error::store)?
        .map(|c| c.full_name())
        .ok_or_else(missing),
    }
  }
}
