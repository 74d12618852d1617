//! Action creation and status transitions.
//!
//! Status moves freely between `NotStarted`, `InProgress` and `Done`; no
//! transition is forbidden. The legacy `is_done` flag is never stored on its
//! own, it is read off the status.

use chrono::{DateTime, SubsecRound as _, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  action::{Action, ActionStatus, Actor, ActorKind, CreateAction, PersonActionSummary},
  attribution::ActorAttribution,
  notification::{NotificationSender, Notifier, PushMessage},
  person::Person,
  store::{ActionStore, ActorStore, CounselorStore, PersonStore},
};

/// Action timestamps carry microseconds, the precision stores keep.
fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

/// Result of [`ActionLifecycle::transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  Applied(ActionStatus),
  /// The requested status was not one of the known values; nothing was
  /// written.
  Ignored,
}

pub struct ActionLifecycle<'a, S, N> {
  store:    &'a S,
  notifier: &'a Notifier<N>,
}

impl<'a, S, N> ActionLifecycle<'a, S, N>
where
  S: ActionStore + ActorStore + PersonStore + CounselorStore,
  N: NotificationSender,
{
  pub fn new(store: &'a S, notifier: &'a Notifier<N>) -> Self {
    Self { store, notifier }
  }

  /// Create an action owned by `owner`.
  ///
  /// The author is `owner` or `owner`'s counselor depending on
  /// `input.creator_kind`. An action authored by the counselor triggers a
  /// best-effort push to the person; its outcome does not affect the result.
  pub async fn create(&self, input: CreateAction, owner: &Person) -> Result<Action> {
    let creator = match input.creator_kind {
      ActorKind::Person => Actor::Person(owner.person_id.clone()),
      ActorKind::Counselor => Actor::Counselor(owner.counselor_id.clone()),
    };
    let creator = ActorAttribution::new(self.store).ensure(&creator).await?;

    let now = now();
    let status = input.initial_status();
    let action = Action {
      action_id: Uuid::new_v4(),
      person_id: owner.person_id.clone(),
      content: input.content,
      comment: input.comment,
      status,
      visible_to_counselor: true,
      created_at: now,
      limit_date: None,
      last_update: now,
      completed_at: status.is_done().then_some(now),
      creator,
    };

    self
      .store
      .add_action(&action)
      .await
      .map_err(Error::store)?;
    tracing::info!(
      action_id = %action.action_id,
      person_id = %action.person_id,
      status = %action.status,
      "action created"
    );

    if input.creator_kind == ActorKind::Counselor {
      let action_id = action.action_id;
      self
        .notifier
        .notify(owner, |token| PushMessage::new_action(token, action_id))
        .await;
    }

    Ok(action)
  }

  /// Move an action to `raw_status`.
  ///
  /// An unrecognised status is ignored rather than rejected: older clients
  /// send values outside the enum and expect the call to succeed. Nothing is
  /// written in that case, not even `last_update`.
  pub async fn transition(&self, action_id: Uuid, raw_status: &str) -> Result<Transition> {
    let Some(status) = ActionStatus::parse(raw_status) else {
      tracing::debug!(%action_id, status = raw_status, "unknown action status ignored");
      return Ok(Transition::Ignored);
    };

    self.require(action_id).await?;
    self
      .store
      .update_status(action_id, status, now())
      .await
      .map_err(Error::store)?;
    tracing::info!(%action_id, %status, "action status updated");

    Ok(Transition::Applied(status))
  }

  /// Write the legacy completion flag.
  ///
  /// Never validates its input. Kept in step with `status`: `true` means
  /// `Done`, `false` reopens a done action as `NotStarted`.
  #[deprecated(note = "older clients only; use `transition`")]
  pub async fn transition_legacy(&self, action_id: Uuid, is_done: bool) -> Result<()> {
    self.require(action_id).await?;
    self
      .store
      .update_legacy_done(action_id, is_done, now())
      .await
      .map_err(Error::store)?;
    tracing::info!(%action_id, is_done, "action completion flag updated");
    Ok(())
  }

  /// All actions of a person, unordered.
  pub async fn list_for(&self, person_id: &str) -> Result<Vec<Action>> {
    self
      .store
      .get_person(person_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::PersonNotFound(person_id.to_owned()))?;

    self
      .store
      .list_actions_by_person(person_id)
      .await
      .map_err(Error::store)
  }

  /// Todo/done counts for each person followed by `counselor_id`, ordered by
  /// last name.
  pub async fn summarize_for_counselor(
    &self,
    counselor_id: &str,
  ) -> Result<Vec<PersonActionSummary>> {
    self
      .store
      .get_counselor(counselor_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::CounselorNotFound(counselor_id.to_owned()))?;

    let mut summaries = self
      .store
      .summary_by_counselor(counselor_id)
      .await
      .map_err(Error::store)?;
    summaries.sort_by(|a, b| a.last_name.cmp(&b.last_name));
    Ok(summaries)
  }

  async fn require(&self, action_id: Uuid) -> Result<Action> {
    self
      .store
      .get_action(action_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ActionNotFound(action_id))
  }
}
