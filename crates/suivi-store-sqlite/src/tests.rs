//! Integration tests for `SqliteStore` and the core services running on it,
//! against an in-memory database.

use std::sync::{
  Mutex,
  atomic::{AtomicBool, AtomicUsize, Ordering},
};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use suivi_core::{
  Error as CoreError, Services,
  action::{Action, ActionStatus, Actor, ActorKind, ActorRef, CreateAction},
  appointment::{APPOINTMENT_TITLE, Appointment, CreateAppointment},
  attribution::ActorAttribution,
  lifecycle::Transition,
  notification::{Delivery, NotificationKind, NotificationSender, Notifier, PushMessage},
  person::{Counselor, NewPerson, Person},
  scheduler::AppointmentScheduler,
  store::{
    ActionStore, ActorStore, AppointmentStore, CounselorStore, PersonStore,
    RegistrationStore,
  },
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

// ─── Fixtures ────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("push service unavailable")]
struct Unavailable;

/// Records every message instead of pushing it; optionally fails every send.
#[derive(Default)]
struct RecordingSender {
  sent: Mutex<Vec<PushMessage>>,
  fail: bool,
}

impl NotificationSender for RecordingSender {
  type Error = Unavailable;

  async fn send(&self, message: &PushMessage) -> Result<(), Unavailable> {
    if self.fail {
      return Err(Unavailable);
    }
    self.sent.lock().unwrap().push(message.clone());
    Ok(())
  }
}

type TestServices = Services<SqliteStore, RecordingSender>;

fn sent(services: &TestServices) -> Vec<PushMessage> {
  services.notifier().sender().sent.lock().unwrap().clone()
}

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// Counselor "A" (Nils Wilis) following person "1" (F L).
async fn seeded_store(push_token: Option<&str>) -> SqliteStore {
  let s = store().await;
  s.add_counselor(&Counselor {
    counselor_id: "A".into(),
    first_name:   "Nils".into(),
    last_name:    "Wilis".into(),
  })
  .await
  .unwrap();
  s.add_person(NewPerson {
    person_id:    "1".into(),
    first_name:   "F".into(),
    last_name:    "L".into(),
    counselor_id: "A".into(),
  })
  .await
  .unwrap();
  if let Some(token) = push_token {
    s.update_push_token("1", Some(token.into())).await.unwrap();
  }
  s
}

async fn services(push_token: Option<&str>) -> TestServices {
  Services::new(seeded_store(push_token).await, RecordingSender::default())
}

/// Delegates to a `SqliteStore`, counting actor writes and optionally failing
/// person lookups.
struct Instrumented {
  inner:               SqliteStore,
  actor_writes:        AtomicUsize,
  fail_person_lookups: AtomicBool,
}

impl Instrumented {
  fn new(inner: SqliteStore) -> Self {
    Self {
      inner,
      actor_writes: AtomicUsize::new(0),
      fail_person_lookups: AtomicBool::new(false),
    }
  }
}

impl PersonStore for Instrumented {
  type Error = Error;

  async fn get_person(&self, person_id: &str) -> Result<Option<Person>, Error> {
    if self.fail_person_lookups.load(Ordering::SeqCst) {
      return Err(Error::Decode { column: "person_id", value: person_id.to_owned() });
    }
    self.inner.get_person(person_id).await
  }

  async fn list_persons_by_counselor(&self, counselor_id: &str) -> Result<Vec<Person>, Error> {
    self.inner.list_persons_by_counselor(counselor_id).await
  }
}

impl CounselorStore for Instrumented {
  type Error = Error;

  async fn get_counselor(&self, counselor_id: &str) -> Result<Option<Counselor>, Error> {
    self.inner.get_counselor(counselor_id).await
  }
}

impl ActorStore for Instrumented {
  type Error = Error;

  async fn find_or_create_actor(&self, creator: &Actor) -> Result<ActorRef, Error> {
    self.actor_writes.fetch_add(1, Ordering::SeqCst);
    self.inner.find_or_create_actor(creator).await
  }

  async fn find_actor(&self, creator: &Actor) -> Result<Option<ActorRef>, Error> {
    self.inner.find_actor(creator).await
  }
}

impl AppointmentStore for Instrumented {
  type Error = Error;

  async fn add_appointment(&self, appointment: &Appointment) -> Result<(), Error> {
    self.inner.add_appointment(appointment).await
  }

  async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, Error> {
    self.inner.get_appointment(appointment_id).await
  }

  async fn list_appointments_by_person(
    &self,
    person_id: &str,
    from: DateTime<Utc>,
    include_deleted: bool,
  ) -> Result<Vec<Appointment>, Error> {
    self
      .inner
      .list_appointments_by_person(person_id, from, include_deleted)
      .await
  }

  async fn list_appointments_by_counselor(
    &self,
    counselor_id: &str,
    from: DateTime<Utc>,
    include_deleted: bool,
  ) -> Result<Vec<Appointment>, Error> {
    self
      .inner
      .list_appointments_by_counselor(counselor_id, from, include_deleted)
      .await
  }

  async fn soft_delete_appointment(&self, appointment_id: Uuid) -> Result<(), Error> {
    self.inner.soft_delete_appointment(appointment_id).await
  }
}

fn may(day: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2020, 5, day, 10, 0, 0).unwrap()
}

/// Insert an action for person "1" authored by counselor "A".
async fn seed_action(
  s: &SqliteStore,
  content: &str,
  last_update: DateTime<Utc>,
  status: ActionStatus,
) -> Action {
  let creator = s
    .find_or_create_actor(&Actor::Counselor("A".into()))
    .await
    .unwrap();
  let action = Action {
    action_id: Uuid::new_v4(),
    person_id: "1".into(),
    content: content.into(),
    comment: Some(format!("{content} comment")),
    status,
    visible_to_counselor: true,
    created_at: may(17),
    limit_date: Some(may(30)),
    last_update,
    completed_at: status.is_done().then_some(last_update),
    creator,
  };
  s.add_action(&action).await.unwrap();
  action
}

fn appointment(date: DateTime<Utc>, soft_deleted: bool) -> Appointment {
  Appointment {
    appointment_id: Uuid::new_v4(),
    title: APPOINTMENT_TITLE.into(),
    subtitle: "avec Nils".into(),
    comment: None,
    modality: "par téléphone".into(),
    date,
    duration: TimeDelta::minutes(30),
    soft_deleted,
    person_id: "1".into(),
    counselor_id: "A".into(),
  }
}

fn jan(day: u32, hour: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2021, 1, day, hour, 0, 0).unwrap()
}

fn contents(actions: &[Action]) -> Vec<&str> {
  actions.iter().map(|a| a.content.as_str()).collect()
}

// ─── People ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_person() {
  let s = seeded_store(None).await;

  let person = s.get_person("1").await.unwrap().unwrap();
  assert_eq!(person.full_name(), "F L");
  assert_eq!(person.counselor_id, "A");
  assert_eq!(person.push_token, None);

  let counselor = s.get_counselor("A").await.unwrap().unwrap();
  assert_eq!(counselor.full_name(), "Nils Wilis");
}

#[tokio::test]
async fn missing_people_return_none() {
  let s = seeded_store(None).await;
  assert!(s.get_person("nobody").await.unwrap().is_none());
  assert!(s.get_counselor("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn list_persons_by_counselor_filters_on_owner() {
  let s = seeded_store(None).await;
  s.add_counselor(&Counselor {
    counselor_id: "B".into(),
    first_name:   "Other".into(),
    last_name:    "Counselor".into(),
  })
  .await
  .unwrap();
  s.add_person(NewPerson {
    person_id:    "2".into(),
    first_name:   "G".into(),
    last_name:    "M".into(),
    counselor_id: "B".into(),
  })
  .await
  .unwrap();

  let persons = s.list_persons_by_counselor("A").await.unwrap();
  assert_eq!(persons.len(), 1);
  assert_eq!(persons[0].person_id, "1");
}

#[tokio::test]
async fn update_push_token_stamps_update_time() {
  let s = seeded_store(None).await;
  let before = Utc::now() - TimeDelta::seconds(1);

  let person = s
    .update_push_token("1", Some("device".into()))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(person.push_token(), Some("device"));
  assert!(person.push_token_updated_at.unwrap() >= before);

  assert!(s.update_push_token("nobody", None).await.unwrap().is_none());
}

// ─── Actors ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn find_or_create_actor_is_keyed_on_id_and_kind() {
  let s = store().await;

  let first = s.find_or_create_actor(&Actor::Person("1".into())).await.unwrap();
  let again = s.find_or_create_actor(&Actor::Person("1".into())).await.unwrap();
  assert_eq!(first, again);

  let counselor = s.find_or_create_actor(&Actor::Counselor("1".into())).await.unwrap();
  assert_ne!(counselor.actor_id, first.actor_id);
  assert_eq!(counselor.creator.kind(), ActorKind::Counselor);

  let found = s.find_actor(&Actor::Person("1".into())).await.unwrap();
  assert_eq!(found, Some(first));
  assert!(s.find_actor(&Actor::Person("2".into())).await.unwrap().is_none());
}

#[tokio::test]
async fn ensure_returns_same_actor_without_second_write() {
  let svc = services(None).await;
  let attribution = svc.attribution();
  let actor = Actor::Person("1".into());

  assert!(svc.store().find_actor(&actor).await.unwrap().is_none());
  let first = attribution.ensure(&actor).await.unwrap();
  let second = attribution.ensure(&actor).await.unwrap();

  assert_eq!(first, second);
  assert_eq!(svc.store().find_actor(&actor).await.unwrap(), Some(first));
}

#[tokio::test]
async fn ensure_writes_an_actor_once() {
  let store = Instrumented::new(seeded_store(None).await);
  let attribution = ActorAttribution::new(&store);
  let actor = Actor::Counselor("A".into());

  let first = attribution.ensure(&actor).await.unwrap();
  let second = attribution.ensure(&actor).await.unwrap();

  assert_eq!(first, second);
  assert_eq!(store.actor_writes.load(Ordering::SeqCst), 1);

  attribution.ensure(&Actor::Person("A".into())).await.unwrap();
  assert_eq!(store.actor_writes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn display_name_follows_creator_kind() {
  let svc = services(None).await;
  let s = svc.store();

  let by_counselor = seed_action(s, "counselor", may(20), ActionStatus::NotStarted).await;
  assert_eq!(
    svc.attribution().resolve_display_name(&by_counselor).await.unwrap(),
    "Nils Wilis"
  );

  let mut by_person = by_counselor.clone();
  by_person.creator = s.find_or_create_actor(&Actor::Person("1".into())).await.unwrap();
  assert_eq!(svc.attribution().resolve_display_name(&by_person).await.unwrap(), "F L");
}

#[tokio::test]
async fn dangling_author_is_an_integrity_error() {
  let svc = services(None).await;
  let mut action = seed_action(svc.store(), "orphan", may(20), ActionStatus::NotStarted).await;
  action.creator = ActorRef {
    actor_id: Uuid::new_v4(),
    creator:  Actor::Person("ghost".into()),
  };

  let err = svc.attribution().resolve_display_name(&action).await.unwrap_err();
  assert!(matches!(
    err,
    CoreError::ActorNotFound { ref creator_id, kind: ActorKind::Person } if creator_id == "ghost"
  ));
}

// ─── Action storage ──────────────────────────────────────────────────────────

#[tokio::test]
async fn action_roundtrip() {
  let s = seeded_store(None).await;
  let action = seed_action(&s, "Write CV", may(20), ActionStatus::InProgress).await;

  let fetched = s.get_action(action.action_id).await.unwrap().unwrap();
  assert_eq!(fetched, action);

  let listed = s.list_actions_by_person("1").await.unwrap();
  assert_eq!(listed, vec![action]);
  assert!(s.get_action(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn update_status_maintains_completion_time() {
  let s = seeded_store(None).await;
  let action = seed_action(&s, "Write CV", may(20), ActionStatus::NotStarted).await;

  s.update_status(action.action_id, ActionStatus::Done, may(21)).await.unwrap();
  let done = s.get_action(action.action_id).await.unwrap().unwrap();
  assert!(done.is_done());
  assert_eq!(done.completed_at, Some(may(21)));
  assert_eq!(done.last_update, may(21));

  s.update_status(action.action_id, ActionStatus::InProgress, may(22)).await.unwrap();
  let reopened = s.get_action(action.action_id).await.unwrap().unwrap();
  assert!(!reopened.is_done());
  assert_eq!(reopened.completed_at, None);
}

#[tokio::test]
async fn legacy_done_flag_stays_in_lockstep_with_status() {
  let s = seeded_store(None).await;
  let in_progress = seed_action(&s, "a", may(20), ActionStatus::InProgress).await;

  s.update_legacy_done(in_progress.action_id, false, may(21)).await.unwrap();
  let untouched = s.get_action(in_progress.action_id).await.unwrap().unwrap();
  assert_eq!(untouched.status, ActionStatus::InProgress);
  assert_eq!(untouched.last_update, may(21));

  s.update_legacy_done(in_progress.action_id, true, may(22)).await.unwrap();
  let done = s.get_action(in_progress.action_id).await.unwrap().unwrap();
  assert_eq!(done.status, ActionStatus::Done);
  assert_eq!(done.completed_at, Some(may(22)));

  s.update_legacy_done(in_progress.action_id, true, may(23)).await.unwrap();
  let still_done = s.get_action(in_progress.action_id).await.unwrap().unwrap();
  assert_eq!(still_done.completed_at, Some(may(22)));
  assert_eq!(still_done.last_update, may(23));

  s.update_legacy_done(in_progress.action_id, false, may(24)).await.unwrap();
  let reopened = s.get_action(in_progress.action_id).await.unwrap().unwrap();
  assert_eq!(reopened.status, ActionStatus::NotStarted);
  assert_eq!(reopened.completed_at, None);
}

#[tokio::test]
async fn summary_counts_per_person_sorted_by_last_name() {
  let s = seeded_store(None).await;
  for (id, last_name) in [("2", "Adam"), ("3", "Zola")] {
    s.add_person(NewPerson {
      person_id:    id.into(),
      first_name:   "X".into(),
      last_name:    last_name.into(),
      counselor_id: "A".into(),
    })
    .await
    .unwrap();
  }
  seed_action(&s, "a", may(20), ActionStatus::Done).await;
  seed_action(&s, "b", may(20), ActionStatus::InProgress).await;
  seed_action(&s, "c", may(20), ActionStatus::NotStarted).await;

  let summary = s.summary_by_counselor("A").await.unwrap();
  let names: Vec<&str> = summary.iter().map(|p| p.last_name.as_str()).collect();
  assert_eq!(names, ["Adam", "L", "Zola"]);

  assert_eq!((summary[0].todo_count, summary[0].done_count), (0, 0));
  assert_eq!(summary[1].person_id, "1");
  assert_eq!((summary[1].todo_count, summary[1].done_count), (2, 1));
}

// ─── Action lifecycle ────────────────────────────────────────────────────────

fn create_input(kind: ActorKind) -> CreateAction {
  CreateAction {
    content:      "content".into(),
    comment:      Some("comment".into()),
    status:       None,
    is_done:      false,
    creator_kind: kind,
  }
}

#[tokio::test]
async fn create_action_by_person() {
  let svc = services(Some("device")).await;
  let owner = svc.store().get_person("1").await.unwrap().unwrap();
  let before = Utc::now() - TimeDelta::seconds(1);

  let action = svc
    .actions()
    .create(create_input(ActorKind::Person), &owner)
    .await
    .unwrap();

  assert_eq!(action.content, "content");
  assert_eq!(action.comment.as_deref(), Some("comment"));
  assert_eq!(action.status, ActionStatus::NotStarted);
  assert!(!action.is_done());
  assert!(action.visible_to_counselor);
  assert_eq!(action.limit_date, None);
  assert_eq!(action.created_at, action.last_update);
  assert!(action.created_at >= before);
  assert_eq!(action.creator.creator, Actor::Person("1".into()));

  let stored = svc.store().list_actions_by_person("1").await.unwrap();
  assert_eq!(stored, vec![action]);

  assert!(sent(&svc).is_empty());
}

#[tokio::test]
async fn create_action_by_counselor_notifies_person() {
  let svc = services(Some("device")).await;
  let owner = svc.store().get_person("1").await.unwrap().unwrap();

  let action = svc
    .actions()
    .create(create_input(ActorKind::Counselor), &owner)
    .await
    .unwrap();
  assert_eq!(action.creator.creator, Actor::Counselor("A".into()));

  let sent = sent(&svc);
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].token, "device");
  assert_eq!(sent[0].data.kind, NotificationKind::NewAction);
  assert_eq!(sent[0].data.id, Some(action.action_id));
}

#[tokio::test]
async fn create_action_reuses_author_record() {
  let svc = services(None).await;
  let owner = svc.store().get_person("1").await.unwrap().unwrap();

  let first = svc.actions().create(create_input(ActorKind::Person), &owner).await.unwrap();
  let second = svc.actions().create(create_input(ActorKind::Person), &owner).await.unwrap();
  assert_eq!(first.creator.actor_id, second.creator.actor_id);
}

#[tokio::test]
async fn create_done_action_from_legacy_flag() {
  let svc = services(None).await;
  let owner = svc.store().get_person("1").await.unwrap().unwrap();

  let mut input = create_input(ActorKind::Person);
  input.is_done = true;
  let action = svc.actions().create(input, &owner).await.unwrap();

  assert_eq!(action.status, ActionStatus::Done);
  assert_eq!(action.completed_at, Some(action.created_at));

  let stored = svc.store().get_action(action.action_id).await.unwrap();
  assert_eq!(stored, Some(action));
}

#[tokio::test]
async fn failing_push_does_not_fail_action_creation() {
  let store = seeded_store(Some("device")).await;
  let svc = Services::new(store, RecordingSender { fail: true, ..Default::default() });
  let owner = svc.store().get_person("1").await.unwrap().unwrap();

  let action = svc
    .actions()
    .create(create_input(ActorKind::Counselor), &owner)
    .await
    .unwrap();
  assert!(svc.store().get_action(action.action_id).await.unwrap().is_some());
}

#[tokio::test]
async fn transition_to_in_progress_bumps_last_update() {
  let svc = services(None).await;
  let action = seed_action(svc.store(), "a", may(20), ActionStatus::NotStarted).await;

  let outcome = svc
    .actions()
    .transition(action.action_id, "in_progress")
    .await
    .unwrap();
  assert_eq!(outcome, Transition::Applied(ActionStatus::InProgress));

  let stored = svc.store().get_action(action.action_id).await.unwrap().unwrap();
  assert_eq!(stored.status, ActionStatus::InProgress);
  assert!(stored.last_update > action.last_update);
}

#[tokio::test]
async fn transition_with_unknown_status_changes_nothing() {
  let svc = services(None).await;
  let action = seed_action(svc.store(), "a", may(20), ActionStatus::NotStarted).await;

  let outcome = svc.actions().transition(action.action_id, "bogus").await.unwrap();
  assert_eq!(outcome, Transition::Ignored);

  let stored = svc.store().get_action(action.action_id).await.unwrap().unwrap();
  assert_eq!(stored, action);
}

#[tokio::test]
async fn transitions_are_permitted_out_of_done() {
  let svc = services(None).await;
  let action = seed_action(svc.store(), "a", may(20), ActionStatus::Done).await;

  svc.actions().transition(action.action_id, "not_started").await.unwrap();
  let stored = svc.store().get_action(action.action_id).await.unwrap().unwrap();
  assert_eq!(stored.status, ActionStatus::NotStarted);
  assert_eq!(stored.completed_at, None);
}

#[tokio::test]
async fn transition_unknown_action_is_not_found() {
  let svc = services(None).await;
  let missing = Uuid::new_v4();

  let err = svc.actions().transition(missing, "done").await.unwrap_err();
  assert!(matches!(err, CoreError::ActionNotFound(id) if id == missing));
}

#[tokio::test]
#[allow(deprecated)]
async fn legacy_transition_marks_done() {
  let svc = services(None).await;
  let action = seed_action(svc.store(), "a", may(20), ActionStatus::InProgress).await;

  svc.actions().transition_legacy(action.action_id, true).await.unwrap();
  let stored = svc.store().get_action(action.action_id).await.unwrap().unwrap();
  assert!(stored.is_done());
  assert!(stored.last_update > action.last_update);
}

#[tokio::test]
async fn list_for_unknown_person_is_not_found() {
  let svc = services(None).await;
  let err = svc.actions().list_for("nobody").await.unwrap_err();
  assert!(err.is_not_found());
}

#[tokio::test]
async fn summarize_for_unknown_counselor_is_not_found() {
  let svc = services(None).await;
  let err = svc.actions().summarize_for_counselor("Z").await.unwrap_err();
  assert!(matches!(err, CoreError::CounselorNotFound(_)));

  let summary = svc.actions().summarize_for_counselor("A").await.unwrap();
  assert_eq!(summary.len(), 1);
}

// ─── Home ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn person_home_shows_two_most_recent_pending() {
  let svc = services(None).await;
  let s = svc.store();
  seed_action(s, "May 20", may(20), ActionStatus::InProgress).await;
  seed_action(s, "May 21", may(21), ActionStatus::InProgress).await;
  seed_action(s, "May 19", may(19), ActionStatus::InProgress).await;
  seed_action(s, "May 17", may(17), ActionStatus::Done).await;

  let home = svc.home().person_home("1", jan(2, 0)).await.unwrap();
  assert_eq!(contents(&home.actions), ["May 21", "May 20"]);
  assert_eq!(home.done_count, 1);
  assert_eq!(home.counselor.first_name, "Nils");
}

#[tokio::test]
async fn person_home_with_one_pending_shows_it_alone() {
  let svc = services(None).await;
  let s = svc.store();
  seed_action(s, "done", may(20), ActionStatus::Done).await;
  seed_action(s, "pending", may(21), ActionStatus::InProgress).await;

  let home = svc.home().person_home("1", jan(2, 0)).await.unwrap();
  assert_eq!(contents(&home.actions), ["pending"]);
  assert_eq!(home.done_count, 1);
}

#[tokio::test]
async fn person_home_without_actions() {
  let svc = services(None).await;
  let home = svc.home().person_home("1", jan(2, 0)).await.unwrap();
  assert!(home.actions.is_empty());
  assert_eq!(home.done_count, 0);
  assert!(home.appointments.is_empty());
}

#[tokio::test]
async fn person_home_lists_only_upcoming_appointments() {
  let svc = services(None).await;
  let s = svc.store();
  let upcoming = appointment(jan(3, 9), false);
  s.add_appointment(&upcoming).await.unwrap();
  s.add_appointment(&appointment(jan(1, 9), false)).await.unwrap();
  s.add_appointment(&appointment(jan(4, 9), true)).await.unwrap();

  let home = svc.home().person_home("1", jan(2, 0)).await.unwrap();
  assert_eq!(home.appointments, vec![upcoming]);
}

#[tokio::test]
async fn person_home_for_unknown_person_is_not_found() {
  let svc = services(None).await;
  let err = svc.home().person_home("nobody", Utc::now()).await.unwrap_err();
  assert!(matches!(err, CoreError::PersonNotFound(ref id) if id == "nobody"));
}

#[tokio::test]
async fn counselor_home_shows_every_action() {
  let svc = services(None).await;
  let s = svc.store();
  for day in [17, 18, 19, 20] {
    seed_action(s, &format!("May {day}"), may(day), ActionStatus::NotStarted).await;
  }
  seed_action(s, "done", may(21), ActionStatus::Done).await;

  let home = svc.home().counselor_home("1").await.unwrap();
  assert_eq!(home.person.person_id, "1");
  assert_eq!(home.actions.len(), 5);
}

// ─── Appointments ────────────────────────────────────────────────────────────

fn create_appointment_input() -> CreateAppointment {
  CreateAppointment {
    comment:      Some("comment".into()),
    date:         "Sun, 24 Sep 2023 19:30:00 GMT".into(),
    duration:     "00:61:00".into(),
    modality:     "visio".into(),
    person_id:    "1".into(),
    counselor_id: "A".into(),
  }
}

#[tokio::test]
async fn create_appointment_builds_title_subtitle_and_parses_input() {
  let svc = services(Some("device")).await;

  let created = svc
    .appointments()
    .create(create_appointment_input())
    .await
    .unwrap();

  assert_eq!(created.title, "Rendez-vous conseiller");
  assert_eq!(created.subtitle, "avec Nils");
  assert_eq!(created.date, Utc.with_ymd_and_hms(2023, 9, 24, 19, 30, 0).unwrap());
  assert_eq!(created.duration, TimeDelta::minutes(61));
  assert_eq!(created.comment.as_deref(), Some("comment"));
  assert_eq!(created.modality, "visio");
  assert_eq!(created.person_id, "1");
  assert_eq!(created.counselor_id, "A");
  assert!(!created.soft_deleted);

  let stored = svc
    .store()
    .get_appointment(created.appointment_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(stored, created);

  let sent = sent(&svc);
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].title, "Nouveau rendez-vous");
  assert_eq!(sent[0].data.id, Some(created.appointment_id));
}

#[tokio::test]
async fn create_appointment_rejects_malformed_input() {
  let svc = services(None).await;

  let mut bad_duration = create_appointment_input();
  bad_duration.duration = "61".into();
  let err = svc.appointments().create(bad_duration).await.unwrap_err();
  assert!(matches!(err, CoreError::InvalidDuration(_)));

  let mut bad_date = create_appointment_input();
  bad_date.date = "24/09/2023".into();
  let err = svc.appointments().create(bad_date).await.unwrap_err();
  assert!(matches!(err, CoreError::InvalidDate(_)));

  let all = svc
    .store()
    .list_appointments_by_person("1", DateTime::<Utc>::MIN_UTC, true)
    .await
    .unwrap();
  assert!(all.is_empty());
}

#[tokio::test]
async fn create_appointment_requires_the_persons_counselor() {
  let svc = services(None).await;
  svc
    .store()
    .add_counselor(&Counselor {
      counselor_id: "B".into(),
      first_name:   "Other".into(),
      last_name:    "Counselor".into(),
    })
    .await
    .unwrap();

  let mut input = create_appointment_input();
  input.counselor_id = "B".into();
  let err = svc.appointments().create(input).await.unwrap_err();
  assert!(matches!(err, CoreError::CounselorMismatch { .. }));
  assert!(err.is_validation());

  let mut input = create_appointment_input();
  input.person_id = "nobody".into();
  let err = svc.appointments().create(input).await.unwrap_err();
  assert!(matches!(err, CoreError::PersonNotFound(_)));
}

#[tokio::test]
async fn create_appointment_without_token_skips_push() {
  let svc = services(None).await;
  svc.appointments().create(create_appointment_input()).await.unwrap();
  assert!(sent(&svc).is_empty());
}

#[tokio::test]
async fn failing_push_does_not_fail_appointment_creation() {
  let store = seeded_store(Some("device")).await;
  let svc = Services::new(store, RecordingSender { fail: true, ..Default::default() });

  let created = svc.appointments().create(create_appointment_input()).await.unwrap();
  assert!(svc.store().get_appointment(created.appointment_id).await.unwrap().is_some());
}

#[tokio::test]
async fn list_for_person_excludes_past_and_deleted() {
  let svc = services(None).await;
  let s = svc.store();
  let now = jan(2, 12);
  let at_now = appointment(now, false);
  let later = appointment(jan(5, 9), false);
  s.add_appointment(&later).await.unwrap();
  s.add_appointment(&at_now).await.unwrap();
  s.add_appointment(&appointment(jan(2, 11), false)).await.unwrap();
  s.add_appointment(&appointment(jan(6, 9), true)).await.unwrap();

  let listed = svc.appointments().list_for_person("1", now).await.unwrap();
  assert_eq!(listed.len(), 2);
  assert!(listed.iter().all(|a| a.is_upcoming(now)));
  assert!(listed.contains(&at_now));
  assert!(listed.contains(&later));
}

#[tokio::test]
async fn list_for_counselor_is_ordered_by_date() {
  let svc = services(None).await;
  let s = svc.store();
  let third = appointment(jan(9, 9), false);
  let first = appointment(jan(3, 9), false);
  let second = appointment(jan(4, 9), false);
  for a in [&third, &first, &second] {
    s.add_appointment(a).await.unwrap();
  }
  s.add_appointment(&appointment(jan(5, 9), true)).await.unwrap();

  let listed = svc.appointments().list_for_counselor("A", jan(2, 0)).await.unwrap();
  assert_eq!(listed, vec![first, second, third]);
}

#[tokio::test]
async fn soft_delete_is_idempotent_and_touches_only_the_flag() {
  let svc = services(None).await;
  let original = appointment(jan(5, 9), false);
  svc.store().add_appointment(&original).await.unwrap();

  svc.appointments().soft_delete(original.appointment_id).await.unwrap();
  let again = svc.appointments().soft_delete(original.appointment_id).await.unwrap();
  assert!(again.soft_deleted);

  let stored = svc
    .store()
    .get_appointment(original.appointment_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(stored, Appointment { soft_deleted: true, ..original });
}

#[tokio::test]
async fn soft_delete_unknown_appointment_is_not_found() {
  let svc = services(None).await;
  let err = svc.appointments().soft_delete(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, CoreError::AppointmentNotFound(_)));
}

#[tokio::test]
async fn delete_notifies_once_with_date() {
  let svc = services(Some("device")).await;
  let target = appointment(Utc.with_ymd_and_hms(2023, 9, 24, 19, 30, 0).unwrap(), false);
  svc.store().add_appointment(&target).await.unwrap();

  let first = svc.appointments().delete(target.appointment_id).await.unwrap();
  let second = svc.appointments().delete(target.appointment_id).await.unwrap();
  assert_eq!(first, Delivery::Sent);
  assert_eq!(second, Delivery::Skipped);

  let sent = sent(&svc);
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].body, "Votre rendez-vous du 24/09 à 19:30 est supprimé");
  assert_eq!(sent[0].data.kind, NotificationKind::DeletedRendezvous);
}

#[tokio::test]
async fn delete_survives_a_failed_person_lookup() {
  let store = Instrumented::new(seeded_store(Some("device")).await);
  let notifier = Notifier::new(RecordingSender::default());
  let target = appointment(jan(5, 9), false);
  store.add_appointment(&target).await.unwrap();

  store.fail_person_lookups.store(true, Ordering::SeqCst);
  let delivery = AppointmentScheduler::new(&store, &notifier)
    .delete(target.appointment_id)
    .await
    .unwrap();

  assert!(matches!(delivery, Delivery::Failed(_)));
  assert!(notifier.sender().sent.lock().unwrap().is_empty());
  let stored = store.get_appointment(target.appointment_id).await.unwrap().unwrap();
  assert!(stored.soft_deleted);
}

#[tokio::test]
async fn notify_created_reports_delivery() {
  let store = seeded_store(Some("device")).await;
  let svc = Services::new(store, RecordingSender { fail: true, ..Default::default() });

  let delivery = svc
    .appointments()
    .notify_created("1", Uuid::new_v4())
    .await
    .unwrap();
  assert_eq!(delivery, Delivery::Failed("push service unavailable".into()));
}
