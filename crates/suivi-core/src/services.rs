//! One place that owns the store and the notification gateway, built once at
//! startup and handed to whichever layer drives the core.

use crate::{
  attribution::ActorAttribution,
  home::HomeAggregator,
  lifecycle::ActionLifecycle,
  notification::{NotificationSender, Notifier},
  scheduler::AppointmentScheduler,
  store::Store,
};

pub struct Services<S, N> {
  store:    S,
  notifier: Notifier<N>,
}

impl<S, N> Services<S, N>
where
  S: Store,
  N: NotificationSender,
{
  pub fn new(store: S, sender: N) -> Self {
    Self { store, notifier: Notifier::new(sender) }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn notifier(&self) -> &Notifier<N> { &self.notifier }

  pub fn attribution(&self) -> ActorAttribution<'_, S> { ActorAttribution::new(&self.store) }

  pub fn actions(&self) -> ActionLifecycle<'_, S, N> {
    ActionLifecycle::new(&self.store, &self.notifier)
  }

  pub fn home(&self) -> HomeAggregator<'_, S> { HomeAggregator::new(&self.store) }

  pub fn appointments(&self) -> AppointmentScheduler<'_, S, N> {
    AppointmentScheduler::new(&self.store, &self.notifier)
  }
}
