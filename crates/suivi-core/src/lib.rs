//! Core of the case-management backend: action lifecycle, authorship
//! attribution, appointment scheduling, home-screen aggregation, best-effort
//! push notifications, and access-token caching.
//!
//! No HTTP or SQL here: persistence goes through [`store`], push delivery
//! through [`notification`], and the job-board token through [`token`].

// Trait futures carry explicit `Send` bounds where it matters.
#![allow(async_fn_in_trait)]

pub mod action;
pub mod appointment;
pub mod attribution;
pub mod error;
pub mod home;
pub mod lifecycle;
pub mod notification;
pub mod person;
pub mod scheduler;
pub mod services;
pub mod store;
pub mod token;

pub use error::{Error, Result};
pub use services::Services;
