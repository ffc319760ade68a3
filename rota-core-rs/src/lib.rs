//! ROTA Core Library
//!
//! Duty roster rotation for a shared channel: operators enroll during a
//! fixed window, two of them are put on duty once quorum is met, and the
//! shift rotates on a fixed period until the roster falls below quorum.

pub mod types;
pub mod error;
pub mod config;
pub mod selector;
pub mod session;
pub mod registry;
pub mod presenter;
pub mod scheduler;

pub use types::*;
pub use error::{PresenterError, RosterError};
pub use config::{SchedulerConfig, MIN_ROTATION_PERIOD};
pub use selector::{RandomSelector, SeededSelector, UniformSelector};
pub use session::{Departure, Session, DUTY_SLOTS, QUORUM};
pub use registry::SessionRegistry;
pub use presenter::{NullPresenter, RecordingPresenter, RosterPresenter};
pub use scheduler::RotationScheduler;
