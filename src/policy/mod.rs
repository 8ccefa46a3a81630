//! Time policy module
//!
//! Clock abstraction plus the submission window and overdue rules.

pub mod clock;
pub mod window;

pub use clock::{Clock, SystemClock, FixedClock};
pub use window::{
    overdue, EveningGate, SubmissionPath, SubmissionPlan, SubmissionRejection, Window, WindowPolicy,
};
