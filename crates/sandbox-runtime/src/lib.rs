#![deny(warnings)]

//! Runtime for playing levels: the per-scenario state machine, level runs,
//! the completion gate and certificate issuance.

pub mod certificate;
pub mod gate;
pub mod run;
pub mod session;

pub use certificate::{
    completion_date_today, issue_certificate, Certificate, CertificateError,
    CertificateFormatter, CertificateRequest, PlainTextFormatter, MAX_NAME_CHARS,
};
pub use gate::{certificate_access, check_all_levels_completed, completion_stats_for, GateDecision};
pub use run::{LevelRun, RunError, RunSummary, Submission};
pub use session::{derive_completion, ResponseState, ScenarioPhase, ScenarioSession, SessionError};
