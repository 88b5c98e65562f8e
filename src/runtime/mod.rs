//! # Runtime
//!
//! Process wiring: startup, the controller watch loop and the error policy
//! that turns failed reconciliations into retry decisions.

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
