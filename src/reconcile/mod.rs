//! Three-way reconciliation of `current`, `local` and `master`.
//!
//! [`classify`] derives the four change sets from pairs of inventories,
//! [`resolve`] assigns every touched path a single [`PathState`] and projects
//! the four resolvers from it, and [`plan`] turns the states into push/pull
//! plans and the status report. Everything here is pure.

mod classify;
mod plan;
mod resolve;

pub use classify::{diff_modified, diff_removed, ChangeSets, PathSet};
pub use plan::{PullPlan, PushPlan, StatusReport};
pub use resolve::{PathState, Reconciliation, Resolution};
