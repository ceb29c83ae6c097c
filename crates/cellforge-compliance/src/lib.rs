//! Task compliance auditing for the Cellforge population engine.
//!
//! Every task outcome an entity produces is appended to the
//! [`ComplianceMonitor`]. The monitor never edits or drops a record; the
//! population-wide [`Verdict`] is derived from the log on every call and
//! never cached.
//!
//! # Verdict rule
//!
//! ```text
//! compliant  <=>  every record has status == completed
//! violations  =   all non-completed records, in recording order
//! ```
//!
//! # Usage
//!
//! ```
//! use cellforge_compliance::ComplianceMonitor;
//! use cellforge_types::{ComplianceStatus, EntityId, Task};
//!
//! let mut monitor = ComplianceMonitor::new();
//! let child = EntityId::from("CHILD_1");
//! monitor.record(&child, &Task::from("scan"), ComplianceStatus::Completed, None);
//! monitor.record(
//!     &child,
//!     &Task::from("evolve"),
//!     ComplianceStatus::Pending,
//!     Some(String::from("insufficient energy")),
//! );
//!
//! let verdict = monitor.verdict();
//! assert!(!verdict.compliant);
//! assert_eq!(verdict.violations.len(), 1);
//! ```

pub mod error;
pub mod monitor;

pub use error::ComplianceError;
pub use monitor::{ComplianceMonitor, Verdict, Violation};
