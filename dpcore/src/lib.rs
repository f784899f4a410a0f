//! Periodic bit-pattern generation on a digital output line
//!
//! A [`pat::Pattern`] is emitted one bit per period by a
//! [`gen::Generator`], which drives an [`out::OutputDriver`] and waits on
//! absolute deadlines kept by a [`sched::Scheduler`]. An optional clock line
//! is toggled at the start of every pattern cycle. Generation ends at the end
//! of the pattern (unless repeating) or when a [`shutdown::Shutdown`] token
//! is triggered, and both routes go through [`shutdown::finalize`].

pub mod cfg;
pub mod gen;
pub mod out;
pub mod pat;
pub mod sched;
pub mod shutdown;
pub mod sim;

/// Number of bits per row when dumping a pattern to the log
pub const DUMP_COLUMNS: usize = 32;
