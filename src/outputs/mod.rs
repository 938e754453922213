//! Output generation: tabular serialization and durable sinks.
//!
//! # Submodules
//!
//! - [`csv`]: Renders the accepted article set as CSV rows with a fixed
//!   column order
//! - [`sink`]: Persists the rendered bytes to the configured destination
//!   (local filesystem path or S3 object) and reports the identifier of
//!   what was written
//!
//! A failed sink write is fatal to the run: a dataset that cannot be
//! persisted reports overall failure even when extraction succeeded.

pub mod csv;
pub mod sink;
