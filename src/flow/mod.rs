//! Sustained high-quality episode tracking.
//!
//! The indicator bundle here is separate from the `Flow` process
//! state: the classifier labels single samples, while the bundle drives the
//! continuous episode lifecycle. The two may disagree at the margins.

mod indicators;
mod tracker;

pub use indicators::{FlowCheck, FlowIndicators};
pub use tracker::FlowTracker;
