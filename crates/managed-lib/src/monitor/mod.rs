//! Polling loop over all managed containers
//!
//! One cycle runs every container's checks in configuration order, folds
//! their actions into the host action and lets the host action decide
//! whether to notify.

mod r#loop;


pub use r#loop::{CycleReport, Monitor, MonitorBuilder, MonitorConfig};
