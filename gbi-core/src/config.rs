use crate::CYCLES_PER_FRAME;
use serde::{Deserialize, Serialize};
use std::fmt::Formatter;

/// Settings for the console driver. The interpreter itself has no configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulationConfig {
    /// Cycle budget for one `Console::run_frame` call.
    pub frame_cycles: u32,
    /// Whether `Console::step` dispatches pending interrupts before fetching.
    pub service_interrupts: bool,
}

impl Default for EmulationConfig {
    fn default() -> Self {
        Self {
            frame_cycles: CYCLES_PER_FRAME,
            service_interrupts: true,
        }
    }
}

impl std::fmt::Display for EmulationConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "frame_cycles: {}", self.frame_cycles)?;
        writeln!(f, "service_interrupts: {}", self.service_interrupts)?;

        Ok(())
    }
}
