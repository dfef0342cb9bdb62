// ── Runtime controller configuration ──
//
// Tuning for a `Controller`. Never touches disk: the CLI builds one from
// its loaded profile and hands it in.

use std::time::Duration;

use crate::layout::LayoutConfig;
use crate::scheduler::DEFAULT_FRAME_INTERVAL;

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub layout: LayoutConfig,
    /// Animation clock period for [`FrameScheduler`](crate::FrameScheduler).
    pub frame_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }
}
