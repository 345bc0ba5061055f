//! Presentation side effects handed to external collaborators
//!
//! The core never talks to the renderer or UI directly. It records requests
//! here and the host drains them once per frame.

use super::paddle::Affectation;
use crate::Side;

/// Request to show a countdown bar for an affectation
#[derive(Debug, Clone, PartialEq)]
pub struct TimerBar {
    pub side: Side,
    /// Wire name of the pickup that started the countdown
    pub label: &'static str,
    pub duration: f32,
}

/// Request to drop the visual layer an affectation added to a paddle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerRemoval {
    pub side: Side,
    pub affectation: Affectation,
}

#[derive(Debug, Clone, Default)]
pub struct Outbox {
    /// Render handle ids whose drawables should be destroyed
    pub detached_graphics: Vec<u64>,
    pub layer_removals: Vec<LayerRemoval>,
    pub timer_bars: Vec<TimerBar>,
}

impl Outbox {
    /// Hand everything recorded so far to the caller
    pub fn take(&mut self) -> Outbox {
        std::mem::take(self)
    }

    pub fn is_empty(&self) -> bool {
        self.detached_graphics.is_empty()
            && self.layer_removals.is_empty()
            && self.timer_bars.is_empty()
    }
}
