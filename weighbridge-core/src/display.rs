//! Presentation Sink Abstraction
//!
//! Rendering hardware is an external collaborator: the core hands a
//! [`DisplayFrame`] to a [`DisplaySink`] and is done. Sinks are expected to
//! redraw only what changed (weight text, link glyph); [`ChangeFilter`]
//! gives any sink that behavior by skipping identical frames.
//!
//! The frame's weight is `None` until the first commit, so a sink shows an
//! explicit placeholder instead of a fabricated `0.00`.

use crate::reading::{format_weight, WeightText, WEIGHT_SENTINEL};

/// What the display should show right now
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayFrame {
    /// Last committed weight; `None` before the first cycle completes
    pub weight: Option<f32>,
    /// Honest link indicator - never "ok" while degraded
    pub link_ok: bool,
}

impl DisplayFrame {
    pub fn new(weight: Option<f32>, link_ok: bool) -> Self {
        Self { weight, link_ok }
    }

    /// Weight text with two fraction digits, or the sentinel placeholder
    pub fn weight_text(&self) -> WeightText {
        match self.weight {
            Some(value) => format_weight(value),
            None => {
                let mut text = WeightText::new();
                let _ = text.push_str(WEIGHT_SENTINEL);
                text
            }
        }
    }
}

/// Rendering capability; stateless from the core's perspective
pub trait DisplaySink {
    fn render(&mut self, frame: &DisplayFrame);
}

/// Sink that draws nothing (headless deployments, benches)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn render(&mut self, _frame: &DisplayFrame) {}
}

/// Sink that records every frame it is asked to draw
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    frames: heapless::Vec<DisplayFrame, 64>,
    renders: u32,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[DisplayFrame] {
        &self.frames
    }

    pub fn last(&self) -> Option<&DisplayFrame> {
        self.frames.last()
    }

    /// Render calls observed, including any dropped by a full buffer
    pub fn renders(&self) -> u32 {
        self.renders
    }
}

impl DisplaySink for RecordingDisplay {
    fn render(&mut self, frame: &DisplayFrame) {
        self.renders += 1;
        let _ = self.frames.push(*frame);
    }
}

/// Adapter that forwards only changed frames to the inner sink
///
/// Satisfies the flicker-avoidance recommendation for sinks whose redraw is
/// expensive (e-paper, slow SPI panels) without each driver re-implementing
/// the comparison.
#[derive(Debug, Clone)]
pub struct ChangeFilter<D: DisplaySink> {
    inner: D,
    last: Option<DisplayFrame>,
}

impl<D: DisplaySink> ChangeFilter<D> {
    pub fn new(inner: D) -> Self {
        Self { inner, last: None }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D: DisplaySink> DisplaySink for ChangeFilter<D> {
    fn render(&mut self, frame: &DisplayFrame) {
        if self.last.as_ref() == Some(frame) {
            return;
        }
        self.inner.render(frame);
        self.last = Some(*frame);
    }
}
