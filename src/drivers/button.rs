//! Polled, debounced multi-click decoder for the encoder push button.
//!
//! ## Hardware
//!
//! Momentary switch on the rotary encoder shaft, polarity-configurable
//! (the shipped board wires it active-low with an internal pull-up). The
//! main loop feeds raw level samples into [`ClickDecoder::sample`] each
//! iteration; no ISR is involved.
//!
//! ## Gesture detection
//!
//! | Gesture       | Condition                                        |
//! |---------------|--------------------------------------------------|
//! | Single        | one release, then the grouping window elapses    |
//! | Double        | two releases, then the grouping window elapses   |
//! | TripleOrMore  | third release inside the window — fires at once  |
//!
//! The triple path resolves immediately on the third release rather than
//! waiting out the window: it drives the schedule override and must feel
//! instant. Releases arriving after a triple already resolved are ignored
//! (the pending count is zeroed on resolution).

/// Minimum gap between accepted button edges.
pub const DEBOUNCE_MS: u32 = 35;
/// Grouping window for single/double/triple classification.
pub const MULTI_CLICK_WINDOW_MS: u32 = 600;

/// Classified click gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickEvent {
    Single,
    Double,
    TripleOrMore,
}

/// Debounce + grouping state machine over raw pressed samples.
///
/// Conceptual states: `Idle` (no pending clicks), `Debouncing` (an edge was
/// seen less than [`DEBOUNCE_MS`] ago) and `CountingClicks` (pending > 0,
/// grouping window open). They are encoded in the fields below rather than
/// an enum because debouncing overlaps both other states.
pub struct ClickDecoder {
    active_low: bool,
    debounce_ms: u32,
    window_ms: u32,
    prev_pressed: bool,
    last_edge_ms: u32,
    pending: u8,
    first_click_ms: u32,
    last_release_ms: u32,
}

impl ClickDecoder {
    pub fn new(active_low: bool, debounce_ms: u32, window_ms: u32) -> Self {
        Self {
            active_low,
            debounce_ms,
            window_ms,
            prev_pressed: false,
            last_edge_ms: 0,
            pending: 0,
            first_click_ms: 0,
            last_release_ms: 0,
        }
    }

    /// Decoder with the shipped-hardware timings.
    pub fn with_defaults(active_low: bool) -> Self {
        Self::new(active_low, DEBOUNCE_MS, MULTI_CLICK_WINDOW_MS)
    }

    /// Feed one raw GPIO level sample. Returns a classified gesture when a
    /// grouping resolves; never emits while counting is still in progress.
    pub fn sample(&mut self, raw_level: bool, now_ms: u32) -> Option<ClickEvent> {
        let pressed = if self.active_low { !raw_level } else { raw_level };

        if pressed != self.prev_pressed
            && now_ms.wrapping_sub(self.last_edge_ms) > self.debounce_ms
        {
            self.last_edge_ms = now_ms;
            let release = self.prev_pressed && !pressed;
            self.prev_pressed = pressed;

            if release {
                if self.pending == 0 {
                    self.first_click_ms = now_ms;
                }
                self.pending = self.pending.saturating_add(1);
                self.last_release_ms = now_ms;

                // Low-latency path: a third release inside the window
                // resolves immediately.
                if self.pending >= 3
                    && now_ms.wrapping_sub(self.first_click_ms) <= self.window_ms
                {
                    self.pending = 0;
                    return Some(ClickEvent::TripleOrMore);
                }
            }
        }

        if self.pending > 0 && now_ms.wrapping_sub(self.last_release_ms) > self.window_ms {
            let clicks = self.pending;
            self.pending = 0;
            return Some(match clicks {
                1 => ClickEvent::Single,
                2 => ClickEvent::Double,
                _ => ClickEvent::TripleOrMore,
            });
        }

        None
    }
}
