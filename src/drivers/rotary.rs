//! Polled quadrature decoder for the brightness dial.
//!
//! Samples the CLK/DT lines each loop iteration and accumulates gray-code
//! transitions. One mechanical detent is four valid quarter-steps; the
//! decoder emits a ±1 step per detent, which the service maps to one
//! brightness unit. Invalid transitions (skipped states from slow polling
//! or contact noise) reset the accumulator rather than guessing direction.

/// Direction lookup indexed by `(prev_state << 2) | new_state`, where a
/// state is `(clk << 1) | dt`. +1 / -1 are valid quarter-steps, 0 is either
/// "no movement" or an invalid two-bit jump.
const TRANSITIONS: [i8; 16] = [
    0, 1, -1, 0, //
    -1, 0, 0, 1, //
    1, 0, 0, -1, //
    0, -1, 1, 0,
];

pub struct RotaryDecoder {
    prev_state: u8,
    accum: i8,
}

impl RotaryDecoder {
    /// `clk`/`dt` are the idle line levels at construction time.
    pub fn new(clk: bool, dt: bool) -> Self {
        Self {
            prev_state: Self::encode(clk, dt),
            accum: 0,
        }
    }

    fn encode(clk: bool, dt: bool) -> u8 {
        (u8::from(clk) << 1) | u8::from(dt)
    }

    /// Feed one sample of both lines. Returns a detent step: -1, 0 or +1.
    pub fn sample(&mut self, clk: bool, dt: bool) -> i8 {
        let state = Self::encode(clk, dt);
        if state == self.prev_state {
            return 0;
        }

        let quarter = TRANSITIONS[usize::from((self.prev_state << 2) | state)];
        self.prev_state = state;

        if quarter == 0 {
            // Skipped a state — direction unknowable, drop the partial turn.
            self.accum = 0;
            return 0;
        }

        self.accum += quarter;
        if self.accum >= 4 {
            self.accum = 0;
            1
        } else if self.accum <= -4 {
            self.accum = 0;
            -1
        } else {
            0
        }
    }
}
