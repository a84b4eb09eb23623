//! Constant-velocity scrolling with sub-pixel accumulation.

/// Integrates a velocity in pixels per second into a whole-pixel offset. The fractional
/// part carries over between ticks so slow or uneven ticks do not drift.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutoScroll {
    velocity: (f64, f64),
    accumulator: (f64, f64),
    offset: (i64, i64),
    last_tick_ms: Option<u64>,
}

impl AutoScroll {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self {
            velocity: (dx, dy),
            ..Self::default()
        }
    }

    pub fn velocity(&self) -> (f64, f64) {
        self.velocity
    }

    pub fn offset(&self) -> (i64, i64) {
        self.offset
    }

    pub fn is_moving(&self) -> bool {
        self.velocity != (0.0, 0.0)
    }

    /// The first tick only records the time.
    pub fn tick(&mut self, now_ms: u64) {
        let Some(last_tick_ms) = self.last_tick_ms.replace(now_ms) else {
            return;
        };
        let elapsed_ms = now_ms.saturating_sub(last_tick_ms) as f64;

        let (x, dx) = Self::integrate(self.accumulator.0, self.velocity.0, elapsed_ms);
        let (y, dy) = Self::integrate(self.accumulator.1, self.velocity.1, elapsed_ms);
        self.accumulator = (x, y);
        self.offset.0 += dx;
        self.offset.1 += dy;
    }

    // returns the new fractional remainder and the whole pixels to move
    fn integrate(accumulator: f64, velocity: f64, elapsed_ms: f64) -> (f64, i64) {
        let total = accumulator + velocity * elapsed_ms / 1000.0;
        let whole = total.trunc();
        (total - whole, whole as i64)
    }

    /// Offset wrapped into `0..width` and `0..height` for tiling a frame of that size.
    pub fn wrapped(&self, width: u32, height: u32) -> (i32, i32) {
        (wrap(self.offset.0, width), wrap(self.offset.1, height))
    }
}

fn wrap(offset: i64, size: u32) -> i32 {
    if size == 0 {
        return 0;
    }
    offset.rem_euclid(i64::from(size)) as i32
}
