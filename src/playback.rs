//! Which frame of an animated layer is on screen, advanced once per tick.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// How many more times an animation may pass its end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoopCount {
    #[default]
    Infinite,
    /// `Finite(0)` holds the current frame.
    Finite(u32),
}

impl LoopCount {
    /// `-1` (or any negative count) loops forever.
    pub fn from_signed(count: i64) -> Self {
        match u32::try_from(count) {
            Ok(count) => LoopCount::Finite(count),
            Err(_) if count < 0 => LoopCount::Infinite,
            Err(_) => LoopCount::Finite(u32::MAX),
        }
    }

    /// Uses up one loop, returns true once none are left.
    fn consume(&mut self) -> bool {
        match self {
            LoopCount::Infinite => false,
            LoopCount::Finite(remaining) => {
                *remaining = remaining.saturating_sub(1);
                *remaining == 0
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackOptions {
    pub ping_pong: bool,
    pub loops: LoopCount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playback {
    current: usize,
    next_advance_ms: u64,
    direction: Direction,
    ping_pong: bool,
    remaining: LoopCount,
}

impl Playback {
    /// Starts on frame 0, which stays up for `first_delay_ms` from `now_ms`.
    pub fn new(options: PlaybackOptions, now_ms: u64, first_delay_ms: u32) -> Self {
        Self {
            current: 0,
            next_advance_ms: now_ms + u64::from(first_delay_ms),
            direction: Direction::Forward,
            ping_pong: options.ping_pong,
            remaining: options.loops,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn remaining_loops(&self) -> LoopCount {
        self.remaining
    }

    pub fn is_holding(&self) -> bool {
        self.remaining == LoopCount::Finite(0)
    }

    /// Moves at most one frame if `now_ms` has reached the scheduled advance. `delays` holds
    /// the display time of every frame and must not be empty.
    pub fn tick(&mut self, now_ms: u64, delays: &[u32]) {
        if delays.is_empty() || self.is_holding() || now_ms < self.next_advance_ms {
            return;
        }

        let last = delays.len() - 1;
        match self.direction {
            Direction::Forward if self.current >= last => {
                if self.ping_pong {
                    self.direction = Direction::Backward;
                    self.current = last.saturating_sub(1);
                } else if self.remaining.consume() {
                    self.current = last;
                } else {
                    self.current = 0;
                }
            }
            Direction::Forward => self.current += 1,
            Direction::Backward if self.current == 0 => {
                self.direction = Direction::Forward;
                if self.remaining.consume() {
                    self.current = 0;
                } else {
                    self.current = 1.min(last);
                }
            }
            Direction::Backward => self.current -= 1,
        }

        self.next_advance_ms = now_ms + u64::from(delays[self.current]);
    }
}
