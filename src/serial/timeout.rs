// src/serial/timeout.rs

//! Polling strategies for status-bit waits
//!
//! Every transfer primitive waits on a status bit through a
//! [`WaitStrategy`]. Three strategies are provided:
//! - [`Spin`]: unbounded busy-wait, the bare-metal default
//! - [`Bounded`]: at most `max_iterations` polls with backoff, then
//!   `UartError::Timeout`
//! - [`Yielding`]: calls a hook between polls (cooperative runtimes,
//!   simulators)

use super::error::UartError;
use core::fmt;

/// Waits until a hardware condition holds.
pub trait WaitStrategy {
    /// Poll `condition` until it returns `true`.
    ///
    /// The condition re-reads hardware on every call; nothing is cached.
    fn wait_until<F>(&mut self, condition: F) -> Result<(), UartError>
    where
        F: FnMut() -> bool;
}

/// Unbounded busy-wait
///
/// Spins forever if the status bit never sets. On bare metal with a single
/// owner of the peripheral this is the only available primitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spin;

impl WaitStrategy for Spin {
    #[inline]
    fn wait_until<F>(&mut self, mut condition: F) -> Result<(), UartError>
    where
        F: FnMut() -> bool,
    {
        while !condition() {
            core::hint::spin_loop();
        }
        Ok(())
    }
}

/// Busy-wait with an iteration budget and backoff between polls
#[derive(Debug, Clone, Copy)]
pub struct Bounded(pub TimeoutConfig);

impl WaitStrategy for Bounded {
    fn wait_until<F>(&mut self, mut condition: F) -> Result<(), UartError>
    where
        F: FnMut() -> bool,
    {
        let mut ctx = TimeoutContext::new(self.0);
        while ctx.tick() {
            if condition() {
                return Ok(());
            }
        }
        Err(UartError::Timeout {
            iterations: ctx.iteration(),
        })
    }
}

/// Unbounded wait that hands control to `hook` between polls
pub struct Yielding<Y>(pub Y);

impl<Y: FnMut()> WaitStrategy for Yielding<Y> {
    fn wait_until<F>(&mut self, mut condition: F) -> Result<(), UartError>
    where
        F: FnMut() -> bool,
    {
        while !condition() {
            (self.0)();
        }
        Ok(())
    }
}

impl<Y> fmt::Debug for Yielding<Y> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Yielding(..)")
    }
}

/// Timeout configuration
#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    /// Maximum iterations for polling operations
    pub max_iterations: u32,
    /// Backoff strategy
    pub backoff: BackoffStrategy,
}

impl TimeoutConfig {
    /// Default timeout (balanced for most hardware)
    pub const fn default_timeout() -> Self {
        Self {
            max_iterations: 1000,
            backoff: BackoffStrategy::Linear,
        }
    }

    /// Short timeout for quick operations
    pub const fn short_timeout() -> Self {
        Self {
            max_iterations: 100,
            backoff: BackoffStrategy::None,
        }
    }

    /// Long timeout for slow baud rates
    pub const fn long_timeout() -> Self {
        Self {
            max_iterations: 10000,
            backoff: BackoffStrategy::Exponential { base: 2, max: 100 },
        }
    }
}

/// Backoff strategy for polling operations
#[derive(Debug, Clone, Copy)]
pub enum BackoffStrategy {
    /// No backoff, busy-wait
    None,
    /// Linear backoff (wait n iterations)
    Linear,
    /// Exponential backoff with max
    Exponential { base: u32, max: u32 },
}

/// Iteration budget for one bounded wait
#[derive(Debug)]
pub struct TimeoutContext {
    config: TimeoutConfig,
    iteration: u32,
}

impl TimeoutContext {
    pub fn new(config: TimeoutConfig) -> Self {
        Self {
            config,
            iteration: 0,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.iteration >= self.config.max_iterations
    }

    /// Spend one iteration, backing off first
    ///
    /// Returns false once the budget is used up.
    pub fn tick(&mut self) -> bool {
        if self.is_expired() {
            return false;
        }

        self.iteration += 1;
        for _ in 0..self.backoff() {
            core::hint::spin_loop();
        }
        true
    }

    /// Spin-loop hints to issue before the current poll
    fn backoff(&self) -> u32 {
        match self.config.backoff {
            BackoffStrategy::None => 0,
            BackoffStrategy::Linear => self.iteration,
            BackoffStrategy::Exponential { base, max } => {
                base.saturating_pow(self.iteration).min(max)
            }
        }
    }

    /// Polls made so far
    pub fn iteration(&self) -> u32 {
        self.iteration
    }
}
