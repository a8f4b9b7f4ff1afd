//! Cooperative interruption of long searches.
//!
//! A search polls its [`Interrupt`] every `check_interval` finalized
//! cells and gives up with [`LcpError::Interrupted`](crate::LcpError)
//! once it reports `true`.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

pub trait Interrupt {
    fn is_interrupted(&self) -> bool;
}

/// Never interrupts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Never;

impl Interrupt for Never {
    #[inline]
    fn is_interrupted(&self) -> bool {
        false
    }
}

/// A cancellation flag, typically shared with another thread.
impl Interrupt for AtomicBool {
    fn is_interrupted(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// Interrupts once a wall-clock instant has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }
}

impl Interrupt for Deadline {
    fn is_interrupted(&self) -> bool {
        Instant::now() >= self.0
    }
}

impl<I: Interrupt + ?Sized> Interrupt for &I {
    fn is_interrupted(&self) -> bool {
        (**self).is_interrupted()
    }
}

impl<I: Interrupt + ?Sized> Interrupt for Arc<I> {
    fn is_interrupted(&self) -> bool {
        (**self).is_interrupted()
    }
}

/// Interrupts when either side does.
impl<A: Interrupt, B: Interrupt> Interrupt for (A, B) {
    fn is_interrupted(&self) -> bool {
        self.0.is_interrupted() || self.1.is_interrupted()
    }
}
