// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Readiness barrier - a lock-guarded bitmask with clear-on-consume waits
//!
//! Producers `signal` their bit after publishing fresh data. The aggregator
//! calls `await_all` with its required mask and is released exactly once
//! all required bits are set, at which point those bits are cleared in the
//! same critical section that observed them. Repeated signals between two
//! consumptions coalesce into one.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

/// Set of readiness bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReadinessMask(u32);

impl ReadinessMask {
    pub const EMPTY: ReadinessMask = ReadinessMask(0);

    /// Mask with only bit `index` set
    pub const fn bit(index: u8) -> Self {
        ReadinessMask(1 << index)
    }

    pub const fn from_bits(bits: u32) -> Self {
        ReadinessMask(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `other` is also set in `self`
    pub const fn contains(self, other: ReadinessMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Bits in `self` that are not in `other`
    pub const fn difference(self, other: ReadinessMask) -> ReadinessMask {
        ReadinessMask(self.0 & !other.0)
    }
}

impl BitOr for ReadinessMask {
    type Output = ReadinessMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        ReadinessMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for ReadinessMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ReadinessMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#07b}", self.0)
    }
}

/// Returned by [`ReadinessSet::await_all_timeout`] when the deadline passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stalled {
    /// Required bits that were still clear at the deadline
    pub missing: ReadinessMask,
}

/// Rendezvous point between producers and the aggregator
pub struct ReadinessSet {
    current: Mutex<ReadinessMask>,
    notify: Notify,
}

impl ReadinessSet {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(ReadinessMask::EMPTY),
            notify: Notify::new(),
        }
    }

    /// Set `bits` and wake every waiter so it can re-check its mask.
    pub fn signal(&self, bits: ReadinessMask) {
        {
            let mut current = self.current.lock();
            *current |= bits;
        }
        self.notify.notify_waiters();
    }

    /// Bits currently set, without consuming anything
    pub fn peek(&self) -> ReadinessMask {
        *self.current.lock()
    }

    /// Check-and-clear in one critical section. Returns `true` and clears
    /// exactly `required` if all of it was set; otherwise leaves the mask
    /// untouched.
    pub fn try_consume(&self, required: ReadinessMask) -> bool {
        let mut current = self.current.lock();
        if current.contains(required) {
            *current = current.difference(required);
            true
        } else {
            false
        }
    }

    /// Wait until every bit of `required` is set, then clear those bits.
    ///
    /// Cancel safe: the bits are only cleared in the same poll that
    /// returns, so dropping the future never loses a signal.
    pub async fn await_all(&self, required: ReadinessMask) {
        loop {
            // Register before checking so a signal racing the check still
            // wakes us.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.try_consume(required) {
                return;
            }

            notified.await;
        }
    }

    /// [`await_all`](Self::await_all) bounded by `timeout`. Nothing is
    /// consumed on timeout.
    pub async fn await_all_timeout(
        &self,
        required: ReadinessMask,
        timeout: Duration,
    ) -> Result<(), Stalled> {
        match tokio::time::timeout(timeout, self.await_all(required)).await {
            Ok(()) => Ok(()),
            Err(_) => Err(Stalled {
                missing: required.difference(self.peek()),
            }),
        }
    }
}

impl Default for ReadinessSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const A: ReadinessMask = ReadinessMask::bit(0);
    const B: ReadinessMask = ReadinessMask::bit(1);
    const C: ReadinessMask = ReadinessMask::bit(2);
    const SHORT: Duration = Duration::from_millis(50);

    async fn blocks(set: &ReadinessSet, required: ReadinessMask) -> bool {
        tokio::time::timeout(SHORT, set.await_all(required)).await.is_err()
    }

    #[tokio::test]
    async fn test_signals_before_wait_release_immediately() {
        let set = ReadinessSet::new();
        set.signal(C);
        set.signal(A);
        set.signal(B);

        tokio::time::timeout(SHORT, set.await_all(A | B | C))
            .await
            .expect("all bits were already set");
    }

    #[tokio::test]
    async fn test_waiter_wakes_only_when_all_present() {
        let set = Arc::new(ReadinessSet::new());
        let waiter = {
            let set = set.clone();
            tokio::spawn(async move { set.await_all(A | B | C).await })
        };

        set.signal(A);
        set.signal(B);
        tokio::time::sleep(SHORT).await;
        assert!(!waiter.is_finished());

        set.signal(C);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
        assert_eq!(set.peek(), ReadinessMask::EMPTY);
    }

    #[tokio::test]
    async fn test_consume_clears_bits() {
        let set = ReadinessSet::new();
        set.signal(A | B);
        set.await_all(A | B).await;

        assert!(blocks(&set, A | B).await);
    }

    #[tokio::test]
    async fn test_repeated_signals_coalesce() {
        let set = ReadinessSet::new();
        set.signal(A);
        set.signal(A);
        set.signal(B);

        set.await_all(A | B).await;
        set.signal(B);
        // A was signaled twice but only counts once
        assert!(blocks(&set, A | B).await);
    }

    #[tokio::test]
    async fn test_subset_leaves_other_bits() {
        let set = ReadinessSet::new();
        set.signal(A | C);
        set.await_all(A).await;
        assert_eq!(set.peek(), C);
    }

    #[test]
    fn test_try_consume_is_all_or_nothing() {
        let set = ReadinessSet::new();
        set.signal(A);
        assert!(!set.try_consume(A | B));
        assert_eq!(set.peek(), A);

        set.signal(B);
        assert!(set.try_consume(A | B));
        assert!(set.peek().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_reports_missing_bits() {
        let set = ReadinessSet::new();
        set.signal(B);

        let err = set.await_all_timeout(A | B | C, SHORT).await.unwrap_err();
        assert_eq!(err.missing, A | C);
        // Nothing consumed on timeout
        assert_eq!(set.peek(), B);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_no_lost_wakeups_under_contention() {
        let set = Arc::new(ReadinessSet::new());
        let rounds = 200;

        let consumer = {
            let set = set.clone();
            tokio::spawn(async move {
                for _ in 0..rounds {
                    set.await_all(A | B | C).await;
                }
            })
        };

        let producers: Vec<_> = [A, B, C]
            .into_iter()
            .map(|bit| {
                let set = set.clone();
                tokio::spawn(async move {
                    // Keep signaling until the consumer has finished; any
                    // lost wake-up would stall it and trip the timeout.
                    loop {
                        set.signal(bit);
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        let result = tokio::time::timeout(Duration::from_secs(10), consumer).await;
        for p in producers {
            p.abort();
        }
        result.expect("consumer stalled").unwrap();
    }
}
