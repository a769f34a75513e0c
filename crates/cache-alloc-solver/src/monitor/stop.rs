// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering::Relaxed};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Cooperative stop flag shared by the batch, its workers, the strategies and
/// the [`Watchdog`]. Clones observe the same flag.
#[derive(Clone, Default, Debug)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
    #[inline]
    pub fn is_set(&self) -> bool {
        self.0.load(Relaxed)
    }
    #[inline]
    pub fn request_stop(&self) {
        self.0.store(true, Relaxed)
    }
}

impl PartialEq for StopToken {
    /// Two tokens are equal when they share one flag.
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for StopToken {}

impl fmt::Display for StopToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_set() { "stopped" } else { "running" };
        write!(f, "StopToken({})", state)
    }
}

const WATCHDOG_TICK: Duration = Duration::from_millis(10);

/// Background thread that trips a [`StopToken`] once a deadline passes.
///
/// Dropping the watchdog disarms it and joins the thread; the token is left
/// untouched if the deadline has not been reached.
#[derive(Debug)]
pub struct Watchdog {
    disarmed: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Watchdog {
    pub fn arm(token: StopToken, limit: Duration) -> Self {
        let disarmed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&disarmed);
        let deadline = Instant::now() + limit;

        let handle = std::thread::spawn(move || {
            loop {
                if flag.load(Relaxed) || token.is_set() {
                    return;
                }
                let now = Instant::now();
                if now >= deadline {
                    tracing::info!(limit_ms = limit.as_millis() as u64, "time limit reached");
                    token.request_stop();
                    return;
                }
                std::thread::sleep(WATCHDOG_TICK.min(deadline - now));
            }
        });

        Self {
            disarmed,
            handle: Some(handle),
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.disarmed.store(true, Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_request_reaches_a_polling_worker() {
        let token = StopToken::new();
        assert_eq!(token, token.clone());
        assert_ne!(token, StopToken::new());
        assert_eq!(token.to_string(), "StopToken(running)");

        let worker = {
            let token = token.clone();
            std::thread::spawn(move || {
                while !token.is_set() {
                    std::thread::yield_now();
                }
            })
        };
        token.request_stop();
        assert!(worker.join().is_ok());
        assert_eq!(token.to_string(), "StopToken(stopped)");
    }

    #[test]
    fn external_stop_releases_watchdog_before_its_deadline() {
        let token = StopToken::new();
        let dog = Watchdog::arm(token.clone(), Duration::from_secs(60));
        token.request_stop();
        let start = Instant::now();
        drop(dog);
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(token.is_set());
    }

    #[test]
    fn watchdog_trips_token_after_deadline() {
        let token = StopToken::new();
        let _dog = Watchdog::arm(token.clone(), Duration::from_millis(20));
        let start = Instant::now();
        while !token.is_set() {
            assert!(start.elapsed() < Duration::from_secs(5), "watchdog never fired");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn dropped_watchdog_leaves_token_alone() {
        let token = StopToken::new();
        drop(Watchdog::arm(token.clone(), Duration::from_secs(60)));
        assert!(!token.is_set());
    }
}
