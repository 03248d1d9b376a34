// Recurring tick scheduled on a worker thread

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

/// Sends an event every `interval` until cancelled
///
/// Deadlines are computed from the start instant, so a late wake-up is
/// followed by catch-up ticks instead of drifting. Dropping the ticker
/// cancels it.
pub struct Ticker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn start<E, F>(interval: Duration, sender: Sender<E>, mut make_event: F) -> Self
    where
        E: Send + 'static,
        F: FnMut() -> E + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            let mut next = Instant::now() + interval;
            debug!(interval_ms = interval.as_millis() as u64, "Ticker started");

            loop {
                let now = Instant::now();
                if now < next {
                    thread::park_timeout(next - now);
                }
                if flag.load(Ordering::Acquire) {
                    break;
                }

                while next <= Instant::now() {
                    if sender.send(make_event()).is_err() {
                        debug!("Tick receiver dropped, ticker exiting");
                        return;
                    }
                    next += interval;
                }
            }

            debug!("Ticker cancelled");
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// True until the ticker is cancelled or its receiver goes away
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the worker and wait for it; no tick is sent after this returns
    pub fn cancel(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.stop.store(true, Ordering::Release);
        handle.thread().unpark();
        let _ = handle.join();
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_ticker_delivers_ticks() {
        let (tx, rx) = mpsc::channel();
        let mut count = 0u32;
        let mut ticker = Ticker::start(Duration::from_millis(5), tx, move || {
            count += 1;
            count
        });

        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert!(ticker.is_active());

        ticker.cancel();
        assert!(!ticker.is_active());
    }

    #[test]
    fn test_no_ticks_after_cancel() {
        let (tx, rx) = mpsc::channel();
        let mut ticker = Ticker::start(Duration::from_millis(2), tx, || ());

        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        ticker.cancel();

        // Drain anything sent before cancel returned, then nothing more arrives
        while rx.try_recv().is_ok() {}
        thread::sleep(Duration::from_millis(20));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_cancel_is_prompt_for_long_interval() {
        let (tx, rx) = mpsc::channel::<()>();
        let started = Instant::now();

        let mut ticker = Ticker::start(Duration::from_secs(60), tx, || ());
        ticker.cancel();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_drop_cancels() {
        let (tx, rx) = mpsc::channel();
        {
            let _ticker = Ticker::start(Duration::from_millis(2), tx, || ());
            rx.recv_timeout(Duration::from_secs(2)).unwrap();
        }

        while rx.try_recv().is_ok() {}
        // Sender was moved into the worker, which has exited
        assert!(matches!(rx.recv_timeout(Duration::from_millis(20)), Err(mpsc::RecvTimeoutError::Disconnected)));
    }
}
