use std::sync::Arc;
#[cfg(test)]
use std::time::Duration;

use anyhow::Result;
use parking_lot::{Condvar, Mutex};

use super::queue::RequestQueue;
use super::request::CowRequest;

/// One-shot completion flag for a display cycle, set by the GUI thread when
/// the popup reaches its terminal state.
#[derive(Debug, Default)]
pub struct DisplayCompletion {
    done: Mutex<bool>,
    cond: Condvar,
}

impl DisplayCompletion {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn signal(&self) {
        *self.done.lock() = true;
        self.cond.notify_all();
    }

    #[cfg(test)]
    pub fn is_done(&self) -> bool {
        *self.done.lock()
    }

    pub fn wait(&self) {
        let mut done = self.done.lock();
        while !*done {
            self.cond.wait(&mut done);
        }
    }

    /// Returns true if the cycle completed before the timeout.
    #[cfg(test)]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut done = self.done.lock();
        if !*done {
            self.cond.wait_for(&mut done, timeout);
        }
        *done
    }
}

/// Hands a request over to the thread that owns the GUI.
pub trait DisplaySink {
    fn submit(&self, request: CowRequest) -> Result<Arc<DisplayCompletion>>;
}

/// Single consumer loop: show each queued request in turn, waiting for one
/// display cycle to finish before admitting the next. Returns when the queue
/// is closed or the GUI stops accepting requests.
pub fn run_display_worker<S: DisplaySink>(queue: &RequestQueue, sink: &S) {
    tracing::debug!("Display worker started");

    while let Some(request) = queue.dequeue_blocking() {
        tracing::debug!("Displaying {:?} request", request.mode);
        match sink.submit(request) {
            Ok(done) => done.wait(),
            Err(e) => {
                tracing::error!("Failed to hand request to display: {:#}", e);
                break;
            }
        }
        queue.complete_head();
    }

    tracing::debug!("Display worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Completes every request on a background thread after a short delay,
    /// recording the order and whether two cycles ever overlapped.
    struct DelayedSink {
        shown: Arc<Mutex<Vec<String>>>,
        active: Arc<AtomicUsize>,
        overlapped: Arc<AtomicBool>,
    }

    impl DelayedSink {
        fn new() -> Self {
            Self {
                shown: Arc::new(Mutex::new(Vec::new())),
                active: Arc::new(AtomicUsize::new(0)),
                overlapped: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl DisplaySink for DelayedSink {
        fn submit(&self, request: CowRequest) -> Result<Arc<DisplayCompletion>> {
            if self.active.fetch_add(1, Ordering::SeqCst) > 0 {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            self.shown.lock().push(request.content);

            let done = DisplayCompletion::new();
            let signal = Arc::clone(&done);
            let active = Arc::clone(&self.active);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(10));
                active.fetch_sub(1, Ordering::SeqCst);
                signal.signal();
            });
            Ok(done)
        }
    }

    struct ClosedSink;

    impl DisplaySink for ClosedSink {
        fn submit(&self, _request: CowRequest) -> Result<Arc<DisplayCompletion>> {
            anyhow::bail!("event loop closed")
        }
    }

    #[test]
    fn test_worker_displays_in_order_without_overlap() {
        let queue = Arc::new(RequestQueue::new());
        for name in ["A", "B", "C"] {
            queue.enqueue(CowRequest::say(name)).unwrap();
        }

        let sink = DelayedSink::new();
        let shown = Arc::clone(&sink.shown);
        let overlapped = Arc::clone(&sink.overlapped);
        let worker = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || run_display_worker(&queue, &sink))
        };

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !queue.is_empty() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        queue.close();
        worker.join().unwrap();

        assert_eq!(*shown.lock(), vec!["A", "B", "C"]);
        assert!(!overlapped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_worker_keeps_head_while_displaying() {
        let queue = Arc::new(RequestQueue::new());
        queue.enqueue(CowRequest::say("first")).unwrap();

        struct HoldSink(Arc<Mutex<Option<Arc<DisplayCompletion>>>>);
        impl DisplaySink for HoldSink {
            fn submit(&self, _request: CowRequest) -> Result<Arc<DisplayCompletion>> {
                let done = DisplayCompletion::new();
                *self.0.lock() = Some(Arc::clone(&done));
                Ok(done)
            }
        }

        let held = Arc::new(Mutex::new(None));
        let worker = {
            let queue = Arc::clone(&queue);
            let sink = HoldSink(Arc::clone(&held));
            std::thread::spawn(move || run_display_worker(&queue, &sink))
        };

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while held.lock().is_none() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        queue.enqueue(CowRequest::say("second")).unwrap();
        assert_eq!(queue.in_flight(), Some(CowRequest::say("first")));
        assert_eq!(queue.pending(), 1);

        let done = held.lock().take().unwrap();
        queue.close();
        done.signal();
        worker.join().unwrap();
    }

    #[test]
    fn test_worker_stops_when_sink_fails() {
        let queue = RequestQueue::new();
        queue.enqueue(CowRequest::say("A")).unwrap();

        run_display_worker(&queue, &ClosedSink);

        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_completion_wait_timeout() {
        let done = DisplayCompletion::new();
        assert!(!done.wait_timeout(Duration::from_millis(10)));
        done.signal();
        assert!(done.wait_timeout(Duration::from_millis(10)));
        assert!(done.is_done());
        done.wait();
    }
}
