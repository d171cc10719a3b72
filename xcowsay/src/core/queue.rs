use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

use super::request::CowRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request queue is closed")]
pub struct QueueClosed;

#[derive(Debug, Default)]
struct QueueState {
    requests: VecDeque<CowRequest>,
    in_flight: bool,
    closed: bool,
}

/// Unbounded FIFO of display requests shared between any number of
/// producers and a single display consumer.
///
/// The consumer peeks the head with [`dequeue_blocking`](Self::dequeue_blocking)
/// and only removes it with [`complete_head`](Self::complete_head) once its
/// display cycle has finished, so the in-flight request stays at the front
/// of the queue for the whole cycle.
#[derive(Debug, Default)]
pub struct RequestQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request and wake the consumer. Never blocks on display.
    /// Returns the number of requests now held, including any in flight.
    pub fn enqueue(&self, request: CowRequest) -> Result<usize, QueueClosed> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(QueueClosed);
        }
        tracing::debug!("Enqueue {:?} request", request.mode);
        state.requests.push_back(request);
        let len = state.requests.len();
        drop(state);

        self.available.notify_one();
        Ok(len)
    }

    /// Block until a request is available and return a copy of the head
    /// without removing it. Returns `None` once the queue is closed.
    pub fn dequeue_blocking(&self) -> Option<CowRequest> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(head) = state.requests.front() {
                let head = head.clone();
                state.in_flight = true;
                return Some(head);
            }
            self.available.wait(&mut state);
        }
    }

    /// Remove the in-flight head after its display cycle has completed.
    ///
    /// # Panics
    ///
    /// Panics if no request is in flight: the consumer must call
    /// `dequeue_blocking` first and complete each head exactly once.
    pub fn complete_head(&self) -> CowRequest {
        let mut state = self.state.lock();
        assert!(
            state.in_flight,
            "request queue protocol violation: completed a request with none in flight"
        );
        state.in_flight = false;
        match state.requests.pop_front() {
            Some(done) => {
                tracing::debug!(
                    "Completed {:?} request, {} pending",
                    done.mode,
                    state.requests.len()
                );
                done
            }
            None => panic!("request queue protocol violation: in-flight request vanished"),
        }
    }

    /// The request currently being displayed, if any.
    pub fn in_flight(&self) -> Option<CowRequest> {
        let state = self.state.lock();
        if state.in_flight {
            state.requests.front().cloned()
        } else {
            None
        }
    }

    /// Requests waiting behind the in-flight one.
    pub fn pending(&self) -> usize {
        let state = self.state.lock();
        state.requests.len() - usize::from(state.in_flight)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.state.lock().requests.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.state.lock().requests.is_empty()
    }

    /// Refuse new requests and release a consumer blocked in
    /// `dequeue_blocking`.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        drop(state);
        self.available.notify_all();
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = RequestQueue::new();
        queue.enqueue(CowRequest::say("A")).unwrap();
        queue.enqueue(CowRequest::say("B")).unwrap();
        queue.enqueue(CowRequest::say("C")).unwrap();

        let mut seen = Vec::new();
        for _ in 0..3 {
            let head = queue.dequeue_blocking().unwrap();
            seen.push(head.content.clone());
            assert_eq!(queue.complete_head(), head);
        }
        assert_eq!(seen, vec!["A", "B", "C"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_dequeue_twice_returns_same_head() {
        let queue = RequestQueue::new();
        queue.enqueue(CowRequest::say("A")).unwrap();
        queue.enqueue(CowRequest::think("B")).unwrap();

        let first = queue.dequeue_blocking().unwrap();
        let second = queue.dequeue_blocking().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.content, "A");
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_enqueue_reports_length() {
        let queue = RequestQueue::new();
        assert_eq!(queue.enqueue(CowRequest::say("A")).unwrap(), 1);
        assert_eq!(queue.enqueue(CowRequest::say("B")).unwrap(), 2);
    }

    #[test]
    fn test_in_flight_and_pending() {
        let queue = RequestQueue::new();
        queue.enqueue(CowRequest::say("A")).unwrap();
        queue.enqueue(CowRequest::say("B")).unwrap();
        assert_eq!(queue.in_flight(), None);
        assert_eq!(queue.pending(), 2);

        queue.dequeue_blocking().unwrap();
        assert_eq!(queue.in_flight(), Some(CowRequest::say("A")));
        assert_eq!(queue.pending(), 1);

        queue.complete_head();
        assert_eq!(queue.in_flight(), None);
        assert_eq!(queue.pending(), 1);
    }

    #[test]
    #[should_panic(expected = "protocol violation")]
    fn test_complete_without_in_flight_panics() {
        let queue = RequestQueue::new();
        queue.enqueue(CowRequest::say("A")).unwrap();
        queue.complete_head();
    }

    #[test]
    #[should_panic(expected = "protocol violation")]
    fn test_complete_twice_panics() {
        let queue = RequestQueue::new();
        queue.enqueue(CowRequest::say("A")).unwrap();
        queue.enqueue(CowRequest::say("B")).unwrap();
        queue.dequeue_blocking().unwrap();
        queue.complete_head();
        queue.complete_head();
    }

    #[test]
    fn test_enqueue_wakes_blocked_consumer() {
        let queue = Arc::new(RequestQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || queue.dequeue_blocking())
        };

        std::thread::sleep(Duration::from_millis(50));
        queue.enqueue(CowRequest::dream("/tmp/grass.png")).unwrap();

        let head = consumer.join().unwrap();
        assert_eq!(head, Some(CowRequest::dream("/tmp/grass.png")));
    }

    #[test]
    fn test_close_releases_blocked_consumer() {
        let queue = Arc::new(RequestQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || queue.dequeue_blocking())
        };

        std::thread::sleep(Duration::from_millis(50));
        queue.close();

        assert_eq!(consumer.join().unwrap(), None);
        assert_eq!(queue.enqueue(CowRequest::say("late")), Err(QueueClosed));
        assert!(queue.is_closed());
    }

    #[test]
    fn test_concurrent_producers_keep_per_producer_order() {
        let queue = Arc::new(RequestQueue::new());
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        queue.enqueue(CowRequest::say(format!("{}:{}", p, i))).unwrap();
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let mut last = [-1i32; 4];
        for _ in 0..100 {
            let head = queue.dequeue_blocking().unwrap();
            queue.complete_head();
            let (p, i) = head.content.split_once(':').unwrap();
            let (p, i): (usize, i32) = (p.parse().unwrap(), i.parse().unwrap());
            assert!(i > last[p]);
            last[p] = i;
        }
        assert!(queue.is_empty());
    }
}
