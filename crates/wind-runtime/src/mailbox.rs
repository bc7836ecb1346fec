//! Process mailbox for message delivery.
//!
//! Each process owns one mailbox. Any thread may push into it; only the
//! owning thread pops. Popping never blocks: a thread that finds its mailbox
//! empty waits on its wakeup channel instead, and senders only signal that
//! channel when their push turned an empty mailbox into a non-empty one.

use parking_lot::Mutex;
use std::collections::VecDeque;
use wind_core::Payload;

#[derive(Debug, Default)]
struct Queue {
    items: VecDeque<Payload>,
    closed: bool,
}

/// A multi-producer, single-consumer FIFO of payloads.
#[derive(Debug, Default)]
pub struct Mailbox {
    queue: Mutex<Queue>,
}

impl Mailbox {
    /// Creates an empty, open mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a payload.
    ///
    /// Returns `Ok(true)` if the mailbox was empty before this push, which is
    /// the caller's cue to signal the owner's wakeup channel. The check and
    /// the enqueue happen under one lock, so a concurrent pop cannot make the
    /// answer stale. Returns the payload back if the mailbox is closed.
    pub fn push(&self, payload: Payload) -> Result<bool, Payload> {
        let mut queue = self.queue.lock();
        if queue.closed {
            return Err(payload);
        }
        let was_empty = queue.items.is_empty();
        queue.items.push_back(payload);
        Ok(was_empty)
    }

    /// Dequeues the oldest payload, or returns `None` immediately if there is
    /// none.
    pub fn pop(&self) -> Option<Payload> {
        self.queue.lock().items.pop_front()
    }

    /// Returns the number of queued payloads.
    pub fn len(&self) -> usize {
        self.queue.lock().items.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().items.is_empty()
    }

    /// Returns `true` once [`drain_and_close`](Self::drain_and_close) ran.
    pub fn is_closed(&self) -> bool {
        self.queue.lock().closed
    }

    /// Closes the mailbox and drops every payload still queued.
    ///
    /// Returns how many payloads were discarded. Later pushes are refused.
    pub fn drain_and_close(&self) -> usize {
        let drained = {
            let mut queue = self.queue.lock();
            queue.closed = true;
            std::mem::take(&mut queue.items)
        };
        drained.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn payload(byte: u8) -> Payload {
        Payload::from(vec![byte])
    }

    #[test]
    fn test_mailbox_fifo() {
        let mailbox = Mailbox::new();
        mailbox.push(payload(1)).unwrap();
        mailbox.push(payload(2)).unwrap();
        mailbox.push(payload(3)).unwrap();

        assert_eq!(mailbox.len(), 3);
        assert_eq!(mailbox.pop().unwrap().as_bytes(), &[1]);
        assert_eq!(mailbox.pop().unwrap().as_bytes(), &[2]);
        assert_eq!(mailbox.pop().unwrap().as_bytes(), &[3]);
        assert!(mailbox.pop().is_none());
    }

    #[test]
    fn test_push_reports_empty_transition() {
        let mailbox = Mailbox::new();

        assert_eq!(mailbox.push(payload(1)), Ok(true));
        assert_eq!(mailbox.push(payload(2)), Ok(false));
        assert_eq!(mailbox.push(payload(3)), Ok(false));

        // Partially draining does not re-arm the signal.
        mailbox.pop().unwrap();
        assert_eq!(mailbox.push(payload(4)), Ok(false));

        while mailbox.pop().is_some() {}
        assert_eq!(mailbox.push(payload(5)), Ok(true));
    }

    #[test]
    fn test_pop_empty_does_not_block() {
        let mailbox = Mailbox::new();
        assert!(mailbox.pop().is_none());
        assert!(mailbox.is_empty());
    }

    #[test]
    fn test_drain_and_close() {
        let mailbox = Mailbox::new();
        mailbox.push(payload(1)).unwrap();
        mailbox.push(payload(2)).unwrap();

        assert_eq!(mailbox.drain_and_close(), 2);
        assert!(mailbox.is_closed());
        assert!(mailbox.pop().is_none());

        let refused = mailbox.push(payload(9)).unwrap_err();
        assert_eq!(refused.as_bytes(), &[9]);
    }

    #[test]
    fn test_concurrent_senders_keep_their_own_order() {
        let mailbox = Arc::new(Mailbox::new());
        let senders: Vec<_> = (0u8..4)
            .map(|sender| {
                let mailbox = Arc::clone(&mailbox);
                thread::spawn(move || {
                    for seq in 0u8..100 {
                        mailbox.push(Payload::from(vec![sender, seq])).unwrap();
                    }
                })
            })
            .collect();
        for handle in senders {
            handle.join().unwrap();
        }

        let mut next = [0u8; 4];
        while let Some(p) = mailbox.pop() {
            let (sender, seq) = (p.as_bytes()[0] as usize, p.as_bytes()[1]);
            assert_eq!(seq, next[sender]);
            next[sender] += 1;
        }
        assert_eq!(next, [100; 4]);
    }

    #[test]
    fn test_exactly_one_empty_transition_per_drain() {
        let mailbox = Arc::new(Mailbox::new());
        let signals: usize = (0..8)
            .map(|_| {
                let mailbox = Arc::clone(&mailbox);
                thread::spawn(move || {
                    (0..50)
                        .filter(|_| mailbox.push(payload(0)).unwrap())
                        .count()
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .sum();

        assert_eq!(signals, 1);
        assert_eq!(mailbox.len(), 400);
    }
}
