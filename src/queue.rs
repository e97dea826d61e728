//! Chronologically ordered queue of pending outbound messages

use crate::message::Message;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Condvar, Mutex};
use std::time::Instant;

struct Entry {
    due: Instant,
    seq: u64,
    msg: Message,
}

// Earliest due time wins; the insertion sequence number keeps equal
// timestamps first-queued-first-sent.
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Entry {}

struct QueueState {
    entries: BinaryHeap<Entry>,
    next_seq: u64,
    closed: bool,
}

/// A queue of messages ordered by their delivery timestamps
///
/// Producers push from any thread; one consumer blocks in
/// [`TimedQueue::pop_due`] until the earliest entry becomes due. The
/// condvar is signaled on every insertion so that an entry with an earlier
/// due time than the one currently waited on shortens the wait, and the
/// waiter recomputes its deadline from the current head after every wakeup.
pub struct TimedQueue {
    inner: Mutex<QueueState>,
    available: Condvar,
}

impl Default for TimedQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TimedQueue {
    pub fn new() -> Self {
        TimedQueue {
            inner: Mutex::new(QueueState {
                entries: BinaryHeap::new(),
                next_seq: 0,
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Enqueues a message, keyed by its timestamp. Never blocks beyond the
    /// queue's own synchronization.
    pub fn push(&self, msg: Message) {
        let mut state = self.inner.lock().unwrap();
        if state.closed {
            return;
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.push(Entry {
            due: msg.timestamp,
            seq,
            msg,
        });
        self.available.notify_all();
    }

    /// Removes the earliest-scheduled message once its due time has
    /// arrived, blocking until then. Returns `None` once the queue is
    /// closed; pending entries are discarded.
    pub fn pop_due(&self) -> Option<Message> {
        let mut state = self.inner.lock().unwrap();
        loop {
            if state.closed {
                return None;
            }
            let due = match state.entries.peek() {
                Some(head) => head.due,
                None => {
                    state = self.available.wait(state).unwrap();
                    continue;
                }
            };
            let now = Instant::now();
            if due <= now {
                return state.entries.pop().map(|entry| entry.msg);
            }
            let (guard, _timed_out) = self
                .available
                .wait_timeout(state, due - now)
                .unwrap();
            state = guard;
        }
    }

    /// Closes the queue, waking the consumer. Pending entries are dropped.
    pub fn close(&self) {
        let mut state = self.inner.lock().unwrap();
        state.closed = true;
        state.entries.clear();
        self.available.notify_all();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_equal_timestamps_keep_insertion_order() {
        let queue = TimedQueue::new();
        let at = Instant::now();
        queue.push(Message::song_select(1).unwrap().at(at));
        queue.push(Message::song_select(2).unwrap().at(at));
        queue.push(Message::song_select(3).unwrap().at(at));

        for expected in 1..=3 {
            let msg = queue.pop_due().expect("queue should yield an entry");
            assert_eq!(
                msg.kind,
                crate::message::MessageKind::SongSelect { song: expected }
            );
        }
    }

    #[test]
    fn test_close_wakes_consumer() {
        let queue = std::sync::Arc::new(TimedQueue::new());
        let waiter = {
            let queue = queue.clone();
            std::thread::spawn(move || queue.pop_due())
        };
        std::thread::sleep(Duration::from_millis(50));
        queue.close();
        assert_eq!(waiter.join().unwrap(), None);
    }
}
