/*!
Transition events and the stable time-ordered event queue.

The queue is the heart of the discrete-event simulation: events dequeue in
non-decreasing timestamp order, and events that share a timestamp dequeue in
insertion order. That stability is load-bearing — simultaneous arrivals, an
IO completion coinciding with a quantum expiry, and same-clock preemptions
all depend on it. A monotone sequence number records insertion order; the
vector is kept sorted by `(time, seq)` with each insert placed after every
event of equal time.

At most one event per process is live at any instant (single-future-event
rule), which is what makes `cancel` by process id well-defined.
*/

/// State-machine transitions carried by events.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    CreatedToReady,
    ReadyToRunning,
    RunningToReady, // quantum expiry or priority preemption
    RunningToBlock,
    BlockToReady,
    Done,
}

#[derive(Copy, Clone, Debug)]
pub struct Event {
    pub time: u64,
    pub seq: u64,
    pub pid: usize,
    pub transition: Transition,
}

#[derive(Debug, Default)]
pub struct EventQueue {
    // Sorted ascending by (time, seq). Linear insert/remove is fine at the
    // scale of a process trace.
    events: Vec<Event>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time: u64, pid: usize, transition: Transition) {
        let event = Event {
            time,
            seq: self.next_seq,
            pid,
            transition,
        };
        self.next_seq += 1;
        // Insert after every event with the same timestamp.
        let pos = self.events.partition_point(|e| e.time <= time);
        self.events.insert(pos, event);
    }

    pub fn pop(&mut self) -> Option<Event> {
        if self.events.is_empty() {
            None
        } else {
            Some(self.events.remove(0))
        }
    }

    pub fn peek_time(&self) -> Option<u64> {
        self.events.first().map(|e| e.time)
    }

    /// Remove and return the unique live event for `pid`.
    pub fn cancel(&mut self, pid: usize) -> Option<Event> {
        let pos = self.events.iter().position(|e| e.pid == pid)?;
        Some(self.events.remove(pos))
    }

    /// Whether `pid` already has an event pending at `time` (PREPRIO Cond2).
    pub fn has_event_at(&self, pid: usize, time: u64) -> bool {
        self.events.iter().any(|e| e.pid == pid && e.time == time)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
