/*!
Process record: the single authoritative owner of one process's static
descriptors and mutable runtime state.

The simulator owns all processes in one arena (`Vec<Process>`); events and
run queues refer to them by index. All mutation happens inside the dispatch
loop, so the usual aliasing headaches of sharing a process between the event
queue, the run queue and the "current runner" slot never arise.
*/

/// Lifecycle states. A process is never destroyed mid-run; it parks in
/// `Done` once `remaining` hits zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProcState {
    Created,
    Ready,
    Running,
    Blocked,
    Done,
}

#[derive(Debug, Clone)]
pub struct Process {
    pub id: usize,

    // Static descriptors, fixed at parse time.
    pub at: u64,  // arrival time
    pub tc: u64,  // total CPU demand
    pub cb: u32,  // CPU-burst draw bound
    pub io: u32,  // IO-burst draw bound
    pub static_prio: i32,

    // Runtime state, mutated only by the dispatch loop.
    pub remaining: u64,
    pub dyn_prio: i32, // -1 means "expired"; reset to static_prio - 1 on requeue
    pub state: ProcState,
    pub state_ts: u64,
    pub current_burst: u64, // residue of the in-flight CPU burst; 0 when not mid-burst
    pub preempted: bool,    // next dispatch must resume current_burst, not draw

    // Accounting.
    pub cw: u64,      // total time spent READY
    pub io_time: u64, // total time spent BLOCKED
    pub finish: Option<u64>,
    pub tat: u64,
}

impl Process {
    pub fn new(id: usize, at: u64, tc: u64, cb: u32, io: u32, static_prio: i32) -> Self {
        Self {
            id,
            at,
            tc,
            cb,
            io,
            static_prio,
            remaining: tc,
            dyn_prio: static_prio - 1,
            state: ProcState::Created,
            state_ts: at,
            current_burst: 0,
            preempted: false,
            cw: 0,
            io_time: 0,
            finish: None,
            tat: 0,
        }
    }

    /// CPU time consumed so far.
    #[inline]
    pub fn cpu_used(&self) -> u64 {
        self.tc - self.remaining
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.state == ProcState::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_process_starts_created_with_full_demand() {
        let p = Process::new(0, 5, 100, 10, 10, 3);
        assert_eq!(p.state, ProcState::Created);
        assert_eq!(p.remaining, 100);
        assert_eq!(p.dyn_prio, 2);
        assert_eq!(p.state_ts, 5);
        assert!(!p.preempted);
        assert_eq!(p.cpu_used(), 0);
    }
}
