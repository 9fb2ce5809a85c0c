/*!
The discrete-event dispatch loop.

One coordinator owns every moving part: the process arena, the event queue,
the ready queue, the random stream and the global accounting counters. Each
popped event is translated into state updates and at most one follow-up
event; after dispatch, the scheduler is consulted only once all events at
the current clock have drained.

Accounting convention: CPU consumption (`remaining`, `current_burst`, the
global `cpu_time`) is charged when the follow-up event fires, from
`time_in_state`. A canceled completion event (PREPRIO) therefore leaves no
pre-charged time behind, and `tat == cpu + io + cw` holds per process on
every input. `cw` accrues at READY->RUNNING, also from `time_in_state`.
*/

use tracing::debug;

use crate::randgen::RandGen;

use super::event::{EventQueue, Transition};
use super::process::{ProcState, Process};
use super::runqueue::RunQueue;
use super::SchedSpec;

pub struct Simulator {
    spec: SchedSpec,
    procs: Vec<Process>,
    queue: EventQueue,
    runq: RunQueue,
    rand: RandGen,

    clock: u64,
    current_running: Option<usize>,
    call_scheduler: bool,

    // Global accounting.
    cpu_time: u64,
    total_io_time: u64, // union of IO-busy intervals, not the per-process sum
    n_io_blocked: u32,
    io_start: u64,

    verbose: bool,
    trace: Vec<String>,
}

impl Simulator {
    pub fn new(spec: SchedSpec, procs: Vec<Process>, rand: RandGen) -> Self {
        let mut queue = EventQueue::new();
        // Seed arrivals in input order; the queue's stability keeps
        // same-timestamp arrivals in pid order.
        for p in &procs {
            queue.push(p.at, p.id, Transition::CreatedToReady);
        }
        let runq = spec.run_queue();
        Self {
            spec,
            procs,
            queue,
            runq,
            rand,
            clock: 0,
            current_running: None,
            call_scheduler: false,
            cpu_time: 0,
            total_io_time: 0,
            n_io_blocked: 0,
            io_start: 0,
            verbose: false,
            trace: Vec::new(),
        }
    }

    /// Also emit scheduling-decision lines (PrioPreempt) into the trace.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Run the simulation to completion (empty event queue).
    pub fn run(&mut self) {
        while let Some(event) = self.queue.pop() {
            self.clock = event.time;
            let pid = event.pid;
            assert!(
                !self.procs[pid].is_done(),
                "event dispatched for a finished process"
            );
            let time_in_state = self.clock - self.procs[pid].state_ts;
            match event.transition {
                Transition::CreatedToReady => self.on_created_to_ready(pid, time_in_state),
                Transition::ReadyToRunning => self.on_ready_to_running(pid, time_in_state),
                Transition::RunningToReady => self.on_running_to_ready(pid, time_in_state),
                Transition::RunningToBlock => self.on_running_to_block(pid, time_in_state),
                Transition::BlockToReady => self.on_block_to_ready(pid, time_in_state),
                Transition::Done => self.on_done(pid, time_in_state),
            }
            self.maybe_schedule();
        }
    }

    fn on_created_to_ready(&mut self, pid: usize, time_in_state: u64) {
        self.trace
            .push(format!("{} {} {}: CREATED -> READY", self.clock, pid, time_in_state));
        let p = &mut self.procs[pid];
        p.state = ProcState::Ready;
        p.state_ts = self.clock;
        self.runq.add(pid, &mut self.procs);
        self.call_scheduler = true;
    }

    fn on_ready_to_running(&mut self, pid: usize, time_in_state: u64) {
        let (cb, remaining, preempted, resumed_burst, dyn_prio) = {
            let p = &self.procs[pid];
            (p.cb, p.remaining, p.preempted, p.current_burst, p.dyn_prio)
        };
        // A preempted process resumes its residual burst; no draw is consumed.
        let burst = if preempted {
            resumed_burst
        } else {
            (self.rand.next(cb) as u64).min(remaining)
        };
        self.trace.push(format!(
            "{} {} {}: READY -> RUNNING cb={} rem={} prio={}",
            self.clock, pid, time_in_state, burst, remaining, dyn_prio
        ));

        let p = &mut self.procs[pid];
        p.cw += time_in_state;
        p.current_burst = burst;
        p.preempted = false;
        p.state = ProcState::Running;
        p.state_ts = self.clock;
        self.current_running = Some(pid);

        let quantum = self.spec.quantum();
        if burst > quantum {
            self.queue
                .push(self.clock + quantum, pid, Transition::RunningToReady);
        } else if burst >= remaining {
            self.queue.push(self.clock + burst, pid, Transition::Done);
        } else {
            self.queue
                .push(self.clock + burst, pid, Transition::RunningToBlock);
        }
    }

    fn on_running_to_ready(&mut self, pid: usize, time_in_state: u64) {
        self.cpu_time += time_in_state;
        let decay = self.spec.decays_priority();
        let p = &mut self.procs[pid];
        p.remaining -= time_in_state;
        p.current_burst -= time_in_state;
        p.preempted = true;
        self.trace.push(format!(
            "{} {} {}: RUNNING -> READY cb={} rem={} prio={}",
            self.clock, pid, time_in_state, p.current_burst, p.remaining, p.dyn_prio
        ));
        if decay {
            // Reaching -1 is handled by the run queue: re-seed and expire.
            p.dyn_prio -= 1;
        }
        p.state = ProcState::Ready;
        p.state_ts = self.clock;
        self.current_running = None;
        self.runq.add(pid, &mut self.procs);
        self.call_scheduler = true;
    }

    fn on_running_to_block(&mut self, pid: usize, time_in_state: u64) {
        self.cpu_time += time_in_state;
        let io_bound = self.procs[pid].io;
        let io_burst = self.rand.next(io_bound) as u64;
        let p = &mut self.procs[pid];
        p.remaining -= time_in_state;
        p.current_burst = 0;
        self.trace.push(format!(
            "{} {} {}: RUNNING -> BLOCK ib={} rem={}",
            self.clock, pid, time_in_state, io_burst, p.remaining
        ));
        p.state = ProcState::Blocked;
        p.state_ts = self.clock;
        self.current_running = None;
        if self.n_io_blocked == 0 {
            self.io_start = self.clock;
        }
        self.n_io_blocked += 1;
        self.queue
            .push(self.clock + io_burst, pid, Transition::BlockToReady);
        self.call_scheduler = true;
    }

    fn on_block_to_ready(&mut self, pid: usize, time_in_state: u64) {
        self.n_io_blocked -= 1;
        if self.n_io_blocked == 0 {
            self.total_io_time += self.clock - self.io_start;
        }
        self.trace
            .push(format!("{} {} {}: BLOCK -> READY", self.clock, pid, time_in_state));
        let p = &mut self.procs[pid];
        p.io_time += time_in_state;
        p.dyn_prio = p.static_prio - 1;
        p.state = ProcState::Ready;
        p.state_ts = self.clock;
        self.runq.add(pid, &mut self.procs);
        if self.spec.preemptive() {
            self.check_preempt(pid);
        }
        self.call_scheduler = true;
    }

    fn on_done(&mut self, pid: usize, time_in_state: u64) {
        self.cpu_time += time_in_state;
        let clock = self.clock;
        let p = &mut self.procs[pid];
        p.remaining -= time_in_state;
        p.current_burst = 0;
        p.state = ProcState::Done;
        p.state_ts = clock;
        p.finish = Some(clock);
        p.tat = clock - p.at;
        self.trace
            .push(format!("{} {} {}: RUNNING -> DONE", clock, pid, time_in_state));
        self.current_running = None;
        self.call_scheduler = true;
    }

    /// PREPRIO wakeup check: preempt the runner iff the woken process has
    /// strictly higher dynamic priority (Cond1) and the runner has no event
    /// already pending at the current clock (Cond2).
    fn check_preempt(&mut self, pid: usize) {
        let Some(runner) = self.current_running else {
            return;
        };
        let cond1 = self.procs[pid].dyn_prio > self.procs[runner].dyn_prio;
        let cond2 = !self.queue.has_event_at(runner, self.clock);
        let preempt = cond1 && cond2;
        debug!(
            clock = self.clock,
            woken = pid,
            runner,
            cond1,
            cond2,
            preempt,
            "priority preemption check"
        );
        if self.verbose {
            self.trace.push(format!(
                "{} {}: PrioPreempt Cond1={} Cond2={} -> {}",
                self.clock,
                pid,
                cond1 as u8,
                cond2 as u8,
                if preempt { "YES" } else { "NO" }
            ));
        }
        if preempt {
            self.queue.cancel(runner);
            self.queue
                .push(self.clock, runner, Transition::RunningToReady);
        }
    }

    fn maybe_schedule(&mut self) {
        if !self.call_scheduler {
            return;
        }
        // Defer until every event at this clock has drained.
        if self.queue.peek_time() == Some(self.clock) {
            return;
        }
        self.call_scheduler = false;
        if self.current_running.is_none() {
            if let Some(pid) = self.runq.next() {
                debug!(clock = self.clock, pid, "dispatching");
                self.queue.push(self.clock, pid, Transition::ReadyToRunning);
            }
        }
    }

    // ---------------------------------------------------------------------
    // Results
    // ---------------------------------------------------------------------

    pub fn processes(&self) -> &[Process] {
        &self.procs
    }

    pub fn cpu_time(&self) -> u64 {
        self.cpu_time
    }

    pub fn total_io_time(&self) -> u64 {
        self.total_io_time
    }

    /// Transition log, one line per emitted transition.
    pub fn trace(&self) -> &[String] {
        &self.trace
    }

    /// Final summary: policy title, one line per process, and the SUM line.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.spec.title());
        out.push('\n');
        for p in &self.procs {
            out.push_str(&format!(
                "{:04}: {:4} {:4} {:4} {:4} {:1} | {:5} {:5} {:5} {:5}\n",
                p.id,
                p.at,
                p.tc,
                p.cb,
                p.io,
                p.static_prio,
                p.finish.unwrap_or(0),
                p.tat,
                p.io_time,
                p.cw
            ));
        }
        let last_finish = self
            .procs
            .iter()
            .filter_map(|p| p.finish)
            .max()
            .unwrap_or(0);
        if last_finish > 0 {
            let t = last_finish as f64;
            let n = self.procs.len() as f64;
            let cpu_util = 100.0 * self.cpu_time as f64 / t;
            let io_util = 100.0 * self.total_io_time as f64 / t;
            let avg_tat = self.procs.iter().map(|p| p.tat).sum::<u64>() as f64 / n;
            let avg_cw = self.procs.iter().map(|p| p.cw).sum::<u64>() as f64 / n;
            let throughput = 100.0 * n / t;
            out.push_str(&format!(
                "SUM: {last_finish} {cpu_util:.2} {io_util:.2} {avg_tat:.2} {avg_cw:.2} {throughput:.3}\n"
            ));
        }
        out
    }
}
