/*!
Ready-queue disciplines for the five scheduling policies.

One tagged variant with a single `add`/`next` surface instead of a trait
hierarchy: the policies differ only in where `add` places a process and
which end `next` pops. PRIO and PREPRIO share the multi-band variant; what
distinguishes them (preemption on wakeup) lives in the simulator.
*/

use std::collections::VecDeque;

use super::process::Process;

#[derive(Debug)]
pub enum RunQueue {
    /// FIFO order (FCFS, and RR which differs only by quantum).
    Fifo { queue: VecDeque<usize> },
    /// LIFO order.
    Lifo { queue: VecDeque<usize> },
    /// Ascending by remaining CPU demand; ties keep insertion order.
    ShortestRemaining { queue: Vec<usize> },
    /// MAXPRIO bands with an active/expired pair, swapped when active drains.
    MultiLevel {
        active: Vec<VecDeque<usize>>,
        expired: Vec<VecDeque<usize>>,
    },
}

impl RunQueue {
    pub fn fifo() -> Self {
        RunQueue::Fifo {
            queue: VecDeque::new(),
        }
    }

    pub fn lifo() -> Self {
        RunQueue::Lifo {
            queue: VecDeque::new(),
        }
    }

    pub fn shortest_remaining() -> Self {
        RunQueue::ShortestRemaining { queue: Vec::new() }
    }

    pub fn multi_level(maxprio: usize) -> Self {
        RunQueue::MultiLevel {
            active: vec![VecDeque::new(); maxprio],
            expired: vec![VecDeque::new(); maxprio],
        }
    }

    /// Enqueue a ready process. The multi-level variant reads (and, for an
    /// expired process, re-seeds) `dyn_prio`, so it takes the arena.
    pub fn add(&mut self, pid: usize, procs: &mut [Process]) {
        match self {
            RunQueue::Fifo { queue } | RunQueue::Lifo { queue } => queue.push_back(pid),
            RunQueue::ShortestRemaining { queue } => {
                let remaining = procs[pid].remaining;
                let pos = queue.partition_point(|&q| procs[q].remaining <= remaining);
                queue.insert(pos, pid);
            }
            RunQueue::MultiLevel { active, expired } => {
                let p = &mut procs[pid];
                if p.dyn_prio < 0 {
                    // Just expired: re-seed and demote to the expired bands.
                    p.dyn_prio = p.static_prio - 1;
                    expired[p.dyn_prio as usize].push_back(pid);
                } else {
                    active[p.dyn_prio as usize].push_back(pid);
                }
            }
        }
    }

    /// Pick the next process to run, or `None` when nothing is ready.
    pub fn next(&mut self) -> Option<usize> {
        match self {
            RunQueue::Fifo { queue } => queue.pop_front(),
            RunQueue::Lifo { queue } => queue.pop_back(),
            RunQueue::ShortestRemaining { queue } => {
                if queue.is_empty() {
                    None
                } else {
                    Some(queue.remove(0))
                }
            }
            RunQueue::MultiLevel { active, expired } => {
                for pass in 0..2 {
                    for level in (0..active.len()).rev() {
                        if let Some(pid) = active[level].pop_front() {
                            return Some(pid);
                        }
                    }
                    if pass == 0 {
                        std::mem::swap(active, expired);
                    }
                }
                None
            }
        }
    }
}
