/*!
Process-scheduling simulator: a discrete-event engine driving five
ready-queue policies over a trace of processes with alternating CPU and IO
bursts.

Submodules:
- `process`  - process record (static descriptors + runtime state)
- `event`    - transitions and the stable time-ordered event queue
- `runqueue` - the policy family (FCFS, LCFS, SRTF, RR, PRIO, PREPRIO)
- `input`    - process-file parser
- `sim`      - the dispatch loop, accounting, and output rendering

Only the stable surface is re-exported here; the binary and the tests should
not depend on internal layout.
*/

mod event;
mod input;
mod process;
mod runqueue;
mod sim;

pub use event::{Event, EventQueue, Transition};
pub use input::{load_processes, parse_processes};
pub use process::{ProcState, Process};
pub use runqueue::RunQueue;
pub use sim::Simulator;

use crate::error::{Result, SimError};

/// Scheduling policy selected on the command line:
/// `F | L | S | R<q> | P<q>[:<maxprio>] | E<q>[:<maxprio>]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SchedSpec {
    Fcfs,
    Lcfs,
    Srtf,
    RoundRobin { quantum: u64 },
    Prio { quantum: u64, maxprio: usize },
    PrioPreempt { quantum: u64, maxprio: usize },
}

pub const DEFAULT_MAXPRIO: usize = 4;

impl SchedSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let bad = || SimError::BadSchedSpec(spec.to_string());
        let mut chars = spec.chars();
        let head = chars.next().ok_or_else(bad)?;
        let rest = chars.as_str();
        match head {
            'F' if rest.is_empty() => Ok(SchedSpec::Fcfs),
            'L' if rest.is_empty() => Ok(SchedSpec::Lcfs),
            'S' if rest.is_empty() => Ok(SchedSpec::Srtf),
            'R' => Ok(SchedSpec::RoundRobin {
                quantum: parse_quantum(rest).ok_or_else(bad)?,
            }),
            'P' | 'E' => {
                let (q, m) = match rest.split_once(':') {
                    Some((q, m)) => (
                        parse_quantum(q).ok_or_else(bad)?,
                        m.parse::<usize>().ok().filter(|&m| m > 0).ok_or_else(bad)?,
                    ),
                    None => (parse_quantum(rest).ok_or_else(bad)?, DEFAULT_MAXPRIO),
                };
                if head == 'P' {
                    Ok(SchedSpec::Prio {
                        quantum: q,
                        maxprio: m,
                    })
                } else {
                    Ok(SchedSpec::PrioPreempt {
                        quantum: q,
                        maxprio: m,
                    })
                }
            }
            _ => Err(bad()),
        }
    }

    /// Quantum in clock ticks; effectively infinite for the non-slicing
    /// policies.
    pub fn quantum(self) -> u64 {
        match self {
            SchedSpec::RoundRobin { quantum }
            | SchedSpec::Prio { quantum, .. }
            | SchedSpec::PrioPreempt { quantum, .. } => quantum,
            _ => u64::MAX,
        }
    }

    pub fn maxprio(self) -> usize {
        match self {
            SchedSpec::Prio { maxprio, .. } | SchedSpec::PrioPreempt { maxprio, .. } => maxprio,
            _ => DEFAULT_MAXPRIO,
        }
    }

    /// Whether dynamic priority decays on quantum expiry (PRIO family).
    pub fn decays_priority(self) -> bool {
        matches!(
            self,
            SchedSpec::Prio { .. } | SchedSpec::PrioPreempt { .. }
        )
    }

    /// Whether an IO completion may preempt the running process.
    pub fn preemptive(self) -> bool {
        matches!(self, SchedSpec::PrioPreempt { .. })
    }

    /// Summary header line.
    pub fn title(self) -> String {
        match self {
            SchedSpec::Fcfs => "FCFS".into(),
            SchedSpec::Lcfs => "LCFS".into(),
            SchedSpec::Srtf => "SRTF".into(),
            SchedSpec::RoundRobin { quantum } => format!("RR {quantum}"),
            SchedSpec::Prio { quantum, .. } => format!("PRIO {quantum}"),
            SchedSpec::PrioPreempt { quantum, .. } => format!("PREPRIO {quantum}"),
        }
    }

    /// The ready-queue discipline this policy uses.
    pub fn run_queue(self) -> RunQueue {
        match self {
            SchedSpec::Fcfs | SchedSpec::RoundRobin { .. } => RunQueue::fifo(),
            SchedSpec::Lcfs => RunQueue::lifo(),
            SchedSpec::Srtf => RunQueue::shortest_remaining(),
            SchedSpec::Prio { maxprio, .. } | SchedSpec::PrioPreempt { maxprio, .. } => {
                RunQueue::multi_level(maxprio)
            }
        }
    }
}

fn parse_quantum(s: &str) -> Option<u64> {
    s.parse::<u64>().ok().filter(|&q| q > 0)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("F", SchedSpec::Fcfs)]
    #[test_case("L", SchedSpec::Lcfs)]
    #[test_case("S", SchedSpec::Srtf)]
    #[test_case("R4", SchedSpec::RoundRobin { quantum: 4 })]
    #[test_case("P2", SchedSpec::Prio { quantum: 2, maxprio: 4 })]
    #[test_case("P2:8", SchedSpec::Prio { quantum: 2, maxprio: 8 })]
    #[test_case("E10:5", SchedSpec::PrioPreempt { quantum: 10, maxprio: 5 })]
    fn parses_valid_specs(input: &str, expected: SchedSpec) {
        assert_eq!(SchedSpec::parse(input).unwrap(), expected);
    }

    #[test_case(""; "empty")]
    #[test_case("X"; "unknown policy")]
    #[test_case("R"; "missing quantum")]
    #[test_case("R0"; "zero quantum")]
    #[test_case("P2:"; "missing maxprio")]
    #[test_case("P2:0"; "zero maxprio")]
    #[test_case("F2"; "trailing junk")]
    fn rejects_invalid_specs(input: &str) {
        let err = SchedSpec::parse(input).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Invalid scheduler specification: {input}.")
        );
    }
}
