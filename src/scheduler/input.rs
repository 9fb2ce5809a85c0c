/*!
Process-file parser.

One process per line, four whitespace-separated integers: arrival time,
total CPU demand, CPU-burst bound, IO-burst bound. Static priority is drawn
from the shared random stream as each process is read — that draw order is
observable, so parsing and priority assignment happen together.
*/

use std::path::Path;

use crate::error::{Result, SimError};
use crate::randgen::RandGen;

use super::process::Process;

pub fn parse_processes(text: &str, rand: &mut RandGen, maxprio: usize) -> Result<Vec<Process>> {
    let mut procs = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 4 {
            return Err(SimError::Malformed {
                line: lineno + 1,
                reason: format!("expected `at tc cb io`, found {} tokens", fields.len()),
            });
        }
        let mut num = |i: usize| -> Result<u64> {
            fields[i].parse().map_err(|_| SimError::Malformed {
                line: lineno + 1,
                reason: format!("bad integer {:?}", fields[i]),
            })
        };
        let (at, tc, cb, io) = (num(0)?, num(1)?, num(2)?, num(3)?);
        if tc == 0 || cb == 0 || io == 0 {
            return Err(SimError::Malformed {
                line: lineno + 1,
                reason: "tc, cb and io must be positive".into(),
            });
        }
        let static_prio = rand.next(maxprio as u32) as i32;
        procs.push(Process::new(
            procs.len(),
            at,
            tc,
            cb as u32,
            io as u32,
            static_prio,
        ));
    }
    Ok(procs)
}

pub fn load_processes<P: AsRef<Path>>(
    path: P,
    rand: &mut RandGen,
    maxprio: usize,
) -> Result<Vec<Process>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| SimError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_processes(&text, rand, maxprio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_processes_in_input_order_and_draws_priorities() {
        let mut rand = RandGen::from_values(vec![3, 5]);
        let procs = parse_processes("0 100 10 10\n500 100 20 10\n", &mut rand, 4).unwrap();
        assert_eq!(procs.len(), 2);
        assert_eq!(procs[0].at, 0);
        assert_eq!(procs[1].at, 500);
        assert_eq!(procs[1].cb, 20);
        // prio draws: 1 + 3 % 4 = 4, then 1 + 5 % 4 = 2
        assert_eq!(procs[0].static_prio, 4);
        assert_eq!(procs[1].static_prio, 2);
    }

    #[test]
    fn rejects_short_lines() {
        let mut rand = RandGen::from_values(vec![1]);
        assert!(matches!(
            parse_processes("0 100 10\n", &mut rand, 4),
            Err(SimError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn rejects_non_integer_tokens() {
        let mut rand = RandGen::from_values(vec![1]);
        assert!(matches!(
            parse_processes("0 100 ten 10\n", &mut rand, 4),
            Err(SimError::Malformed { line: 1, .. })
        ));
    }
}
