/*!
Reference-trace parser.

Layout (with `#`-prefixed comment lines allowed anywhere):
  - number of processes
  - per process: a VMA count, then that many `start end wprot fmap` lines
  - instructions `op value` until EOF, `op` one of c/r/w/e
*/

use std::path::Path;

use crate::error::{Result, SimError};

use super::memory::{NUM_VPAGES, Vma};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Ctx,
    Read,
    Write,
    Exit,
}

impl Op {
    pub fn code(self) -> char {
        match self {
            Op::Ctx => 'c',
            Op::Read => 'r',
            Op::Write => 'w',
            Op::Exit => 'e',
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Instr {
    pub op: Op,
    pub arg: usize,
}

#[derive(Debug, Clone)]
pub struct MmuInput {
    pub processes: Vec<Vec<Vma>>,
    pub instructions: Vec<Instr>,
}

pub fn parse_input(text: &str) -> Result<MmuInput> {
    // Comment and blank lines carry no content anywhere in the file.
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
        .collect();
    let mut cursor = lines.into_iter();

    let mut next_line = |what: &str| -> Result<(usize, &str)> {
        cursor.next().ok_or_else(|| SimError::Malformed {
            line: text.lines().count(),
            reason: format!("unexpected end of input, expected {what}"),
        })
    };

    let parse_count = |lineno: usize, token: &str, what: &str| -> Result<usize> {
        token.parse().map_err(|_| SimError::Malformed {
            line: lineno,
            reason: format!("bad {what} {token:?}"),
        })
    };

    let (lineno, line) = next_line("process count")?;
    let num_procs = parse_count(lineno, line, "process count")?;

    let mut processes = Vec::with_capacity(num_procs);
    for _ in 0..num_procs {
        let (lineno, line) = next_line("VMA count")?;
        let num_vmas = parse_count(lineno, line, "VMA count")?;
        let mut vmas = Vec::with_capacity(num_vmas);
        for _ in 0..num_vmas {
            let (lineno, line) = next_line("VMA spec")?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 4 {
                return Err(SimError::Malformed {
                    line: lineno,
                    reason: format!("expected `start end wprot fmap`, found {line:?}"),
                });
            }
            let start = parse_count(lineno, fields[0], "VMA start")?;
            let end = parse_count(lineno, fields[1], "VMA end")?;
            let wprot = parse_count(lineno, fields[2], "VMA wprot")?;
            let fmap = parse_count(lineno, fields[3], "VMA fmap")?;
            if start > end || end >= NUM_VPAGES {
                return Err(SimError::Malformed {
                    line: lineno,
                    reason: format!("VMA range {start}..={end} out of bounds"),
                });
            }
            vmas.push(Vma {
                start,
                end,
                write_protected: wprot != 0,
                file_mapped: fmap != 0,
            });
        }
        processes.push(vmas);
    }

    let mut instructions = Vec::new();
    let mut seen_ctx = false;
    for (lineno, line) in cursor {
        let mut fields = line.split_whitespace();
        let (op, arg) = match (fields.next(), fields.next()) {
            (Some(op), Some(arg)) => (op, arg),
            _ => {
                return Err(SimError::Malformed {
                    line: lineno,
                    reason: format!("expected `op value`, found {line:?}"),
                });
            }
        };
        let arg = parse_count(lineno, arg, "instruction argument")?;
        let op = match op {
            "c" => Op::Ctx,
            "r" => Op::Read,
            "w" => Op::Write,
            "e" => Op::Exit,
            other => {
                return Err(SimError::Malformed {
                    line: lineno,
                    reason: format!("unknown operation {other:?}"),
                });
            }
        };
        let valid = match op {
            Op::Read | Op::Write => arg < NUM_VPAGES,
            Op::Ctx | Op::Exit => arg < num_procs,
        };
        if !valid {
            return Err(SimError::Malformed {
                line: lineno,
                reason: format!("instruction argument {arg} out of range"),
            });
        }
        match op {
            Op::Ctx => seen_ctx = true,
            Op::Read | Op::Write if !seen_ctx => {
                return Err(SimError::Malformed {
                    line: lineno,
                    reason: "memory access before any context switch".into(),
                });
            }
            _ => {}
        }
        instructions.push(Instr { op, arg });
    }

    Ok(MmuInput {
        processes,
        instructions,
    })
}

pub fn load_input<P: AsRef<Path>>(path: P) -> Result<MmuInput> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| SimError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_input(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# reference trace
# two processes
2
# process 0
1
0 7 0 0
# process 1
2
0 1 1 0
12 15 0 1
# instructions
c 0
r 0
w 3
e 0
";

    #[test]
    fn parses_processes_vmas_and_instructions() {
        let input = parse_input(SAMPLE).unwrap();
        assert_eq!(input.processes.len(), 2);
        assert_eq!(input.processes[0].len(), 1);
        assert_eq!(input.processes[1].len(), 2);
        assert!(input.processes[1][0].write_protected);
        assert!(input.processes[1][1].file_mapped);
        assert_eq!(
            input.instructions,
            vec![
                Instr { op: Op::Ctx, arg: 0 },
                Instr {
                    op: Op::Read,
                    arg: 0
                },
                Instr {
                    op: Op::Write,
                    arg: 3
                },
                Instr { op: Op::Exit, arg: 0 },
            ]
        );
    }

    #[test]
    fn rejects_truncated_vma_section() {
        let err = parse_input("1\n2\n0 7 0 0\n").unwrap_err();
        assert!(matches!(err, SimError::Malformed { .. }));
    }

    #[test]
    fn rejects_out_of_range_vpage() {
        let err = parse_input("1\n1\n0 7 0 0\nc 0\nr 64\n").unwrap_err();
        assert!(matches!(err, SimError::Malformed { line: 5, .. }));
    }

    #[test]
    fn rejects_unknown_operation() {
        let err = parse_input("1\n1\n0 7 0 0\nq 3\n").unwrap_err();
        assert!(matches!(err, SimError::Malformed { line: 4, .. }));
    }

    #[test]
    fn rejects_access_before_context_switch() {
        let err = parse_input("1\n1\n0 7 0 0\nr 3\n").unwrap_err();
        assert!(matches!(err, SimError::Malformed { line: 4, .. }));
    }
}
