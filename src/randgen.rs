/*!
Deterministic random stream shared by both simulator cores.

The stream is loaded from a file whose first token is a count `n`, followed
by `n` non-negative integers. `next(bound)` maps the current value into
`[1, bound]` and advances the index, wrapping at `n`. Every
non-deterministic choice in the simulators (CPU bursts, IO bursts, static
priorities, the random pager) draws from one instance of this stream, so the
draw order itself is part of the observable behavior.
*/

use std::path::Path;

use crate::error::{Result, SimError};

#[derive(Debug, Clone)]
pub struct RandGen {
    values: Vec<u32>,
    index: usize,
}

impl RandGen {
    /// Load the stream from a random file (`n` on the first line, then `n`
    /// integers, one per line).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut count: Option<usize> = None;
        let mut values = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            for token in line.split_whitespace() {
                match count {
                    None => {
                        count = Some(token.parse().map_err(|_| SimError::Malformed {
                            line: lineno + 1,
                            reason: format!("bad random count {token:?}"),
                        })?);
                    }
                    Some(n) => {
                        if values.len() == n {
                            break;
                        }
                        values.push(token.parse().map_err(|_| SimError::Malformed {
                            line: lineno + 1,
                            reason: format!("bad random value {token:?}"),
                        })?);
                    }
                }
            }
        }

        let count = count.ok_or(SimError::Malformed {
            line: 1,
            reason: "empty random file".into(),
        })?;
        if values.len() < count || count == 0 {
            return Err(SimError::Malformed {
                line: text.lines().count(),
                reason: format!("expected {} random values, found {}", count, values.len()),
            });
        }
        Ok(Self::from_values(values))
    }

    /// Build a stream directly from values (used by tests).
    pub fn from_values(values: Vec<u32>) -> Self {
        assert!(!values.is_empty(), "random stream must not be empty");
        Self { values, index: 0 }
    }

    /// Next draw in `[1, bound]`. The index wraps at the end of the stream.
    pub fn next(&mut self, bound: u32) -> u32 {
        debug_assert!(bound > 0, "draw bound must be positive");
        let value = self.values[self.index];
        self.index = (self.index + 1) % self.values.len();
        1 + value % bound
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn draws_wrap_around() {
        let mut r = RandGen::from_values(vec![3, 5, 2]);
        assert_eq!(r.next(10), 4);
        assert_eq!(r.next(10), 6);
        assert_eq!(r.next(10), 3);
        // Wrapped back to the first value.
        assert_eq!(r.next(10), 4);
    }

    #[test]
    fn draw_is_one_based_modulo() {
        let mut r = RandGen::from_values(vec![7]);
        assert_eq!(r.next(4), 4); // 1 + 7 % 4
        assert_eq!(r.next(7), 1); // 1 + 7 % 7
    }

    #[test]
    fn loads_count_prefixed_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "4").unwrap();
        for v in [3, 5, 2, 7] {
            writeln!(f, "{v}").unwrap();
        }
        let mut r = RandGen::from_file(f.path()).unwrap();
        assert_eq!(r.len(), 4);
        assert_eq!(r.next(10), 4);
    }

    #[test]
    fn short_file_is_malformed() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "3\n1\n2").unwrap();
        assert!(matches!(
            RandGen::from_file(f.path()),
            Err(SimError::Malformed { .. })
        ));
    }

    #[test]
    fn non_integer_token_is_malformed() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "2\n1\nbogus").unwrap();
        assert!(matches!(
            RandGen::from_file(f.path()),
            Err(SimError::Malformed { line: 3, .. })
        ));
    }
}
