/*!
Victim selection: the page-replacement policy family.

One tagged variant with a single `select_victim` surface. A pager is only
consulted when the free list is empty, so every frame has an owner while a
scan runs. Scan-based policies start at the hand and advance it past the
chosen victim; the aging policy is the exception and breaks age ties toward
the lowest frame index.
*/

use tracing::debug;

use crate::error::{Result, SimError};
use crate::randgen::RandGen;

use super::memory::{Frame, MmuProcess};

/// Working-set age threshold in instructions.
const TAU: u64 = 49;

/// Referenced-bit reset cadence for NRU, in instructions.
const NRU_RESET_PERIOD: u64 = 48;

#[derive(Debug, Clone)]
pub enum Pager {
    Fifo { hand: usize },
    Random,
    Clock { hand: usize },
    Nru { hand: usize, last_reset: u64 },
    Aging { hand: usize },
    WorkingSet { hand: usize },
}

impl Pager {
    /// Map a `-a` algorithm code to a pager.
    pub fn from_code(code: char) -> Result<Self> {
        match code {
            'f' => Ok(Pager::Fifo { hand: 0 }),
            'r' => Ok(Pager::Random),
            'c' => Ok(Pager::Clock { hand: 0 }),
            'e' => Ok(Pager::Nru {
                hand: 0,
                last_reset: 0,
            }),
            'a' => Ok(Pager::Aging { hand: 0 }),
            'w' => Ok(Pager::WorkingSet { hand: 0 }),
            other => Err(SimError::BadAlgorithm(other)),
        }
    }

    /// Choose the frame to evict. `now` is the index of the faulting
    /// instruction.
    pub fn select_victim(
        &mut self,
        frames: &mut [Frame],
        procs: &mut [MmuProcess],
        rand: &mut RandGen,
        now: u64,
    ) -> usize {
        let n = frames.len();
        let owner = |frames: &[Frame], f: usize| -> (usize, usize) {
            frames[f].owner.expect("pager scanned an unowned frame")
        };
        match self {
            Pager::Fifo { hand } => {
                let victim = *hand;
                *hand = (victim + 1) % n;
                victim
            }

            Pager::Random => (rand.next(n as u32) - 1) as usize,

            Pager::Clock { hand } => loop {
                let f = *hand;
                *hand = (f + 1) % n;
                let (pid, vpage) = owner(frames, f);
                let pte = &mut procs[pid].page_table[vpage];
                if pte.referenced() {
                    // Second chance: clear and keep sweeping.
                    pte.set_referenced(false);
                } else {
                    break f;
                }
            },

            Pager::Nru { hand, last_reset } => {
                let reset = now - *last_reset >= NRU_RESET_PERIOD;
                if reset {
                    *last_reset = now;
                }
                let mut best: Option<(u32, usize)> = None;
                for k in 0..n {
                    let f = (*hand + k) % n;
                    let (pid, vpage) = owner(frames, f);
                    let pte = &mut procs[pid].page_table[vpage];
                    let class = 2 * u32::from(pte.referenced()) + u32::from(pte.modified());
                    if best.is_none_or(|(c, _)| class < c) {
                        best = Some((class, f));
                    }
                    if reset {
                        pte.set_referenced(false);
                    } else if class == 0 {
                        // Nothing beats class 0 and no bits need clearing.
                        break;
                    }
                }
                let (class, victim) = best.expect("NRU scan over zero frames");
                debug!(victim, class, reset, "nru selection");
                *hand = (victim + 1) % n;
                victim
            }

            Pager::Aging { hand } => {
                let mut victim = 0;
                for f in 0..n {
                    let (pid, vpage) = owner(frames, f);
                    let pte = &mut procs[pid].page_table[vpage];
                    frames[f].age >>= 1;
                    if pte.referenced() {
                        frames[f].age |= 1 << 31;
                        pte.set_referenced(false);
                    }
                    if frames[f].age < frames[victim].age {
                        victim = f;
                    }
                }
                debug!(victim, age = frames[victim].age, "aging selection");
                *hand = (victim + 1) % n;
                victim
            }

            Pager::WorkingSet { hand } => {
                let mut victim = *hand;
                let mut oldest = u64::MAX;
                for k in 0..n {
                    let f = (*hand + k) % n;
                    let (pid, vpage) = owner(frames, f);
                    let pte = &mut procs[pid].page_table[vpage];
                    if pte.referenced() {
                        // Inside the working set: refresh and spare it.
                        pte.set_referenced(false);
                        frames[f].last_used = now;
                    } else if now - frames[f].last_used > TAU {
                        victim = f;
                        break;
                    } else if frames[f].last_used < oldest {
                        oldest = frames[f].last_used;
                        victim = f;
                    }
                }
                debug!(victim, "working-set selection");
                *hand = (victim + 1) % n;
                victim
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_codes_round_trip() {
        assert!(matches!(
            Pager::from_code('f').unwrap(),
            Pager::Fifo { hand: 0 }
        ));
        assert!(matches!(Pager::from_code('r').unwrap(), Pager::Random));
        assert!(matches!(Pager::from_code('c').unwrap(), Pager::Clock { .. }));
        assert!(matches!(Pager::from_code('e').unwrap(), Pager::Nru { .. }));
        assert!(matches!(Pager::from_code('a').unwrap(), Pager::Aging { .. }));
        assert!(matches!(
            Pager::from_code('w').unwrap(),
            Pager::WorkingSet { .. }
        ));
        assert!(matches!(
            Pager::from_code('z'),
            Err(SimError::BadAlgorithm('z'))
        ));
    }

    #[test]
    fn fifo_hand_is_circular() {
        let mut frames = vec![Frame::default(); 3];
        for (i, f) in frames.iter_mut().enumerate() {
            f.owner = Some((0, i));
        }
        let mut procs = vec![MmuProcess::new(vec![])];
        let mut rand = RandGen::from_values(vec![0]);
        let mut pager = Pager::from_code('f').unwrap();
        let picks: Vec<usize> = (0..4)
            .map(|_| pager.select_victim(&mut frames, &mut procs, &mut rand, 0))
            .collect();
        assert_eq!(picks, vec![0, 1, 2, 0]);
    }

    #[test]
    fn random_maps_draws_into_frame_range() {
        let mut frames = vec![Frame::default(); 4];
        for (i, f) in frames.iter_mut().enumerate() {
            f.owner = Some((0, i));
        }
        let mut procs = vec![MmuProcess::new(vec![])];
        // Draws 1 + v % 4, shifted down: 3, 0, 2
        let mut rand = RandGen::from_values(vec![2, 7, 5]);
        let mut pager = Pager::from_code('r').unwrap();
        let picks: Vec<usize> = (0..3)
            .map(|_| pager.select_victim(&mut frames, &mut procs, &mut rand, 0))
            .collect();
        assert_eq!(picks, vec![3, 0, 2]);
    }

    #[test]
    fn clock_clears_referenced_bits_on_the_way() {
        let mut frames = vec![Frame::default(); 3];
        let mut procs = vec![MmuProcess::new(vec![])];
        for (i, f) in frames.iter_mut().enumerate() {
            f.owner = Some((0, i));
            procs[0].page_table[i].set_present(true);
            procs[0].page_table[i].set_referenced(true);
        }
        procs[0].page_table[2].set_referenced(false);
        let mut rand = RandGen::from_values(vec![0]);
        let mut pager = Pager::from_code('c').unwrap();
        let victim = pager.select_victim(&mut frames, &mut procs, &mut rand, 0);
        assert_eq!(victim, 2);
        // Frames 0 and 1 lost their referenced bit during the sweep.
        assert!(!procs[0].page_table[0].referenced());
        assert!(!procs[0].page_table[1].referenced());
    }

    #[test]
    fn aging_breaks_ties_toward_lowest_index() {
        let mut frames = vec![Frame::default(); 3];
        let mut procs = vec![MmuProcess::new(vec![])];
        for (i, f) in frames.iter_mut().enumerate() {
            f.owner = Some((0, i));
            procs[0].page_table[i].set_present(true);
        }
        // No referenced bits: all ages shift to equal zero.
        let mut rand = RandGen::from_values(vec![0]);
        let mut pager = Pager::from_code('a').unwrap();
        assert_eq!(pager.select_victim(&mut frames, &mut procs, &mut rand, 0), 0);
    }

    #[test]
    fn working_set_takes_an_old_unreferenced_frame_immediately() {
        let mut frames = vec![Frame::default(); 3];
        let mut procs = vec![MmuProcess::new(vec![])];
        for (i, f) in frames.iter_mut().enumerate() {
            f.owner = Some((0, i));
            procs[0].page_table[i].set_present(true);
            f.last_used = 10;
        }
        frames[1].last_used = 0; // older than tau at now=60
        let mut rand = RandGen::from_values(vec![0]);
        let mut pager = Pager::from_code('w').unwrap();
        assert_eq!(
            pager.select_victim(&mut frames, &mut procs, &mut rand, 60),
            1
        );
    }

    #[test]
    fn working_set_refreshes_referenced_frames() {
        let mut frames = vec![Frame::default(); 2];
        let mut procs = vec![MmuProcess::new(vec![])];
        for (i, f) in frames.iter_mut().enumerate() {
            f.owner = Some((0, i));
            procs[0].page_table[i].set_present(true);
        }
        procs[0].page_table[0].set_referenced(true);
        frames[0].last_used = 0;
        frames[1].last_used = 5;
        let mut rand = RandGen::from_values(vec![0]);
        let mut pager = Pager::from_code('w').unwrap();
        // Frame 0 is referenced: spared and refreshed; frame 1 is the oldest
        // unreferenced frame (and younger than tau), so it wins by age.
        let victim = pager.select_victim(&mut frames, &mut procs, &mut rand, 20);
        assert_eq!(victim, 1);
        assert_eq!(frames[0].last_used, 20);
        assert!(!procs[0].page_table[0].referenced());
    }
}
