/*!
Demand-paging simulator: executes a reference trace over per-process
virtual memory areas under a pluggable page-replacement policy.

Submodules:
- `memory` - page-table entries, frames, VMAs, per-process state
- `pager`  - the victim-selection policy family
- `input`  - reference-trace parser
- `driver` - the fault handler, instruction driver and output rendering

Only the stable surface is re-exported here.
*/

mod driver;
mod input;
mod memory;
mod pager;

pub use driver::Mmu;
pub use input::{Instr, MmuInput, Op, load_input, parse_input};
pub use memory::{Frame, MAX_FRAMES, MmuProcess, NUM_VPAGES, ProcStats, Pte, Vma};
pub use pager::Pager;

use crate::error::{Result, SimError};

/// Output selection from the `-o` option string (default `OPFS`), plus the
/// per-instruction debug dumps `xyaf` from the original driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct MmuOptions {
    /// `O`: per-instruction trace (instruction echo + paging operations).
    pub trace: bool,
    /// `P`: final page tables.
    pub page_tables: bool,
    /// `F`: final frame table.
    pub frame_table: bool,
    /// `S`: per-process statistics and the TOTALCOST line.
    pub summary: bool,
    /// `x`: current process's page table after every instruction.
    pub cur_pt_each: bool,
    /// `y`: all page tables after every instruction.
    pub all_pt_each: bool,
    /// `f`: frame table after every instruction.
    pub ft_each: bool,
    /// `a`: victim-selection diagnostics through `tracing`.
    pub pager_debug: bool,
}

impl MmuOptions {
    pub fn parse(opts: &str) -> Result<Self> {
        let mut parsed = Self::default();
        for c in opts.chars() {
            match c {
                'O' => parsed.trace = true,
                'P' => parsed.page_tables = true,
                'F' => parsed.frame_table = true,
                'S' => parsed.summary = true,
                'x' => parsed.cur_pt_each = true,
                'y' => parsed.all_pt_each = true,
                'f' => parsed.ft_each = true,
                'a' => parsed.pager_debug = true,
                other => return Err(SimError::BadOption(other)),
            }
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_option_string() {
        let o = MmuOptions::parse("OPFS").unwrap();
        assert!(o.trace && o.page_tables && o.frame_table && o.summary);
        assert!(!o.cur_pt_each && !o.all_pt_each && !o.ft_each && !o.pager_debug);
    }

    #[test]
    fn parses_debug_flags() {
        let o = MmuOptions::parse("Oxf").unwrap();
        assert!(o.trace && o.cur_pt_each && o.ft_each);
        assert!(!o.summary);
    }

    #[test]
    fn rejects_unknown_option_letter() {
        assert!(matches!(
            MmuOptions::parse("OQ"),
            Err(SimError::BadOption('Q'))
        ));
    }
}
