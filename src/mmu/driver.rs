/*!
The fault handler and instruction driver.

One coordinator owns the frame table, the free list, the process arena, the
pager and the cost counters, and dispatches each trace instruction:

  c pid   context switch
  r vpage read  (fault in the page if absent)
  w vpage write (fault in; SEGPROT on a write-protected page)
  e pid   exit  (unmap everything, release swap, free the frames)

A fault first checks VMA coverage (SEGV if uncovered), then claims a frame
(free list first, pager otherwise), evicts the victim with
UNMAP/OUT/FOUT as needed, and populates the new mapping with FIN/IN/ZERO
followed by MAP. Output lines are collected in order; the binary prints
them.
*/

use std::collections::VecDeque;

use tracing::debug;

use crate::error::{Result, SimError};
use crate::randgen::RandGen;

use super::MmuOptions;
use super::input::{Instr, Op};
use super::memory::{Frame, MAX_FRAMES, MmuProcess, NUM_VPAGES, Pte, Vma};
use super::pager::Pager;

// Instruction and operation costs.
const COST_RW: u64 = 1;
const COST_CTX: u64 = 130;
const COST_EXIT: u64 = 1230;
const COST_MAP: u64 = 350;
const COST_UNMAP: u64 = 410;
const COST_IN: u64 = 3200;
const COST_OUT: u64 = 2750;
const COST_FIN: u64 = 2350;
const COST_FOUT: u64 = 2800;
const COST_ZERO: u64 = 150;
const COST_SEGV: u64 = 440;
const COST_SEGPROT: u64 = 410;

pub struct Mmu {
    frames: Vec<Frame>,
    free: VecDeque<usize>,
    procs: Vec<MmuProcess>,
    pager: Pager,
    rand: RandGen,
    opts: MmuOptions,

    current: Option<usize>,
    inst_count: u64,
    ctx_switches: u64,
    process_exits: u64,
    cost: u64,

    out: Vec<String>,
}

impl Mmu {
    pub fn new(
        frame_count: usize,
        processes: Vec<Vec<Vma>>,
        pager: Pager,
        rand: RandGen,
        opts: MmuOptions,
    ) -> Result<Self> {
        if frame_count == 0 || frame_count > MAX_FRAMES {
            return Err(SimError::BadFrameCount(frame_count));
        }
        Ok(Self {
            frames: vec![Frame::default(); frame_count],
            free: (0..frame_count).collect(),
            procs: processes.into_iter().map(MmuProcess::new).collect(),
            pager,
            rand,
            opts,
            current: None,
            inst_count: 0,
            ctx_switches: 0,
            process_exits: 0,
            cost: 0,
            out: Vec::new(),
        })
    }

    /// Execute the whole reference trace.
    pub fn run(&mut self, instructions: &[Instr]) {
        for (idx, instr) in instructions.iter().enumerate() {
            if self.opts.trace {
                self.out
                    .push(format!("inst: {} {}", instr.op.code(), instr.arg));
            }
            match instr.op {
                Op::Ctx => {
                    self.ctx_switches += 1;
                    self.cost += COST_CTX;
                    self.current = Some(instr.arg);
                }
                Op::Exit => {
                    self.process_exits += 1;
                    self.cost += COST_EXIT;
                    self.exit_process(instr.arg);
                }
                Op::Read => {
                    self.cost += COST_RW;
                    self.access(idx as u64, instr.arg, false);
                }
                Op::Write => {
                    self.cost += COST_RW;
                    self.access(idx as u64, instr.arg, true);
                }
            }
            self.inst_count += 1;
            self.per_instruction_dumps();
        }
    }

    /// Resolve one read/write, faulting the page in if needed.
    fn access(&mut self, now: u64, vpage: usize, write: bool) {
        let pid = self
            .current
            .expect("memory access before any context switch");
        if !self.procs[pid].page_table[vpage].present() {
            let Some(vma) = self.procs[pid].vma_for(vpage).copied() else {
                self.emit(" SEGV".to_string());
                self.procs[pid].stats.segv += 1;
                self.cost += COST_SEGV;
                return;
            };
            let frame = self.claim_frame(now);
            if vma.file_mapped {
                self.emit(" FIN".to_string());
                self.procs[pid].stats.fins += 1;
                self.cost += COST_FIN;
            } else if self.procs[pid].page_table[vpage].pagedout() {
                self.emit(" IN".to_string());
                self.procs[pid].stats.ins += 1;
                self.cost += COST_IN;
            } else {
                self.emit(" ZERO".to_string());
                self.procs[pid].stats.zeros += 1;
                self.cost += COST_ZERO;
            }
            self.emit(format!(" MAP {frame}"));
            self.procs[pid].stats.maps += 1;
            self.cost += COST_MAP;

            let pte = &mut self.procs[pid].page_table[vpage];
            pte.set_present(true);
            pte.set_frame(frame);
            pte.set_write_protected(vma.write_protected);
            pte.set_file_mapped(vma.file_mapped);
            self.frames[frame] = Frame {
                owner: Some((pid, vpage)),
                age: 0,
                last_used: now,
            };
        }

        self.procs[pid].page_table[vpage].set_referenced(true);
        if write {
            if self.procs[pid].page_table[vpage].write_protected() {
                self.emit(" SEGPROT".to_string());
                self.procs[pid].stats.segprot += 1;
                self.cost += COST_SEGPROT;
            } else {
                self.procs[pid].page_table[vpage].set_modified(true);
            }
        }
    }

    /// Get a frame for a faulting page: free list first, eviction otherwise.
    fn claim_frame(&mut self, now: u64) -> usize {
        if let Some(frame) = self.free.pop_front() {
            return frame;
        }
        let victim =
            self.pager
                .select_victim(&mut self.frames, &mut self.procs, &mut self.rand, now);
        if self.opts.pager_debug {
            debug!(victim, "victim frame selected");
        }
        let (vpid, vvpage) = self.frames[victim]
            .owner
            .expect("pager selected a free frame");
        self.emit(format!(" UNMAP {vpid}:{vvpage}"));
        self.procs[vpid].stats.unmaps += 1;
        self.cost += COST_UNMAP;

        let pte = self.procs[vpid].page_table[vvpage];
        if pte.modified() {
            if pte.file_mapped() {
                self.emit(" FOUT".to_string());
                self.procs[vpid].stats.fouts += 1;
                self.cost += COST_FOUT;
            } else {
                self.procs[vpid].page_table[vvpage].set_pagedout(true);
                self.emit(" OUT".to_string());
                self.procs[vpid].stats.outs += 1;
                self.cost += COST_OUT;
            }
        }
        let pte = &mut self.procs[vpid].page_table[vvpage];
        pte.set_present(false);
        pte.set_referenced(false);
        pte.set_modified(false);
        victim
    }

    /// Tear down an exiting process: unmap present pages, write back
    /// modified file-mapped ones, release swap slots and frames.
    fn exit_process(&mut self, pid: usize) {
        for vpage in 0..NUM_VPAGES {
            let pte = self.procs[pid].page_table[vpage];
            if pte.present() {
                let frame = pte.frame();
                self.emit(format!(" UNMAP {pid}:{vpage}"));
                self.procs[pid].stats.unmaps += 1;
                self.cost += COST_UNMAP;
                if pte.modified() && pte.file_mapped() {
                    self.emit(" FOUT".to_string());
                    self.procs[pid].stats.fouts += 1;
                    self.cost += COST_FOUT;
                }
                self.frames[frame] = Frame::default();
                self.free.push_back(frame);
            }
            self.procs[pid].page_table[vpage] = Pte::default();
        }
        self.procs[pid].exited = true;
        if self.current == Some(pid) {
            self.current = None;
        }
    }

    fn per_instruction_dumps(&mut self) {
        if self.opts.cur_pt_each {
            if let Some(pid) = self.current {
                let line = self.render_page_table(pid);
                self.out.push(line);
            }
        }
        if self.opts.all_pt_each {
            for pid in 0..self.procs.len() {
                let line = self.render_page_table(pid);
                self.out.push(line);
            }
        }
        if self.opts.ft_each {
            let line = self.render_frame_table();
            self.out.push(line);
        }
    }

    #[inline]
    fn emit(&mut self, line: String) {
        if self.opts.trace {
            self.out.push(line);
        }
    }

    // ---------------------------------------------------------------------
    // Rendering
    // ---------------------------------------------------------------------

    /// `PT[pid]:` then one entry per vpage: `v:RMS` when present (`-` for a
    /// clear bit), `#` when swapped out, `*` otherwise.
    pub fn render_page_table(&self, pid: usize) -> String {
        let mut line = format!("PT[{pid}]:");
        for (vpage, pte) in self.procs[pid].page_table.iter().enumerate() {
            line.push(' ');
            if pte.present() {
                line.push_str(&format!(
                    "{}:{}{}{}",
                    vpage,
                    if pte.referenced() { 'R' } else { '-' },
                    if pte.modified() { 'M' } else { '-' },
                    if pte.pagedout() { 'S' } else { '-' },
                ));
            } else if pte.pagedout() {
                line.push('#');
            } else {
                line.push('*');
            }
        }
        line
    }

    /// `FT:` then `pid:vpage` per frame, `*` for a free frame.
    pub fn render_frame_table(&self) -> String {
        let mut line = String::from("FT:");
        for frame in &self.frames {
            line.push(' ');
            match frame.owner {
                Some((pid, vpage)) => line.push_str(&format!("{pid}:{vpage}")),
                None => line.push('*'),
            }
        }
        line
    }

    /// Append the final sections selected by the options.
    pub fn render_final(&mut self) {
        if self.opts.page_tables {
            for pid in 0..self.procs.len() {
                let line = self.render_page_table(pid);
                self.out.push(line);
            }
        }
        if self.opts.frame_table {
            let line = self.render_frame_table();
            self.out.push(line);
        }
        if self.opts.summary {
            for (pid, proc) in self.procs.iter().enumerate() {
                let s = proc.stats;
                self.out.push(format!(
                    "PROC[{pid}]: U={} M={} I={} O={} FI={} FO={} Z={} SV={} SP={}",
                    s.unmaps, s.maps, s.ins, s.outs, s.fins, s.fouts, s.zeros, s.segv, s.segprot
                ));
            }
            self.out.push(format!(
                "TOTALCOST {} {} {} {} {}",
                self.inst_count,
                self.ctx_switches,
                self.process_exits,
                self.cost,
                std::mem::size_of::<Pte>()
            ));
        }
    }

    // ---------------------------------------------------------------------
    // Accessors (used by the binary and the tests)
    // ---------------------------------------------------------------------

    pub fn output(&self) -> &[String] {
        &self.out
    }

    pub fn processes(&self) -> &[MmuProcess] {
        &self.procs
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn free_frame_count(&self) -> usize {
        self.free.len()
    }

    pub fn cost(&self) -> u64 {
        self.cost
    }

    pub fn inst_count(&self) -> u64 {
        self.inst_count
    }

    pub fn ctx_switches(&self) -> u64 {
        self.ctx_switches
    }

    pub fn process_exits(&self) -> u64 {
        self.process_exits
    }
}
