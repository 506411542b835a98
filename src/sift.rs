//! Dynamic variable reordering: sifting, odt-sifting, group-sifting, and
//! symmetric-sifting, all built on the adjacent swap.
//!
//! The shared skeleton is Rudell's: visit variables largest-row-first, walk
//! each one down to the bottom and back up to the top recording the live
//! count at every position, then return it to the best position seen.
//! Budgets (swap count, wall clock, user callback) are polled at sift
//! boundaries; cancellation keeps the best-so-far order.
//!
//! odt-sifting re-runs the expansion-choice heuristic at every position, so
//! it searches the product space position x expansion-type.
//!
//! Group flavors move blocks of levels as units. Biconditional groups (a
//! run of biconditional levels plus the classical level that terminates it)
//! are converted to their classical forms for the duration of the reorder,
//! moved rigidly, and restored at their final location -- the OET records
//! taken before and after assert that no group was split or merged.
use crate::nid::NID;
use crate::vid::VID;
use crate::bkf::{BkfBase, Method};
use crate::expn::Expn;
use crate::err::Result;
use std::time::Instant;

/// where a variable sits in a biconditional group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupRole { #[default] Single, Top, Mid, Bot }

/// Per-variable descriptor recorded around a reorder: the variable's
/// expansion, its group role, and its paired variable (the one below it,
/// for biconditional levels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Oet { pub expn:Expn, pub role:GroupRole, pub pair:Option<VID> }

impl Default for Oet {
  fn default()->Oet { Oet { expn:Expn::CS, role:GroupRole::Single, pair:None }}}


impl BkfBase {

  // -- oet records ------------------------------------------------------

  /// record each variable's expansion, group role and pairing.
  pub(crate) fn snapshot_oet(&self)->Vec<Oet> {
    let n = self.nvars();
    let mut oet = vec![Oet::default(); n];
    let mut l = 0;
    while l < n {
      if self.rows[l].expn.is_bicond() {
        let mut m = l;
        while self.rows[m].expn.is_bicond() { m += 1 } // lands on the terminator
        for k in l..=m {
          oet[self.invperm[k]] = Oet {
            expn: self.rows[k].expn,
            role: if k == l { GroupRole::Top }
                  else if k == m { GroupRole::Bot }
                  else { GroupRole::Mid },
            pair: if k < m { Some(self.var_at(k+1)) } else { None } }}
        l = m + 1 }
      else {
        oet[self.invperm[l]] = Oet { expn: self.rows[l].expn, role: GroupRole::Single, pair: None };
        l += 1 }}
    oet }

  /// group/OET agreement: the before and after records must describe the
  /// same biconditional groups. runs in debug builds after group reorders.
  pub(crate) fn oet_check(&self)->std::result::Result<(), String> {
    if self.oet1.len() != self.oet2.len() { return Err("oet length changed".to_string()) }
    for (i, (a, b)) in self.oet1.iter().zip(self.oet2.iter()).enumerate() {
      if a != b { return Err(format!("oet changed for x{}: {:?} -> {:?}", i, a, b)) }}
    Ok(()) }

  // -- group chains -----------------------------------------------------
  // a group is a contiguous block of levels whose `next` pointers form a
  // cycle. outside reordering every row's next points at itself.

  pub(crate) fn group_range(&self, l:usize)->(usize, usize) {
    let (mut lo, mut hi) = (l, l);
    let mut k = self.rows[l].next;
    while k != l { lo = lo.min(k); hi = hi.max(k); k = self.rows[k].next }
    (lo, hi) }

  fn link_group(&mut self, a:usize, b:usize) {
    for k in a..b { self.rows[k].next = k+1 }
    self.rows[b].next = a }

  fn clear_groups(&mut self) {
    for l in 0..self.nvars() { self.rows[l].next = l }}

  /// link every biconditional run (plus terminator) into a group, then
  /// convert the run to classical for the duration of the reorder.
  /// returns the (variable, expansion) pairs to restore afterwards.
  fn init_groups(&mut self)->Result<Vec<(usize, Expn)>> {
    let n = self.nvars();
    let mut saved = vec![];
    let mut l = 0;
    while l < n {
      if self.rows[l].expn.is_bicond() {
        let mut m = l;
        while self.rows[m].expn.is_bicond() { m += 1 }
        self.link_group(l, m);
        for k in l..m { saved.push((self.invperm[k], self.rows[k].expn)) }
        for k in l..m { self.change_bi_cla(k)? }
        l = m + 1 }
      else { l += 1 }}
    Ok(saved) }

  fn restore_bicond(&mut self, saved:Vec<(usize, Expn)>)->Result<()> {
    for (vix, e) in saved {
      let l = self.perm[vix];
      self.change_expn(l, e)? }
    Ok(()) }

  // -- cancellation -----------------------------------------------------

  pub(crate) fn reorder_cancelled(&mut self)->bool {
    if self.swaps >= self.conf.sift_max_swap { return true }
    if let (Some(t0), Some(lim)) = (self.clock, self.conf.time_limit) {
      if t0.elapsed() >= lim {
        // a timeout also turns background reordering off for good.
        self.conf.auto_dyn = false;
        return true }}
    if let Some(f) = &self.term { if f() { return true }}
    false }

  // -- block moves ------------------------------------------------------

  /// move the group [a..=b] down past whatever sits below it (a level or a
  /// whole group), one adjacent swap at a time. returns the new top.
  fn move_block_down(&mut self, a:usize, b:usize)->Result<usize> {
    let (nlo, nhi) = self.group_range(b+1);
    debug_assert_eq!(nlo, b+1, "groups overlap");
    let jump = nhi - nlo + 1;
    for k in 0..jump {
      for l in ((a+k)..=(b+k)).rev() { self.sift_swap(l)? }}
    for l in a..=(b+jump) { self.rows[l].next = l }
    if jump > 1 { self.link_group(a, a+jump-1) }
    if b > a { self.link_group(a+jump, b+jump) }
    Ok(a + jump) }

  /// move the group [a..=b] up past whatever sits above it.
  fn move_block_up(&mut self, a:usize, b:usize)->Result<usize> {
    let (nlo, nhi) = self.group_range(a-1);
    debug_assert_eq!(nhi, a-1, "groups overlap");
    let jump = nhi - nlo + 1;
    for k in 0..jump {
      for l in (a-1-k)..(b-k) { self.sift_swap(l)? }}
    for l in (a-jump)..=b { self.rows[l].next = l }
    if b > a { self.link_group(a-jump, b-jump) }
    if jump > 1 { self.link_group(b-jump+1, b) }
    Ok(a - jump) }

  fn sift_swap(&mut self, l:usize)->Result<()> {
    self.prep_swap(l)?;
    self.swap_adjacent(l)?;
    Ok(()) }

  // -- the engine -------------------------------------------------------

  /// run one reordering pass with the given algorithm. returns the live
  /// count afterwards. cancellation (budget, clock, callback) is not an
  /// error: the best order found so far stays in place.
  pub fn reorder(&mut self, m:Method)->Result<usize> {
    let n = self.nvars();
    if n < 2 { return Ok(self.live()) }
    debug!("reorder({:?}): {} live nodes", m, self.live());
    self.gc();
    self.build_interact();
    self.memo.wipe();
    self.swaps = 0;
    self.clock = Some(Instant::now());
    self.oet1 = self.snapshot_oet();
    let grouped = matches!(m, Method::GroupSift | Method::SymmSift);
    let saved = if grouped { self.init_groups()? } else { vec![] };
    let res = self.sift_all(m);
    if grouped { self.restore_bicond(saved)? }
    self.oet2 = self.snapshot_oet();
    if grouped {
      debug_assert!(self.oet_check().is_ok(), "group structure changed: {:?}", self.oet_check()) }
    self.clear_groups();
    self.clock = None;
    res?;
    debug!("reorder done: {} live nodes after {} swaps", self.live(), self.swaps);
    Ok(self.live()) }

  fn sift_all(&mut self, m:Method)->Result<usize> {
    let n = self.nvars();
    // sift order: biggest rows first, sizes snapshotted up front.
    let sizes:Vec<usize> = (0..n).map(|vix| self.rows[self.perm[vix]].keys()).collect();
    let mut order:Vec<usize> = (0..n).collect();
    order.sort_by_key(|&vix| std::cmp::Reverse(sizes[vix]));
    let mut sifted = 0;
    for &vix in order.iter() {
      if sifted >= self.conf.sift_max_var { break }
      if self.reorder_cancelled() { break }
      let (glo, ghi) = self.group_range(self.perm[vix]);
      if self.perm[vix] != glo { continue } // its group moves when its top is visited
      if ghi - glo + 1 >= n { continue }    // nowhere to go
      self.sift_var(glo, ghi - glo + 1, m)?;
      sifted += 1 }
    Ok(self.live()) }

  /// sift the group whose top is at `pos0`: down sweep, up sweep, then
  /// back to the best position seen (ties break toward the start).
  fn sift_var(&mut self, pos0:usize, gsize:usize, m:Method)->Result<()> {
    let n = self.nvars();
    let start_size = self.live();
    let limit = (self.conf.max_growth * start_size as f64) as usize;
    let mut pos = pos0;
    let mut best = (start_size, pos0);
    macro_rules! record { ($size:expr, $p:expr) => {{
      let (s, p) = ($size, $p);
      let closer = p.abs_diff(pos0) < best.1.abs_diff(pos0);
      if s < best.0 || (s == best.0 && closer) { best = (s, p) }}}}
    // down sweep
    while pos + gsize <= n - 1 {
      if self.reorder_cancelled() { break }
      pos = self.move_block_down(pos, pos + gsize - 1)?;
      if m == Method::OdtSift { self.odt_choose(pos)? }
      let size = self.live();
      record!(size, pos);
      if size > limit { break }}
    // up sweep
    while pos > 0 {
      if self.reorder_cancelled() { break }
      pos = self.move_block_up(pos, pos + gsize - 1)?;
      if m == Method::OdtSift { self.odt_choose(pos)? }
      let size = self.live();
      record!(size, pos);
      if size > limit { break }}
    // backward pass: undo moves past the recorded minimum.
    let mut guard = 4 * n * n + 16;
    while pos != best.1 && guard > 0 {
      if pos < best.1 { pos = self.move_block_down(pos, pos + gsize - 1)? }
      else { pos = self.move_block_up(pos, pos + gsize - 1)? }
      guard -= 1 }
    debug_assert_eq!(pos, best.1, "backward pass failed to land on the best position");
    if m == Method::OdtSift { self.odt_choose(pos)? }
    trace!("sifted group at {} (size {}) to {}: {} nodes", pos0, gsize, pos, self.live());
    // aggregation: extend the group when the boundary predicate fires.
    match m {
      Method::GroupSift => {
        if pos + gsize < n && self.sec_diff_check(pos + gsize - 1) {
          let (_, bhi) = self.group_range(pos + gsize);
          self.link_group(pos, bhi);
          debug!("aggregated levels {}..={} (second-difference)", pos, bhi) }}
      Method::SymmSift => {
        if pos + gsize < n && self.symm_check(pos + gsize - 1) {
          let (_, bhi) = self.group_range(pos + gsize);
          self.link_group(pos, bhi);
          debug!("aggregated levels {}..={} (symmetry)", pos, bhi) }}
      _ => {}}
    Ok(()) }

  /// odt: re-choose the expansion at the level that now holds the sifted
  /// variable. the mode filter inside the chooser limits which codes are
  /// actually tried.
  fn odt_choose(&mut self, l:usize)->Result<()> {
    self.choose_sd6_restricted(l)?;
    Ok(()) }

  // -- aggregation predicates ------------------------------------------

  /// never aggregate.
  pub fn no_check(&self, _x:usize)->bool { false }

  /// second-difference test: the size gradient flattens across the
  /// boundary and the two variables are known to interact.
  pub fn sec_diff_check(&self, x:usize)->bool {
    if x == 0 || x+1 >= self.nvars() { return false }
    let sx = self.rows[x].keys() as f64;
    let sy = self.rows[x+1].keys() as f64;
    let sp = self.rows[x-1].keys() as f64;
    if sx == 0.0 || sp == 0.0 { return false }
    (sy/sx) - (sx/sp) < (self.conf.recomb as f64 / 100.0)
      && self.interact(self.invperm[x], self.invperm[x+1]) }

  /// grandchild reads for the symmetry tests: the value cofactors of an
  /// edge under a classical-shannon level, by pointer only.
  fn ss_grandchildren(&self, y:usize, a:NID)->(NID, NID) {
    if self.level_of(a) > y { return (a, a) }
    let node = self.vhl(a);
    (node.hi.inv_if(a.is_inv()), node.lo.inv_if(a.is_inv())) }

  /// symmetry check between level x and the level below it. every live
  /// node at x must either satisfy the S-S pattern (f11==f00 or f10==f01)
  /// or not reach the lower level at all, and every reference into the
  /// lower row must come from row x (modulo the projection handle).
  /// classical-shannon levels only.
  pub fn symm_check(&self, x:usize)->bool {
    self.symm_check_tol(x, 0, 0) }

  /// weakened variant 2: a configurable percentage of violating nodes and
  /// stray arcs is tolerated.
  pub fn ext_symm_check2(&self, x:usize)->bool {
    self.symm_check_tol(x, self.conf.symmviolation, self.conf.arcviolation) }

  /// weakened variant 1: additionally admits mixed expansion patterns.
  /// Of the four patterns (S-S, S-D, D-S, D-D), the mixed ones fall back
  /// to the S-S structural comparison and D-D is rejected outright.
  pub fn ext_symm_check1(&self, x:usize)->bool {
    if x+1 >= self.nvars() { return false }
    let (ex, ey) = (self.rows[x].expn, self.rows[x+1].expn);
    if !(ex.is_classical() && ey.is_classical()) { return false }
    if ex.is_davio() && ey.is_davio() { return false }
    self.symm_check_pairs(x, self.conf.symmviolation, self.conf.arcviolation) }

  fn symm_check_tol(&self, x:usize, symmviol:u32, arcviol:u32)->bool {
    if x+1 >= self.nvars() { return false }
    if self.rows[x].expn != Expn::CS || self.rows[x+1].expn != Expn::CS { return false }
    self.symm_check_pairs(x, symmviol, arcviol) }

  fn symm_check_pairs(&self, x:usize, symmviol:u32, arcviol:u32)->bool {
    let y = x + 1;
    let yv = self.var_at(y);
    let mut arcs = 0usize;
    let mut total = 0usize;
    let mut bad = 0usize;
    for (hl, ixrc) in self.rows[x].hm.iter() {
      if ixrc.rc == 0 { continue }
      total += 1;
      let reach = |n:NID| !n.is_const() && self.vhls[n.idx()].v == yv;
      let (rh, rl) = (reach(hl.hi), reach(hl.lo));
      if rh { arcs += 1 }
      if rl { arcs += 1 }
      if !(rh || rl) { continue } // does not reach the lower level
      let (f11, f10) = self.ss_grandchildren(y, hl.hi);
      let (f01, f00) = self.ss_grandchildren(y, hl.lo);
      if !(f11 == f00 || f10 == f01) { bad += 1 }}
    if total == 0 { return false }
    if bad * 100 > symmviol as usize * total { return false }
    // every reference into row y must come from row x, except the
    // projection handle itself.
    let yrefs:usize = self.rows[y].hm.values()
      .filter(|ixrc| ixrc.rc > 0).map(|ixrc| ixrc.rc as usize).sum();
    let expected = arcs + 1; // +1 for the vars[] handle on y's projection
    let slack = yrefs.abs_diff(expected);
    slack * 100 <= arcviol as usize * yrefs.max(1) }}


include!("test-sift.rs");
