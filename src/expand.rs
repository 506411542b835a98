//! Per-level expansion-type rewrites, and the canonicity fixup that
//! restores the lo-edge invariant afterwards.
//!
//! Each rewrite walks every node at one level and replaces its branch pair
//! with a new pair computed from the old one (and, for the
//! classical/biconditional flips, from the variable one level down). The
//! node keeps its arena slot, so edges held by parents stay valid; what a
//! slot *denotes* is preserved because the new pair re-expresses the same
//! function under the new decomposition rule.
//!
//! Some rules produce an inverted lo branch. A freshly built node would
//! push that mark up to its own edge, but an in-place rewrite cannot touch
//! its parents, so the mark is left in place and `fix_canonicity` sweeps it
//! out afterwards.
use crate::nid::NID;
use crate::vhl::{HiLo, Vhl};
use crate::bkf::{BkfBase, BkHashMap, IxRc};
use crate::expn::{Expn, Letter};
use crate::err::Result;

type Rule = fn(&mut BkfBase, usize, HiLo)->Result<HiLo>;

// -- rewrite rules -----------------------------------------------------
// each returns the new branch pair with one owned reference per branch
// (transferred to the node's internal edges on install).

/// S (hi=f1, lo=f0) -> ND (hi=f1^f0, lo=f1)
fn rule_s_nd(b:&mut BkfBase, _l:usize, hl:HiLo)->Result<HiLo> {
  let hi = b.xor_inner(hl.hi, hl.lo)?;
  b.nref(hl.hi);
  Ok(HiLo::new(hi, hl.hi)) }

/// ND (hi=fd, lo=f1) -> S (hi=f1, lo=f1^fd)
fn rule_nd_s(b:&mut BkfBase, _l:usize, hl:HiLo)->Result<HiLo> {
  let lo = b.xor_inner(hl.lo, hl.hi)?;
  b.nref(hl.lo);
  Ok(HiLo::new(hl.lo, lo)) }

/// S (hi=f1, lo=f0) <-> PD (hi=f0^f1, lo=f0). the same rule serves both
/// directions, and it never touches lo, so no fixup is needed.
fn rule_s_pd(b:&mut BkfBase, _l:usize, hl:HiLo)->Result<HiLo> {
  let hi = b.xor_inner(hl.hi, hl.lo)?;
  b.nref(hl.lo);
  Ok(HiLo::new(hi, hl.lo)) }

/// ND (hi=fd, lo=f1) <-> PD (hi=fd, lo=f0). two-sided.
fn rule_nd_pd(b:&mut BkfBase, _l:usize, hl:HiLo)->Result<HiLo> {
  let lo = b.xor_inner(hl.lo, hl.hi)?;
  b.nref(hl.hi);
  Ok(HiLo::new(hl.hi, lo)) }

/// CS <-> BS: hi' = ite(y, hi, lo), lo' = ite(y, lo, hi). substituting
/// x := x==y twice is the identity, so the same rule serves both ways.
fn rule_flip_s(b:&mut BkfBase, l:usize, hl:HiLo)->Result<HiLo> {
  let y = b.var(b.var_at(l+1));
  let hi = b.ite_inner(y, hl.hi, hl.lo)?;
  let lo = match b.ite_inner(y, hl.lo, hl.hi) {
    Ok(x) => x,
    Err(e) => { b.nderef(hi); return Err(e) }};
  Ok(HiLo::new(hi, lo)) }

/// Davio classical <-> biconditional: lo' = lo ^ (!y & hi), hi' = hi.
/// (x·hi == (x==y)·hi ^ !y·hi, so the correction term folds into lo.)
/// two-sided: applying it twice cancels the correction.
fn rule_flip_davio(b:&mut BkfBase, l:usize, hl:HiLo)->Result<HiLo> {
  let y = b.var(b.var_at(l+1));
  let t = b.and_inner(!y, hl.hi)?;
  let lo = match b.xor_inner(hl.lo, t) {
    Ok(x) => x,
    Err(e) => { b.nderef(t); return Err(e) }};
  b.nderef(t);
  b.nref(hl.hi);
  Ok(HiLo::new(hl.hi, lo)) }


impl BkfBase {

  /// rewrite level `l` to the target expansion, routing through the
  /// primitive transitions (letter change within the current class first,
  /// then the classical/biconditional flip).
  ///
  /// Raw NIDs held outside the manager are *not* rewritten; roots that
  /// must survive this call belong in `tags` (or are re-read via `var`).
  pub fn change_expn(&mut self, l:usize, target:Expn)->Result<()> {
    let cur = self.rows[l].expn;
    if cur == target { return Ok(()) }
    // the bottom level cannot pair with a variable below it; asking for a
    // biconditional expansion there silently succeeds without rewriting.
    if target.is_bicond() && l+1 == self.nvars() { return Ok(()) }
    if cur.letter() != target.letter() { self.change_letter(l, target.letter())? }
    if self.rows[l].expn.is_classical() != target.is_classical() { self.change_bi_cla(l)? }
    debug_assert_eq!(self.rows[l].expn, target);
    Ok(()) }

  /// switch the letter (S/ND/PD) within the level's current class.
  fn change_letter(&mut self, l:usize, to:Letter)->Result<()> {
    let cur = self.rows[l].expn;
    let from = cur.letter();
    if from == to { return Ok(()) }
    let (rule, fixup):(Rule, bool) = match (from, to) {
      (Letter::S,  Letter::ND) => (rule_s_nd, true),
      (Letter::ND, Letter::S)  => (rule_nd_s, true),
      (Letter::S,  Letter::PD) | (Letter::PD, Letter::S)  => (rule_s_pd, false),
      (Letter::ND, Letter::PD) | (Letter::PD, Letter::ND) => (rule_nd_pd, true),
      _ => unreachable!("letter change {:?} -> {:?}", from, to) };
    self.rewrite_level(l, cur.with_letter(to), rule, fixup) }

  /// flip classical <-> biconditional at level `l`, keeping the letter.
  pub fn change_bi_cla(&mut self, l:usize)->Result<()> {
    let cur = self.rows[l].expn;
    if l+1 == self.nvars() {
      debug_assert!(cur.is_classical(), "biconditional expansion on the bottom level");
      return Ok(()) }
    let target = if cur.is_classical() { cur.bicond() } else { cur.classical() };
    let rule:Rule = if cur.is_shannon() { rule_flip_s } else { rule_flip_davio };
    self.rewrite_level(l, target, rule, true) }

  /// the shared skeleton: detach every node at the level, rewrite each in
  /// place with inner operators, rehash, then post-process (wipe the
  /// cache, sweep the affected levels, recount isolated projections) and
  /// optionally run the canonicity fixup.
  ///
  /// An allocation failure mid-walk leaves the manager inconsistent: the
  /// error is recorded, the manager is poisoned, and the caller must treat
  /// the affected functions as lost.
  fn rewrite_level(&mut self, l:usize, target:Expn, rule:Rule, fixup:bool)->Result<()> {
    debug!("rewrite level {}: {:?} -> {:?} ({} nodes)",
           l, self.rows[l].expn, target, self.rows[l].hm.len());
    self.hold += 1;
    let entries:Vec<(HiLo, IxRc)> = self.rows[l].hm.drain().collect();
    let mut old_children:Vec<NID> = Vec::with_capacity(entries.len()*2);
    let mut failed = None;
    let mut pending:Vec<(HiLo, IxRc)> = Vec::with_capacity(entries.len());
    for (hl, ixrc) in entries {
      if failed.is_some() { pending.push((hl, ixrc)); continue }
      match rule(self, l, hl) {
        Ok(new) => {
          let ix = ixrc.ix.idx();
          let v = self.vhls[ix].v;
          self.vhls[ix] = Vhl::new(v, new.hi, new.lo);
          old_children.push(hl.hi);
          old_children.push(hl.lo);
          pending.push((new, ixrc)) }
        Err(e) => { failed = Some(e); pending.push((hl, ixrc)) }}}
    for (hl, ixrc) in pending {
      let prev = self.rows[l].hm.insert(hl, ixrc);
      debug_assert!(prev.is_none(), "rewrite produced duplicate key {:?} at level {}", hl, l); }
    if let Some(e) = failed {
      // some nodes rewritten, some not: invariants are broken for good.
      warn!("rewrite of level {} failed mid-walk: {}", l, e);
      self.err = Some(e);
      self.poisoned = true;
      self.hold -= 1;
      return Err(e) }
    for c in old_children { self.nderef(c) }
    self.rows[l].expn = target;
    self.memo.wipe();
    self.sweep_from(l);
    if fixup { self.fix_canonicity() }
    self.hold -= 1;
    #[cfg(debug_assertions)] self.validate("after expansion rewrite");
    Ok(()) }

  /// Restore the lo-edge canonicity invariant after a rewrite (or swap)
  /// that left inverted lo marks behind.
  ///
  /// A node whose lo* chain carries an odd number of inversion marks
  /// denotes the complement of its normalized form. One bottom-up pass
  /// computes that parity for every stored node; then every node is
  /// renormalized in place (lo mark cleared; hi mark xored with the hi
  /// target's parity, and with the node's own parity on shannon rows,
  /// where a complement distributes over both branches), every row is
  /// rehashed, and every external handle (projections, named roots) gets
  /// its mark flipped to match. No two live nodes can collapse together
  /// here: the unique table never holds two nodes denoting equal or
  /// complementary functions, and rewrites preserve functions.
  pub(crate) fn fix_canonicity(&mut self) {
    let mut par = vec![false; self.vhls.len()];
    for l in (0..self.nvars()).rev() {
      for ixrc in self.rows[l].hm.values() {
        let ix = ixrc.ix.idx();
        let lo = self.vhls[ix].lo;
        par[ix] = lo.is_inv() ^ (!lo.is_const() && par[lo.raw().idx()]); }}
    if par.iter().all(|&p| !p) { return }  // nothing dirty
    trace!("fix_canonicity: {} dirty nodes", par.iter().filter(|&&p| p).count());
    for l in 0..self.nvars() {
      let shannon = self.rows[l].expn.is_shannon();
      let entries:Vec<(HiLo, IxRc)> = self.rows[l].hm.drain().collect();
      let mut hm:BkHashMap<HiLo, IxRc> = BkHashMap::default();
      for (_, ixrc) in entries {
        let ix = ixrc.ix.idx();
        let node = self.vhls[ix];
        let ph = !node.hi.is_const() && par[node.hi.raw().idx()];
        let hi = node.hi.inv_if(ph ^ (shannon && par[ix]));
        let lo = node.lo.raw();
        self.vhls[ix] = Vhl::new(node.v, hi, lo);
        let prev = hm.insert(HiLo::new(hi, lo), ixrc);
        debug_assert!(prev.is_none(), "fixup collapsed two nodes at level {}", l); }
      self.rows[l].hm = hm; }
    for i in 0..self.vars.len() {
      let n = self.vars[i];
      if !n.is_const() && par[n.raw().idx()] { self.vars[i] = !n }}
    for v in self.tags.values_mut() {
      if !v.is_const() && par[v.raw().idx()] { *v = !*v }}}}


include!("test-expand.rs");
