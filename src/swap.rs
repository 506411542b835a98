//! Adjacent-variable swap.
//!
//! Exchanging two neighboring levels preserves every function. Nodes on the
//! upper row that never reach the lower row just migrate down with their
//! variable; the rest are rebuilt in place from their four grandcofactors:
//!
//! ```text
//!    x ____                        y ____
//!    :     \                       :     \
//!    y __    y __      =>          x __    x __
//!    :   \    :  \                 :   \    :   \
//!    11   10  01  00               11   01  10   00
//! ```
//!
//! Expansion codes stay attached to their *levels*, so the rebuilt nodes
//! re-express the same functions under the same per-level rules with the
//! variables exchanged. Both levels (and the level above, whose
//! biconditional pairing would otherwise quote the wrong variable) must be
//! classical; the reordering driver converts levels as needed before
//! calling in here.
use crate::nid::NID;
use crate::vhl::{HiLo, Vhl};
use crate::bkf::{BkfBase, IxRc};
use crate::expn::Expn;
use crate::err::Result;

struct Mover { ixrc:IxRc, old:HiLo, f11:NID, f10:NID, f01:NID, f00:NID, f1:NID, f0:NID }

impl BkfBase {

  /// value cofactors (f at x=1, f at x=0) of a stored branch pair under a
  /// classical expansion, as owned edges. `m` is the referring edge's mark.
  fn val_cofs_of_pair(&mut self, e:Expn, hl:HiLo, m:bool)->Result<(NID, NID)> {
    match e {
      Expn::CS => {
        let (h, l) = (hl.hi.inv_if(m), hl.lo.inv_if(m));
        self.nref(h); self.nref(l);
        Ok((h, l)) }
      Expn::CND => { // f|x=1 = lo, f|x=0 = lo ^ hi
        let b = hl.lo.inv_if(m);
        let o = self.xor_inner(b, hl.hi)?;
        self.nref(b);
        Ok((b, o)) }
      Expn::CPD => { // f|x=0 = lo, f|x=1 = lo ^ hi
        let b = hl.lo.inv_if(m);
        let o = self.xor_inner(b, hl.hi)?;
        self.nref(b);
        Ok((o, b)) }
      _ => unreachable!("value cofactors need a classical expansion") }}

  /// value cofactors of an edge with respect to the variable at `lvl`.
  fn edge_val_cofs(&mut self, lvl:usize, a:NID)->Result<(NID, NID)> {
    if self.level_of(a) > lvl { self.nref(a); self.nref(a); return Ok((a, a)) }
    debug_assert_eq!(self.level_of(a), lvl);
    let e = self.rows[lvl].expn;
    let hl = self.vhl(a).hilo();
    self.val_cofs_of_pair(e, hl, a.is_inv()) }

  /// the (hi, lo) pair denoting a function with the given value cofactors
  /// under a classical expansion, as owned edges. the pair is *not*
  /// normalized: an inverted lo is the caller's problem.
  fn pair_from_val_cofs(&mut self, e:Expn, f1:NID, f0:NID)->Result<HiLo> {
    match e {
      Expn::CS => { self.nref(f1); self.nref(f0); Ok(HiLo::new(f1, f0)) }
      Expn::CND => {
        let d = self.xor_inner(f1, f0)?;
        self.nref(f1);
        Ok(HiLo::new(d, f1)) }
      Expn::CPD => {
        let d = self.xor_inner(f1, f0)?;
        self.nref(f0);
        Ok(HiLo::new(d, f0)) }
      _ => unreachable!("pair construction needs a classical expansion") }}

  /// find-or-insert the node for the given value cofactors at `lvl`.
  fn node_from_val_cofs(&mut self, lvl:usize, f1:NID, f0:NID)->Result<NID> {
    let e = self.rows[lvl].expn;
    let hl = self.pair_from_val_cofs(e, f1, f0)?;
    let r = self.add_ref(lvl, hl);
    self.nderef(hl.hi); self.nderef(hl.lo);
    r }

  /// public swap: prepare the neighborhood (biconditional levels become
  /// classical first), then exchange levels l and l+1. returns the live
  /// node count.
  pub fn swap(&mut self, l:usize)->Result<usize> {
    self.tidy()?;
    self.prep_swap(l)?;
    self.swap_adjacent(l) }

  /// convert the levels a swap at `l` touches to their classical forms.
  pub(crate) fn prep_swap(&mut self, l:usize)->Result<()> {
    assert!(l+1 < self.nvars(), "swap needs a level below");
    if l > 0 && self.rows[l-1].expn.is_bicond() { self.change_bi_cla(l-1)? }
    if self.rows[l].expn.is_bicond() { self.change_bi_cla(l)? }
    if self.rows[l+1].expn.is_bicond() { self.change_bi_cla(l+1)? }
    Ok(()) }

  /// exchange the variables at levels l and l+1. requires classical
  /// expansions at l-1, l, and l+1 (see prep_swap).
  pub(crate) fn swap_adjacent(&mut self, l:usize)->Result<usize> {
    debug_assert!(self.rows[l].expn.is_classical());
    debug_assert!(self.rows[l+1].expn.is_classical());
    debug_assert!(l == 0 || self.rows[l-1].expn.is_classical());
    let xv = self.var_at(l); let yv = self.var_at(l+1);
    let (e_top, e_bot) = (self.rows[l].expn, self.rows[l+1].expn);
    trace!("swap: {} (level {}, {:?}) <-> {} (level {}, {:?})", xv, l, e_top, yv, l+1, e_bot);
    self.hold += 1;
    // phase 1: with both rows still in place, split the upper row into
    // movers (some branch reaches the lower row) and stayers, and extract
    // every mover's four grandcofactors through the expansion rules.
    let entries:Vec<(HiLo, IxRc)> = self.rows[l].hm.iter().map(|(hl, rc)| (*hl, *rc)).collect();
    let mut movers:Vec<Mover> = vec![];
    let mut stayers:Vec<(HiLo, IxRc)> = vec![];
    let mut temps:Vec<NID> = vec![];
    for (hl, ixrc) in entries {
      let touches = |n:NID| !n.is_const() && self.vhls[n.idx()].v == yv;
      if !(touches(hl.hi) || touches(hl.lo)) { stayers.push((hl, ixrc)); continue }
      let r = (|b:&mut Self| -> Result<Mover> {
        let (f1, f0) = b.val_cofs_of_pair(e_top, hl, false)?;
        let (f11, f10) = match b.edge_val_cofs(l+1, f1) {
          Ok(x) => x, Err(e) => { b.nderef(f1); b.nderef(f0); return Err(e) }};
        let (f01, f00) = match b.edge_val_cofs(l+1, f0) {
          Ok(x) => x,
          Err(e) => { for t in [f1, f0, f11, f10] { b.nderef(t) } return Err(e) }};
        Ok(Mover { ixrc, old:hl, f11, f10, f01, f00, f1, f0 }) })(self);
      match r {
        Ok(m) => {
          temps.extend([m.f11, m.f10, m.f01, m.f00, m.f1, m.f0]);
          movers.push(m) }
        Err(e) => {
          // nothing rewritten yet: release scratch and leave the manager
          // exactly as it was.
          for t in temps { self.nderef(t) }
          self.sweep_from(l);
          self.hold -= 1;
          return Err(e) }}}
    // phase 2: move the rows and the permutation together. the lower row's
    // nodes keep their keys and arena slots; they simply now live one
    // level up. stayers keep theirs and live one level down.
    let y_map = std::mem::take(&mut self.rows[l+1].hm);
    let y_dead = std::mem::replace(&mut self.rows[l+1].dead, 0);
    self.rows[l].hm = y_map;
    self.rows[l].dead = y_dead;
    for (hl, ixrc) in stayers {
      if ixrc.rc == 0 { self.rows[l+1].dead += 1 }
      self.rows[l+1].hm.insert(hl, ixrc); }
    self.perm.swap(xv.var_ix(), yv.var_ix());
    self.invperm.swap(l, l+1);
    // phase 3: rebuild each mover in place as a node testing y at level l,
    // over two freshly built (or shared) nodes testing x at level l+1.
    let mut fixup = false;
    let mut failed = None;
    for m in &movers {
      if failed.is_some() { break }
      let r = (|b:&mut Self| -> Result<()> {
        let g1 = b.node_from_val_cofs(l+1, m.f11, m.f01)?;
        let g0 = match b.node_from_val_cofs(l+1, m.f10, m.f00) {
          Ok(x) => x, Err(e) => { b.nderef(g1); return Err(e) }};
        let hl = match b.pair_from_val_cofs(e_top, g1, g0) {
          Ok(x) => x, Err(e) => { b.nderef(g1); b.nderef(g0); return Err(e) }};
        b.nderef(g1); b.nderef(g0);
        let ix = m.ixrc.ix.idx();
        b.vhls[ix] = Vhl::new(yv, hl.hi, hl.lo);
        fixup |= hl.lo.is_inv();
        if m.ixrc.rc == 0 { b.rows[l].dead += 1 }
        let prev = b.rows[l].hm.insert(hl, m.ixrc);
        debug_assert!(prev.is_none(), "swap collapsed two distinct nodes");
        b.nderef(m.old.hi); b.nderef(m.old.lo);
        Ok(()) })(self);
      if let Err(e) = r { failed = Some(e) }}
    for t in temps { self.nderef(t) }
    if let Some(e) = failed {
      warn!("swap of levels {}/{} failed mid-rebuild: {}", l, l+1, e);
      self.err = Some(e);
      self.poisoned = true;
      self.hold -= 1;
      return Err(e) }
    self.memo.wipe();
    self.sweep_from(l);
    if fixup { self.fix_canonicity() }
    self.hold -= 1;
    self.swaps += 1;
    #[cfg(debug_assertions)] self.validate("after adjacent swap");
    Ok(self.live()) }}


include!("test-swap.rs");
