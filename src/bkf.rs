//! The manager: shared unique-node table, refcounts, and garbage collection.
//!
//! A `BkfBase` owns every node of every diagram built through it. Nodes live
//! in a slot arena (`vhls`); each *level* of the diagram has a `Row` holding
//! a hashmap from (hi, lo) pairs to arena slots plus reference counts, the
//! level's expansion code, and its dead-entry count. Two permutations relate
//! stable variable indices to levels. External code only ever holds `NID`
//! edges, bracketed by `nref`/`nderef`.
use std::collections::HashMap;
use std::time::{Duration, Instant};
use crate::nid::{NID, I, O};
use crate::vid::VID;
use crate::vhl::{HiLo, Vhl, VHL_NOV};
use crate::expn::Expn;
use crate::memo::Memo;
use crate::err::{Error, Result};
use crate::reg::Reg;
use crate::sift::Oet;

pub type BkHashMap<K,V> = hashbrown::HashMap<K,V,fxhash::FxBuildHasher>;

/// Reference counts saturate here and then freeze: a node whose count ever
/// reaches RC_SAT is permanent. This is deliberate -- it makes over-deref
/// from re-entrant paths harmless at the cost of never reclaiming a handful
/// of extremely popular nodes.
pub const RC_SAT:u16 = u16::MAX;

/// level number assigned to the constants (below every real level).
pub const CONST_LVL:usize = usize::MAX;

/// arena slot + reference count for one stored node.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct IxRc { pub ix:NID, pub rc:u16 }

/// One unique-table row. All nodes whose variable currently sits at this
/// level live here, keyed by their branch pair.
pub struct Row {
  pub hm: BkHashMap<HiLo, IxRc>,
  pub expn: Expn,
  /// entries with rc==0 still present in `hm` (purged by the next sweep).
  pub dead: usize,
  /// group-chain pointer used only during reordering; otherwise == own level.
  pub next: usize }

impl Row {
  pub fn new(expn:Expn, lvl:usize)->Row {
    Row { hm: BkHashMap::default(), expn, dead: 0, next: lvl }}
  /// live entries in this row.
  pub fn keys(&self)->usize { self.hm.len() - self.dead }}

/// Which expansion codes dynamic re-typing may introduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  /// Shannon and negative Davio only ({CS, CND, BS, BND}).
  Snd,
  /// all six codes.
  Sd }

/// Reordering algorithm selector (also used for background reordering).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method { Sift, OdtSift, GroupSift, SymmSift }

/// Runtime knobs. Everything here has a working default; tests poke
/// individual fields.
#[derive(Debug, Clone)]
pub struct Conf {
  /// stored-node cap; reaching it makes node creation fail with MemoryOut.
  pub max_nodes: usize,
  pub init_cache: usize,
  pub max_cache: usize,
  pub mode: Mode,
  pub auto_method: Method,
  /// enable background reordering when the live count exceeds next_dyn.
  pub auto_dyn: bool,
  pub next_dyn: usize,
  /// reordering budgets.
  pub sift_max_var: usize,
  pub sift_max_swap: usize,
  pub max_growth: f64,
  pub time_limit: Option<Duration>,
  /// expansion-choice knobs.
  pub davio_exist_factor: f64,
  pub choose_threshold: usize,
  pub choose_new_bound_factor: f64,
  pub choose_dav_bound_factor: f64,
  /// aggregation-check knobs (percentages).
  pub recomb: i32,
  pub arcviolation: u32,
  pub symmviolation: u32 }

impl Default for Conf {
  fn default()->Conf {
    Conf {
      max_nodes: 1<<24,
      init_cache: 1<<14,
      max_cache: 1<<22,
      mode: Mode::Sd,
      auto_method: Method::Sift,
      auto_dyn: false,
      next_dyn: 4096,
      sift_max_var: 1000,
      sift_max_swap: 2_000_000,
      max_growth: 1.2,
      time_limit: None,
      davio_exist_factor: 0.6,
      choose_threshold: 0,
      choose_new_bound_factor: 1.0,
      choose_dav_bound_factor: 0.95,
      recomb: 0,
      arcviolation: 0,
      symmviolation: 0 }}}


/// Finally, we put everything together. This is the top-level type for this crate.
pub struct BkfBase {
  /// the node arena. slots with v==NOV are free.
  pub(crate) vhls: Vec<Vhl>,
  /// free arena slots, reclaimed by sweeps.
  free: Vec<usize>,
  /// one unique-table row per level.
  pub(crate) rows: Vec<Row>,
  /// variable index -> level.
  pub(crate) perm: Vec<usize>,
  /// level -> variable index.
  pub(crate) invperm: Vec<usize>,
  /// projection-function edges, by variable index. rewritten in place by
  /// expansion changes; always fetch through var().
  pub(crate) vars: Vec<NID>,
  /// allows us to give user-friendly names to specific nodes in the base.
  /// named roots survive expansion rewrites (the canonicity fixup updates
  /// them in place), so long-lived handles belong here.
  pub tags: HashMap<String, NID>,
  pub(crate) memo: Memo,
  /// stored entries across all rows (live + dead).
  pub(crate) keys: usize,
  /// stored entries with rc==0.
  pub(crate) dead: usize,
  /// variables whose projection edge has rc exactly 1.
  pub(crate) isolated: usize,
  /// conservative pairwise interaction bitmap.
  interact: Vec<u64>,
  pub conf: Conf,
  /// most recent error kind.
  pub(crate) err: Option<Error>,
  /// set when an allocation failure struck in the middle of a rewrite:
  /// invariants are broken and the affected functions are unrecoverable.
  pub(crate) poisoned: bool,
  /// >0 while a rewrite is in progress: suppresses gc and auto-reordering.
  pub(crate) hold: u32,
  gc_trigger: usize,
  /// per-variable expansion/group records around a reorder, compared to
  /// assert group structure is preserved.
  pub(crate) oet1: Vec<Oet>,
  pub(crate) oet2: Vec<Oet>,
  /// swap budget + clock for the reorder in progress.
  pub(crate) swaps: usize,
  pub(crate) clock: Option<Instant>,
  /// cooperative termination callback, polled at sift boundaries.
  pub(crate) term: Option<Box<dyn Fn()->bool>> }

impl BkfBase {

  pub fn new(nvars:usize)->BkfBase {
    let conf = Conf::default();
    let mut base = BkfBase {
      vhls: vec![], free: vec![],
      rows: (0..nvars).map(|l| Row::new(Expn::CS, l)).collect(),
      perm: (0..nvars).collect(),
      invperm: (0..nvars).collect(),
      vars: vec![],
      tags: HashMap::new(),
      memo: Memo::new(conf.init_cache, conf.max_cache),
      keys: 0, dead: 0, isolated: 0,
      interact: vec![0; (nvars*nvars).div_ceil(64).max(1)],
      conf,
      err: None, poisoned: false, hold: 0, gc_trigger: 1<<12,
      oet1: vec![], oet2: vec![],
      swaps: 0, clock: None, term: None };
    for l in 0..nvars {
      let n = base.add_ref(l, HiLo::new(I, O)).expect("fresh manager over node limit");
      base.vars.push(n); }
    base.count_isolated();
    base }

  pub fn nvars(&self)->usize { self.rows.len() }

  /// the projection edge for a variable.
  pub fn var(&self, v:VID)->NID { self.vars[v.var_ix()] }

  /// total stored entries (live + dead).
  pub fn len(&self)->usize { self.keys }
  #[must_use] pub fn is_empty(&self)->bool { self.keys == 0 }

  /// the size metric used by reordering and expansion choice:
  /// stored minus dead minus isolated projections.
  pub fn live(&self)->usize { self.keys - self.dead - self.isolated }

  pub fn last_err(&self)->Option<Error> { self.err }

  /// cooperative cancellation for long reorders.
  pub fn set_terminator(&mut self, f:Option<Box<dyn Fn()->bool>>) { self.term = f }

  // -- levels and variables --------------------------------------------

  pub fn level_of_var(&self, v:VID)->usize { self.perm[v.var_ix()] }
  pub fn var_at(&self, lvl:usize)->VID { VID::var(self.invperm[lvl] as u32) }
  pub fn expn_at(&self, lvl:usize)->Expn { self.rows[lvl].expn }

  /// level of the node an edge refers to (CONST_LVL for O and I).
  pub fn level_of(&self, n:NID)->usize {
    if n.is_const() { CONST_LVL }
    else { self.perm[self.vhls[n.idx()].v.var_ix()] }}

  /// fetch the stored triple behind an edge (ignoring the edge's own mark).
  pub fn vhl(&self, n:NID)->Vhl {
    debug_assert!(!n.is_const(), "vhl() of a constant");
    let v = self.vhls[n.idx()];
    debug_assert!(!v.v.is_nov(), "vhl() of a freed slot");
    v }

  // -- find-or-insert --------------------------------------------------

  /// The unique-table operation: return the canonical edge for the given
  /// branch pair at the given level, creating a node only if none exists.
  /// Applies the reduction rule first (shannon: hi==lo, davio: hi==O), then
  /// the complement push-up, so the result always satisfies the canonicity
  /// invariants. The returned edge carries one fresh reference owned by the
  /// caller.
  pub(crate) fn add_ref(&mut self, lvl:usize, hl0:HiLo)->Result<NID> {
    let e = self.rows[lvl].expn;
    let reduced = if e.is_shannon() { hl0.hi == hl0.lo } else { hl0.hi == O };
    if reduced { self.nref(hl0.lo); return Ok(hl0.lo) }
    let (hl, inv) = hl0.norm(e);
    debug_assert!(!hl.lo.is_inv());
    debug_assert!(self.level_of(hl.hi) > lvl, "hi branch must point strictly down");
    debug_assert!(self.level_of(hl.lo) > lvl, "lo branch must point strictly down");
    if let Some(ixrc) = self.rows[lvl].hm.get_mut(&hl) {
      let ix = ixrc.ix;
      let resurrected = ixrc.rc == 0;
      if resurrected { ixrc.rc = 1 }
      else if ixrc.rc < RC_SAT { ixrc.rc += 1 }
      if resurrected { self.rows[lvl].dead -= 1; self.dead -= 1; }
      return Ok(ix.inv_if(inv)) }
    if self.keys >= self.conf.max_nodes {
      self.err = Some(Error::MemoryOut);
      return Err(Error::MemoryOut) }
    let slot = if let Some(s) = self.free.pop() { s }
      else { self.vhls.push(VHL_NOV); self.vhls.len()-1 };
    let v = self.var_at(lvl);
    self.vhls[slot] = Vhl::new(v, hl.hi, hl.lo);
    let n = NID::ixn(slot);
    self.rows[lvl].hm.insert(hl, IxRc{ ix:n, rc:1 });
    self.keys += 1;
    self.nref(hl.hi); self.nref(hl.lo);
    Ok(n.inv_if(inv)) }

  // -- reference counting ----------------------------------------------

  fn entry_lvl(&self, n:NID)->(usize, HiLo) {
    let node = self.vhls[n.idx()];
    debug_assert!(!node.v.is_nov(), "ref op on freed slot {}", n);
    (self.perm[node.v.var_ix()], node.hilo()) }

  /// add an external reference to an edge. no-op for constants and for
  /// nodes whose count has frozen at the saturation point.
  pub fn nref(&mut self, n:NID) {
    if n.is_const() { return }
    let (lvl, hl) = self.entry_lvl(n);
    let row = &mut self.rows[lvl];
    let ixrc = row.hm.get_mut(&hl).expect("nref: node not in its row");
    if ixrc.rc == 0 { row.dead -= 1; self.dead -= 1; }
    if ixrc.rc < RC_SAT { ixrc.rc += 1 }}

  /// drop a reference. the node is merely marked dead when the count hits
  /// zero; the next sweep reclaims it (and cascades into its children).
  pub fn nderef(&mut self, n:NID) {
    if n.is_const() { return }
    let (lvl, hl) = self.entry_lvl(n);
    let row = &mut self.rows[lvl];
    let ixrc = row.hm.get_mut(&hl).expect("nderef: node not in its row");
    if ixrc.rc == RC_SAT { return } // frozen
    debug_assert!(ixrc.rc > 0, "nderef would underflow on {}", n);
    ixrc.rc -= 1;
    if ixrc.rc == 0 { row.dead += 1; self.dead += 1; }}

  pub(crate) fn rc_of(&self, n:NID)->u16 {
    if n.is_const() { return RC_SAT }
    let (lvl, hl) = self.entry_lvl(n);
    self.rows[lvl].hm.get(&hl).expect("rc_of: node not in its row").rc }

  // -- garbage collection ----------------------------------------------

  /// sweep every row, reclaiming dead nodes. returns how many were freed.
  pub fn gc(&mut self)->usize { self.sweep_from(0) }

  /// sweep rows at the given level and below. children point strictly
  /// downward, so one top-down pass catches every cascade.
  pub(crate) fn sweep_from(&mut self, lvl:usize)->usize {
    let mut freed = 0;
    for l in lvl..self.nvars() {
      let mut dead_ixs:Vec<usize> = vec![];
      let row = &mut self.rows[l];
      if row.dead == 0 { continue }
      row.hm.retain(|_, ixrc| if ixrc.rc == 0 { dead_ixs.push(ixrc.ix.idx()); false }
                              else { true });
      row.dead = 0;
      for ix in dead_ixs {
        let node = self.vhls[ix];
        self.vhls[ix] = VHL_NOV;
        self.free.push(ix);
        self.keys -= 1; self.dead -= 1; freed += 1;
        self.nderef(node.hi); self.nderef(node.lo); }}
    self.count_isolated();
    if freed > 0 { self.memo.wipe() }
    trace!("sweep_from({}) freed {}", lvl, freed);
    freed }

  /// a projection is isolated when nothing refers to it beyond the vars[]
  /// handle and other projections' own nodes. (under biconditional codes a
  /// projection necessarily cites the variable paired with it, and that
  /// reference must not make the cited projection look load-bearing.)
  pub(crate) fn isolated_count(&self)->usize {
    let mut proj_refs:BkHashMap<u64, u16> = BkHashMap::default();
    let pset:BkHashMap<u64, ()> = self.vars.iter().map(|v| (v.raw().u(), ())).collect();
    for &v in self.vars.iter() {
      let node = self.vhls[v.idx()];
      for c in [node.hi, node.lo] {
        if !c.is_const() && pset.contains_key(&c.raw().u()) {
          *proj_refs.entry(c.raw().u()).or_insert(0) += 1 }}}
    self.vars.iter()
      .filter(|&&v| self.rc_of(v) == 1 + proj_refs.get(&v.raw().u()).copied().unwrap_or(0))
      .count() }

  pub(crate) fn count_isolated(&mut self) { self.isolated = self.isolated_count() }

  /// number of nodes in the diagram reachable from an edge.
  pub fn node_count(&self, n:NID)->usize {
    let mut seen:BkHashMap<u64, ()> = BkHashMap::default();
    let mut stack = vec![n.raw()];
    while let Some(x) = stack.pop() {
      if x.is_const() || seen.contains_key(&x.u()) { continue }
      seen.insert(x.u(), ());
      let node = self.vhls[x.idx()];
      stack.push(node.hi.raw());
      stack.push(node.lo.raw()); }
    seen.len() }

  /// housekeeping at public-operator entry: possibly collect garbage,
  /// possibly kick off background reordering. never runs while a rewrite
  /// holds the manager.
  pub(crate) fn tidy(&mut self)->Result<()> {
    if self.hold > 0 { return Ok(()) }
    if self.keys > self.gc_trigger {
      self.gc();
      self.gc_trigger = (self.keys * 2).max(1<<12); }
    if self.conf.auto_dyn && self.live() > self.conf.next_dyn {
      let m = self.conf.auto_method;
      debug!("auto reorder ({:?}) at {} live nodes", m, self.live());
      self.reorder(m)?;
      self.conf.next_dyn = (self.live() * 2).max(self.conf.next_dyn); }
    Ok(()) }

  // -- expansion-aware cofactors ---------------------------------------

  /// The two cofactors of edge f with respect to the branch condition at
  /// level `lvl` (f must not branch above `lvl`). For shannon levels the
  /// result is (f at g=1, f at g=0); for davio levels it is
  /// (difference, base). Returned edges are borrowed: no refcount change.
  pub(crate) fn cofs(&self, lvl:usize, f:NID)->(NID, NID) {
    debug_assert!(self.level_of(f) >= lvl);
    let shannon = self.rows[lvl].expn.is_shannon();
    if self.level_of(f) == lvl {
      let node = self.vhls[f.idx()]; let m = f.is_inv();
      if shannon { (node.hi.inv_if(m), node.lo.inv_if(m)) }
      else { (node.hi, node.lo.inv_if(m)) }}
    else if shannon { (f, f) }
    else { (O, f) }}

  // -- evaluation and counting -----------------------------------------

  /// evaluate an edge under an input assignment. read-only.
  pub fn eval(&self, f:NID, reg:&Reg)->bool {
    let mut memo:BkHashMap<u64,bool> = BkHashMap::default();
    self.eval_aux(f, reg, &mut memo) }

  fn eval_aux(&self, f:NID, reg:&Reg, memo:&mut BkHashMap<u64,bool>)->bool {
    if f.is_const() { return f == I }
    let raw = f.raw();
    let r = if let Some(&b) = memo.get(&raw.u()) { b } else {
      let node = self.vhls[raw.idx()];
      let lvl = self.perm[node.v.var_ix()];
      let e = self.rows[lvl].expn;
      let x = reg.var_get(node.v);
      let g = if e.is_bicond() { x == reg.var_get(self.var_at(lvl+1)) } else { x };
      let b = match e.letter() {
        crate::expn::Letter::S =>
          if g { self.eval_aux(node.hi, reg, memo) } else { self.eval_aux(node.lo, reg, memo) },
        crate::expn::Letter::ND =>
          self.eval_aux(node.lo, reg, memo) ^ (!g && self.eval_aux(node.hi, reg, memo)),
        crate::expn::Letter::PD =>
          self.eval_aux(node.lo, reg, memo) ^ (g && self.eval_aux(node.hi, reg, memo)) };
      memo.insert(raw.u(), b);
      b };
    r ^ f.is_inv() }

  /// number of satisfying assignments over all declared variables.
  /// davio and biconditional levels need materialized cofactors, so this
  /// can create (and then release) scratch nodes.
  pub fn solution_count(&mut self, f:NID)->Result<u64> {
    assert!(self.nvars() <= 63, "solution_count only works for <= 63 vars");
    self.hold += 1;
    let mut memo:BkHashMap<u64,u64> = BkHashMap::default();
    let r = self.sc_edge(f, 0, &mut memo);
    self.hold -= 1;
    // the davio paths leave dead scratch nodes behind; reclaim them so the
    // counters (and anything watching live()) settle.
    self.sweep_from(0);
    r }

  fn sc_edge(&mut self, f:NID, lvl:usize, memo:&mut BkHashMap<u64,u64>)->Result<u64> {
    let n = self.nvars();
    if f.is_const() { return Ok(if f == I { 1u64 << (n-lvl) } else { 0 }) }
    let fl = self.level_of(f);
    debug_assert!(fl >= lvl);
    let below = 1u64 << (n-fl);
    let at_node = if let Some(&c) = memo.get(&f.raw().u()) { c }
      else { let c = self.sc_node(f.raw(), fl, memo)?; memo.insert(f.raw().u(), c); c };
    let here = if f.is_inv() { below - at_node } else { at_node };
    Ok(here << (fl - lvl)) }

  fn sc_node(&mut self, f:NID, fl:usize, memo:&mut BkHashMap<u64,u64>)->Result<u64> {
    // count the two branch-condition cofactors; each condition value
    // corresponds to exactly one value of the level's own variable, even
    // for biconditional levels.
    let (hi, lo) = self.cofs(fl, f);
    let (c1, c0) = if self.rows[fl].expn.is_shannon() {
      (self.sc_edge(hi, fl+1, memo)?, self.sc_edge(lo, fl+1, memo)?) }
    else {
      let other = self.xor_inner(lo, hi)?;
      let a = self.sc_edge(lo, fl+1, memo)?;
      let b = self.sc_edge(other, fl+1, memo);
      self.nderef(other);
      (a, b?) };
    Ok(c1 + c0) }

  /// variables an edge depends on (through branch conditions, so a
  /// biconditional level contributes the paired variable too).
  pub fn support(&self, f:NID)->Vec<VID> {
    let mut seen:BkHashMap<u64,()> = BkHashMap::default();
    let mut vset:BkHashMap<usize,()> = BkHashMap::default();
    let mut stack = vec![f.raw()];
    while let Some(n) = stack.pop() {
      if n.is_const() || seen.contains_key(&n.u()) { continue }
      seen.insert(n.u(), ());
      let node = self.vhls[n.idx()];
      let lvl = self.perm[node.v.var_ix()];
      vset.insert(node.v.var_ix(), ());
      if self.rows[lvl].expn.is_bicond() { vset.insert(self.invperm[lvl+1], ()); }
      stack.push(node.hi.raw());
      stack.push(node.lo.raw()); }
    let mut vs:Vec<usize> = vset.keys().cloned().collect();
    vs.sort_unstable();
    vs.into_iter().map(|i| VID::var(i as u32)).collect() }

  // -- interaction matrix ----------------------------------------------

  fn interact_bit(&self, i:usize, j:usize)->usize {
    let (a, b) = if i < j { (i, j) } else { (j, i) };
    a * self.nvars() + b }

  pub(crate) fn interact(&self, i:usize, j:usize)->bool {
    if i == j { return true }
    let bit = self.interact_bit(i, j);
    self.interact[bit/64] & (1 << (bit%64)) != 0 }

  fn set_interact(&mut self, i:usize, j:usize) {
    if i == j { return }
    let bit = self.interact_bit(i, j);
    self.interact[bit/64] |= 1 << (bit%64); }

  /// rebuild the pairwise interaction bitmap from the external roots
  /// (tagged functions and projections). conservative: a clear bit proves
  /// the two variables never share a function.
  pub(crate) fn build_interact(&mut self) {
    for w in self.interact.iter_mut() { *w = 0 }
    let roots:Vec<NID> = self.tags.values().cloned().collect();
    for r in roots {
      let s = self.support(r);
      for (i, &a) in s.iter().enumerate() {
        for &b in s.iter().skip(i+1) { self.set_interact(a.var_ix(), b.var_ix()) }}}}

  // -- tags -------------------------------------------------------------

  /// name a root. the registry owns one reference, and the canonicity
  /// fixup rewrites registered edges in place, so a tagged root stays
  /// valid across expansion changes and reorders.
  pub fn tag(&mut self, n:NID, s:String)->NID {
    self.nref(n);
    if let Some(old) = self.tags.insert(s, n) { self.nderef(old) }
    n }

  pub fn get(&self, s:&str)->Option<NID> { Some(*self.tags.get(s)?) }

  pub fn untag(&mut self, s:&str) {
    if let Some(old) = self.tags.remove(s) { self.nderef(old) }}

  // -- stats and debugging ---------------------------------------------

  /// (cache tests, cache hits)
  pub fn get_stats(&self)->(u64, u64) { (self.memo.tests, self.memo.hits) }

  pub fn print_stats(&self) {
    let (tests, hits) = self.get_stats();
    println!("Cache stats: {hits} hits / {tests} tests ({:.1}%).",
      (hits as f64/tests as f64) * 100.0);
    println!("Nodes: {} stored, {} dead, {} isolated.", self.keys, self.dead, self.isolated); }

  pub fn dump(&self, msg:&str) {
    println!("@dump: {}", msg);
    println!("$order: {:?}", self.invperm);
    for l in 0..self.nvars() {
      let row = &self.rows[l];
      println!("^{:03} {} {:?} keys:{} dead:{}", l, self.var_at(l), row.expn, row.keys(), row.dead);
      let mut entries:Vec<_> = row.hm.iter().collect();
      entries.sort_by_key(|(_, ixrc)| ixrc.ix.idx());
      for (hl, ixrc) in entries {
        println!("   {:?} hi:{:?} lo:{:?} rc:{}", ixrc.ix, hl.hi, hl.lo, ixrc.rc) }}
    println!("@/dump") }

  /// panic (with a dump) if the structure is broken. (this is for debugging)
  pub fn validate(&self, msg:&str) {
    if let Err(e) = self.is_valid() {
      self.dump(msg);
      panic!("validation failed: {}", e) }}

  /// run the structural check, recording Internal on failure. a manager
  /// poisoned by a mid-rewrite allocation failure always reports
  /// inconsistent (while last_err keeps the original MemoryOut).
  pub fn debug_check(&mut self)->Result<()> {
    if let Err(e) = self.is_valid() {
      warn!("debug_check: {}", e);
      self.err = Some(Error::Internal);
      Err(Error::Internal) }
    else if self.poisoned { Err(Error::Internal) }
    else { Ok(()) }}

  /// validate that the manager is well formed.
  pub fn is_valid(&self)->std::result::Result<(), String> {
    let n = self.nvars();
    // perm and invperm must be mutual inverses.
    for i in 0..n {
      if self.invperm[self.perm[i]] != i { return Err(format!("perm/invperm disagree at var {}", i)) }}
    // the bottom level's expansion must be classical.
    if n > 0 && !self.rows[n-1].expn.is_classical() {
      return Err(format!("biconditional expansion {:?} on the bottom level", self.rows[n-1].expn)) }
    let mut keys = 0; let mut dead = 0;
    let mut rc:BkHashMap<u64,usize> = BkHashMap::default();
    for l in 0..n {
      let row = &self.rows[l];
      if row.expn.is_bicond() && l+1 >= n { return Err("biconditional row with no row below".to_string()) }
      let mut row_dead = 0;
      for (hl, ixrc) in row.hm.iter() {
        let ix = ixrc.ix;
        let node = self.vhls[ix.idx()];
        if node.v.is_nov() { return Err(format!("row {} entry {:?} points at a freed slot", l, ix)) }
        if node.v != self.var_at(l) { return Err(format!("node {:?} stored in row {} but branches on {}", ix, l, node.v)) }
        if node.hilo() != *hl { return Err(format!("row {} key {:?} disagrees with arena {:?}", l, hl, node)) }
        for c in [hl.hi, hl.lo] {
          if !c.is_const() && self.vhls[c.raw().idx()].v.is_nov() {
            return Err(format!("branch of {:?} points at freed slot {:?}", ix, c)) }}
        if hl.lo.is_inv() { return Err(format!("inverted lo branch on {:?} in row {}", ix, l)) }
        if row.expn.is_shannon() { if hl.hi == hl.lo { return Err(format!("unmerged shannon branches on {:?}", ix)) }}
        else if hl.hi == O { return Err(format!("redundant davio node {:?} (hi == O)", ix)) }
        if self.level_of(hl.hi) <= l { return Err(format!("upward hi branch on {:?}", ix)) }
        if self.level_of(hl.lo) <= l { return Err(format!("upward lo branch on {:?}", ix)) }
        if ixrc.rc == 0 { row_dead += 1 }
        *rc.entry(hl.hi.raw().u()).or_insert(0) += 1;
        *rc.entry(hl.lo.raw().u()).or_insert(0) += 1;
        keys += 1 }
      if row_dead != row.dead { return Err(format!("row {} dead count {} != {}", l, row.dead, row_dead)) }
      dead += row_dead }
    if keys != self.keys { return Err(format!("keys counter {} != stored {}", self.keys, keys)) }
    if dead != self.dead { return Err(format!("dead counter {} != counted {}", self.dead, dead)) }
    // every node must carry at least as many refs as it has in-edges.
    for l in 0..n {
      for ixrc in self.rows[l].hm.values() {
        let have = ixrc.rc as usize;
        let need = *rc.get(&ixrc.ix.u()).unwrap_or(&0);
        if have != RC_SAT as usize && have < need {
          return Err(format!("refcount too low for {:?}: have {}, need at least {}", ixrc.ix, have, need)) }}}
    // isolated-projection counter.
    let iso = self.isolated_count();
    if iso != self.isolated { return Err(format!("isolated counter {} != counted {}", self.isolated, iso)) }
    Ok(()) }}


include!("test-bkf.rs");
