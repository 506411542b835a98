//! Computed-table cache: a bounded, direct-mapped, lossy memo for operator
//! results. Keys are normalized ite triples (ite is the one fundamental
//! operator; the named operators are wrappers that build ite forms), so no
//! separate op tag is needed. Entries are overwritten on collision, and the
//! whole table is wiped whenever the variable order changes or nodes are
//! freed that may appear as keys or values.
use crate::nid::{NID, O};

#[derive(Clone, Copy)]
struct Ent { f:NID, g:NID, h:NID, r:NID }

/// a normalized ite key never has a constant first slot, so f==O marks
/// an empty entry.
const EMPTY:Ent = Ent { f:O, g:O, h:O, r:O };

pub struct Memo {
  tab: Vec<Ent>,
  mask: usize,
  /// total lookups / hits, also exposed through get_stats().
  pub tests: u64,
  pub hits: u64,
  /// grow the table when hits outnumber misses by this factor.
  min_hit: u64,
  max_slots: usize }

impl Memo {

  pub fn new(slots:usize, max_slots:usize)->Memo {
    assert!(slots.is_power_of_two(), "cache size must be a power of two");
    Memo { tab: vec![EMPTY; slots], mask: slots-1, tests:0, hits:0, min_hit:4, max_slots }}

  #[inline] fn ix(&self, f:NID, g:NID, h:NID)->usize {
    fxhash::hash64(&(f.u(), g.u(), h.u())) as usize & self.mask }

  /// probe for a previously computed result. the caller is responsible for
  /// resurrecting the returned node if it has gone dead in the meantime
  /// (the inner lookup variant in the manager asserts that it hasn't).
  pub fn get(&mut self, f:NID, g:NID, h:NID)->Option<NID> {
    self.tests += 1;
    let e = self.tab[self.ix(f,g,h)];
    if e.f == f && e.g == g && e.h == h { self.hits += 1; Some(e.r) }
    else { self.maybe_grow(); None }}

  /// store a result, overwriting whatever shared the slot.
  pub fn put(&mut self, f:NID, g:NID, h:NID, r:NID) {
    let ix = self.ix(f,g,h);
    self.tab[ix] = Ent { f, g, h, r }}

  /// forget everything, keeping the current table size.
  pub fn wipe(&mut self) { for e in self.tab.iter_mut() { *e = EMPTY }}

  pub fn len(&self)->usize { self.tab.len() }
  pub fn is_empty(&self)->bool { self.tab.is_empty() }

  /// double the table when it is earning its keep and there is room.
  fn maybe_grow(&mut self) {
    let misses = self.tests - self.hits;
    if self.tab.len() >= self.max_slots { return }
    if self.hits <= misses * self.min_hit { return }
    let new_len = self.tab.len()*2;
    let old = std::mem::replace(&mut self.tab, vec![EMPTY; new_len]);
    self.mask = self.tab.len()-1;
    for e in old { if e.f != O { let ix = self.ix(e.f, e.g, e.h); self.tab[ix] = e }}}}


#[test] fn test_memo() {
  let (a, b, c, r) = (NID::ixn(1), NID::ixn(2), NID::ixn(3), NID::ixn(4));
  let mut m = Memo::new(64, 1<<20);
  assert_eq!(m.get(a,b,c), None);
  m.put(a,b,c,r);
  assert_eq!(m.get(a,b,c), Some(r));
  assert_eq!(m.get(b,a,c), None, "different key should miss");
  m.wipe();
  assert_eq!(m.get(a,b,c), None, "wipe should forget");
  assert_eq!(m.tests, 4);
  assert_eq!(m.hits, 1) }

#[test] fn test_memo_lossy() {
  // with a single slot, every put lands on the same entry.
  let (a, b, r1, r2) = (NID::ixn(1), NID::ixn(2), NID::ixn(3), NID::ixn(4));
  let mut m = Memo::new(1, 1);
  m.put(a,a,a,r1);
  m.put(b,b,b,r2);
  assert_eq!(m.get(a,a,a), None, "collision should have evicted the first entry");
  assert_eq!(m.get(b,b,b), Some(r2)) }
