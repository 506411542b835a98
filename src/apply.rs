//! Recursive boolean operators.
//!
//! `ite` is the one fundamental operator; `and`, `or` and `xor` are wrappers
//! that build their canonical ite forms, and `not` is just the edge mark.
//! Each triple is first rewritten into Bryant's normal form, then looked up
//! in the computed cache, then cofactored per the expansion type at the top
//! level of its operands.
use crate::nid::{NID, I, O};
use crate::vhl::HiLo;
use crate::bkf::{BkfBase, CONST_LVL};
use crate::expn::Letter;
use crate::err::Result;

/// An if/then/else triple.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone, Copy)]
pub struct ITE { pub i:NID, pub t:NID, pub e:NID }
impl ITE {
  /// shorthand constructor
  pub fn new(i:NID, t:NID, e:NID)->ITE { ITE { i, t, e } }}

/// This represents the result of normalizing an ITE. There are three conditions:
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Norm {
  /// used when the triple simplifies to a single NID.
  Nid(NID),
  /// a normalized ITE.
  Ite(ITE),
  /// a normalized, inverted ITE.
  Not(ITE) }


impl BkfBase {

  /// ordering of operands for normalization: above-first, then by raw bits.
  /// level-based (not variable-based) so the normal form survives reorders.
  fn before(&self, a:NID, b:NID)->bool {
    let (la, lb) = (self.level_of(a), self.level_of(b));
    la < lb || (la == lb && a.raw().u() < b.raw().u()) }

  /// choose normal form for writing this triple. Algorithm based on:
  /// "Efficient Implementation of a BDD Package"
  /// <http://www.cs.cmu.edu/~emc/15817-f08/bryant-bdd-1991.pdf>
  /// The rewrite identities are pure boolean algebra, so they hold for
  /// every expansion type; only the tie-breaking order is ours.
  pub(crate) fn norm_ite(&self, f0:NID, g0:NID, h0:NID)->Norm {
    let mut f = f0; let mut g = g0; let mut h = h0;
    loop {
      if f.is_const() { return Norm::Nid(if f == I { g } else { h }) }  // (I/O, _, _)
      if g == h { return Norm::Nid(g) }                                 // (_, g, g)
      if g == f { if h.is_const() {
                  return Norm::Nid(if h == I { I } else { f }) }        // (f, f, I/O)
                  else { g = I }}
      else if g.is_const() && h.is_const() { // both const, and we know g != h
        return if g == I { Norm::Nid(f) } else { Norm::Nid(!f) }}
      else {
        let nf = !f;
        if      g == nf { g = O }
        else if h == nf { h = I }
        else if h == f  { h = O }
        else {
          macro_rules! cmp { ($x:expr) => {{ self.before($x, f) }}}
          if g.is_const() && cmp!(h) {
            if g == I { g = f;  f = h;  h = g;  g = I; }
            else      { f = !h; g = O;  h = nf; }}
          else if h.is_const() && cmp!(g) {
            if h == I { f = !g; g = nf; h = I; }
            else      { h = f;  f = g;  g = h;  h = O; }}
          else {
            let ng = !g;
            if (h == ng) && cmp!(g) { h = f; f = g; g = h; h = nf; }
            // choose form where first 2 slots are NOT inverted:
            // from { (f,g,h), (¬f,h,g), ¬(f,¬g,¬h), ¬(¬f,¬g,¬h) }
            else if f.is_inv() { f = g; g = h; h = f; f = nf; }
            else if g.is_inv() { return match self.norm_ite(f, ng, !h) {
              Norm::Nid(nid) => Norm::Nid(!nid),
              Norm::Not(ite) => Norm::Ite(ite),
              Norm::Ite(ite) => Norm::Not(ite) }}
            else { return Norm::Ite(ITE::new(f, g, h)) }}}}}}

  // -- public operators -------------------------------------------------

  /// all-purpose node creation/lookup. the returned edge carries one
  /// reference owned by the caller (release it with nderef).
  pub fn ite(&mut self, f:NID, g:NID, h:NID)->Result<NID> {
    self.tidy()?; self.ite_inner(f, g, h) }

  pub fn and(&mut self, x:NID, y:NID)->Result<NID> { self.tidy()?; self.ite_inner(x, y, O) }
  pub fn or(&mut self, x:NID, y:NID)->Result<NID> { self.tidy()?; self.ite_inner(x, I, y) }
  pub fn xor(&mut self, x:NID, y:NID)->Result<NID> { self.tidy()?; self.ite_inner(x, !y, y) }

  // -- inner variants ---------------------------------------------------
  // used during rewrites, when invariants are transiently broken: these
  // never trigger gc or automatic reordering.

  pub(crate) fn ite_inner(&mut self, f:NID, g:NID, h:NID)->Result<NID> {
    match self.norm_ite(f, g, h) {
      Norm::Nid(n) => { self.nref(n); Ok(n) }
      Norm::Ite(k) => self.ite_k(k),
      Norm::Not(k) => Ok(!(self.ite_k(k)?)) }}

  pub(crate) fn and_inner(&mut self, x:NID, y:NID)->Result<NID> { self.ite_inner(x, y, O) }
  pub(crate) fn xor_inner(&mut self, x:NID, y:NID)->Result<NID> { self.ite_inner(x, !y, y) }

  /// the recursive worker, on an already-normalized triple.
  fn ite_k(&mut self, k:ITE)->Result<NID> {
    if let Some(r) = self.memo.get(k.i, k.t, k.e) {
      // an outer call may find an entry whose result node has since died;
      // nref resurrects it. inner callers guarantee no dead entries exist.
      debug_assert!(self.hold == 0 || r.is_const() || self.rc_of(r) > 0,
                    "inner cache hit on a dead node");
      self.nref(r);
      return Ok(r) }
    let top = self.level_of(k.i).min(self.level_of(k.t)).min(self.level_of(k.e));
    debug_assert!(top != CONST_LVL, "normalized ite with all-constant operands");
    // temps owned so far; released together on success or failure.
    let mut temps:Vec<NID> = vec![];
    macro_rules! step { ($e:expr) => {
      match $e {
        Ok(x) => { temps.push(x); x }
        Err(er) => { for t in temps { self.nderef(t) } return Err(er) }}}}
    let hl = if self.rows[top].expn.letter() == Letter::S {
      let (ih, il) = self.cofs(top, k.i);
      let (th, tl) = self.cofs(top, k.t);
      let (eh, el) = self.cofs(top, k.e);
      let rh = step!(self.ite_inner(ih, th, eh));
      let rl = step!(self.ite_inner(il, tl, el));
      HiLo::new(rh, rl) }
    else {
      // davio level: cofs yields (difference, base). materialize each
      // operand's other cofactor (base xor difference), recurse on both
      // condition values, and rebuild (difference, base) for the result.
      let (id, ib) = self.cofs(top, k.i);
      let (td, tb) = self.cofs(top, k.t);
      let (ed, eb) = self.cofs(top, k.e);
      let i1 = step!(self.xor_inner(ib, id));
      let t1 = step!(self.xor_inner(tb, td));
      let e1 = step!(self.xor_inner(eb, ed));
      let rb = step!(self.ite_inner(ib, tb, eb));
      let r1 = step!(self.ite_inner(i1, t1, e1));
      let rd = step!(self.xor_inner(rb, r1));
      HiLo::new(rd, rb) };
    let r = match self.add_ref(top, hl) {
      Ok(r) => r,
      Err(er) => { for t in temps { self.nderef(t) } return Err(er) }};
    for t in temps { self.nderef(t) }
    self.memo.put(k.i, k.t, k.e, r);
    Ok(r) }}
