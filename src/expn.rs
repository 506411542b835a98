//! Expansion (decomposition) type codes, one per diagram level.
//!
//! The first letter says whether the level branches on its own variable x
//! (Classical) or on the biconditional `x == y` with y the variable one level
//! down (Biconditional). The second part names the algebra: Shannon,
//! negative Davio, or positive Davio. Writing g for the branch condition
//! (x itself, or `x==y`), a node (hi, lo) at the level denotes:
//!
//! ```text
//!    CS / BS :  f = if g { hi } else { lo }
//!    CND / BND: f = lo xor (!g and hi)     (lo = f at g=1, hi = difference)
//!    CPD / BPD: f = lo xor ( g and hi)     (lo = f at g=0, hi = difference)
//! ```
//!
//! Uniformly, `lo` is the branch the reduction rule collapses to (Shannon:
//! hi==lo, Davio: hi==O) and `hi` carries the Shannon hi-cofactor or the
//! Davio difference function.
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Letter { S, ND, PD }

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expn { CS, CND, CPD, BS, BND, BPD }
use self::Expn::*;

/// All six codes, in trial order for the choice heuristics.
pub const ALL:[Expn;6] = [CS, CND, CPD, BS, BND, BPD];

impl Expn {
  pub fn is_classical(&self)->bool { matches!(self, CS|CND|CPD) }
  pub fn is_bicond(&self)->bool { !self.is_classical() }
  pub fn is_shannon(&self)->bool { matches!(self, CS|BS) }
  pub fn is_davio(&self)->bool { !self.is_shannon() }
  pub fn letter(&self)->Letter {
    match self {
      CS|BS => Letter::S,
      CND|BND => Letter::ND,
      CPD|BPD => Letter::PD }}

  /// the classical code with the same letter.
  pub fn classical(&self)->Expn {
    match self { BS => CS, BND => CND, BPD => CPD, e => *e }}

  /// the biconditional code with the same letter.
  pub fn bicond(&self)->Expn {
    match self { CS => BS, CND => BND, CPD => BPD, e => *e }}

  /// same class (classical/biconditional), different letter.
  pub fn with_letter(&self, l:Letter)->Expn {
    let c = match l { Letter::S => CS, Letter::ND => CND, Letter::PD => CPD };
    if self.is_classical() { c } else { c.bicond() }}

  /// does the branch condition come negated? (negative Davio tests !g)
  pub fn neg_factor(&self)->bool { matches!(self, CND|BND) }}

impl fmt::Display for Expn {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let s = match self { CS=>"CS", CND=>"CND", CPD=>"CPD", BS=>"BS", BND=>"BND", BPD=>"BPD" };
    write!(f, "{}", s) }}

impl fmt::Debug for Expn {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{}", self) }}


#[test] fn test_expn_classes() {
  assert!(CS.is_classical() && CND.is_classical() && CPD.is_classical());
  assert!(BS.is_bicond() && BND.is_bicond() && BPD.is_bicond());
  assert!(CS.is_shannon() && BS.is_shannon());
  assert!(CND.is_davio() && BPD.is_davio());
  assert_eq!(BND.classical(), CND);
  assert_eq!(CPD.bicond(), BPD);
  assert_eq!(CS.bicond().classical(), CS) }

#[test] fn test_expn_letters() {
  assert_eq!(CS.letter(), Letter::S);
  assert_eq!(BND.letter(), Letter::ND);
  assert_eq!(CS.with_letter(Letter::PD), CPD);
  assert_eq!(BS.with_letter(Letter::ND), BND);
  assert!(CND.neg_factor() && BND.neg_factor());
  assert!(!CPD.neg_factor() && !CS.neg_factor()) }
