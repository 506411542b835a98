//! Boolean-network input: build diagram roots from per-node records of the
//! form (name, kind, fanin names, sum-of-products lines, polarity).
//!
//! Cube lines are strings over {'0','1','-'} with one column per fanin;
//! lines are OR-ed together, columns within a line AND-ed. Two shapes get
//! recognized and built directly instead of cube by cube: a pure
//! XOR-of-all-inputs (up to 3 inputs) and the 3-input 2-to-1 mux.
use std::collections::HashMap;
use crate::nid::{NID, I, O};
use crate::vid::VID;
use crate::bkf::BkfBase;
use crate::err::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind { Input, LatchInput, Internal, Constant, Output }

#[derive(Debug, Clone)]
pub struct NetNode {
  pub name: String,
  pub kind: Kind,
  pub fanins: Vec<String>,
  pub cubes: Vec<String>,
  /// false means the cover describes the complement.
  pub polarity: bool }

/// truth table of a cover over up to 3 fanins, one bit per input row.
fn cover_tt(nins:usize, cubes:&[String])->Option<u8> {
  if nins == 0 || nins > 3 { return None }
  let mut tt = 0u8;
  for r in 0..(1usize << nins) {
    let on = cubes.iter().any(|cube| {
      cube.len() == nins && cube.chars().enumerate().all(|(i, c)| {
        let bit = (r >> i) & 1 == 1;
        match c { '1' => bit, '0' => !bit, _ => c == '-' }})});
    if on { tt |= 1 << r }}
  Some(tt) }

/// does the table compute xor of all inputs?
fn is_xor(nins:usize, tt:u8)->bool {
  (0..(1u8 << nins)).all(|r| ((tt >> r) & 1 == 1) == (r.count_ones() & 1 == 1)) }

/// detect f = if s { a } else { b } over three inputs; returns the column
/// indices (s, a, b).
fn is_mux(tt:u8)->Option<(usize, usize, usize)> {
  for s in 0..3usize {
    let rest:Vec<usize> = (0..3).filter(|&i| i != s).collect();
    for (a, b) in [(rest[0], rest[1]), (rest[1], rest[0])] {
      let ok = (0..8u8).all(|r| {
        let pick = if (r >> s) & 1 == 1 { a } else { b };
        ((tt >> r) & 1 == 1) == ((r >> pick) & 1 == 1) });
      if ok { return Some((s, a, b)) }}}
  None }

/// build one cover over already-built fanin edges. the result carries one
/// owned reference.
fn build_cover(base:&mut BkfBase, fi:&[NID], cubes:&[String])->Result<NID> {
  if let Some(tt) = cover_tt(fi.len(), cubes) {
    if is_xor(fi.len(), tt) {
      debug!("cover is a {}-input xor", fi.len());
      let mut acc = fi[0];
      base.nref(acc);
      for &x in &fi[1..] {
        let nx = match base.xor(acc, x) {
          Ok(n) => n, Err(e) => { base.nderef(acc); return Err(e) }};
        base.nderef(acc);
        acc = nx }
      return Ok(acc) }
    if fi.len() == 3 {
      if let Some((s, a, b)) = is_mux(tt) {
        debug!("cover is a 2-to-1 mux (select column {})", s);
        return base.ite(fi[s], fi[a], fi[b]) }}}
  let mut sum = O;
  for cube in cubes {
    let mut prod = I;
    for (i, c) in cube.chars().enumerate() {
      let lit = match c { '1' => fi[i], '0' => !fi[i], _ => continue };
      let np = match base.and(prod, lit) {
        Ok(n) => n, Err(e) => { base.nderef(prod); base.nderef(sum); return Err(e) }};
      base.nderef(prod);
      prod = np }
    let ns = match base.or(sum, prod) {
      Ok(n) => n, Err(e) => { base.nderef(prod); base.nderef(sum); return Err(e) }};
    base.nderef(sum); base.nderef(prod);
    sum = ns }
  Ok(sum) }

/// Build every node of a network in order. Inputs (and latch inputs) bind
/// to the manager's variables in the order they appear; outputs are tagged
/// under their names (and the returned map holds them). Internal signals
/// are released before returning.
pub fn build(base:&mut BkfBase, nodes:&[NetNode])->Result<HashMap<String, NID>> {
  let mut sigs:HashMap<String, NID> = HashMap::new();
  let mut owned:Vec<NID> = vec![];
  let mut outs:HashMap<String, NID> = HashMap::new();
  let mut next_var = 0usize;
  for nd in nodes {
    let n = match nd.kind {
      Kind::Input | Kind::LatchInput => {
        assert!(next_var < base.nvars(), "network has more inputs than the manager has variables");
        let v = base.var(VID::var(next_var as u32));
        next_var += 1;
        v }
      Kind::Constant => if nd.cubes.is_empty() { O } else { I },
      Kind::Internal | Kind::Output => {
        let fi:Vec<NID> = nd.fanins.iter()
          .map(|f| *sigs.get(f).unwrap_or_else(|| panic!("undefined fanin {} of {}", f, nd.name)))
          .collect();
        let f = build_cover(base, &fi, &nd.cubes)?;
        owned.push(f);
        f }};
    let n = if nd.polarity { n } else { !n };
    if nd.kind == Kind::Output {
      base.tag(n, nd.name.clone());
      outs.insert(nd.name.clone(), n); }
    sigs.insert(nd.name.clone(), n); }
  for n in owned { base.nderef(n) }
  base.gc();
  Ok(outs) }


#[cfg(test)] mod net_tests {
  use super::*;
  use crate::vid::named::*;
  use crate::reg::Reg;

  fn node(name:&str, kind:Kind, fanins:&[&str], cubes:&[&str])->NetNode {
    NetNode { name: name.to_string(), kind,
      fanins: fanins.iter().map(|s| s.to_string()).collect(),
      cubes: cubes.iter().map(|s| s.to_string()).collect(),
      polarity: true }}

  #[test] fn test_build_sop() {
    let mut base = BkfBase::new(3);
    let net = vec![
      node("a", Kind::Input, &[], &[]),
      node("b", Kind::Input, &[], &[]),
      node("c", Kind::Input, &[], &[]),
      // f = a&b | !c
      node("f", Kind::Output, &["a","b","c"], &["11-", "--0"]) ];
    let outs = build(&mut base, &net).unwrap();
    let f = outs["f"];
    let mut reg = Reg::new(3);
    for i in 0..8usize {
      for b in 0..3 { reg.put(b, (i >> b) & 1 == 1) }
      let expect = ((i & 1 == 1) && (i >> 1 & 1 == 1)) || (i >> 2 & 1 == 0);
      assert_eq!(base.eval(f, &reg), expect, "assignment {:03b}", i) }
    base.validate("after sop build") }

  #[test] fn test_xor_shape() {
    let mut base = BkfBase::new(3);
    let net = vec![
      node("a", Kind::Input, &[], &[]),
      node("b", Kind::Input, &[], &[]),
      node("c", Kind::Input, &[], &[]),
      // parity cover of three inputs
      node("p", Kind::Output, &["a","b","c"], &["100", "010", "001", "111"]) ];
    let outs = build(&mut base, &net).unwrap();
    // same function built directly:
    let (a, b, c) = (base.var(x0), base.var(x1), base.var(x2));
    let t = base.xor(a, b).unwrap();
    let expect = base.xor(t, c).unwrap();
    base.nderef(t);
    assert_eq!(outs["p"], expect) }

  #[test] fn test_mux_shape() {
    let mut base = BkfBase::new(3);
    // f = s ? a : b with s the first column
    let tt = cover_tt(3, &["11-".to_string(), "0-1".to_string()]).unwrap();
    assert_eq!(is_mux(tt), Some((0, 1, 2)));
    let net = vec![
      node("s", Kind::Input, &[], &[]),
      node("a", Kind::Input, &[], &[]),
      node("b", Kind::Input, &[], &[]),
      node("m", Kind::Output, &["s","a","b"], &["11-", "0-1"]) ];
    let outs = build(&mut base, &net).unwrap();
    let (s, a, b) = (base.var(x0), base.var(x1), base.var(x2));
    let expect = base.ite(s, a, b).unwrap();
    assert_eq!(outs["m"], expect) }

  #[test] fn test_constant_and_polarity() {
    let mut base = BkfBase::new(1);
    let mut net = vec![
      node("k0", Kind::Constant, &[], &[]),
      node("a", Kind::Input, &[], &[]),
      node("f", Kind::Output, &["a"], &["1"]) ];
    net[2].polarity = false; // inverted buffer
    let outs = build(&mut base, &net).unwrap();
    assert_eq!(outs["f"], !base.var(x0)) }}
