//! BLIF output: dump the diagram reachable from named roots as a netlist,
//! one `.names` block per node.
//!
//! Shannon nodes emit two cubes and Davio nodes three. A biconditional
//! level branches on a helper signal `bkf_<i>_<j>` (the XNOR of its
//! variable pair) emitted once per pairing. Node identifiers are the hex
//! of the arena slot, so they stay short and unique within one dump. The
//! final block per output is a buffer or inverter absorbing the root
//! edge's complement bit.
use std::io::{self, Write};
use crate::nid::NID;
use crate::bkf::{BkfBase, BkHashMap};
use crate::expn::Letter;

/// a single literal requirement inside a cube template.
#[derive(Clone, Copy)]
enum Lit { X(bool), H(bool), L(bool) }
use self::Lit::*;

fn node_sig(n:NID)->String { format!("n{:x}", n.idx()) }

impl BkfBase {

  fn branch_sig(&self, lvl:usize)->String {
    if self.rows[lvl].expn.is_bicond() {
      format!("bkf_{}_{}", self.invperm[lvl], self.invperm[lvl+1]) }
    else { format!("{}", self.var_at(lvl)) }}

  /// write one node's `.names` block.
  fn write_node<W:Write>(&self, w:&mut W, n:NID)->io::Result<()> {
    let node = self.vhl(n);
    let lvl = self.level_of(n);
    let e = self.rows[lvl].expn;
    // input columns: branch signal, then the distinct non-constant children.
    let mut cols:Vec<String> = vec![self.branch_sig(lvl)];
    let mut col_of = |x:NID|->Option<usize> {
      if x.is_const() { return None }
      let sig = node_sig(x.raw());
      Some(if let Some(p) = cols.iter().position(|c| *c == sig) { p }
           else { cols.push(sig); cols.len()-1 }) };
    let hcol = col_of(node.hi);
    let lcol = col_of(node.lo);
    let templates:&[&[Lit]] = match e.letter() {
      Letter::S  => &[ &[X(true), H(true)], &[X(false), L(true)] ],
      Letter::ND => &[ &[X(true), L(true)],
                       &[X(false), L(true), H(false)],
                       &[X(false), L(false), H(true)] ],
      Letter::PD => &[ &[X(false), L(true)],
                       &[X(true), L(true), H(false)],
                       &[X(true), L(false), H(true)] ] };
    let mut cubes:Vec<String> = vec![];
    'template: for t in templates {
      let mut pat:Vec<char> = vec!['-'; cols.len()];
      for lit in *t {
        let (col, ch) = match *lit {
          X(v) => (Some(0), if v { '1' } else { '0' }),
          H(v) => match hcol {
            Some(c) => (Some(c), if v ^ node.hi.is_inv() { '1' } else { '0' }),
            // constant branch: the literal either always holds or kills the cube.
            None => { if (node.hi.is_inv()) == v { (None, '-') } else { continue 'template } }},
          L(v) => match lcol {
            Some(c) => (Some(c), if v ^ node.lo.is_inv() { '1' } else { '0' }),
            None => { if (node.lo.is_inv()) == v { (None, '-') } else { continue 'template } }}};
        if let Some(c) = col {
          if pat[c] != '-' && pat[c] != ch { continue 'template }
          pat[c] = ch }}
      cubes.push(pat.into_iter().collect()) }
    writeln!(w, ".names {} {}", cols.join(" "), node_sig(n.raw()))?;
    for cube in cubes { writeln!(w, "{} 1", cube)? }
    Ok(()) }

  /// dump the diagram reachable from the given (name, root) pairs.
  pub fn dump_blif<W:Write>(&self, w:&mut W, model:&str, outputs:&[(String, NID)])->io::Result<()> {
    writeln!(w, ".model {}", model)?;
    let inames:Vec<String> = (0..self.nvars()).map(|l| format!("{}", self.var_at(l))).collect();
    writeln!(w, ".inputs {}", inames.join(" "))?;
    let onames:Vec<&str> = outputs.iter().map(|(s, _)| s.as_str()).collect();
    writeln!(w, ".outputs {}", onames.join(" "))?;
    // helper signals, one per biconditional level pairing.
    for l in 0..self.nvars() {
      if self.rows[l].expn.is_bicond() {
        writeln!(w, ".names {} {} bkf_{}_{}",
                 self.var_at(l), self.var_at(l+1), self.invperm[l], self.invperm[l+1])?;
        writeln!(w, "11 1")?;
        writeln!(w, "00 1")? }}
    // reachable nodes, deepest level first so readers meet leaves early.
    let mut seen:BkHashMap<u64, ()> = BkHashMap::default();
    let mut stack:Vec<NID> = outputs.iter().map(|(_, n)| n.raw()).collect();
    let mut order:Vec<NID> = vec![];
    while let Some(x) = stack.pop() {
      if x.is_const() || seen.contains_key(&x.u()) { continue }
      seen.insert(x.u(), ());
      order.push(x);
      let node = self.vhl(x);
      stack.push(node.hi.raw());
      stack.push(node.lo.raw()); }
    order.sort_by_key(|&x| (std::cmp::Reverse(self.level_of(x)), x.idx()));
    for x in order { self.write_node(w, x)? }
    // per-output buffer/inverter absorbing the root complement bit.
    for (name, root) in outputs {
      if root.is_const() {
        writeln!(w, ".names {}", name)?;
        if root.is_inv() { writeln!(w, "1")? }}
      else {
        writeln!(w, ".names {} {}", node_sig(root.raw()), name)?;
        writeln!(w, "{} 1", if root.is_inv() { "0" } else { "1" })? }}
    writeln!(w, ".end") }}


#[cfg(test)] mod blif_tests {
  use crate::bkf::BkfBase;
  use crate::vid::named::*;

  #[test] fn test_dump_shannon() {
    let mut base = BkfBase::new(2);
    let (a, b) = (base.var(x0), base.var(x1));
    let f = base.and(a, b).unwrap();
    let mut out:Vec<u8> = vec![];
    base.dump_blif(&mut out, "andgate", &[("f".to_string(), f)]).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with(".model andgate\n"), "got: {}", text);
    assert!(text.contains(".inputs x0 x1\n"));
    assert!(text.contains(".outputs f\n"));
    // the root node tests x0, with the x1 node as its hi input.
    assert!(text.contains("11 1\n"), "and node cube missing: {}", text);
    assert!(text.ends_with(".end\n"));
    // root is not inverted, so the output block is a buffer.
    assert!(text.contains("f\n1 1\n"), "buffer block missing: {}", text) }

  #[test] fn test_dump_davio_cubes() {
    use crate::expn::Expn;
    let mut base = BkfBase::new(3);
    let (a, b, c) = (base.var(x0), base.var(x1), base.var(x2));
    let f = base.ite(a, b, c).unwrap();
    base.tag(f, "f".to_string());
    base.nderef(f);
    base.change_expn(0, Expn::CND).unwrap();
    let f = base.get("f").unwrap();
    let mut out:Vec<u8> = vec![];
    base.dump_blif(&mut out, "mux", &[("f".to_string(), f)]).unwrap();
    let text = String::from_utf8(out).unwrap();
    // a negative-davio node with two distinct children emits three cubes:
    // x=1 takes the base, x=0 takes base xor difference.
    assert!(text.contains("1-1 1\n"), "base cube missing:\n{}", text);
    assert!(text.contains("001 1\n"), "difference cube missing:\n{}", text);
    assert!(text.contains("010 1\n"), "difference cube missing:\n{}", text) }

  #[test] fn test_dump_inverter_root() {
    let mut base = BkfBase::new(2);
    let (a, b) = (base.var(x0), base.var(x1));
    let ab = base.and(a, b).unwrap();
    let f = !ab; // nand: the root edge carries a complement bit.
    assert!(f.is_inv());
    let mut out:Vec<u8> = vec![];
    base.dump_blif(&mut out, "nandgate", &[("f".to_string(), f)]).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("f\n0 1\n"), "inverter block missing: {}", text) }}
