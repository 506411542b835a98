//! operator + reordering benchmarks over a ripple-carry chain.
use bkfdd::{BkfBase, Method, O, NID, VID};

fn main() { divan::main() }

/// carry-out of an n-bit ripple adder with operand bits laid out worst-first
/// (all a bits above all b bits).
fn carry(base:&mut BkfBase, nbits:usize)->NID {
  let mut c = O;
  base.nref(c);
  for i in 0..nbits {
    let a = base.var(VID::var(i as u32));
    let b = base.var(VID::var((i + nbits) as u32));
    let ab = base.and(a, b).unwrap();
    let axb = base.xor(a, b).unwrap();
    let t = base.and(axb, c).unwrap();
    let nc = base.or(ab, t).unwrap();
    for n in [ab, axb, t, c] { base.nderef(n) }
    c = nc }
  c }

#[divan::bench(args = [4, 6, 8])]
fn build_carry(bencher:divan::Bencher, nbits:usize) {
  bencher.bench(|| {
    let mut base = BkfBase::new(2 * nbits);
    let f = carry(&mut base, nbits);
    divan::black_box(base.node_count(f)) }) }

#[divan::bench(args = [4, 6])]
fn sift_carry(bencher:divan::Bencher, nbits:usize) {
  bencher.bench(|| {
    let mut base = BkfBase::new(2 * nbits);
    let f = carry(&mut base, nbits);
    base.tag(f, "carry".to_string());
    base.nderef(f);
    divan::black_box(base.reorder(Method::Sift).unwrap()) }) }

#[divan::bench(args = [4, 6])]
fn odt_sift_carry(bencher:divan::Bencher, nbits:usize) {
  bencher.bench(|| {
    let mut base = BkfBase::new(2 * nbits);
    let f = carry(&mut base, nbits);
    base.tag(f, "carry".to_string());
    base.nderef(f);
    divan::black_box(base.reorder(Method::OdtSift).unwrap()) }) }
