// expansion-change test suite
#[cfg(test)] mod expand_tests {
  use crate::bkf::BkfBase;
  use crate::err::Error;
  use crate::expn::Expn;
  use crate::nid::NID;
  use crate::reg::Reg;
  use crate::vid::named::*;

  /// truth table of a tagged root, indexed by the variable bits.
  fn tt_of(base:&BkfBase, tag:&str, nvars:usize)->Vec<bool> {
    let f = base.get(tag).unwrap();
    let mut reg = Reg::new(nvars);
    (0..(1usize << nvars)).map(|i| {
      for b in 0..nvars { reg.put(b, (i >> b) & 1 == 1) }
      base.eval(f, &reg) }).collect() }

  /// majority-of-three, a function with no special structure.
  fn maj3(base:&mut BkfBase)->NID {
    let (a, b, c) = (base.var(x0), base.var(x1), base.var(x2));
    let ab = base.and(a, b).unwrap();
    let bc = base.and(b, c).unwrap();
    let ca = base.and(c, a).unwrap();
    let t = base.or(ab, bc).unwrap();
    let f = base.or(t, ca).unwrap();
    for n in [ab, bc, ca, t] { base.nderef(n) }
    f }

  #[test] fn test_expn_preserves_semantics() {
    let mut base = BkfBase::new(3);
    let f = maj3(&mut base);
    base.tag(f, "f".to_string());
    base.nderef(f);
    let before = tt_of(&base, "f", 3);
    for e in [Expn::CND, Expn::CPD, Expn::BS, Expn::BND, Expn::BPD, Expn::CS] {
      base.change_expn(0, e).unwrap();
      assert_eq!(base.expn_at(0), e);
      assert_eq!(tt_of(&base, "f", 3), before, "level 0 as {:?}", e);
      base.validate("level 0 rewrite") }
    for e in [Expn::CND, Expn::BPD, Expn::CS] {
      base.change_expn(1, e).unwrap();
      assert_eq!(tt_of(&base, "f", 3), before, "level 1 as {:?}", e) }
    base.change_expn(0, Expn::BND).unwrap();
    base.change_expn(1, Expn::CPD).unwrap();
    base.change_expn(2, Expn::CND).unwrap();
    assert_eq!(tt_of(&base, "f", 3), before, "mixed expansions");
    base.validate("mixed expansions") }

  #[test] fn test_round_trips() {
    let mut base = BkfBase::new(3);
    let f = maj3(&mut base);
    base.tag(f, "f".to_string());
    base.nderef(f);
    let e0 = base.get("f");
    let before = tt_of(&base, "f", 3);
    for path in [[Expn::CND, Expn::CS], [Expn::CPD, Expn::CS],
                 [Expn::BS, Expn::CS], [Expn::BND, Expn::CS]] {
      for e in path { base.change_expn(0, e).unwrap() }
      assert_eq!(tt_of(&base, "f", 3), before);
      assert_eq!(base.get("f"), e0, "a round trip restores the same edge") }}

  #[test] fn test_bottom_level_stays_classical() {
    let mut base = BkfBase::new(2);
    let f = { let (a, b) = (base.var(x0), base.var(x1)); base.and(a, b).unwrap() };
    base.tag(f, "f".to_string());
    base.change_expn(1, Expn::BS).unwrap(); // silently refused
    assert_eq!(base.expn_at(1), Expn::CS);
    base.change_expn(1, Expn::CND).unwrap();
    assert_eq!(base.expn_at(1), Expn::CND);
    base.validate("bottom stays classical") }

  #[test] fn test_choose_sd6_xor() {
    // use simplelog::*;  let _ = SimpleLogger::init(LevelFilter::Trace, Config::default());
    let mut base = BkfBase::new(3);
    let (a, b, c) = (base.var(x0), base.var(x1), base.var(x2));
    let ab = base.xor(a, b).unwrap();
    let f = base.xor(ab, c).unwrap();
    base.nderef(ab);
    base.tag(f, "f".to_string());
    base.nderef(f);
    base.gc();
    assert_eq!(base.live(), 3);
    let e = base.choose_sd6(0).unwrap();
    assert!(e.is_davio(), "the xor spine should settle on a davio code, got {:?}", e);
    assert_eq!(base.live(), 2, "the spine shrinks to a davio chain");
    // an independently rebuilt copy must land on the tagged edge.
    let (a, b, c) = (base.var(x0), base.var(x1), base.var(x2));
    let t = base.xor(a, b).unwrap();
    let g = base.xor(t, c).unwrap();
    base.nderef(t);
    assert_eq!(g, base.get("f").unwrap(), "independently built copy shares the edge");
    base.validate("after choose") }

  #[test] fn test_choose_sd3_stays_in_class() {
    let mut base = BkfBase::new(3);
    let f = maj3(&mut base);
    base.tag(f, "f".to_string());
    base.nderef(f);
    let e = base.choose_sd3(0).unwrap();
    assert!(e.is_classical(), "sd3 from a classical level stays classical");
    base.validate("after sd3") }

  #[test] fn test_xnor_bs_level() {
    let mut base = BkfBase::new(2);
    let (a, b) = (base.var(x0), base.var(x1));
    let x = base.xor(a, b).unwrap();
    base.tag(!x, "h".to_string()); // xnor
    base.nderef(x);
    base.change_expn(0, Expn::BS).unwrap();
    let h = base.get("h").unwrap();
    assert_eq!(base.node_count(h), 1, "a single biconditional node denotes xnor");
    let mut reg = Reg::new(2);
    for i in 0..4usize {
      reg.put(0, i & 1 == 1); reg.put(1, i >> 1 == 1);
      assert_eq!(base.eval(h, &reg), (i & 1 == 1) == (i >> 1 == 1), "xnor at {:02b}", i) }
    // the dump pairs the two variables through the xnor helper signal.
    let mut out:Vec<u8> = vec![];
    base.dump_blif(&mut out, "xnor", &[("h".to_string(), h)]).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains(".names x0 x1 bkf_0_1\n11 1\n00 1\n"), "helper block missing:\n{}", text);
    base.validate("after bs conversion") }

  #[test] fn test_midrewrite_failure_poisons() {
    let mut base = BkfBase::new(4);
    let f = {
      let (a, b, c, d) = (base.var(x0), base.var(x1), base.var(x2), base.var(x3));
      let ab = base.and(a, b).unwrap();
      let cd = base.and(c, d).unwrap();
      let f = base.or(ab, cd).unwrap();
      base.nderef(ab); base.nderef(cd);
      f };
    base.tag(f, "f".to_string());
    base.nderef(f);
    base.gc();
    base.conf.max_nodes = base.len(); // the next allocation fails
    let r = base.change_bi_cla(1);
    assert_eq!(r, Err(Error::MemoryOut));
    assert_eq!(base.last_err(), Some(Error::MemoryOut));
    assert!(base.debug_check().is_err(), "a poisoned manager reports inconsistent") }

  #[test] fn test_restricted_respects_cap() {
    let mut base = BkfBase::new(3);
    base.conf.davio_exist_factor = 0.0; // cap of zero non-shannon levels
    let f = maj3(&mut base);
    base.tag(f, "f".to_string());
    base.nderef(f);
    let e = base.choose_sd6_restricted(0).unwrap();
    assert!(e.is_shannon(), "the cap keeps shannon levels shannon, got {:?}", e);
    base.validate("after restricted choose") }

  #[test] fn test_snd_mode_skips_positive_davio() {
    let mut base = BkfBase::new(3);
    base.conf.mode = crate::bkf::Mode::Snd;
    let (a, b, c) = (base.var(x0), base.var(x1), base.var(x2));
    let ab = base.xor(a, b).unwrap();
    let f = base.xor(ab, c).unwrap();
    base.nderef(ab);
    base.tag(f, "f".to_string());
    base.nderef(f);
    let e = base.choose_sd6(0).unwrap();
    assert_ne!(e.letter(), crate::expn::Letter::PD, "snd mode must not introduce positive davio");
    base.validate("after snd choose") }}
