//! Expansion-choice heuristics: try alternative decomposition types at one
//! level, keep whichever leaves the fewest live nodes.
//!
//! Every trial is a real rewrite; the loop walks the candidate codes
//! cyclically, measures, and finishes by rewriting to the winner (or back
//! to where it started, when nothing clears the acceptance bounds).
use crate::bkf::{BkfBase, Mode};
use crate::expn::{Expn, Letter, ALL};
use crate::err::Result;

/// hard cap on the number of non-shannon levels the restricted variants
/// will allow, regardless of the davio_exist_factor knob.
pub const DAVIO_EXIST_BOUND:usize = 128;

impl BkfBase {

  fn davio_cap(&self)->usize {
    DAVIO_EXIST_BOUND.min((self.conf.davio_exist_factor * self.nvars() as f64) as usize) }

  fn non_shannon_levels(&self)->usize {
    (0..self.nvars()).filter(|&l| self.rows[l].expn.is_davio()).count() }

  /// SND mode never introduces positive-Davio codes.
  fn mode_allows(&self, e:Expn)->bool {
    match self.conf.mode {
      Mode::Sd => true,
      Mode::Snd => e.letter() != Letter::PD }}

  /// search the three expansions sharing the level's class (classical or
  /// biconditional).
  pub fn choose_sd3(&mut self, l:usize)->Result<Expn> {
    let cands:[Expn;3] = if self.rows[l].expn.is_classical() {
      [Expn::CS, Expn::CND, Expn::CPD] } else { [Expn::BS, Expn::BND, Expn::BPD] };
    self.choose_from(l, &cands) }

  /// search all six expansions.
  pub fn choose_sd6(&mut self, l:usize)->Result<Expn> {
    self.choose_from(l, &ALL) }

  /// choose_sd3, except the total number of non-shannon levels is capped;
  /// at the cap a shannon level may still flip between its classical and
  /// biconditional forms.
  pub fn choose_sd3_restricted(&mut self, l:usize)->Result<Expn> {
    if self.davio_capped(l) { return self.choose_from(l, &[Expn::CS, Expn::BS]) }
    self.choose_sd3(l) }

  /// choose_sd6 under the same cap.
  pub fn choose_sd6_restricted(&mut self, l:usize)->Result<Expn> {
    if self.davio_capped(l) { return self.choose_from(l, &[Expn::CS, Expn::BS]) }
    self.choose_sd6(l) }

  /// at the cap, a level that is currently shannon must stay shannon.
  /// (a level that is already davio can be re-typed freely: no trial can
  /// push the count past the cap.)
  fn davio_capped(&self, l:usize)->bool {
    self.rows[l].expn.is_shannon() && self.non_shannon_levels() >= self.davio_cap() }

  /// the trial loop. rows smaller than choose_threshold are left alone.
  fn choose_from(&mut self, l:usize, cands:&[Expn])->Result<Expn> {
    let cur = self.rows[l].expn;
    if self.rows[l].keys() < self.conf.choose_threshold { return Ok(cur) }
    if self.hold == 0 { self.gc(); }
    let old_size = self.live();
    let mut best = (cur, old_size);
    for &cand in cands {
      if cand == cur || !self.mode_allows(cand) { continue }
      if let Err(e) = self.change_expn(l, cand) {
        // roll the failed trial back via the inverse transition, then
        // report. (if the rollback itself fails the manager is already
        // poisoned and the error stands on its own.)
        let _ = self.change_expn(l, cur);
        return Err(e) }
      if self.rows[l].expn != cand { continue } // bottom level refused a biconditional
      let size = self.live();
      trace!("choose level {}: {:?} gives {} live nodes", l, cand, size);
      // ties settle on a davio code when one is available.
      if size < best.1 || (size == best.1 && best.0.is_shannon() && cand.is_davio()) {
        best = (cand, size) }}
    // acceptance bounds: the winner must strictly beat the factor, and a
    // davio winner must clear the stricter davio factor.
    let mut target = best.0;
    if target != cur {
      let factor = if target.is_davio() { self.conf.choose_dav_bound_factor }
                   else { self.conf.choose_new_bound_factor };
      if (best.1 as f64) >= factor * (old_size as f64) { target = cur }}
    self.change_expn(l, target)?;
    debug!("choose level {}: {:?} -> {:?} ({} -> {} live nodes)",
           l, cur, target, old_size, self.live());
    Ok(target) }}
