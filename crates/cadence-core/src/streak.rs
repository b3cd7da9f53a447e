//! The streak accumulator.
//!
//! A habit's completion history is kept run-length encoded: a sorted list of
//! closed occurrence-index intervals, each covering a contiguous run of
//! completed occurrences and carrying a running completion tally. Completions
//! may be toggled in any order; each toggle rewrites the list in a single pass
//! and the current streak is the tally of the last (most recent) interval.
//!
//! Two quirks of the tally are load-bearing for displayed streak numbers and
//! are kept as-is:
//!
//! - re-completing an index strictly inside an interval bumps the tally
//!   without moving the bounds, so a tally can exceed the interval's span;
//! - splitting an interval resets each half's tally to its own span instead of
//!   apportioning the old tally.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── StreakSpan ──────────────────────────────────────────────────────────────

/// One run of completed occurrences, `start..=end`.
///
/// Serialised as a `[start, end, completed]` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i64, i64, i64)", into = "(i64, i64, i64)")]
pub struct StreakSpan {
  pub start:     i64,
  pub end:       i64,
  /// Running completion tally; see the module docs for why this is not
  /// simply `end - start + 1`.
  pub completed: i64,
}

impl StreakSpan {
  pub const fn new(start: i64, end: i64, completed: i64) -> Self {
    Self { start, end, completed }
  }

  const fn single(index: i64) -> Self { Self::new(index, index, 1) }

  pub const fn contains(&self, index: i64) -> bool {
    self.start <= index && index <= self.end
  }
}

impl From<(i64, i64, i64)> for StreakSpan {
  fn from((start, end, completed): (i64, i64, i64)) -> Self {
    Self::new(start, end, completed)
  }
}

impl From<StreakSpan> for (i64, i64, i64) {
  fn from(span: StreakSpan) -> Self { (span.start, span.end, span.completed) }
}

// ─── StreakHistory ───────────────────────────────────────────────────────────

/// A habit's interval history plus its cached current streak.
///
/// Invariants, checked on construction and (in debug builds) after every
/// [`apply`](Self::apply):
///
/// 1. intervals are sorted by `start`;
/// 2. consecutive intervals are separated by at least one missing index
///    (`prev.end + 1 < next.start`);
/// 3. `start <= end` for every interval.
///
/// `streak` always equals the last interval's tally, or 0 when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStreakHistory")]
pub struct StreakHistory {
  streak:    i64,
  intervals: Vec<StreakSpan>,
}

#[derive(Deserialize)]
struct RawStreakHistory {
  #[serde(default)]
  intervals: Vec<StreakSpan>,
}

impl TryFrom<RawStreakHistory> for StreakHistory {
  type Error = Error;

  fn try_from(raw: RawStreakHistory) -> Result<Self> {
    Self::from_intervals(raw.intervals)
  }
}

impl StreakHistory {
  pub fn new() -> Self { Self::default() }

  /// Rebuild a history from persisted intervals. The streak is recomputed, and
  /// an interval list that breaks the invariants is rejected rather than
  /// repaired.
  pub fn from_intervals(intervals: Vec<StreakSpan>) -> Result<Self> {
    check_invariants(&intervals)?;
    Ok(Self {
      streak: last_tally(&intervals),
      intervals,
    })
  }

  pub fn streak(&self) -> i64 { self.streak }

  pub fn intervals(&self) -> &[StreakSpan] { &self.intervals }

  pub fn is_empty(&self) -> bool { self.intervals.is_empty() }

  /// Mark occurrence `index` as completed (`true`) or not (`false`) and
  /// return the new current streak.
  pub fn apply(&mut self, index: i64, completed: bool) -> i64 {
    self.intervals = if completed {
      mark(&self.intervals, index)
    } else {
      unmark(&self.intervals, index)
    };
    self.streak = last_tally(&self.intervals);

    debug_assert!(
      check_invariants(&self.intervals).is_ok(),
      "streak intervals broken after applying {index}={completed}: {:?}",
      self.intervals,
    );

    self.streak
  }

  /// Serialise only the interval list, in the `[[start, end, completed], ..]`
  /// shape stored alongside a habit record.
  pub fn intervals_json(&self) -> Result<String> {
    Ok(serde_json::to_string(&self.intervals)?)
  }
}

// ─── Transitions ─────────────────────────────────────────────────────────────

fn last_tally(intervals: &[StreakSpan]) -> i64 {
  intervals.last().map_or(0, |span| span.completed)
}

/// Completion path. The first interval that a rule applies to reacts once;
/// everything after it is copied, folding in any interval that has become
/// adjacent to the one just emitted. Re-marking the first or last index of a
/// run changes nothing.
fn mark(intervals: &[StreakSpan], index: i64) -> Vec<StreakSpan> {
  if intervals.is_empty() {
    return vec![StreakSpan::single(index)];
  }

  let mut out: Vec<StreakSpan> = Vec::with_capacity(intervals.len() + 1);
  let mut placed = false;

  for (i, &span) in intervals.iter().enumerate() {
    if placed {
      match out.last_mut() {
        Some(prev) if prev.end.checked_add(1) == Some(span.start) => {
          prev.end = span.end;
          prev.completed += span.completed;
        }
        _ => out.push(span),
      }
      continue;
    }

    let mut span = span;
    placed = true;

    if span.start < index && index < span.end {
      // Re-confirming a day inside a run.
      span.completed += 1;
      out.push(span);
    } else if span.contains(index) {
      // Start or end of a run: already counted.
      out.push(span);
    } else if index + 1 == span.start {
      span.start = index;
      span.completed += 1;
      out.push(span);
    } else if index - 1 == span.end {
      span.end = index;
      span.completed += 1;
      out.push(span);
    } else if index > span.end
      && intervals.get(i + 1).is_none_or(|next| index < next.start)
    {
      out.push(span);
      out.push(StreakSpan::single(index));
    } else if index < span.start
      && (i == 0 || index > intervals[i - 1].end)
    {
      out.push(StreakSpan::single(index));
      out.push(span);
    } else {
      placed = false;
      out.push(span);
    }
  }

  out
}

/// Un-completion path. Only the interval containing `index` changes.
fn unmark(intervals: &[StreakSpan], index: i64) -> Vec<StreakSpan> {
  let mut out: Vec<StreakSpan> = Vec::with_capacity(intervals.len() + 1);
  let mut removed = false;

  for &span in intervals {
    if removed || !span.contains(index) {
      out.push(span);
      continue;
    }
    removed = true;

    if span.start == span.end {
      continue;
    }

    if index == span.start {
      out.push(StreakSpan::new(index + 1, span.end, span.completed - 1));
    } else if index == span.end {
      out.push(StreakSpan::new(span.start, index - 1, span.completed - 1));
    } else {
      out.push(StreakSpan::new(span.start, index - 1, index - span.start));
      out.push(StreakSpan::new(index + 1, span.end, span.end - index));
    }
  }

  out
}

fn check_invariants(intervals: &[StreakSpan]) -> Result<()> {
  for span in intervals {
    if span.start > span.end {
      return Err(Error::CorruptStreakHistory(format!(
        "interval [{}, {}] starts after it ends",
        span.start, span.end
      )));
    }
  }
  for pair in intervals.windows(2) {
    let (a, b) = (pair[0], pair[1]);
    if a.end.checked_add(1).is_none_or(|next| next >= b.start) {
      return Err(Error::CorruptStreakHistory(format!(
        "intervals [{}, {}] and [{}, {}] overlap, touch, or are out of order",
        a.start, a.end, b.start, b.end
      )));
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn history(spans: &[(i64, i64, i64)]) -> StreakHistory {
    StreakHistory::from_intervals(spans.iter().copied().map(StreakSpan::from).collect())
      .unwrap()
  }

  fn triples(h: &StreakHistory) -> Vec<(i64, i64, i64)> {
    h.intervals().iter().copied().map(Into::into).collect()
  }

  // ── Completion ──────────────────────────────────────────────────────────

  #[test]
  fn first_completion_starts_a_run() {
    let mut h = StreakHistory::new();
    assert_eq!(h.apply(4, true), 1);
    assert_eq!(triples(&h), [(4, 4, 1)]);
  }

  #[test]
  fn sequential_growth() {
    let mut h = StreakHistory::new();
    h.apply(1, true);
    h.apply(2, true);
    assert_eq!(h.apply(3, true), 3);
    assert_eq!(triples(&h), [(1, 3, 3)]);
  }

  #[test]
  fn extend_left() {
    let mut h = history(&[(3, 5, 3)]);
    assert_eq!(h.apply(2, true), 4);
    assert_eq!(triples(&h), [(2, 5, 4)]);
  }

  #[test]
  fn extend_right() {
    let mut h = history(&[(3, 5, 3)]);
    assert_eq!(h.apply(6, true), 4);
    assert_eq!(triples(&h), [(3, 6, 4)]);
  }

  #[test]
  fn gap_inserts_new_run_after() {
    let mut h = history(&[(1, 3, 3)]);
    assert_eq!(h.apply(7, true), 1);
    assert_eq!(triples(&h), [(1, 3, 3), (7, 7, 1)]);
  }

  #[test]
  fn gap_inserts_new_run_before_first() {
    let mut h = history(&[(5, 7, 3)]);
    assert_eq!(h.apply(2, true), 3);
    assert_eq!(triples(&h), [(2, 2, 1), (5, 7, 3)]);
  }

  #[test]
  fn gap_inserts_between_runs() {
    let mut h = history(&[(1, 2, 2), (9, 10, 2)]);
    assert_eq!(h.apply(5, true), 2);
    assert_eq!(triples(&h), [(1, 2, 2), (5, 5, 1), (9, 10, 2)]);
  }

  #[test]
  fn filling_a_one_day_gap_joins_runs() {
    let mut h = history(&[(1, 3, 3), (5, 7, 3)]);
    assert_eq!(h.apply(4, true), 7);
    assert_eq!(triples(&h), [(1, 7, 7)]);
  }

  #[test]
  fn new_run_adjacent_to_next_is_joined() {
    let mut h = history(&[(1, 2, 2), (6, 8, 3)]);
    assert_eq!(h.apply(5, true), 4);
    assert_eq!(triples(&h), [(1, 2, 2), (5, 8, 4)]);
  }

  #[test]
  fn interior_recompletion_bumps_tally_only() {
    let mut h = history(&[(3, 7, 5)]);
    assert_eq!(h.apply(5, true), 6);
    assert_eq!(triples(&h), [(3, 7, 6)]);
  }

  #[test]
  fn boundary_recompletion_is_a_no_op() {
    let mut h = history(&[(3, 7, 5), (10, 10, 1)]);
    h.apply(3, true);
    h.apply(7, true);
    h.apply(10, true);
    assert_eq!(triples(&h), [(3, 7, 5), (10, 10, 1)]);
    assert_eq!(h.streak(), 1);
  }

  #[test]
  fn boundary_recompletion_before_later_runs_is_a_no_op() {
    let mut h = history(&[(1, 1, 1), (3, 3, 1), (5, 5, 1)]);
    let before = h.clone();
    assert_eq!(h.apply(1, true), 1);
    assert_eq!(h, before);

    let mut h = history(&[(2, 4, 3), (8, 9, 2), (12, 12, 1), (20, 21, 2)]);
    let before = h.clone();
    for index in [2, 4, 8, 9, 12] {
      h.apply(index, true);
      assert_eq!(h, before, "re-marking {index}");
    }
  }

  // ── Un-completion ───────────────────────────────────────────────────────

  #[test]
  fn unmark_end() {
    let mut h = history(&[(3, 5, 3)]);
    assert_eq!(h.apply(5, false), 2);
    assert_eq!(triples(&h), [(3, 4, 2)]);
  }

  #[test]
  fn unmark_start() {
    let mut h = history(&[(3, 5, 3)]);
    assert_eq!(h.apply(3, false), 2);
    assert_eq!(triples(&h), [(4, 5, 2)]);
  }

  #[test]
  fn unmark_middle_splits_and_resets_tallies() {
    let mut h = history(&[(3, 7, 5)]);
    assert_eq!(h.apply(5, false), 2);
    assert_eq!(triples(&h), [(3, 4, 2), (6, 7, 2)]);
  }

  #[test]
  fn split_discards_inflated_tally() {
    let mut h = history(&[(3, 7, 9)]);
    h.apply(4, false);
    assert_eq!(triples(&h), [(3, 3, 1), (5, 7, 3)]);
  }

  #[test]
  fn unmark_singleton_removes_run() {
    let mut h = history(&[(4, 4, 1)]);
    assert_eq!(h.apply(4, false), 0);
    assert!(h.is_empty());
  }

  #[test]
  fn unmark_missing_index_is_idempotent() {
    let mut h = history(&[(1, 3, 3), (7, 7, 1)]);
    let before = h.clone();
    assert_eq!(h.apply(5, false), 1);
    assert_eq!(h, before);

    let mut empty = StreakHistory::new();
    assert_eq!(empty.apply(1, false), 0);
    assert!(empty.is_empty());
  }

  #[test]
  fn streak_tracks_last_run_not_longest() {
    let mut h = history(&[(1, 10, 10)]);
    h.apply(12, true);
    assert_eq!(h.streak(), 1);
    h.apply(11, true);
    assert_eq!(h.streak(), 12);
    assert_eq!(triples(&h), [(1, 12, 12)]);
  }

  // ── Invariants ──────────────────────────────────────────────────────────

  #[test]
  fn arbitrary_toggle_order_keeps_invariants() {
    // Deterministic pseudo-random walk over indices 1..=40.
    let mut h = StreakHistory::new();
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    for _ in 0..2_000 {
      state ^= state << 13;
      state ^= state >> 7;
      state ^= state << 17;
      let index = (state % 40) as i64 + 1;
      let completed = state & 0x100 != 0;
      let streak = h.apply(index, completed);

      assert!(check_invariants(h.intervals()).is_ok(), "{:?}", h.intervals());
      assert_eq!(streak, h.intervals().last().map_or(0, |s| s.completed));
    }
  }

  #[test]
  fn from_intervals_rejects_broken_lists() {
    let adjacent = vec![StreakSpan::new(1, 3, 3), StreakSpan::new(4, 5, 2)];
    assert!(matches!(
      StreakHistory::from_intervals(adjacent),
      Err(Error::CorruptStreakHistory(_))
    ));

    let unordered = vec![StreakSpan::new(8, 9, 2), StreakSpan::new(1, 3, 3)];
    assert!(StreakHistory::from_intervals(unordered).is_err());

    let inverted = vec![StreakSpan::new(5, 4, 1)];
    assert!(StreakHistory::from_intervals(inverted).is_err());
  }

  #[test]
  fn from_intervals_rejects_extreme_bounds_without_overflow() {
    let spans = vec![StreakSpan::new(1, i64::MAX, 3), StreakSpan::new(5, 6, 2)];
    assert!(matches!(
      StreakHistory::from_intervals(spans),
      Err(Error::CorruptStreakHistory(_))
    ));

    let lone = history(&[(i64::MAX, i64::MAX, 1)]);
    assert_eq!(lone.streak(), 1);
  }

  #[test]
  fn serialises_as_triples() {
    let h = history(&[(1, 3, 3), (7, 7, 1)]);
    let json = serde_json::to_value(&h).unwrap();
    assert_eq!(
      json,
      serde_json::json!({ "streak": 1, "intervals": [[1, 3, 3], [7, 7, 1]] })
    );
    assert_eq!(h.intervals_json().unwrap(), "[[1,3,3],[7,7,1]]");

    let back: StreakHistory = serde_json::from_value(json).unwrap();
    assert_eq!(back, h);
  }

  #[test]
  fn deserialising_corrupt_intervals_fails() {
    let json = serde_json::json!({ "streak": 9, "intervals": [[1, 3, 3], [2, 5, 1]] });
    assert!(serde_json::from_value::<StreakHistory>(json).is_err());
  }
}
