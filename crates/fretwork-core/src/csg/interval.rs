//! Interval algebra along a single ray
//!
//! A [`SpanSet`] is the set of parameter intervals over which a ray is inside
//! a solid. Spans are sorted by entry and pairwise disjoint; every operation
//! preserves that, so booleans reduce to merging sorted lists.

use super::LeafId;
use crate::material::MaterialId;
use glam::Vec3;

/// A point where the ray crosses a solid's surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub t: f32,
    /// Outward normal of the solid the crossing belongs to, in world space
    pub normal: Vec3,
    pub leaf: LeafId,
    pub material: Option<MaterialId>,
}

impl Crossing {
    /// The same crossing seen from the complement of its solid
    fn inverted(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// One inside interval: `enter.t < exit.t`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub enter: Crossing,
    pub exit: Crossing,
}

impl Span {
    pub fn new(enter: Crossing, exit: Crossing) -> Self {
        Self { enter, exit }
    }

    pub fn contains(&self, t: f32) -> bool {
        self.enter.t <= t && t <= self.exit.t
    }
}

/// Sorted, disjoint inside intervals of one ray
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpanSet {
    spans: Vec<Span>,
}

impl SpanSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A set holding one span, or nothing if the span is empty
    pub fn single(span: Span) -> Self {
        if span.enter.t < span.exit.t {
            Self { spans: vec![span] }
        } else {
            Self::empty()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Span> {
        self.spans.iter()
    }

    /// Span covering `t`, if any
    pub fn span_at(&self, t: f32) -> Option<&Span> {
        let i = self.spans.partition_point(|s| s.exit.t < t);
        self.spans.get(i).filter(|s| s.contains(t))
    }

    /// Every boundary in order of increasing `t`, flagged `true` on entry
    pub fn crossings(&self) -> impl Iterator<Item = (Crossing, bool)> + '_ {
        self.spans
            .iter()
            .flat_map(|s| [(s.enter, true), (s.exit, false)])
    }

    /// Inside either set. Overlapping or touching spans merge.
    pub fn union(&self, other: &SpanSet) -> SpanSet {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }

        let mut all: Vec<Span> = self.spans.iter().chain(&other.spans).copied().collect();
        all.sort_by(|a, b| a.enter.t.total_cmp(&b.enter.t));

        let mut merged: Vec<Span> = Vec::with_capacity(all.len());
        for span in all {
            match merged.last_mut() {
                Some(last) if span.enter.t <= last.exit.t => {
                    if span.exit.t > last.exit.t {
                        last.exit = span.exit;
                    }
                }
                _ => merged.push(span),
            }
        }
        SpanSet { spans: merged }
    }

    /// Inside both sets
    pub fn intersection(&self, other: &SpanSet) -> SpanSet {
        let mut spans = Vec::new();
        let (mut i, mut j) = (0, 0);
        while let (Some(a), Some(b)) = (self.spans.get(i), other.spans.get(j)) {
            let enter = if a.enter.t >= b.enter.t { a.enter } else { b.enter };
            let exit = if a.exit.t <= b.exit.t { a.exit } else { b.exit };
            if enter.t < exit.t {
                spans.push(Span::new(enter, exit));
            }
            if a.exit.t < b.exit.t {
                i += 1;
            } else {
                j += 1;
            }
        }
        SpanSet { spans }
    }

    /// Inside `self` but not inside `other`.
    ///
    /// Surfaces contributed by `other` face the opposite way in the result.
    /// Coincident boundaries cancel, so subtracting a set from itself leaves
    /// nothing.
    pub fn difference(&self, other: &SpanSet) -> SpanSet {
        if other.is_empty() {
            return self.clone();
        }

        let mut spans = Vec::new();
        let mut j = 0;
        for a in &self.spans {
            // Cutters that ended before this span can never matter again
            while other.spans.get(j).is_some_and(|b| b.exit.t <= a.enter.t) {
                j += 1;
            }

            let mut start = Some(a.enter);
            let mut k = j;
            while let (Some(from), Some(b)) = (start, other.spans.get(k)) {
                if b.enter.t >= a.exit.t {
                    break;
                }
                if b.enter.t > from.t {
                    spans.push(Span::new(from, b.enter.inverted()));
                }
                start = (b.exit.t < a.exit.t).then(|| b.exit.inverted());
                k += 1;
            }
            if let Some(from) = start
                && from.t < a.exit.t
            {
                spans.push(Span::new(from, a.exit));
            }
        }
        SpanSet { spans }
    }
}

impl<'a> IntoIterator for &'a SpanSet {
    type Item = &'a Span;
    type IntoIter = std::slice::Iter<'a, Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crossing(t: f32, leaf: usize) -> Crossing {
        Crossing {
            t,
            normal: Vec3::X,
            leaf: LeafId(leaf),
            material: None,
        }
    }

    fn set(leaf: usize, intervals: &[(f32, f32)]) -> SpanSet {
        intervals
            .iter()
            .map(|&(a, b)| SpanSet::single(Span::new(crossing(a, leaf), crossing(b, leaf))))
            .fold(SpanSet::empty(), |acc, s| acc.union(&s))
    }

    fn ts(set: &SpanSet) -> Vec<(f32, f32)> {
        set.iter().map(|s| (s.enter.t, s.exit.t)).collect()
    }

    #[test]
    fn union_merges_overlaps_and_keeps_gaps() {
        let a = set(0, &[(0.0, 2.0), (5.0, 6.0)]);
        let b = set(1, &[(1.0, 3.0), (7.0, 8.0)]);
        assert_eq!(ts(&a.union(&b)), vec![(0.0, 3.0), (5.0, 6.0), (7.0, 8.0)]);
        let merged = a.union(&b);
        assert_eq!(merged.spans()[0].exit.leaf, LeafId(1));
    }

    #[test]
    fn union_of_touching_spans_is_one_span() {
        let a = set(0, &[(0.0, 1.0)]);
        let b = set(1, &[(1.0, 2.0)]);
        assert_eq!(ts(&a.union(&b)), vec![(0.0, 2.0)]);
    }

    #[test]
    fn intersection_keeps_overlaps_only() {
        let a = set(0, &[(0.0, 4.0), (6.0, 9.0)]);
        let b = set(1, &[(1.0, 2.0), (3.0, 7.0)]);
        assert_eq!(ts(&a.intersection(&b)), vec![(1.0, 2.0), (3.0, 4.0), (6.0, 7.0)]);
    }

    #[test]
    fn disjoint_intersection_is_empty() {
        let a = set(0, &[(0.0, 1.0)]);
        let b = set(1, &[(2.0, 3.0)]);
        assert!(a.intersection(&b).is_empty());
    }

    #[test]
    fn difference_cuts_and_flips_cutter_normals() {
        let a = set(0, &[(0.0, 10.0)]);
        let b = set(1, &[(2.0, 3.0), (5.0, 12.0)]);
        let d = a.difference(&b);
        assert_eq!(ts(&d), vec![(0.0, 2.0), (3.0, 5.0)]);
        assert_eq!(d.spans()[0].exit.leaf, LeafId(1));
        assert_eq!(d.spans()[0].exit.normal, Vec3::NEG_X);
        assert_eq!(d.spans()[1].enter.normal, Vec3::NEG_X);
        assert_eq!(d.spans()[0].enter.leaf, LeafId(0));
    }

    #[test]
    fn difference_with_itself_is_empty() {
        let a = set(0, &[(0.0, 1.0), (2.0, 4.0)]);
        assert!(a.difference(&a).is_empty());
    }

    #[test]
    fn difference_skips_cutters_that_end_early() {
        let a = set(0, &[(5.0, 6.0), (8.0, 9.0)]);
        let b = set(1, &[(0.0, 1.0), (5.5, 8.5)]);
        assert_eq!(ts(&a.difference(&b)), vec![(5.0, 5.5), (8.5, 9.0)]);
    }

    #[test]
    fn span_lookup() {
        let a = set(0, &[(0.0, 1.0), (2.0, 4.0)]);
        assert!(a.span_at(3.0).is_some());
        assert!(a.span_at(1.5).is_none());
        assert_eq!(a.crossings().count(), 4);
    }
}
