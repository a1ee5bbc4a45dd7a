//! Ordered vote counting with a first-encounter tie-break.

/// Per-label vote counts, kept in the order each label was first seen.
///
/// The winner is the label with the highest count; on a tie the label that
/// was recorded first wins. Used both for leaf labels (votes are training
/// rows) and for ensemble predictions (votes are trees).
#[derive(Debug, Clone, PartialEq)]
pub struct VoteTally<L> {
    entries: Vec<(L, usize)>,
    total: usize,
}

impl<L> Default for VoteTally<L> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            total: 0,
        }
    }
}

impl<L: PartialEq> VoteTally<L> {
    /// Create an empty tally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one vote for `label`.
    pub fn record(&mut self, label: L) {
        self.total += 1;
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((label, 1)),
        }
    }

    /// Return the index into `entries` of the winning label.
    fn winner_index(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (idx, &(_, count)) in self.entries.iter().enumerate() {
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((idx, count));
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Return the majority label, or `None` for an empty tally.
    #[must_use]
    pub fn winner(&self) -> Option<&L> {
        self.winner_index().map(|idx| &self.entries[idx].0)
    }

    /// Consume the tally and return the majority label.
    #[must_use]
    pub fn into_winner(mut self) -> Option<L> {
        let idx = self.winner_index()?;
        Some(self.entries.swap_remove(idx).0)
    }

    /// Return the number of votes recorded for `label`.
    #[must_use]
    pub fn count(&self, label: &L) -> usize {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map_or(0, |&(_, count)| count)
    }

    /// Return the share of all votes cast for `label`, in `[0.0, 1.0]`.
    #[must_use]
    pub fn fraction(&self, label: &L) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(label) as f64 / self.total as f64
    }

    /// Return the `k` most voted labels with their vote shares, descending.
    ///
    /// Equal counts keep first-encounter order.
    #[must_use]
    pub fn top_k(&self, k: usize) -> Vec<(&L, f64)> {
        let mut ranked: Vec<&(L, usize)> = self.entries.iter().collect();
        // Stable sort keeps first-encounter order among equal counts.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(k)
            .map(|(label, count)| (label, *count as f64 / self.total as f64))
            .collect()
    }

    /// Iterate `(label, count)` pairs in first-encounter order.
    pub fn iter(&self) -> impl Iterator<Item = (&L, usize)> {
        self.entries.iter().map(|(label, count)| (label, *count))
    }

    /// Return the total number of votes recorded.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Return the number of distinct labels seen.
    #[must_use]
    pub fn n_distinct(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` if no vote has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl<L: PartialEq> FromIterator<L> for VoteTally<L> {
    fn from_iter<I: IntoIterator<Item = L>>(iter: I) -> Self {
        let mut tally = Self::new();
        for label in iter {
            tally.record(label);
        }
        tally
    }
}
