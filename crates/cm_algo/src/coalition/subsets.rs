//! Lazy, bounded-depth enumeration of party subsets with seat pruning.
//!
//! Input: seat counts of the candidate parties, sorted **descending**, and
//! optionally the conflicting (red-line) position pairs.
//! Output: index subsets (ascending positions) of size `2..=max_size`, in
//! lexicographic order of positions.
//!
//! Pruning: when a partial subset plus the best `max_size − len` remaining
//! candidates cannot reach `floor`, that branch is abandoned unless it holds,
//! or can still grow into, a conflicting pair. Every subset containing a
//! conflict is therefore yielded whatever its seats. Because seats are sorted,
//! every later sibling is bounded by the same sum, so the rest of the sibling
//! loop is cut as well when no sibling can reach a conflict either.

/// Depth-first subset iterator over seat-sorted candidates.
#[derive(Clone, Debug)]
pub struct SubsetGenerator {
    seats: Vec<u64>,
    /// `prefix[i] = seats[0] + … + seats[i − 1]`
    prefix: Vec<u64>,
    max_size: usize,
    floor: u64,

    /// Conflicting positions of each position.
    partners: Vec<Vec<usize>>,
    /// Largest conflicting position of each position.
    last_partner: Vec<Option<usize>>,
    /// `pair_from[p]`: some conflict lies entirely within positions `p..`.
    pair_from: Vec<bool>,

    stack: Vec<usize>,
    /// `paired[k]`: `stack[..=k]` contains a conflict.
    paired: Vec<bool>,
    sum: u64,
    next: usize,
    done: bool,

    yielded: u64,
    pruned: u64,
}

impl SubsetGenerator {
    /// `seats` must be sorted descending.
    pub fn new(seats: &[u32], max_size: usize, floor: u32) -> Self {
        debug_assert!(seats.windows(2).all(|w| w[0] >= w[1]), "seats must be sorted descending");
        let seats: Vec<u64> = seats.iter().map(|&s| s as u64).collect();
        let n = seats.len();
        let mut prefix = Vec::with_capacity(seats.len() + 1);
        prefix.push(0);
        for s in &seats {
            prefix.push(prefix[prefix.len() - 1] + s);
        }
        Self {
            seats,
            prefix,
            max_size,
            floor: floor as u64,
            partners: vec![Vec::new(); n],
            last_partner: vec![None; n],
            pair_from: vec![false; n + 1],
            stack: Vec::with_capacity(max_size),
            paired: Vec::with_capacity(max_size),
            sum: 0,
            next: 0,
            done: max_size < 2,
            yielded: 0,
            pruned: 0,
        }
    }

    /// Declare conflicting position pairs. Subsets containing one are never pruned.
    ///
    /// Pairs naming a position out of range, or the same position twice, are ignored.
    pub fn with_conflicts<I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let n = self.seats.len();
        for (a, b) in pairs {
            if a == b || a >= n || b >= n {
                continue;
            }
            for (x, y) in [(a, b), (b, a)] {
                if !self.partners[x].contains(&y) {
                    self.partners[x].push(y);
                }
                self.last_partner[x] = self.last_partner[x].max(Some(y));
            }
        }
        for p in (0..n).rev() {
            self.pair_from[p] = self.pair_from[p + 1] || self.partners[p].iter().any(|&q| q > p);
        }
        self
    }

    /// Subsets yielded so far.
    pub fn yielded(&self) -> u64 {
        self.yielded
    }

    /// Sibling loops cut so far.
    pub fn pruned(&self) -> u64 {
        self.pruned
    }

    /// Seat total of the subset last yielded.
    pub fn current_seats(&self) -> u64 {
        self.sum
    }

    /// Seats of the best `r` candidates starting at position `from`.
    #[inline]
    fn best(&self, from: usize, r: usize) -> u64 {
        let n = self.seats.len();
        let from = from.min(n);
        let to = (from + r).min(n);
        self.prefix[to] - self.prefix[from]
    }

    fn stack_paired(&self) -> bool {
        self.paired.last().copied().unwrap_or(false)
    }

    /// A partner of some stacked position lies after `i`.
    fn stack_reaches_past(&self, i: usize) -> bool {
        self.stack.iter().any(|&m| self.last_partner[m].is_some_and(|q| q > i))
    }

    /// The branch `stack + [i]` (of length `len`) can still gain a conflict.
    fn can_pair_later(&self, i: usize, len: usize) -> bool {
        let room = self.max_size - len;
        (room >= 1 && (self.stack_reaches_past(i) || self.last_partner[i].is_some_and(|q| q > i)))
            || (room >= 2 && self.pair_from[i + 1])
    }

    /// Some later sibling `j > i` at the same depth can hold or gain a conflict.
    fn sibling_can_pair(&self, i: usize, len: usize) -> bool {
        self.stack_reaches_past(i) || (len < self.max_size && self.pair_from[i + 1])
    }

    fn backtrack(&mut self) {
        self.paired.pop();
        match self.stack.pop() {
            Some(i) => {
                self.sum -= self.seats[i];
                self.next = i + 1;
            }
            None => self.done = true,
        }
    }
}

impl Iterator for SubsetGenerator {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if self.stack.len() >= self.max_size || self.next >= self.seats.len() {
                self.backtrack();
                continue;
            }

            let i = self.next;
            let len = self.stack.len() + 1;
            let sum = self.sum + self.seats[i];
            let paired = self.stack_paired() || self.partners[i].iter().any(|q| self.stack.contains(q));
            if !paired && sum + self.best(i + 1, self.max_size - len) < self.floor && !self.can_pair_later(i, len) {
                self.pruned += 1;
                if self.sibling_can_pair(i, len) {
                    self.next = i + 1;
                } else {
                    self.backtrack();
                }
                continue;
            }

            self.stack.push(i);
            self.paired.push(paired);
            self.sum = sum;
            self.next = i + 1;
            if len >= 2 {
                self.yielded += 1;
                return Some(self.stack.clone());
            }
        }
        None
    }
}
