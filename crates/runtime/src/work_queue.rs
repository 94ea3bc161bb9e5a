use std::collections::BTreeMap;

use crate::budget::FrameBudget;

/// Ticket for an entry of a [`WorkQueue`]. Tickets are issued in arrival
/// order, so they double as the tie-breaker between equal ranks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkId(u64);

/// Pending work ordered by rank, then arrival; lower ranks leave first.
///
/// Any entry can be withdrawn by its ticket without disturbing the order
/// of the others.
#[derive(Debug)]
pub struct WorkQueue<T> {
    ordered: BTreeMap<(u32, WorkId), T>,
    rank_of: BTreeMap<WorkId, u32>,
    issued: u64,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self {
            ordered: BTreeMap::new(),
            rank_of: BTreeMap::new(),
            issued: 0,
        }
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn push(&mut self, rank: u32, payload: T) -> WorkId {
        let ticket = WorkId(self.issued);
        self.issued += 1;
        self.ordered.insert((rank, ticket), payload);
        self.rank_of.insert(ticket, rank);
        ticket
    }

    pub fn remove(&mut self, ticket: WorkId) -> Option<T> {
        let rank = self.rank_of.remove(&ticket)?;
        self.ordered.remove(&(rank, ticket))
    }

    pub fn contains(&self, ticket: WorkId) -> bool {
        self.rank_of.contains_key(&ticket)
    }

    /// Entries in the order they would leave.
    pub fn iter(&self) -> impl Iterator<Item = (WorkId, &T)> {
        self.ordered.iter().map(|(&(_, ticket), payload)| (ticket, payload))
    }

    pub fn pop(&mut self) -> Option<(WorkId, T)> {
        let ((_, ticket), payload) = self.ordered.pop_first()?;
        self.rank_of.remove(&ticket);
        Some((ticket, payload))
    }

    /// Like [`pop`](Self::pop), but each entry first claims a slot of
    /// `budget`. Nothing leaves once the budget is spent.
    pub fn pop_within(&mut self, budget: &mut FrameBudget) -> Option<(WorkId, T)> {
        if self.is_empty() || !budget.take_slot() {
            return None;
        }
        self.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::WorkQueue;
    use crate::budget::FrameBudget;

    fn drain(q: &mut WorkQueue<&'static str>) -> Vec<&'static str> {
        std::iter::from_fn(|| q.pop().map(|(_, v)| v)).collect()
    }

    #[test]
    fn rank_then_arrival() {
        let mut q = WorkQueue::new();
        q.push(2, "fine-a");
        q.push(0, "coarse");
        q.push(2, "fine-b");
        q.push(1, "middle");
        assert_eq!(drain(&mut q), vec!["coarse", "middle", "fine-a", "fine-b"]);
    }

    #[test]
    fn withdrawn_entries_leave_the_rest_in_order() {
        let mut q = WorkQueue::new();
        q.push(0, "a");
        let b = q.push(0, "b");
        q.push(1, "c");
        assert_eq!(q.remove(b), Some("b"));
        assert_eq!(q.remove(b), None);
        assert!(!q.contains(b));
        assert_eq!(q.iter().map(|(_, v)| *v).collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn budget_caps_what_leaves() {
        let mut q = WorkQueue::new();
        for name in ["a", "b", "c"] {
            q.push(0, name);
        }
        let mut budget = FrameBudget::from_slots(2, 0);
        assert!(q.pop_within(&mut budget).is_some());
        assert!(q.pop_within(&mut budget).is_some());
        assert!(q.pop_within(&mut budget).is_none());
        assert_eq!(q.len(), 1);

        // An empty queue does not use up the budget.
        let mut budget = FrameBudget::from_slots(1, 0);
        q.pop();
        assert!(q.pop_within(&mut budget).is_none());
        assert_eq!(budget.free(), 1);
    }
}
