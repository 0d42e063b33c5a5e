//! Time-ordered event queue driving the simulation loop.
//! This module exists to give the scheduler a stable `(rank, index)` ordering with an
//! explicit binary heap, independent of any container's insertion-order guarantees.
//! It does not own what events do when they fire; dispatch lives in `engine`.

use crate::types::{MonsterId, MonsterStatus, PlayerStatus, Pos};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SimpleAction {
    PlayerTurn,
    StatusEnd(PlayerStatus),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MonsterAction {
    Turn,
    StatusEnd(MonsterStatus),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CloudAction {
    FogEnd,
    FireProgression,
    WallCollapse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventPayload {
    Simple(SimpleAction),
    Monster { id: MonsterId, action: MonsterAction },
    Cloud { pos: Pos, action: CloudAction },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Event {
    pub rank: i32,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(rank: i32, payload: EventPayload) -> Self {
        Self { rank, payload }
    }
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    event: Event,
    index: u64,
}

impl Entry {
    fn key(&self) -> (i32, u64) {
        (self.event.rank, self.index)
    }
}

/// Binary min-heap keyed by `(rank, index)`.
///
/// Indices are assigned from 1 at push time. Index 0 is reserved for
/// same-tick continuations so they run before every other event sharing
/// their rank. Continuations sharing a rank tie on the full key; their
/// relative order follows the heap layout, not push order.
#[derive(Clone, Debug)]
pub struct EventQueue {
    heap: Vec<Entry>,
    next_index: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self { heap: Vec::new(), next_index: 1 }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn push(&mut self, event: Event) {
        let index = self.next_index;
        self.next_index += 1;
        self.insert(Entry { event, index });
    }

    /// Re-queues `event` at its current rank ahead of every same-rank peer.
    pub fn push_again(&mut self, event: Event) {
        self.insert(Entry { event, index: 0 });
    }

    /// Reschedules `event` `delay` ticks later. A zero delay means the same
    /// actor acts again within the current tick.
    pub fn renew(&mut self, mut event: Event, delay: i32) {
        if delay > 0 {
            event.rank += delay;
            self.push(event);
        } else {
            self.push_again(event);
        }
    }

    pub fn pop_min(&mut self) -> Option<Event> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        let entry = self.heap.pop()?;
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some(entry.event)
    }

    pub fn peek_rank(&self) -> Option<i32> {
        self.heap.first().map(|entry| entry.event.rank)
    }

    /// Queued events with their indices, in heap storage order.
    pub fn entries(&self) -> impl Iterator<Item = (&Event, u64)> {
        self.heap.iter().map(|entry| (&entry.event, entry.index))
    }

    fn insert(&mut self, entry: Entry) {
        self.heap.push(entry);
        let last = self.heap.len() - 1;
        self.sift_up(last);
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.heap[i].key() >= self.heap[parent].key() {
                break;
            }
            self.heap.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let n = self.heap.len();
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            let mut smallest = i;
            if left < n && self.heap[left].key() < self.heap[smallest].key() {
                smallest = left;
            }
            if right < n && self.heap[right].key() < self.heap[smallest].key() {
                smallest = right;
            }
            if smallest == i {
                break;
            }
            self.heap.swap(i, smallest);
            i = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::types::PlayerStatus;

    fn status_event(rank: i32, status: PlayerStatus) -> Event {
        Event::new(rank, EventPayload::Simple(SimpleAction::StatusEnd(status)))
    }

    #[test]
    fn equal_ranks_pop_in_push_order() {
        let mut queue = EventQueue::new();
        let a = status_event(5, PlayerStatus::Slow);
        let b = status_event(5, PlayerStatus::Swift);
        let c = status_event(5, PlayerStatus::Dig);
        queue.push(a);
        queue.push(b);
        queue.push(c);

        assert_eq!(queue.pop_min(), Some(a));
        assert_eq!(queue.pop_min(), Some(b));
        assert_eq!(queue.pop_min(), Some(c));
        assert_eq!(queue.pop_min(), None);
    }

    #[test]
    fn zero_delay_renewal_runs_before_remaining_same_rank_events() {
        let mut queue = EventQueue::new();
        let a = status_event(5, PlayerStatus::Slow);
        let b = status_event(5, PlayerStatus::Swift);
        let c = status_event(5, PlayerStatus::Dig);
        queue.push(a);
        queue.push(b);
        queue.push(c);

        assert_eq!(queue.pop_min(), Some(a));
        let processing = queue.pop_min().expect("b is next");
        assert_eq!(processing, b);
        queue.renew(processing, 0);

        assert_eq!(queue.pop_min(), Some(b));
        assert_eq!(queue.pop_min(), Some(c));
    }

    #[test]
    fn same_rank_continuations_precede_pushed_events_in_a_fixed_order() {
        let build = || {
            let mut queue = EventQueue::new();
            queue.push(status_event(5, PlayerStatus::Dig));
            queue.push_again(status_event(5, PlayerStatus::Slow));
            queue.push_again(status_event(5, PlayerStatus::Swift));
            queue.push_again(status_event(5, PlayerStatus::Shadows));
            queue
        };
        let drain = |mut queue: EventQueue| {
            let mut popped = Vec::new();
            while let Some(event) = queue.pop_min() {
                popped.push(event);
            }
            popped
        };

        let first = drain(build());
        assert_eq!(first.len(), 4);
        assert_eq!(first[3], status_event(5, PlayerStatus::Dig), "pushed event runs last");
        let continuations: BTreeSet<_> = first[..3]
            .iter()
            .map(|event| match event.payload {
                EventPayload::Simple(SimpleAction::StatusEnd(status)) => status,
                other => panic!("unexpected payload {other:?}"),
            })
            .collect();
        assert_eq!(
            continuations,
            BTreeSet::from([PlayerStatus::Slow, PlayerStatus::Swift, PlayerStatus::Shadows])
        );
        assert_eq!(drain(build()), first, "tie order is reproducible");
    }

    #[test]
    fn positive_delay_renewal_goes_behind_later_pushes() {
        let mut queue = EventQueue::new();
        let a = status_event(5, PlayerStatus::Slow);
        let late = status_event(8, PlayerStatus::Swift);
        queue.push(a);
        queue.push(late);

        let popped = queue.pop_min().expect("a pops first");
        queue.renew(popped, 3);

        assert_eq!(queue.pop_min(), Some(late));
        assert_eq!(queue.pop_min(), Some(Event { rank: 8, ..a }));
    }

    #[test]
    fn heap_orders_many_ranks() {
        let mut queue = EventQueue::new();
        let ranks = [30, 4, 17, 4, 0, 99, 12, 12, 3, 58, 1, 17];
        for rank in ranks {
            queue.push(status_event(rank, PlayerStatus::Shadows));
        }
        let mut popped = Vec::new();
        while let Some(event) = queue.pop_min() {
            popped.push(event.rank);
        }
        let mut sorted = ranks.to_vec();
        sorted.sort_unstable();
        assert_eq!(popped, sorted);
        assert!(queue.is_empty());
    }
}
