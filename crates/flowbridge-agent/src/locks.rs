// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation turn ordering.
//!
//! Each conversation id keeps the tail of a queue of turns. [`reserve`]
//! appends a turn synchronously, so the order of reservations is the order
//! in which turns run: a [`TurnTicket`] only becomes a [`ConversationGuard`]
//! once the turn reserved before it has finished. Entries are removed once
//! the last reserved turn is done.
//!
//! [`reserve`]: ConversationLocks::reserve

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use flowbridge_core::ConversationId;
use tokio::sync::oneshot;

/// Completion signal of the most recently reserved turn of a conversation.
struct Tail {
    seq: u64,
    done: oneshot::Receiver<()>,
}

/// Registry of per-conversation turn queues.
#[derive(Default)]
pub struct ConversationLocks {
    tails: Arc<DashMap<ConversationId, Tail>>,
    next_seq: AtomicU64,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the next place in `id`'s queue without waiting.
    pub fn reserve(&self, id: &ConversationId) -> TurnTicket {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let (done_tx, done_rx) = oneshot::channel();
        let previous = self
            .tails
            .insert(id.clone(), Tail { seq, done: done_rx })
            .map(|tail| tail.done);
        TurnTicket {
            id: id.clone(),
            seq,
            previous,
            _done: done_tx,
            tails: Arc::clone(&self.tails),
        }
    }

    /// Reserves a place and waits for it.
    pub async fn acquire(&self, id: &ConversationId) -> ConversationGuard {
        self.reserve(id).acquire().await
    }

    /// Number of conversations with a turn running or queued.
    pub fn active(&self) -> usize {
        self.tails.len()
    }
}

/// A reserved place in a conversation's turn queue.
///
/// Dropping the ticket lets the turn reserved after it proceed, so a ticket
/// should be acquired before any other work in its turn.
pub struct TurnTicket {
    id: ConversationId,
    seq: u64,
    previous: Option<oneshot::Receiver<()>>,
    // Dropped with the ticket, which wakes the next turn.
    _done: oneshot::Sender<()>,
    tails: Arc<DashMap<ConversationId, Tail>>,
}

impl TurnTicket {
    /// Waits until every turn reserved earlier for this conversation is done.
    pub async fn acquire(mut self) -> ConversationGuard {
        if let Some(previous) = self.previous.take() {
            // The sender is never used; its drop is the signal.
            let _ = previous.await;
        }
        ConversationGuard { _ticket: self }
    }
}

impl Drop for TurnTicket {
    fn drop(&mut self) {
        self.tails.remove_if(&self.id, |_, tail| tail.seq == self.seq);
    }
}

/// Exclusive access to one conversation, released on drop.
pub struct ConversationGuard {
    _ticket: TurnTicket,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn same_conversation_is_serialized() {
        let locks = Arc::new(ConversationLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));
        let id = ConversationId("whatsapp:1".into());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(&id).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn turns_run_in_reservation_order() {
        let locks = ConversationLocks::new();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let id = ConversationId("whatsapp:1".into());

        let tickets: Vec<_> = (0..10).map(|i| (i, locks.reserve(&id))).collect();
        // Spawned last-first, so scheduling alone would favour late tickets.
        let mut handles = Vec::new();
        for (i, ticket) in tickets.into_iter().rev() {
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                let _guard = ticket.acquire().await;
                tokio::time::sleep(Duration::from_millis(1)).await;
                order.lock().unwrap().push(i);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn dropped_ticket_releases_next_turn() {
        let locks = ConversationLocks::new();
        let id = ConversationId("whatsapp:1".into());

        let first = locks.reserve(&id);
        let second = locks.reserve(&id);
        drop(first);

        let guard = tokio::time::timeout(Duration::from_millis(100), second.acquire()).await;
        assert!(guard.is_ok());
    }

    #[tokio::test]
    async fn different_conversations_do_not_block() {
        let locks = ConversationLocks::new();
        let _a = locks.acquire(&ConversationId("a".into())).await;
        let b = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(&ConversationId("b".into())),
        )
        .await;
        assert!(b.is_ok());
        assert_eq!(locks.active(), 2);
    }
}
