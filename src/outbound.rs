//! Per-connection outbound queue.
//!
//! WebSocket frames from concurrent producers must not interleave on the
//! socket, so each connection has exactly one writer task consuming this
//! queue. Producers never block: when the queue is full the oldest pending
//! EVENT frame is evicted, so a slow reader loses history instead of
//! stalling the hub. OK, EOSE, and NOTICE frames are never dropped.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;

use crate::frame::RelayFrame;

#[derive(Clone)]
pub struct Outbound {
    inner: Arc<Shared>,
}

struct Shared {
    queue: Mutex<VecDeque<RelayFrame>>,
    notify: Notify,
    closed: AtomicBool,
    capacity: usize,
}

impl Outbound {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Shared {
                queue: Mutex::new(VecDeque::new()),
                notify: Notify::new(),
                closed: AtomicBool::new(false),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Enqueue a frame, evicting the oldest pending EVENT frame when the
    /// queue is at capacity.
    pub fn push(&self, frame: RelayFrame) {
        {
            let mut queue = self.lock();
            if queue.len() >= self.inner.capacity {
                if let Some(pos) = queue
                    .iter()
                    .position(|f| matches!(f, RelayFrame::Event { .. }))
                {
                    queue.remove(pos);
                    tracing::debug!("outbound queue full, dropped oldest pending event");
                }
            }
            queue.push_back(frame);
        }
        self.inner.notify.notify_one();
    }

    /// Dequeue the next frame, waiting if the queue is empty.
    /// Returns `None` once the queue is closed and drained.
    pub async fn pop(&self) -> Option<RelayFrame> {
        loop {
            {
                let mut queue = self.lock();
                if let Some(frame) = queue.pop_front() {
                    return Some(frame);
                }
                if self.inner.closed.load(Ordering::Acquire) {
                    return None;
                }
            }
            self.inner.notify.notified().await;
        }
    }

    /// Stop the writer once pending frames are drained.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.notify.notify_one();
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<RelayFrame>> {
        self.inner.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}
