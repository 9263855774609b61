// ── Reactive slice streams ──
//
// Subscription handle over one entity slice, for consumers that prefer
// `changed()` or a `Stream` to raw `watch` receivers.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::SliceState;

/// A subscription to one entity slice.
pub struct SliceStream<E: Clone + Send + Sync + 'static> {
    current: SliceState<E>,
    receiver: watch::Receiver<SliceState<E>>,
}

impl<E: Clone + Send + Sync + 'static> SliceStream<E> {
    pub(crate) fn new(receiver: watch::Receiver<SliceState<E>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// State captured at creation or at the last `changed()`.
    pub fn current(&self) -> &SliceState<E> {
        &self.current
    }

    /// Latest state, which may be newer than `current()`.
    pub fn latest(&self) -> SliceState<E> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change. `None` once the store is dropped.
    pub async fn changed(&mut self) -> Option<SliceState<E>> {
        self.receiver.changed().await.ok()?;
        let state = self.receiver.borrow_and_update().clone();
        self.current = state.clone();
        Some(state)
    }

    pub fn into_stream(self) -> SliceWatchStream<E> {
        SliceWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding each new slice state.
pub struct SliceWatchStream<E: Clone + Send + Sync + 'static> {
    inner: WatchStream<SliceState<E>>,
}

impl<E: Clone + Send + Sync + 'static> Stream for SliceWatchStream<E> {
    type Item = SliceState<E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
