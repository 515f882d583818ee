// ── Shared loading indicator ──
//
// A counter, not a flag: overlapping calls each hold one unit, and the UI
// treats `count > 0` as busy. Only `RequestClient` drives it; everything
// else observes.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::warn;

/// Cloneable handle to the process-wide in-flight request counter.
#[derive(Debug, Clone)]
pub struct LoadingSignal {
    counter: Arc<watch::Sender<usize>>,
}

impl Default for LoadingSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadingSignal {
    pub fn new() -> Self {
        let (counter, _) = watch::channel(0);
        Self {
            counter: Arc::new(counter),
        }
    }

    pub fn increment(&self) {
        self.counter.send_modify(|count| *count += 1);
    }

    /// Pairing is the caller's job; an unpaired decrement saturates at zero.
    pub fn decrement(&self) {
        self.counter.send_modify(|count| {
            if *count == 0 {
                warn!("loading counter decremented below zero; ignoring");
            } else {
                *count -= 1;
            }
        });
    }

    /// Increment now and decrement exactly once when the guard drops.
    pub fn begin(&self) -> LoadingGuard {
        self.increment();
        LoadingGuard {
            signal: self.clone(),
        }
    }

    pub fn count(&self) -> usize {
        *self.counter.borrow()
    }

    pub fn is_busy(&self) -> bool {
        self.count() > 0
    }

    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.counter.subscribe()
    }

    /// Resolve once nothing is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|count| *count == 0).await;
    }

    /// Stream of busy/idle transitions, starting with the current state.
    pub fn busy_stream(&self) -> BusyStream {
        BusyStream {
            inner: WatchStream::new(self.subscribe()),
            last: None,
        }
    }
}

/// Holds one unit of the loading counter.
#[must_use = "dropping the guard ends the loading span immediately"]
#[derive(Debug)]
pub struct LoadingGuard {
    signal: LoadingSignal,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.signal.decrement();
    }
}

/// `Stream` adapter yielding `true`/`false` each time busy-ness flips.
pub struct BusyStream {
    inner: WatchStream<usize>,
    last: Option<bool>,
}

impl Stream for BusyStream {
    type Item = bool;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(count)) => {
                    let busy = count > 0;
                    if self.last != Some(busy) {
                        self.last = Some(busy);
                        return Poll::Ready(Some(busy));
                    }
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[test]
    fn overlapping_guards_count_up_and_down() {
        let signal = LoadingSignal::new();
        let a = signal.begin();
        let b = signal.begin();
        assert_eq!(signal.count(), 2);
        assert!(signal.is_busy());

        drop(a);
        assert_eq!(signal.count(), 1);
        drop(b);
        assert_eq!(signal.count(), 0);
        assert!(!signal.is_busy());
    }

    #[test]
    fn decrement_never_goes_negative() {
        let signal = LoadingSignal::new();
        signal.decrement();
        assert_eq!(signal.count(), 0);
    }

    #[test]
    fn clones_share_the_counter() {
        let signal = LoadingSignal::new();
        let observer = signal.clone();
        let _guard = signal.begin();
        assert_eq!(observer.count(), 1);
    }

    #[tokio::test]
    async fn wait_idle_resolves_after_last_guard() {
        let signal = LoadingSignal::new();
        let guard = signal.begin();
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.wait_idle().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(guard);
        assert!(waiter.await.is_ok());
    }

    #[tokio::test]
    async fn busy_stream_reports_transitions() {
        let signal = LoadingSignal::new();
        let mut stream = signal.busy_stream();
        assert_eq!(stream.next().await, Some(false));

        let guard = signal.begin();
        assert_eq!(stream.next().await, Some(true));
        drop(guard);
        assert_eq!(stream.next().await, Some(false));
    }
}
