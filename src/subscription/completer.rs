use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};

use futures::channel::oneshot;

use crate::subscription::error::{cancelled, SubscriptionError, SubscriptionResult};

/// Write half of a one-shot result cell.
///
/// The first call to [`Completer::complete`] or [`Completer::reject`] settles the paired
/// [`Completion`]; every later call is ignored and returns `false`.
#[derive(Debug)]
pub struct Completer<T> {
    sender: Mutex<Option<oneshot::Sender<SubscriptionResult<T>>>>,
}

/// Read half of a one-shot result cell. Resolves once with the settled result.
///
/// If the [`Completer`] is dropped without being settled the future yields a
/// `subscription/cancelled` error.
#[derive(Debug)]
#[must_use = "a completion does nothing unless awaited"]
pub struct Completion<T> {
    receiver: oneshot::Receiver<SubscriptionResult<T>>,
}

impl<T> Completer<T> {
    pub fn new() -> (Completer<T>, Completion<T>) {
        let (sender, receiver) = oneshot::channel();
        (
            Completer {
                sender: Mutex::new(Some(sender)),
            },
            Completion { receiver },
        )
    }

    pub fn complete(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    pub fn reject(&self, error: SubscriptionError) -> bool {
        self.settle(Err(error))
    }

    pub fn is_completed(&self) -> bool {
        self.sender.lock().unwrap().is_none()
    }

    fn settle(&self, result: SubscriptionResult<T>) -> bool {
        let sender = self.sender.lock().unwrap().take();
        match sender {
            Some(sender) => {
                // The reader may already be gone; the cell still counts as settled.
                let _ = sender.send(result);
                true
            }
            None => false,
        }
    }
}

impl<T> Future for Completion<T> {
    type Output = SubscriptionResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(cancelled(
                "Subscription was torn down before a value was delivered",
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}
