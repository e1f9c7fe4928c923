use std::sync::Arc;

use crate::subscription::SubscriptionError;

pub type NextFn<T> = Arc<dyn Fn(&T) + Send + Sync + 'static>;
pub type ErrorFn = Arc<dyn Fn(&SubscriptionError) + Send + Sync + 'static>;

/// Set of optional sinks a caller hands to a listener.
///
/// Both halves are reference counted so a listener can clone the sinks out of its registry
/// and call them after releasing any lock it holds.
pub struct PartialObserver<T> {
    pub next: Option<NextFn<T>>,
    pub error: Option<ErrorFn>,
}

impl<T> PartialObserver<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_next<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.next = Some(Arc::new(callback));
        self
    }

    pub fn with_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SubscriptionError) + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(callback));
        self
    }

    pub fn notify_next(&self, value: &T) {
        if let Some(next) = &self.next {
            next(value);
        }
    }

    pub fn notify_error(&self, error: &SubscriptionError) {
        if let Some(callback) = &self.error {
            callback(error);
        }
    }
}

impl<T> Clone for PartialObserver<T> {
    fn clone(&self) -> Self {
        Self {
            next: self.next.clone(),
            error: self.error.clone(),
        }
    }
}

impl<T> Default for PartialObserver<T> {
    fn default() -> Self {
        Self {
            next: None,
            error: None,
        }
    }
}

/// Ends a live listener. Invoked at most once.
pub type Unsubscribe = Box<dyn FnOnce() + Send + 'static>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::error::stream_failed;
    use std::sync::Mutex;

    #[test]
    fn sinks_are_optional() {
        let observer = PartialObserver::<u32>::new();
        observer.notify_next(&1);
        observer.notify_error(&stream_failed("ignored"));
    }

    #[test]
    fn clones_share_callbacks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let observer = PartialObserver::new().with_next(move |value: &u32| {
            captured.lock().unwrap().push(*value);
        });
        let copy = observer.clone();

        observer.notify_next(&1);
        copy.notify_next(&2);

        assert_eq!(seen.lock().unwrap().as_slice(), &[1, 2]);
    }
}
