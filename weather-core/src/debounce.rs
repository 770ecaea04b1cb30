use std::{fmt, future::Future, time::Duration};

use tokio::{sync::mpsc, task::JoinHandle};

/// Coalesces rapid successive values so that only one which stayed unchanged
/// for a quiet period reaches the handler.
///
/// This only suppresses calls; a handler that already started runs to
/// completion even if newer values arrive meanwhile.
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> Clone for Debouncer<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl<T: Send + 'static> Debouncer<T> {
    /// Start the debouncing task on the current tokio runtime.
    ///
    /// When every `Debouncer` handle is dropped, a value still waiting out its
    /// quiet period is handed over immediately and the task ends.
    pub fn spawn<F, Fut>(quiet: Duration, handler: F) -> (Self, JoinHandle<()>)
    where
        F: Fn(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();

        let task = tokio::spawn(async move {
            while let Some(mut pending) = rx.recv().await {
                loop {
                    tokio::select! {
                        next = rx.recv() => match next {
                            Some(value) => pending = value,
                            None => {
                                tokio::spawn(handler(pending));
                                return;
                            }
                        },
                        _ = tokio::time::sleep(quiet) => {
                            tokio::spawn(handler(pending));
                            break;
                        }
                    }
                }
            }
        });

        (Self { tx }, task)
    }
}

impl<T> Debouncer<T> {
    /// Queue a value. Returns false once the task has stopped.
    pub fn push(&self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }
}
