//! Single-thread task affinity.
//!
//! Some attachment operations are confined to one designated thread per
//! context (typically the host application's UI thread). An
//! [`AffinityExecutor`] owns that thread: callers check
//! [`is_current`](AffinityExecutor::is_current) and either run synchronously
//! or [`post`](AffinityExecutor::post) a fire-and-forget task. There is no
//! completion signal; posted tasks log their own failures.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use crossbeam_channel::Sender;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Executor bound to one dedicated, named thread.
///
/// The thread runs until every handle to the executor is dropped.
pub struct AffinityExecutor {
    tx: Sender<Task>,
    thread_id: ThreadId,
}

impl AffinityExecutor {
    /// Spawn the executor thread.
    pub fn spawn(label: &str) -> io::Result<Arc<Self>> {
        let (tx, rx) = crossbeam_channel::unbounded::<Task>();
        let handle = thread::Builder::new()
            .name(format!("affinity-{label}"))
            .spawn(move || {
                while let Ok(task) = rx.recv() {
                    task();
                }
            })?;
        let thread_id = handle.thread().id();
        Ok(Arc::new(Self { tx, thread_id }))
    }

    /// `true` when the caller is already on the executor thread.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Queue a task on the executor thread and return immediately.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        if self.tx.send(Box::new(task)).is_err() {
            tracing::warn!("Affinity thread is gone; dropping posted task");
        }
    }
}

impl fmt::Debug for AffinityExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AffinityExecutor")
            .field("thread_id", &self.thread_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_tasks_run_on_the_executor_thread() {
        let executor = AffinityExecutor::spawn("test").unwrap();
        let (tx, rx) = mpsc::channel();

        assert!(!executor.is_current());

        let on_thread = Arc::clone(&executor);
        executor.post(move || {
            tx.send(on_thread.is_current()).unwrap();
        });

        assert!(rx.recv().unwrap());
    }

    #[test]
    fn test_tasks_run_in_post_order() {
        let executor = AffinityExecutor::spawn("order").unwrap();
        let (tx, rx) = mpsc::channel();

        for i in 0..4 {
            let tx = tx.clone();
            executor.post(move || {
                tx.send(i).unwrap();
            });
        }

        let got: Vec<i32> = (0..4).map(|_| rx.recv().unwrap()).collect();
        assert_eq!(got, vec![0, 1, 2, 3]);
    }
}
