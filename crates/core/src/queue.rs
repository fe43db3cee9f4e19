use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::error;

/// Bounded-concurrency runner. With `concurrency == 1` each task completes
/// before the next one starts, in input order.
#[derive(Debug, Clone)]
pub struct WorkQueue {
    concurrency: usize,
}

impl WorkQueue {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn sequential() -> Self {
        Self::new(1)
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs `task` over every input and returns `(index, output)` pairs in
    /// input order. A panicking task is logged and left out.
    pub async fn run<T, R, F, Fut>(&self, inputs: Vec<T>, task: F) -> Vec<(usize, R)>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(usize, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let task = Arc::new(task);
        let mut set = JoinSet::new();

        for (index, input) in inputs.into_iter().enumerate() {
            // Taking the permit before spawning keeps start order == input order.
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => break,
            };
            let task = task.clone();
            set.spawn(async move {
                let out = task(index, input).await;
                drop(permit);
                (index, out)
            });
        }

        let mut results = Vec::with_capacity(set.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(pair) => results.push(pair),
                Err(e) => error!(error = %e, "queued task aborted"),
            }
        }
        results.sort_by_key(|(index, _)| *index);
        results
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::sequential()
    }
}
