use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use restorekit_domain::{DispatcherConfig, RestoreKitError, Result};
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::request::{
    DispatchFailure, DispatchRequest, DispatchResponse, ErrorReceiver, FailureCause,
    LogErrorReceiver, RequestExecutor,
};

struct Queued {
    id: u64,
    request: DispatchRequest,
}

/// State shared between the dispatcher handle and its workers
struct Shared {
    executor: Arc<dyn RequestExecutor>,
    error_receiver: RwLock<Arc<dyn ErrorReceiver>>,
    queue: Mutex<VecDeque<Queued>>,
    /// One permit per free queue slot.
    slots: Semaphore,
    available: Notify,
    idle: Notify,
    /// Requests enqueued but not yet fully handled.
    outstanding: AtomicUsize,
    min_interval: Duration,
}

struct Pool {
    cancel: CancellationToken,
    workers: Vec<JoinHandle<()>>,
}

/// Bounded LIFO request queue drained by a lazily started worker pool
pub struct AsyncRequestDispatcher {
    shared: Arc<Shared>,
    pool: Mutex<Pool>,
    concurrent_workers: usize,
    next_id: AtomicU64,
}

impl AsyncRequestDispatcher {
    /// # Errors
    /// Returns `RestoreKitError::Config` when `config` has no workers, no
    /// queue capacity, or a request rate that is not a positive number.
    pub fn new(executor: Arc<dyn RequestExecutor>, config: &DispatcherConfig) -> Result<Self> {
        config.validate()?;
        let concurrent_workers = config.concurrent_workers;
        let capacity = config.queue_capacity.min(Semaphore::MAX_PERMITS);
        Ok(Self {
            shared: Arc::new(Shared {
                executor,
                error_receiver: RwLock::new(Arc::new(LogErrorReceiver)),
                queue: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
                slots: Semaphore::new(capacity),
                available: Notify::new(),
                idle: Notify::new(),
                outstanding: AtomicUsize::new(0),
                min_interval: config.min_request_interval(),
            }),
            pool: Mutex::new(Pool { cancel: CancellationToken::new(), workers: Vec::new() }),
            concurrent_workers,
            next_id: AtomicU64::new(1),
        })
    }

    /// Replace the receiver used for failures without a per-request handler.
    pub fn set_error_receiver(&self, receiver: Arc<dyn ErrorReceiver>) {
        *self.shared.error_receiver.write() = receiver;
    }

    /// Dispatch `request`.
    ///
    /// With `force_sync` the request runs inline and its outcome is returned
    /// directly. Otherwise it is queued and `Ok(None)` comes back at once;
    /// when the queue is full this waits for a free slot.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn request(
        &self,
        request: DispatchRequest,
        force_sync: bool,
    ) -> Result<Option<DispatchResponse>> {
        if force_sync {
            return self.shared.executor.execute(&request).await.map(Some);
        }

        let permit = self
            .shared
            .slots
            .acquire()
            .await
            .map_err(|_| RestoreKitError::Internal("dispatch queue closed".into()))?;
        permit.forget();

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        {
            // Enqueue and start under the pool lock so a concurrent stop
            // cannot leave this request without workers.
            let mut pool = self.pool.lock();
            self.shared.outstanding.fetch_add(1, Ordering::SeqCst);
            self.shared.queue.lock().push_back(Queued { id, request });
            self.start_workers(&mut pool);
        }
        self.shared.available.notify_one();
        debug!(request_id = id, "request queued");
        Ok(None)
    }

    /// Number of requests waiting in the queue (not counting in-flight ones).
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().len()
    }

    pub fn is_running(&self) -> bool {
        !self.pool.lock().workers.is_empty()
    }

    /// Wait until every queued request has been handled, then stop the
    /// workers. A later request starts a fresh pool.
    #[instrument(skip(self))]
    pub async fn wait(&self) {
        loop {
            self.wait_idle().await;
            self.stop_workers().await;

            let drained = {
                let mut pool = self.pool.lock();
                let drained = self.shared.outstanding.load(Ordering::SeqCst) == 0;
                if !drained {
                    // A request slipped in while the workers were stopping.
                    self.start_workers(&mut pool);
                }
                drained
            };
            if drained {
                break;
            }
        }
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.shared.outstanding.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Stop the workers and drop every request still in the queue.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        self.stop_workers().await;

        let dropped: Vec<Queued> = self.shared.queue.lock().drain(..).collect();
        if !dropped.is_empty() {
            warn!(dropped = dropped.len(), "dropping unexecuted requests");
            self.shared.slots.add_permits(dropped.len());
            self.shared.outstanding.fetch_sub(dropped.len(), Ordering::SeqCst);
            self.shared.idle.notify_waiters();
        }
    }

    fn start_workers(&self, pool: &mut Pool) {
        if !pool.workers.is_empty() {
            return;
        }

        pool.cancel = CancellationToken::new();
        for worker in 0..self.concurrent_workers {
            let shared = Arc::clone(&self.shared);
            let cancel = pool.cancel.clone();
            pool.workers.push(tokio::spawn(worker_loop(worker, shared, cancel)));
        }
        info!(workers = self.concurrent_workers, "dispatcher workers started");
    }

    async fn stop_workers(&self) {
        let workers = {
            let mut pool = self.pool.lock();
            pool.cancel.cancel();
            std::mem::take(&mut pool.workers)
        };
        if workers.is_empty() {
            return;
        }

        for handle in workers {
            if let Err(e) = handle.await {
                error!(error = %e, "dispatcher worker terminated abnormally");
            }
        }
        info!("dispatcher workers stopped");
    }
}

impl Drop for AsyncRequestDispatcher {
    fn drop(&mut self) {
        self.pool.get_mut().cancel.cancel();
    }
}

async fn worker_loop(worker: usize, shared: Arc<Shared>, cancel: CancellationToken) {
    debug!(worker, "dispatcher worker running");
    loop {
        if cancel.is_cancelled() {
            break;
        }

        let next = shared.queue.lock().pop_back();
        let Some(queued) = next else {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = shared.available.notified() => {}
            }
            continue;
        };
        shared.slots.add_permits(1);

        let started = Instant::now();
        run_one(&shared, queued).await;
        if shared.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            shared.idle.notify_waiters();
        }

        let elapsed = started.elapsed();
        if elapsed < shared.min_interval {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(shared.min_interval - elapsed) => {}
            }
        }
    }
    debug!(worker, "dispatcher worker exiting");
}

async fn run_one(shared: &Shared, queued: Queued) {
    let Queued { id, request } = queued;
    let outcome = AssertUnwindSafe(shared.executor.execute(&request)).catch_unwind().await;

    let cause = match outcome {
        Ok(Ok(response)) => {
            debug!(request_id = id, status = response.status, "dispatched request completed");
            return;
        }
        Ok(Err(err)) => FailureCause::Error(err),
        Err(payload) => FailureCause::Panic(panic_message(payload.as_ref())),
    };

    let failure = DispatchFailure {
        request_id: id,
        method: request.method.clone(),
        path: request.path.clone(),
        cause,
    };
    let handler = request.on_error.clone().unwrap_or_else(|| shared.error_receiver.read().clone());

    if let Err(payload) =
        std::panic::catch_unwind(AssertUnwindSafe(|| handler.on_error(&failure)))
    {
        error!(
            request_id = id,
            panic = %panic_message(payload.as_ref()),
            "error handler panicked"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_messages_are_extracted() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
