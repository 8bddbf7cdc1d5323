// Batch classification over a tokio worker pool.
//
// A dispatcher task receives `ClassifyTask`s on one channel and deals them
// round-robin to a fixed set of workers. Each worker hands the CPU-bound decode
// and classification to the blocking pool and answers on the task's oneshot
// channel. `SnowPipeline` holds no per-call state, so all workers share one
// behind an `Arc`.

use crate::error::PoolError;
use crate::pipeline::{ClassificationResult, SnowPipeline};
use futures::future::join_all;
use log::{debug, error};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// A camera snapshot awaiting classification.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Display name of the camera, used for logging only.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Snapshot {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }
}

pub struct ClassifyTask {
    pub snapshot: Snapshot,
    pub result_sender: oneshot::Sender<ClassificationResult>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<ClassifyTask>,
    dispatcher: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `size` workers (at least one). Must be called inside a tokio runtime.
    pub fn new(pipeline: Arc<SnowPipeline>, size: usize) -> Self {
        let size = size.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<ClassifyTask>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) =
            (0..size).map(|_| mpsc::unbounded_channel::<ClassifyTask>()).unzip();

        let dispatcher = tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if worker_senders[worker_idx].send(task).is_err() {
                    error!("snow worker {worker_idx} is gone; dropping task");
                }
                worker_idx = (worker_idx + 1) % worker_senders.len();
            }
        });

        let workers = worker_receivers
            .into_iter()
            .enumerate()
            .map(|(worker_id, mut worker_receiver)| {
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move {
                    while let Some(task) = worker_receiver.recv().await {
                        let ClassifyTask { snapshot, result_sender } = task;
                        debug!("worker {worker_id} classifying {}", snapshot.name);

                        let pipeline = Arc::clone(&pipeline);
                        let classified = tokio::task::spawn_blocking(move || pipeline.classify(&snapshot.bytes)).await;

                        match classified {
                            Ok(result) => {
                                let _ = result_sender.send(result);
                            }
                            Err(err) => error!("worker {worker_id} lost a classification: {err}"),
                        }
                    }
                })
            })
            .collect();

        Self {
            task_sender,
            dispatcher,
            workers,
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub async fn classify(&self, snapshot: Snapshot) -> Result<ClassificationResult, PoolError> {
        let (result_sender, result_receiver) = oneshot::channel();

        let task = ClassifyTask {
            snapshot,
            result_sender,
        };

        self.task_sender.send(task).map_err(|_| PoolError::Closed)?;

        result_receiver.await.map_err(|_| PoolError::WorkerDropped)
    }

    /// Stops accepting work and waits for queued tasks to drain.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        let _ = self.dispatcher.await;
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

/// Classifies many snapshots concurrently with a shared configuration.
pub struct ParallelPipeline {
    pipeline: Arc<SnowPipeline>,
    worker_pool: WorkerPool,
}

impl ParallelPipeline {
    /// One worker per logical CPU.
    pub fn new(pipeline: SnowPipeline) -> Self {
        Self::with_workers(pipeline, num_cpus::get())
    }

    pub fn with_workers(pipeline: SnowPipeline, workers: usize) -> Self {
        let pipeline = Arc::new(pipeline);
        let worker_pool = WorkerPool::new(Arc::clone(&pipeline), workers);
        Self { pipeline, worker_pool }
    }

    pub fn pipeline(&self) -> &SnowPipeline {
        &self.pipeline
    }

    pub fn workers(&self) -> usize {
        self.worker_pool.size()
    }

    pub async fn classify(&self, snapshot: Snapshot) -> Result<ClassificationResult, PoolError> {
        self.worker_pool.classify(snapshot).await
    }

    /// Classifies every snapshot; results come back in input order.
    pub async fn classify_batch(&self, snapshots: Vec<Snapshot>) -> Vec<Result<ClassificationResult, PoolError>> {
        join_all(snapshots.into_iter().map(|snapshot| self.classify(snapshot))).await
    }

    pub async fn shutdown(self) {
        self.worker_pool.shutdown().await;
    }
}
