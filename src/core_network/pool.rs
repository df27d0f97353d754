use crate::core_error::FtpError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Fixed number of workers shared by every session. A command only runs while it
/// holds one of them.
#[derive(Clone, Debug)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(size)),
        }
    }

    /// Waits for a free worker and runs `task` on it.
    pub async fn execute<F>(&self, task: F) -> Result<F::Output, FtpError>
    where
        F: Future,
    {
        let _worker = self
            .permits
            .acquire()
            .await
            .map_err(|_| FtpError::PoolClosed)?;
        Ok(task.await)
    }

    #[cfg(test)]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn close(&self) {
        self.permits.close();
    }
}
