use crate::libs::error::{ProtreeError, Result};
use log::warn;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative cancellation shared between a caller and a running job.
///
/// Checked between units of work only; a unit that has started runs to the end
/// and its result is discarded.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that cancels itself once `timeout` has elapsed.
    pub fn with_deadline(timeout: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::SeqCst) {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.flag.store(true, Ordering::SeqCst);
                true
            }
            _ => false,
        }
    }
}

/// Number of worker threads to use when the caller does not say.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Apply `work` to every input on a bounded pool of `parallel` threads.
///
/// Results come back in input order whatever the completion order.
/// The first failure (lowest input index) is returned and stops the feeding of
/// new units; a fired `cancel` token gives [`ProtreeError::Cancelled`].
pub fn run_indexed<I, T, F>(
    inputs: Vec<I>,
    parallel: usize,
    cancel: &CancelToken,
    work: F,
) -> Result<Vec<T>>
where
    I: Send,
    T: Send,
    F: Fn(I) -> Result<T> + Sync,
{
    let total = inputs.len();
    let parallel = parallel.clamp(1, total.max(1));
    let abort = AtomicBool::new(false);

    let mut slots: Vec<Option<T>> = (0..total).map(|_| None).collect();
    let mut first_error: Option<(usize, ProtreeError)> = None;

    // Channel 1 - Units of work
    let (snd_job, rcv_job) = crossbeam::channel::bounded::<(usize, I)>(parallel * 2);
    // Channel 2 - Results
    let (snd_res, rcv_res) = crossbeam::channel::bounded::<(usize, Result<T>)>(parallel * 2);

    let outcome = crossbeam::scope(|s| {
        let work = &work;
        let abort = &abort;

        //----------------------------
        // Feeder thread
        //----------------------------
        s.spawn(move |_| {
            for job in inputs.into_iter().enumerate() {
                if abort.load(Ordering::SeqCst) || cancel.is_cancelled() {
                    break;
                }
                if snd_job.send(job).is_err() {
                    break;
                }
            }
            // Closing the channel ends the workers' loops
            drop(snd_job);
        });

        //----------------------------
        // Worker threads
        //----------------------------
        for _ in 0..parallel {
            let (sendr, recvr) = (snd_res.clone(), rcv_job.clone());
            s.spawn(move |_| {
                for (idx, input) in recvr.iter() {
                    if abort.load(Ordering::SeqCst) || cancel.is_cancelled() {
                        break;
                    }
                    let result = work(input);
                    if result.is_err() {
                        abort.store(true, Ordering::SeqCst);
                    }
                    if sendr.send((idx, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(rcv_job);
        // Otherwise the collector never leaves its loop
        drop(snd_res);

        //----------------------------
        // Collector
        //----------------------------
        for (idx, result) in rcv_res.iter() {
            match result {
                Ok(value) => slots[idx] = Some(value),
                Err(err) => {
                    if first_error.as_ref().map_or(true, |(i, _)| idx < *i) {
                        first_error = Some((idx, err));
                    }
                }
            }
        }
    });
    if let Err(panic) = outcome {
        std::panic::resume_unwind(panic);
    }

    if let Some((_, err)) = first_error {
        return Err(err);
    }

    let done = slots.iter().filter(|s| s.is_some()).count();
    if done < total {
        warn!("Cancelled after {} of {} units", done, total);
        return Err(ProtreeError::Cancelled);
    }

    Ok(slots.into_iter().flatten().collect())
}
