use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::{DormancyOracle, OracleError};

type Answer = Result<bool, OracleError>;

struct Job {
    repo: String,
    date: NaiveDate,
    deadline: Instant,
    reply: Sender<Answer>,
}

/// Bounds every call of a shared oracle by `timeout`.
///
/// Calls are served by a fixed set of long-lived worker threads. A call that
/// times out keeps its worker busy until the backend returns; its answer is
/// discarded. Queued calls whose deadline has already passed are dropped
/// without reaching the backend, so a hung backend ties up at most `workers`
/// threads.
pub struct DeadlineOracle {
    jobs: Sender<Job>,
    timeout: Duration,
    workers: usize,
}

impl fmt::Debug for DeadlineOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeadlineOracle")
            .field("timeout", &self.timeout)
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

impl DeadlineOracle {
    /// One worker per available core.
    pub fn new<O>(inner: Arc<O>, timeout: Duration) -> Self
    where
        O: DormancyOracle + ?Sized + 'static,
    {
        let workers = thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        Self::with_workers(inner, timeout, workers)
    }

    pub fn with_workers<O>(inner: Arc<O>, timeout: Duration, workers: usize) -> Self
    where
        O: DormancyOracle + ?Sized + 'static,
    {
        let (jobs, queue) = mpsc::channel::<Job>();
        let queue = Arc::new(Mutex::new(queue));

        let mut spawned = 0;
        for i in 0..workers.max(1) {
            let inner = Arc::clone(&inner);
            let queue = Arc::clone(&queue);
            let started = thread::Builder::new()
                .name(format!("depchron-oracle-{i}"))
                .spawn(move || serve(inner.as_ref(), &queue));
            match started {
                Ok(_) => spawned += 1,
                Err(err) => warn!(%err, "failed to start oracle worker"),
            }
        }

        Self {
            jobs,
            timeout,
            workers: spawned,
        }
    }

    /// Number of worker threads that started.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }
}

fn serve<O>(inner: &O, queue: &Mutex<Receiver<Job>>)
where
    O: DormancyOracle + ?Sized,
{
    loop {
        let next = match queue.lock() {
            Ok(receiver) => receiver.recv(),
            Err(_) => return,
        };
        // Sender dropped: the oracle is gone.
        let Ok(job) = next else { return };

        if Instant::now() >= job.deadline {
            continue;
        }

        let answer = panic::catch_unwind(AssertUnwindSafe(|| inner.is_dormant(&job.repo, job.date)))
            .unwrap_or_else(|_| Err(OracleError::Unavailable("oracle backend panicked".to_string())));
        // The caller is gone if it already timed out.
        let _ = job.reply.send(answer);
    }
}

impl DormancyOracle for DeadlineOracle {
    fn is_dormant(&self, repo: &str, date: NaiveDate) -> Answer {
        if self.workers == 0 {
            return Err(OracleError::Unavailable("no oracle workers running".to_string()));
        }

        let (reply, answer) = mpsc::channel();
        let job = Job {
            repo: repo.to_string(),
            date,
            deadline: Instant::now() + self.timeout,
            reply,
        };
        self.jobs
            .send(job)
            .map_err(|_| OracleError::Unavailable("oracle workers exited".to_string()))?;

        match answer.recv_timeout(self.timeout) {
            Ok(answer) => answer,
            Err(RecvTimeoutError::Timeout) => {
                debug!(repo, %date, timeout = ?self.timeout, "oracle call abandoned");
                Err(OracleError::TimedOut(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(OracleError::TimedOut(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dormancy::NeverDormant;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Slow {
        delay: Duration,
        calls: AtomicUsize,
    }

    impl Slow {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl DormancyOracle for Slow {
        fn is_dormant(&self, _repo: &str, _date: NaiveDate) -> Result<bool, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            Ok(true)
        }
    }

    struct Panics;

    impl DormancyOracle for Panics {
        fn is_dormant(&self, _repo: &str, _date: NaiveDate) -> Result<bool, OracleError> {
            panic!("backend exploded");
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 6, 1).unwrap()
    }

    #[test]
    fn fast_answer_passes_through() {
        let oracle = DeadlineOracle::new(Arc::new(NeverDormant), Duration::from_secs(5));
        assert!(oracle.workers() >= 1);
        assert_eq!(oracle.is_dormant("o/r", day()), Ok(false));
        assert_eq!(oracle.is_dormant("o/r", day()), Ok(false));
    }

    #[test]
    fn slow_answer_times_out() {
        let timeout = Duration::from_millis(20);
        let slow = Arc::new(Slow::new(Duration::from_secs(2)));
        let oracle = DeadlineOracle::with_workers(slow, timeout, 1);
        assert_eq!(oracle.is_dormant("o/r", day()), Err(OracleError::TimedOut(timeout)));
    }

    #[test]
    fn hung_backend_does_not_fan_out() {
        let timeout = Duration::from_millis(10);
        let slow = Arc::new(Slow::new(Duration::from_millis(300)));
        let oracle = DeadlineOracle::with_workers(Arc::clone(&slow), timeout, 1);

        for _ in 0..10 {
            assert_eq!(oracle.is_dormant("o/r", day()), Err(OracleError::TimedOut(timeout)));
        }
        thread::sleep(Duration::from_millis(700));

        // The single worker ran the first call; every later call expired in
        // the queue while it was busy.
        assert_eq!(oracle.workers(), 1);
        assert!(slow.calls.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn panicking_backend_is_unavailable_and_worker_survives() {
        let oracle = DeadlineOracle::with_workers(Arc::new(Panics), Duration::from_secs(5), 1);
        for _ in 0..2 {
            assert!(matches!(
                oracle.is_dormant("o/r", day()),
                Err(OracleError::Unavailable(_))
            ));
        }
    }

    #[test]
    fn works_behind_a_trait_object() {
        let inner: Arc<dyn DormancyOracle> = Arc::new(NeverDormant);
        let oracle = DeadlineOracle::new(inner, Duration::from_secs(5));
        assert_eq!(oracle.is_dormant("o/r", day()), Ok(false));
    }
}
