//! Scoped worker pool used for every full-grid sweep.
//!
//! A pool is created per call: all jobs are queued on an unbounded channel,
//! `workers` threads drain it, and the call returns once every thread has
//! joined. Jobs may borrow from the caller's stack because the threads are
//! scoped to the call.

/// Runs `work` on every job using up to `workers` threads and blocks until all
/// jobs are done. Jobs are taken in queue order but finish in no particular
/// order.
///
/// `workers == 0` is treated as 1. No more threads are spawned than there are
/// jobs.
pub(crate) fn fan_out<I, F>(workers: usize, jobs: I, work: F)
where
    I: IntoIterator,
    I::Item: Send,
    F: Fn(I::Item) + Sync,
{
    let (sender, receiver) = crossbeam_channel::unbounded();
    for job in jobs {
        // the receiver is alive until the end of this function
        let _ = sender.send(job);
    }
    // closing the channel lets workers stop once the queue is empty
    drop(sender);

    let workers = workers.clamp(1, receiver.len().max(1));
    let (receiver, work) = (&receiver, &work);
    std::thread::scope(|s| {
        for _ in 0..workers {
            s.spawn(move || {
                for job in receiver.iter() {
                    work(job);
                }
            });
        }
    });
}
