use std::{future::Future, panic, sync::OnceLock, thread};

use tokio::runtime::{Builder, Handle, Runtime, RuntimeFlavor};

fn runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();

    RUNTIME.get_or_init(|| {
        Builder::new_multi_thread()
            .enable_all()
            .thread_name("bucketfs-io")
            .build()
            .expect("failed to build tokio runtime")
    })
}

/// Drives `future` to completion from synchronous code.
///
/// Inside a multi-thread tokio runtime the current worker is handed over with
/// `block_in_place`. A current-thread runtime cannot give up its only worker,
/// so the future runs on the shared background runtime from a scoped thread.
/// Outside any runtime the shared runtime is used directly.
pub fn poll_until_ready<Fut>(future: Fut) -> Fut::Output
where
    Fut: Future + Send,
    Fut::Output: Send,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| handle.block_on(future))
        }
        Ok(_) => thread::scope(|scope| {
            scope
                .spawn(|| runtime().block_on(future))
                .join()
                .unwrap_or_else(|err| panic::resume_unwind(err))
        }),
        Err(_) => runtime().block_on(future),
    }
}
