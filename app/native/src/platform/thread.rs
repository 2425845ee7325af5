use std::io;
use std::thread::{self, JoinHandle, Scope, ScopedJoinHandle};

/// Prefix given to every thread spawned by huewall.
const THREAD_PREFIX: &str = "huewall";

#[must_use]
pub fn thread_name(name: &str) -> String { format!("{THREAD_PREFIX}-{name}") }

/// Spawns a detached named thread, logging instead of failing when the OS
/// refuses to create it.
pub fn spawn_named_thread<F>(name: &str, task: F) -> Option<JoinHandle<()>>
where F: FnOnce() + Send + 'static {
    let thread_name = thread_name(name);

    match thread::Builder::new().name(thread_name.clone()).spawn(task) {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::error!(thread = %thread_name, error = %err, "failed to spawn thread");
            None
        }
    }
}

/// Spawns a named thread inside `scope`, so it may borrow from the caller.
///
/// # Errors
///
/// Returns an error if the operating system refuses to create the thread.
pub fn spawn_named_scoped<'scope, 'env, F, T>(
    scope: &'scope Scope<'scope, 'env>,
    name: &str,
    task: F,
) -> io::Result<ScopedJoinHandle<'scope, T>>
where
    F: FnOnce() -> T + Send + 'scope,
    T: Send + 'scope,
{
    let thread_name = thread_name(name);
    thread::Builder::new().name(thread_name.clone()).spawn_scoped(scope, task).inspect_err(|err| {
        tracing::error!(thread = %thread_name, error = %err, "failed to spawn thread");
    })
}
