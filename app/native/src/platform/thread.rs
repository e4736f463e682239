use std::io;
use std::thread::{self, JoinHandle};

use crate::constants::APP_NAME;

/// Spawns a thread named `daywall-{name}` and returns its handle.
///
/// # Errors
///
/// Returns the OS error if the thread could not be created.
pub fn spawn_named_thread<F, T>(name: &str, task: F) -> io::Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let thread_name = format!("{APP_NAME}-{name}");

    thread::Builder::new().name(thread_name.clone()).spawn(task).inspect_err(|err| {
        tracing::error!(thread = %thread_name, error = %err, "failed to spawn thread");
    })
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::channel;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_spawn_named_thread_returns_result() {
        let handle = spawn_named_thread("answer", || 42).unwrap();
        assert_eq!(handle.join().unwrap(), 42);
    }

    #[test]
    fn test_spawn_named_thread_uses_app_prefix() {
        let (tx, rx) = channel();

        let handle = spawn_named_thread("job-1234", move || {
            let name = thread::current().name().unwrap_or("").to_string();
            tx.send(name).unwrap();
        })
        .unwrap();

        let thread_name = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(thread_name, "daywall-job-1234");
        handle.join().unwrap();
    }

    #[test]
    fn test_spawn_named_thread_runs_concurrently() {
        let (tx1, rx1) = channel();
        let (tx2, rx2) = channel();

        let first = spawn_named_thread("concurrent-1", move || {
            thread::sleep(Duration::from_millis(50));
            tx1.send(1).unwrap();
        })
        .unwrap();
        let second = spawn_named_thread("concurrent-2", move || {
            thread::sleep(Duration::from_millis(50));
            tx2.send(2).unwrap();
        })
        .unwrap();

        assert_eq!(rx1.recv_timeout(Duration::from_secs(1)).unwrap(), 1);
        assert_eq!(rx2.recv_timeout(Duration::from_secs(1)).unwrap(), 2);
        first.join().unwrap();
        second.join().unwrap();
    }
}
