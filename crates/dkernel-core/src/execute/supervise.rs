//! Child process supervision.
//!
//! Output of both pipes is read line by line on reader tasks and forwarded
//! through one channel, so the caller sees chunks in arrival order. The child
//! is killed when the phase deadline passes or an interrupt arrives.

use std::process::ExitStatus;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::InterruptHandle;
use crate::error::{Error, Phase, Result};
use crate::frontend::StreamName;

/// How long to keep reading after the child exited. Pipes inherited by
/// grandchildren may never close.
const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Wait for `child` to finish, forwarding its output to `on_output`.
pub(crate) async fn supervise<F>(
    mut child: Child,
    phase: Phase,
    timeout: Option<Duration>,
    interrupt: &InterruptHandle,
    mut on_output: F,
) -> Result<ExitStatus>
where
    F: FnMut(StreamName, String),
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(tokio::spawn(pump(stdout, StreamName::Stdout, tx.clone())));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(tokio::spawn(pump(stderr, StreamName::Stderr, tx.clone())));
    }
    drop(tx);

    let deadline = async {
        match timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let status = loop {
        tokio::select! {
            Some((name, text)) = rx.recv() => on_output(name, text),
            status = child.wait() => break status?,
            _ = &mut deadline => {
                tracing::debug!(%phase, "deadline reached, killing child");
                stop(&mut child, &readers).await;
                // `timeout` is always set when the deadline fires.
                return Err(Error::Timeout { phase, after: timeout.unwrap_or_default() });
            }
            _ = interrupt.interrupted() => {
                tracing::debug!(%phase, "interrupted, killing child");
                stop(&mut child, &readers).await;
                return Err(Error::Interrupted);
            }
        }
    };

    let drain = async {
        while let Some((name, text)) = rx.recv().await {
            on_output(name, text);
        }
    };
    if tokio::time::timeout(DRAIN_GRACE, drain).await.is_err() {
        tracing::warn!(%phase, "output pipes still open after exit, detaching");
        abort_all(&readers);
    }

    Ok(status)
}

async fn stop(child: &mut Child, readers: &[JoinHandle<()>]) {
    if let Err(e) = child.kill().await {
        tracing::warn!("failed to kill child process: {e}");
    }
    abort_all(readers);
}

fn abort_all(readers: &[JoinHandle<()>]) {
    for reader in readers {
        reader.abort();
    }
}

async fn pump<R>(pipe: R, name: StreamName, tx: mpsc::UnboundedSender<(StreamName, String)>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(pipe);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line).into_owned();
                if tx.send((name, text)).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!("error reading {}: {e}", name.as_str());
                break;
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Stdio;
    use tokio::process::Command;

    fn sh(script: &str) -> Child {
        Command::new("sh")
            .arg("-c")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .unwrap()
    }

    #[tokio::test]
    async fn test_collects_both_streams() {
        let child = sh("echo one; echo two >&2; printf three");
        let mut seen = Vec::new();
        let status = supervise(child, Phase::Run, None, &InterruptHandle::new(), |n, t| {
            seen.push((n, t))
        })
        .await
        .unwrap();

        assert!(status.success());
        let stdout: String = seen
            .iter()
            .filter(|(n, _)| *n == StreamName::Stdout)
            .map(|(_, t)| t.as_str())
            .collect();
        assert_eq!(stdout, "one\nthree");
        assert!(seen.contains(&(StreamName::Stderr, "two\n".to_string())));
    }

    #[tokio::test]
    async fn test_exit_code_reported() {
        let child = sh("exit 3");
        let status = supervise(child, Phase::Run, None, &InterruptHandle::new(), |_, _| {})
            .await
            .unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let child = sh("sleep 30");
        let started = std::time::Instant::now();
        let err = supervise(
            child,
            Phase::Compile,
            Some(Duration::from_millis(200)),
            &InterruptHandle::new(),
            |_, _| {},
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Timeout { phase: Phase::Compile, .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_interrupt_kills_child() {
        let child = sh("echo started; sleep 30");
        let interrupt = InterruptHandle::new();
        let remote = interrupt.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            remote.interrupt();
        });

        let err = supervise(child, Phase::Run, None, &interrupt, |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Interrupted));
    }
}
