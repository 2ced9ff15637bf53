use std::io::BufRead;
use std::thread;

use tokio::sync::mpsc;
use tracing::{info, warn};

use common::EngineCommand;

/// Forward operator commands typed on stdin (`off`, `status`).
///
/// Reads on a plain OS thread: a pending stdin read cannot be cancelled, and
/// on a runtime blocking thread it would hold runtime shutdown until Enter.
/// The thread is detached and dies with the process.
pub fn spawn_stdin_listener(command_tx: mpsc::Sender<EngineCommand>) -> thread::JoinHandle<()> {
    spawn_listener(std::io::BufReader::new(std::io::stdin()), command_tx)
}

/// Run [`listen`] over `reader` on its own thread.
pub fn spawn_listener<R>(reader: R, command_tx: mpsc::Sender<EngineCommand>) -> thread::JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || listen(reader, command_tx))
}

/// Line-oriented command reader. Blocking; returns at EOF, on a read error,
/// or once the scheduler has dropped its receiver.
pub fn listen<R: BufRead>(reader: R, command_tx: mpsc::Sender<EngineCommand>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Console read failed, command listener stopping");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match EngineCommand::parse(&line) {
            Some(cmd) => {
                info!(command = ?cmd, "Console command");
                if command_tx.blocking_send(cmd).is_err() {
                    break;
                }
            }
            None => warn!(input = %line.trim(), "Unknown console command (try 'off' or 'status')"),
        }
    }
    info!("Console command listener finished");
}

#[cfg(test)]
mod tests {
    use std::io::{BufReader, Read};
    use std::time::Duration;

    use super::*;

    /// A reader that never returns, like a terminal nobody types into.
    struct Silent;

    impl Read for Silent {
        fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
            loop {
                thread::park();
            }
        }
    }

    #[test]
    fn parses_lines_and_skips_noise() {
        let input: &[u8] = b"hello\n\nStatus\n  OFF  \n";
        let (tx, mut rx) = mpsc::channel(8);
        listen(input, tx);

        assert_eq!(rx.blocking_recv(), Some(EngineCommand::Summary));
        assert_eq!(rx.blocking_recv(), Some(EngineCommand::Stop));
        assert_eq!(rx.blocking_recv(), None);
    }

    #[test]
    fn listener_thread_forwards_commands() {
        let (tx, mut rx) = mpsc::channel(8);
        let handle = spawn_listener(&b"/status\noff\n"[..], tx);
        handle.join().unwrap();

        assert_eq!(rx.blocking_recv(), Some(EngineCommand::Summary));
        assert_eq!(rx.blocking_recv(), Some(EngineCommand::Stop));
        assert_eq!(rx.blocking_recv(), None);
    }

    #[test]
    fn stops_once_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        listen(&b"off\nstatus\n"[..], tx);
    }

    #[test]
    fn blocked_reader_does_not_hold_runtime_shutdown() {
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (tx, _rx) = mpsc::channel(1);
            rt.block_on(async {
                let _listener = spawn_listener(BufReader::new(Silent), tx);
                tokio::time::sleep(Duration::from_millis(50)).await;
            });
            drop(rt);
            let _ = done_tx.send(());
        });

        assert!(
            done_rx.recv_timeout(Duration::from_secs(5)).is_ok(),
            "runtime drop waited on the console reader"
        );
    }
}
