//! Cooperative single-threaded REPL over stdin, dispatching worker commands
//! to a `Supervisor`.
//!
//! Grounded on `ConsoleManager._run_console_loop`: a command error increments
//! a consecutive-error counter; at 10 in a row the loop pauses briefly and
//! resets, rather than spinning or aborting. A successful command resets the
//! counter immediately. EOF on stdin ends the loop cleanly.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use crate::supervisor::Supervisor;
use crate::types::WorkerKind;

const MAX_CONSECUTIVE_ERRORS: u32 = 10;
const ERROR_PAUSE: Duration = Duration::from_secs(2);

fn print_help() {
    println!("commands (noun first, verb second):");
    println!("  <worker>                      toggle: start if down, stop if up");
    println!("  <worker> on|start|true|1      start and set enabled=true");
    println!("  <worker> off|stop|false|0     stop and set enabled=false");
    println!("  <worker> status               show process state, enabled, autorun, pid");
    println!("  <worker> autorun [true|false] show or set whether it starts at boot");
    println!("  status                        show every worker's state");
    println!("  help                          show this message");
    println!("  quit                          exit the console");
    println!("workers: web, chat_bot, chat_watcher, backup, websocket_hub");
}

fn print_status_line(status: &crate::types::WorkerStatus) {
    println!(
        "{:<13} state={:?} enabled={} autorun={} pid={:?} last_exit={:?}",
        status.kind.label(),
        status.state,
        status.enabled_persisted,
        status.autorun_persisted,
        status.pid,
        status.last_exit_code
    );
}

async fn dispatch(supervisor: &mut Supervisor, line: &str) -> Result<(), String> {
    let mut parts = line.split_whitespace();
    let first = match parts.next() {
        Some(token) => token,
        None => return Ok(()),
    };

    match first {
        "help" => {
            print_help();
            return Ok(());
        }
        "status" => {
            for status in supervisor.status_all() {
                print_status_line(&status);
            }
            return Ok(());
        }
        _ => {}
    }

    // Noun-first grammar: `<worker> [verb [arg]]`.
    let kind: WorkerKind = first.parse().map_err(|bad| format!("unknown worker '{bad}'"))?;
    match parts.next() {
        None => {
            supervisor.toggle(kind).await.map_err(|e| e.to_string())?;
            Ok(())
        }
        Some("on") | Some("start") | Some("true") | Some("1") => {
            supervisor.start(kind).await.map_err(|e| e.to_string())
        }
        Some("off") | Some("stop") | Some("false") | Some("0") => {
            supervisor.stop(kind).await.map_err(|e| e.to_string())
        }
        Some("status") => {
            print_status_line(&supervisor.status(kind));
            Ok(())
        }
        Some("autorun") => {
            let setting = match parts.next() {
                Some("true") | Some("on") => Some(true),
                Some("false") | Some("off") => Some(false),
                Some(other) => return Err(format!("expected 'true' or 'false', got '{other}'")),
                None => None,
            };
            let current = supervisor.autorun(kind, setting).map_err(|e| e.to_string())?;
            println!("autorun[{}] = {current}", kind.label());
            Ok(())
        }
        Some(other) => Err(format!("unknown verb '{other}' for worker '{kind}', try 'help'")),
    }
}

/// Runs the console loop until stdin closes or `quit` is entered.
pub async fn run(mut supervisor: Supervisor) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut consecutive_errors: u32 = 0;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("console stdin closed, exiting");
                break;
            }
            Err(e) => {
                error!(error = %e, "console stdin read error, exiting");
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            info!("console quit requested");
            break;
        }
        if trimmed.is_empty() {
            continue;
        }

        match dispatch(&mut supervisor, trimmed).await {
            Ok(()) => {
                consecutive_errors = 0;
            }
            Err(message) => {
                println!("error: {message}");
                consecutive_errors += 1;
                if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    error!("{MAX_CONSECUTIVE_ERRORS} consecutive command errors, pausing");
                    tokio::time::sleep(ERROR_PAUSE).await;
                    consecutive_errors = 0;
                }
            }
        }
    }
}
