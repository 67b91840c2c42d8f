//! ripple-studio entry point.
//!
//! With no subcommand, runs the front end: a console-driven session whose
//! `run` / `stop` / `shrink` / `quit` commands stand in for clicks on the
//! workbench controls. `ripple-studio backend` runs the playback backend
//! the front end connects to.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use ripple_studio::animation::AnimationSignal;
use ripple_studio::channel::{self, SharedLink};
use ripple_studio::config;
use ripple_studio::editor::ScratchEditor;
use ripple_studio::hub::{NullHub, StrategyHub};
use ripple_studio::stage::{QUIT_BUTTON, RUN_BUTTON, SHRINK_BUTTON, STOP_BUTTON};
use ripple_studio::status::StatusCell;
use ripple_studio::workbench::Workbench;
use ripple_studio::{backend, logging};

/// Two-pane script workbench with a run/pause/stop output panel.
#[derive(Parser, Debug)]
#[command(name = "ripple-studio", version, about)]
struct Args {
    /// WebSocket endpoint of the playback backend (overrides config)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Config file path (defaults to ~/.config/ripple-studio/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run the playback backend process
    Backend {
        /// Listen address (overrides config)
        #[arg(short, long)]
        listen: Option<String>,

        /// Fraction of play requests the admission policy rejects
        #[arg(long)]
        reject_rate: Option<f64>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = logging::init();

    let config_path = args.config.clone().unwrap_or_else(config::config_path);
    config::ensure_default(&config_path);
    let config = config::load_or_default(&config_path);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create Tokio runtime")?;

    match args.command {
        Some(Cmd::Backend { listen, reject_rate }) => {
            let listen = listen.unwrap_or(config.backend.listen);
            let reject_rate = reject_rate.unwrap_or(config.backend.reject_rate);
            runtime.block_on(backend::serve(&listen, reject_rate))
        }
        None => {
            let endpoint = args.endpoint.unwrap_or(config.channel.endpoint);
            config::validate_endpoint(&endpoint)?;
            let reconnect = Duration::from_secs(config.channel.reconnect_secs);
            runtime.block_on(run_frontend(endpoint, reconnect))
        }
    }
}

/// The front-end session: one loop, one event at a time.
///
/// Everything that can wake the workbench (console lines, channel events,
/// animation signals, relayout frames) arrives through this `select!`, so
/// every dispatch runs to completion before the next is taken.
async fn run_frontend(endpoint: String, reconnect: Duration) -> Result<()> {
    println!("ripple-studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Backend endpoint: {endpoint}");
    println!("Commands: run, stop, shrink, quit, text <script>, submit <name>, strategies, status, exit");

    let handle = tokio::runtime::Handle::current();
    let (link, outbound, mut channel_rx) = channel::spawn_client(&handle, endpoint, reconnect);

    let status = StatusCell::new();
    let mut workbench = Workbench::new(outbound, status, Box::new(ScratchEditor::new()));
    let mut hub: Box<dyn StrategyHub> = Box::new(NullHub::new());

    // Animation lifecycle signals come back through this queue so they are
    // serialized with every other event source.
    let (anim_tx, mut anim_rx) = mpsc::unbounded_channel::<AnimationSignal>();
    let mut frames = tokio::time::interval(Duration::from_millis(16));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read console input")? else {
                    break; // EOF
                };
                if !handle_console_line(line.trim(), &mut workbench, &mut hub, &link) {
                    break;
                }
                pump_animations(&mut workbench, &anim_tx);
            }

            Some(event) = channel_rx.recv() => {
                workbench.channel_event(event);
                pump_animations(&mut workbench, &anim_tx);
            }

            Some(signal) = anim_rx.recv() => {
                workbench.animation_signal(&signal);
                pump_animations(&mut workbench, &anim_tx);
            }

            _ = frames.tick() => {
                workbench.relayout_frame();
            }
        }
    }

    info!(target: "frontend", "session ended");
    Ok(())
}

/// Hand freshly triggered animations to the host: the start signal is
/// queued immediately, the end signal after the animation's duration.
fn pump_animations(workbench: &mut Workbench, anim_tx: &mpsc::UnboundedSender<AnimationSignal>) {
    for request in workbench.take_animation_requests() {
        let _ = anim_tx.send(AnimationSignal::Started {
            element: request.element.clone(),
        });
        let tx = anim_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(request.animation.duration).await;
            let _ = tx.send(AnimationSignal::Ended {
                element: request.element,
            });
        });
    }
}

/// One console line. Returns `false` when the session should end.
fn handle_console_line(
    line: &str,
    workbench: &mut Workbench,
    hub: &mut Box<dyn StrategyHub>,
    link: &SharedLink,
) -> bool {
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word {
        "" => {}
        "run" => workbench.click(RUN_BUTTON),
        "stop" => workbench.click(STOP_BUTTON),
        "shrink" => workbench.click(SHRINK_BUTTON),
        "quit" => workbench.click(QUIT_BUTTON),
        "text" => workbench.set_editor_text(rest),
        "submit" => {
            if rest.is_empty() {
                println!("usage: submit <name>");
            } else {
                match hub.submit(rest, &workbench.editor_text()) {
                    Ok(()) => println!("submitted '{rest}'"),
                    Err(e) => println!("submit failed: {e:#}"),
                }
            }
        }
        "strategies" => match hub.list() {
            Ok(names) if names.is_empty() => println!("no strategies"),
            Ok(names) => {
                for name in names {
                    println!("  {name}");
                }
            }
            Err(e) => println!("list failed: {e:#}"),
        },
        "status" => {
            println!("window:   {:?}", workbench.window_state());
            println!("activity: {:?}", workbench.activity_state());
            println!("session:  {:?}", workbench.session_status());
            println!("channel:  {:?}", link.lock().unwrap().status);
        }
        "exit" => return false,
        other => println!("unknown command: {other}"),
    }

    true
}
