use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deckd_core::config;
use deckd_core::ipc::{self, ClientMsg, DaemonMsg};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;

#[derive(Parser)]
#[command(name = "deckctl", about = "Control the deckd daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show daemon status
    Status,
    /// Switch to the next scene
    Next,
    /// Switch to the previous scene
    Prev,
    /// Jump to a scene by index
    Goto {
        /// Scene index (wraps into range)
        index: usize,
    },
    /// Set panel brightness
    Brightness {
        /// Level 0-100; 0 turns the screen off
        level: u8,
    },
    /// Turn the screen on
    On,
    /// Turn the screen off
    Off,
    /// Stop the daemon
    Shutdown,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let socket_path = config::socket_path();
    let stream = UnixStream::connect(&socket_path).with_context(|| {
        format!(
            "connecting to deckd at {}\nIs the daemon running?",
            socket_path.display()
        )
    })?;

    let mut writer = stream.try_clone().context("cloning stream")?;
    let reader = BufReader::new(stream);

    let msg: ClientMsg = match cli.command {
        Command::Status => ClientMsg::GetStatus,
        Command::Next => ClientMsg::Advance { delta: 1 },
        Command::Prev => ClientMsg::Advance { delta: -1 },
        Command::Goto { index } => ClientMsg::Activate { index },
        Command::Brightness { level } => ClientMsg::SetBrightness { level },
        Command::On => ClientMsg::SetBrightness { level: 60 },
        Command::Off => ClientMsg::SetBrightness { level: 0 },
        Command::Shutdown => ClientMsg::Shutdown,
    };

    let line = ipc::encode(&msg);
    writer
        .write_all(line.as_bytes())
        .context("sending command")?;

    // Read response
    for line in reader.lines() {
        let line = line.context("reading response")?;
        if let Some(resp) = ipc::decode_daemon(&line) {
            match resp {
                DaemonMsg::Status {
                    scene,
                    scenes,
                    brightness,
                    screen_off,
                    version,
                } => {
                    println!("deckd v{}", version);
                    println!("  scene:      {} of {}", scene + 1, scenes);
                    println!("  brightness: {}", brightness);
                    println!("  screen:     {}", if screen_off { "off" } else { "on" });
                }
                DaemonMsg::Ack { ok, message } => {
                    if ok {
                        println!("{}", message);
                    } else {
                        eprintln!("error: {}", message);
                        std::process::exit(1);
                    }
                }
            }
            break;
        }
    }

    Ok(())
}
