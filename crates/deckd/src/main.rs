mod display;
mod gesture;
mod handlers;
mod input;
mod registry;
mod scene;

use anyhow::{Context, Result};
use deckd_core::config::{self, Config};
use deckd_core::handler::Command;
use deckd_core::ipc::{self, ClientMsg, DaemonMsg};
use display::{LogSurface, ScreenState};
use gesture::{Action, GestureDetector, KeyEvent};
use registry::Registry;
use scene::SceneCoordinator;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

/// Shared state between the event loop and the IPC handlers.
struct Shared {
    coordinator: SceneCoordinator,
    detector: GestureDetector,
    screen: ScreenState,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("deckd=info".parse().unwrap()),
        )
        .init();

    info!("deckd starting");

    let config = Config::load().context("loading config")?;

    // Scene build happens before any device is touched: an unknown handler
    // type is fatal here.
    let registry = Registry::with_builtins();
    let scenes = registry
        .build_scenes(&config)
        .context("building scenes")?;
    info!(
        scenes = scenes.len(),
        keys = config.general.keys,
        "scenes built"
    );

    let surface: Arc<dyn deckd_core::surface::Surface> = Arc::new(LogSurface);
    let (command_tx, mut command_rx) = mpsc::unbounded_channel::<Command>();

    let screen = ScreenState::new(surface.clone(), config.general.brightness);
    let detector = GestureDetector::new(
        config.general.keys,
        config.double_click_interval(),
        config.long_press_interval(),
    );
    let mut coordinator = SceneCoordinator::new(scenes, surface, command_tx.clone());
    coordinator.start();

    let shared = Arc::new(Mutex::new(Shared {
        coordinator,
        detector,
        screen,
    }));

    // Key event reader
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<KeyEvent>();
    let device_path = match &config.input.device {
        Some(path) => path.clone(),
        None => input::find_keypad(&config.input.keycodes).context("finding key matrix")?,
    };
    let keymap = input::keymap(&config.input.keycodes);
    {
        let device_path = device_path.clone();
        tokio::spawn(async move {
            if let Err(e) = input::read_events(device_path.clone(), keymap, event_tx).await {
                error!(path = %device_path.display(), error = %e, "input reader failed");
            }
        });
    }

    // Admin IPC listener
    let socket_path = config::socket_path();
    let _ = std::fs::remove_file(&socket_path);
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let listener = UnixListener::bind(&socket_path)
        .with_context(|| format!("binding socket {}", socket_path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o666)).ok();
    }
    info!(path = %socket_path.display(), "IPC socket listening");

    {
        let shared = Arc::clone(&shared);
        let command_tx = command_tx.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, _)) => {
                        tokio::spawn(handle_ipc_client(
                            stream,
                            Arc::clone(&shared),
                            command_tx.clone(),
                        ));
                    }
                    Err(e) => {
                        warn!(error = %e, "IPC accept error");
                    }
                }
            }
        });
    }

    // Main event loop: event-driven timers (no idle wakeups)
    loop {
        let deadline = { shared.lock().await.detector.next_deadline() };
        let sleep_fut = match deadline {
            Some(dl) => tokio::time::sleep_until(tokio::time::Instant::from_std(dl)),
            None => tokio::time::sleep_until(
                tokio::time::Instant::now() + std::time::Duration::from_secs(86400),
            ),
        };
        let has_deadline = deadline.is_some();

        tokio::select! {
            Some(event) = event_rx.recv() => {
                let mut shared = shared.lock().await;
                if shared.screen.is_off() {
                    // The panel is dark: the first release only wakes it,
                    // nothing is dispatched.
                    if !event.pressed {
                        shared.screen.wake();
                    }
                    continue;
                }
                let actions = shared.detector.handle_event(event);
                apply_actions(&mut shared, actions);
            }
            Some(command) = command_rx.recv() => {
                let mut shared = shared.lock().await;
                match command {
                    Command::AdvanceScene(delta) => {
                        shared.detector.cancel_all();
                        shared.coordinator.advance(delta);
                    }
                    Command::ActivateScene(index) => {
                        shared.detector.cancel_all();
                        shared.coordinator.activate(index);
                    }
                    Command::SetBrightness(level) => shared.screen.apply(level),
                    Command::Shutdown => break,
                }
            }
            _ = sleep_fut, if has_deadline => {
                let mut shared = shared.lock().await;
                let actions = shared.detector.check_timers(std::time::Instant::now());
                if !actions.is_empty() {
                    apply_actions(&mut shared, actions);
                }
            }
            else => break,
        }
    }

    info!("deckd shutting down");
    shared.lock().await.coordinator.shutdown();
    let _ = std::fs::remove_file(&socket_path);
    Ok(())
}

fn apply_actions(shared: &mut Shared, actions: Vec<Action>) {
    for action in actions {
        match action {
            Action::Dispatch { key, gesture } => shared.coordinator.dispatch(key, gesture),
            Action::Redraw { key, pressed } => shared.coordinator.redraw(key, pressed),
        }
    }
}

async fn handle_ipc_client(
    stream: UnixStream,
    shared: Arc<Mutex<Shared>>,
    command_tx: mpsc::UnboundedSender<Command>,
) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let Some(msg) = ipc::decode_client(&line) else {
            continue;
        };

        let reply = match msg {
            ClientMsg::Advance { delta } => {
                info!(delta, "scene advance via IPC");
                let _ = command_tx.send(Command::AdvanceScene(delta));
                DaemonMsg::Ack {
                    ok: true,
                    message: format!("advancing by {}", delta),
                }
            }
            ClientMsg::Activate { index } => {
                info!(index, "scene activate via IPC");
                let _ = command_tx.send(Command::ActivateScene(index));
                DaemonMsg::Ack {
                    ok: true,
                    message: format!("activating scene {}", index),
                }
            }
            ClientMsg::SetBrightness { level } => {
                info!(level, "brightness via IPC");
                let _ = command_tx.send(Command::SetBrightness(level));
                DaemonMsg::Ack {
                    ok: true,
                    message: format!("brightness {}", level),
                }
            }
            ClientMsg::GetStatus => {
                let shared = shared.lock().await;
                DaemonMsg::Status {
                    scene: shared.coordinator.current_scene(),
                    scenes: shared.coordinator.scene_count(),
                    brightness: shared.screen.brightness(),
                    screen_off: shared.screen.is_off(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                }
            }
            ClientMsg::Shutdown => {
                info!("shutdown via IPC");
                let _ = command_tx.send(Command::Shutdown);
                DaemonMsg::Ack {
                    ok: true,
                    message: "shutting down".into(),
                }
            }
        };

        if writer.write_all(ipc::encode(&reply).as_bytes()).await.is_err() {
            break;
        }
    }
}
