use crate::gesture::KeyEvent;
use anyhow::{Context, Result};
use evdev::{Device, EventType, Key};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Event-code → key-index map built from the configured keycodes.
pub fn keymap(keycodes: &[u16]) -> HashMap<u16, usize> {
    keycodes
        .iter()
        .enumerate()
        .map(|(index, code)| (*code, index))
        .collect()
}

/// Find the control surface under /dev/input/.
///
/// A key matrix qualifies when it reports every mapped keycode but is not a
/// full keyboard (macro pads expose a handful of codes, keyboards expose the
/// whole letter block).
pub fn find_keypad(keycodes: &[u16]) -> Result<PathBuf> {
    let input_dir = Path::new("/dev/input");

    for entry in std::fs::read_dir(input_dir).context("reading /dev/input")? {
        let entry = entry?;
        let path = entry.path();

        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if !name.starts_with("event") {
            continue;
        }

        match Device::open(&path) {
            Ok(device) => {
                if is_keypad(&device, keycodes) {
                    info!(path = %path.display(), name = ?device.name(), "found key matrix");
                    return Ok(path);
                }
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping device");
            }
        }
    }

    anyhow::bail!(
        "no key matrix found — set [input] device in the config, or check permissions \
         (group 'input' or udev rules)"
    )
}

fn is_keypad(device: &Device, keycodes: &[u16]) -> bool {
    let Some(keys) = device.supported_keys() else {
        return false;
    };
    keycodes.iter().all(|code| keys.contains(Key::new(*code)))
        && !keys.contains(Key::KEY_A)
}

/// Grab the device and forward mapped press/release transitions to the
/// channel. Runs until the receiver is dropped or the device errors.
pub async fn read_events(
    path: PathBuf,
    keymap: HashMap<u16, usize>,
    tx: mpsc::UnboundedSender<KeyEvent>,
) -> Result<()> {
    let mut device =
        Device::open(&path).with_context(|| format!("opening {}", path.display()))?;

    let device_name = device.name().unwrap_or("unknown").to_string();
    info!(device = %device_name, path = %path.display(), "grabbing key matrix");

    // Exclusive grab: key presses must not leak into the desktop session.
    device
        .grab()
        .with_context(|| format!("grabbing {}", path.display()))?;

    let mut stream = device
        .into_event_stream()
        .context("creating event stream")?;

    loop {
        match stream.next_event().await {
            Ok(event) => {
                if event.event_type() != EventType::KEY {
                    continue;
                }
                // 0=release, 1=press; autorepeat (2) carries no gesture
                // information.
                let pressed = match event.value() {
                    0 => false,
                    1 => true,
                    _ => continue,
                };
                let Some(&key) = keymap.get(&event.code()) else {
                    debug!(code = event.code(), "unmapped key code");
                    continue;
                };
                let sent = tx.send(KeyEvent {
                    key,
                    pressed,
                    timestamp: Instant::now(),
                });
                if sent.is_err() {
                    // Receiver dropped, shut down.
                    break;
                }
            }
            Err(e) => {
                warn!(device = %device_name, error = %e, "device error, stopping reader");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keymap_assigns_indices_in_order() {
        let map = keymap(&[2, 3, 4, 5]);
        assert_eq!(map.get(&2), Some(&0));
        assert_eq!(map.get(&5), Some(&3));
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn keymap_ignores_unlisted_codes() {
        let map = keymap(&[59, 60]);
        assert!(map.get(&2).is_none());
    }
}
