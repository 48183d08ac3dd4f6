use serde::{Deserialize, Serialize};

/// Messages from daemon to admin clients (JSON-lines over Unix socket).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DaemonMsg {
    /// Status response.
    #[serde(rename = "status")]
    Status {
        /// Active scene index.
        scene: usize,
        /// Total scene count.
        scenes: usize,
        brightness: u8,
        screen_off: bool,
        version: String,
    },
    /// Acknowledgement for commands.
    #[serde(rename = "ack")]
    Ack { ok: bool, message: String },
}

/// Messages from admin clients to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMsg {
    /// Switch scenes by a relative delta (wraps in both directions).
    #[serde(rename = "advance")]
    Advance { delta: i64 },
    /// Jump to an absolute scene index.
    #[serde(rename = "activate")]
    Activate { index: usize },
    /// Set panel brightness 0-100; 0 turns the screen off.
    #[serde(rename = "set_brightness")]
    SetBrightness { level: u8 },
    /// Request current status.
    #[serde(rename = "get_status")]
    GetStatus,
    /// Stop the daemon.
    #[serde(rename = "shutdown")]
    Shutdown,
}

/// Serialize a message as a JSON line (with trailing newline).
pub fn encode(msg: &impl Serialize) -> String {
    let mut s = serde_json::to_string(msg).expect("serialize IPC message");
    s.push('\n');
    s
}

/// Deserialize a JSON line. Returns None on empty/whitespace input.
pub fn decode_daemon(line: &str) -> Option<DaemonMsg> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

pub fn decode_client(line: &str) -> Option<ClientMsg> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- encoded messages are single JSON lines ---

    #[test]
    fn encode_produces_single_trailing_newline() {
        let encoded = encode(&ClientMsg::GetStatus);
        assert!(encoded.ends_with('\n'));
        assert_eq!(encoded.matches('\n').count(), 1);
    }

    #[test]
    fn encoded_messages_carry_the_type_tag() {
        assert!(encode(&ClientMsg::Shutdown).contains("\"type\""));
        assert!(encode(&DaemonMsg::Ack {
            ok: true,
            message: "done".into(),
        })
        .contains("\"type\""));
    }

    // --- decoding ---

    #[test]
    fn client_msg_variants_round_trip() {
        for msg in [
            ClientMsg::Advance { delta: -1 },
            ClientMsg::Activate { index: 2 },
            ClientMsg::SetBrightness { level: 40 },
            ClientMsg::GetStatus,
            ClientMsg::Shutdown,
        ] {
            let encoded = encode(&msg);
            assert!(
                decode_client(&encoded).is_some(),
                "failed to round-trip: {:?}",
                msg
            );
        }
    }

    #[test]
    fn advance_keeps_negative_delta() {
        let decoded = decode_client(&encode(&ClientMsg::Advance { delta: -3 }));
        match decoded {
            Some(ClientMsg::Advance { delta }) => assert_eq!(delta, -3),
            other => panic!("expected Advance, got {:?}", other),
        }
    }

    #[test]
    fn status_round_trips() {
        let msg = DaemonMsg::Status {
            scene: 1,
            scenes: 3,
            brightness: 60,
            screen_off: false,
            version: "0.1.0".into(),
        };
        match decode_daemon(&encode(&msg)) {
            Some(DaemonMsg::Status {
                scene,
                scenes,
                brightness,
                screen_off,
                version,
            }) => {
                assert_eq!((scene, scenes, brightness, screen_off), (1, 3, 60, false));
                assert_eq!(version, "0.1.0");
            }
            other => panic!("expected Status, got {:?}", other),
        }
    }

    // --- empty or garbage input decodes to None, never panics ---

    #[test]
    fn decode_returns_none_for_empty_input() {
        assert!(decode_client("").is_none());
        assert!(decode_client("   \n").is_none());
        assert!(decode_daemon("\n").is_none());
    }

    #[test]
    fn decode_returns_none_for_garbage() {
        assert!(decode_client("not json").is_none());
        assert!(decode_client("{\"type\":\"unknown_variant\"}").is_none());
        assert!(decode_daemon("not json").is_none());
    }
}
