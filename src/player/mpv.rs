//! mpv media element
//!
//! Spawns mpv idle with a JSON IPC socket, then drives it with `loadfile`,
//! `set_property` and `seek` commands. `time-pos`, `duration` and `pause`
//! are observed and turned into [`MediaEvent`]s.
//!
//! Sources are queued as a playlist, so mpv moves on to the next one when a
//! source fails to open.

use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use super::{MediaElement, MediaEvent, PlayerError};

const OBSERVE_TIME_POS: u64 = 1;
const OBSERVE_DURATION: u64 = 2;
const OBSERVE_PAUSE: u64 = 3;

/// How long to wait for mpv to create its socket
const CONNECT_ATTEMPTS: u32 = 30;
const CONNECT_INTERVAL: Duration = Duration::from_millis(100);

/// Running mpv process plus its IPC channel
pub struct MpvElement {
    child: Child,
    socket_path: PathBuf,
    commands: mpsc::UnboundedSender<Value>,
    request_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for MpvElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MpvElement")
            .field("socket_path", &self.socket_path)
            .finish()
    }
}

impl MpvElement {
    /// Spawn `program` and connect to it; events are sent to `events`
    pub async fn spawn(
        program: &str,
        events: mpsc::UnboundedSender<MediaEvent>,
    ) -> Result<Self, PlayerError> {
        let socket_path =
            std::env::temp_dir().join(format!("flixtui-mpv-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&socket_path);

        let mut cmd = Command::new(program);
        cmd.arg(format!("--input-ipc-server={}", socket_path.display()))
            .arg("--idle=yes")
            .arg("--force-window=immediate")
            .arg("--keep-open=no")
            .arg("--osc=yes")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        tracing::info!(program, socket = %socket_path.display(), "starting mpv");
        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlayerError::NotFound(program.to_string())
            } else {
                PlayerError::StartFailed(e)
            }
        })?;

        let stream = connect(&socket_path).await?;
        let (read_half, mut write_half) = stream.into_split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Value>();

        tokio::spawn(async move {
            while let Some(cmd) = rx.recv().await {
                let mut line = cmd.to_string();
                line.push('\n');
                if let Err(e) = write_half.write_all(line.as_bytes()).await {
                    tracing::warn!(error = %e, "mpv IPC write failed");
                    break;
                }
            }
        });

        let reader_tx = tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(read_half).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let Ok(msg) = serde_json::from_str::<Value>(&line) else {
                            continue;
                        };
                        if let Some(event) = translate(&msg) {
                            if event == MediaEvent::Ended {
                                // Drop the rest of the fallback playlist
                                let _ = reader_tx.send(json!({ "command": ["stop"] }));
                            }
                            if events.send(event).is_err() {
                                break;
                            }
                        } else if msg["event"] == "end-file" && msg["reason"] == "error" {
                            tracing::warn!("mpv could not open source, trying next");
                        }
                    }
                    Ok(None) | Err(_) => {
                        tracing::debug!("mpv IPC closed");
                        let _ = events.send(MediaEvent::Ended);
                        break;
                    }
                }
            }
        });

        let element = Self {
            child,
            socket_path,
            commands: tx,
            request_id: Arc::new(AtomicU64::new(1)),
        };
        element.observe(OBSERVE_TIME_POS, "time-pos")?;
        element.observe(OBSERVE_DURATION, "duration")?;
        element.observe(OBSERVE_PAUSE, "pause")?;
        Ok(element)
    }

    fn send(&self, args: Value) -> Result<(), PlayerError> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        self.commands
            .send(json!({ "command": args, "request_id": id }))
            .map_err(|_| PlayerError::Closed)
    }

    fn observe(&self, id: u64, property: &str) -> Result<(), PlayerError> {
        self.send(json!(["observe_property", id, property]))
    }

    fn set_property(&self, name: &str, value: Value) -> Result<(), PlayerError> {
        self.send(json!(["set_property", name, value]))
    }

    /// Wait for mpv to exit
    pub async fn wait(&mut self) -> Result<(), PlayerError> {
        self.child.wait().await?;
        Ok(())
    }
}

impl MediaElement for MpvElement {
    fn load(&mut self, sources: &[String], start: f64) -> Result<(), PlayerError> {
        let (first, rest) = sources.split_first().ok_or(PlayerError::NoSource)?;
        self.set_property("start", json!(format!("{}", start)))?;
        self.send(json!(["loadfile", first, "replace"]))?;
        for source in rest {
            self.send(json!(["loadfile", source, "append"]))?;
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        self.set_property("pause", json!(false))
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        self.set_property("pause", json!(true))
    }

    fn seek(&mut self, seconds: f64) -> Result<(), PlayerError> {
        self.send(json!(["seek", seconds, "absolute"]))
    }

    fn set_volume(&mut self, volume: f64) -> Result<(), PlayerError> {
        self.set_property("volume", json!((volume * 100.0).round()))
    }

    fn set_muted(&mut self, muted: bool) -> Result<(), PlayerError> {
        self.set_property("mute", json!(muted))
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<(), PlayerError> {
        self.set_property("fullscreen", json!(fullscreen))
    }

    fn close(&mut self) -> Result<(), PlayerError> {
        self.send(json!(["quit"]))
    }
}

impl Drop for MpvElement {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

async fn connect(path: &std::path::Path) -> Result<UnixStream, PlayerError> {
    let mut last_err = None;
    for _ in 0..CONNECT_ATTEMPTS {
        match UnixStream::connect(path).await {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
        tokio::time::sleep(CONNECT_INTERVAL).await;
    }
    Err(PlayerError::Ipc(format!(
        "could not connect to {}: {}",
        path.display(),
        last_err.map(|e| e.to_string()).unwrap_or_default()
    )))
}

/// Map one IPC message to a media event
fn translate(msg: &Value) -> Option<MediaEvent> {
    match msg["event"].as_str()? {
        "property-change" => match msg["name"].as_str()? {
            "time-pos" => msg["data"].as_f64().map(MediaEvent::TimeUpdate),
            "duration" => msg["data"].as_f64().map(MediaEvent::LoadedMetadata),
            "pause" => msg["data"].as_bool().map(|paused| {
                if paused {
                    MediaEvent::Pause
                } else {
                    MediaEvent::Play
                }
            }),
            _ => None,
        },
        "end-file" if msg["reason"] == "eof" => Some(MediaEvent::Ended),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_property_changes() {
        let time = json!({"event": "property-change", "id": 1, "name": "time-pos", "data": 12.5});
        assert_eq!(translate(&time), Some(MediaEvent::TimeUpdate(12.5)));

        let dur = json!({"event": "property-change", "id": 2, "name": "duration", "data": 600.0});
        assert_eq!(translate(&dur), Some(MediaEvent::LoadedMetadata(600.0)));

        let paused = json!({"event": "property-change", "id": 3, "name": "pause", "data": true});
        assert_eq!(translate(&paused), Some(MediaEvent::Pause));

        let playing = json!({"event": "property-change", "id": 3, "name": "pause", "data": false});
        assert_eq!(translate(&playing), Some(MediaEvent::Play));
    }

    #[test]
    fn test_translate_ignores_unavailable_and_replies() {
        let unset = json!({"event": "property-change", "id": 1, "name": "time-pos"});
        assert_eq!(translate(&unset), None);

        let reply = json!({"request_id": 4, "error": "success"});
        assert_eq!(translate(&reply), None);
    }

    #[test]
    fn test_translate_end_file() {
        let eof = json!({"event": "end-file", "reason": "eof"});
        assert_eq!(translate(&eof), Some(MediaEvent::Ended));

        let err = json!({"event": "end-file", "reason": "error"});
        assert_eq!(translate(&err), None);
    }
}
