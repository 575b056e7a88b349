use crate::error::Error;
use crate::scene::scroll::ScrollMetrics;
use serde::Deserialize;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};

/// A scroll notification from an external host, one JSON object per line.
///
/// Either the raw page metrics or an already normalized progress value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScrollUpdate {
    Metrics {
        offset: f64,
        scroll_height: f64,
        viewport_height: f64,
    },
    Progress {
        progress: f64,
    },
}

impl ScrollUpdate {
    pub fn metrics(&self) -> Option<ScrollMetrics> {
        match *self {
            ScrollUpdate::Metrics {
                offset,
                scroll_height,
                viewport_height,
            } => Some(ScrollMetrics {
                offset,
                scroll_height,
                viewport_height,
            }),
            ScrollUpdate::Progress { .. } => None,
        }
    }
}

/// Where external scroll updates come from.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedSource {
    Stdin,
    File(PathBuf),
}

impl FeedSource {
    pub fn parse(arg: &str) -> Self {
        match arg {
            "-" | "stdin" => FeedSource::Stdin,
            path => FeedSource::File(PathBuf::from(path)),
        }
    }
}

/// Parse one feed line. Blank and malformed lines yield `None`.
pub fn parse_line(line: &str) -> Option<ScrollUpdate> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(update) => Some(update),
        Err(e) => {
            log::warn!("ignoring malformed scroll update {:?}: {}", line, e);
            None
        }
    }
}

/// Latest non-empty line of a file, parsed.
fn read_last(path: &PathBuf) -> Option<ScrollUpdate> {
    let contents = std::fs::read_to_string(path).ok()?;
    let line = contents.lines().rfind(|l| !l.trim().is_empty())?;
    parse_line(line)
}

/// Start a background reader. The frame loop drains the receiver; dropping
/// it stops the reader at its next send.
pub fn spawn_reader(source: FeedSource) -> Result<Receiver<ScrollUpdate>, Error> {
    let (tx, rx) = mpsc::channel::<ScrollUpdate>();

    match source {
        FeedSource::Stdin => {
            std::thread::spawn(move || {
                let stdin = std::io::BufReader::new(std::io::stdin());
                for line in stdin.lines() {
                    let Ok(line) = line else { break };
                    if let Some(update) = parse_line(&line)
                        && tx.send(update).is_err()
                    {
                        break;
                    }
                }
                log::debug!("scroll feed on stdin closed");
            });
        }
        FeedSource::File(path) => {
            let (file_tx, file_rx) = mpsc::channel();
            let mut watcher = notify::recommended_watcher(move |res| {
                let _ = file_tx.send(res);
            })
            .map_err(|source| Error::Feed {
                path: path.clone(),
                source,
            })?;
            notify::Watcher::watch(&mut watcher, &path, notify::RecursiveMode::NonRecursive)
                .map_err(|source| Error::Feed {
                    path: path.clone(),
                    source,
                })?;

            std::thread::spawn(move || {
                // The watcher lives as long as this thread.
                let _watcher = watcher;
                if !forward(read_last(&path), &tx) {
                    return;
                }
                while let Ok(event) = file_rx.recv() {
                    if let Err(e) = event {
                        log::warn!("scroll feed watch error on {}: {}", path.display(), e);
                        continue;
                    }
                    if !forward(read_last(&path), &tx) {
                        break;
                    }
                }
            });
        }
    }

    Ok(rx)
}

/// Returns false once the receiving side is gone.
fn forward(update: Option<ScrollUpdate>, tx: &Sender<ScrollUpdate>) -> bool {
    match update {
        Some(update) => tx.send(update).is_ok(),
        None => true,
    }
}
