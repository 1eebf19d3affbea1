use crate::grid::color::PixelColor;
use crate::grid::model::is_supported_dimension;
use crate::grid::sync::SendTicket;
use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use url::Url;

pub const DEFAULT_BRIGHTNESS: u8 = 230;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentPayload {
    /// One `rrggbb` entry per LED in row-major order.
    pub i: Vec<String>,
}

/// Body of the state update posted to the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePayload {
    pub on: bool,
    pub bri: u8,
    pub v: bool,
    pub seg: SegmentPayload,
}

impl DevicePayload {
    pub fn from_pixels(pixels: &[PixelColor]) -> Self {
        Self {
            on: true,
            bri: DEFAULT_BRIGHTNESS,
            v: true,
            seg: SegmentPayload {
                i: pixels.iter().map(|color| color.to_wire()).collect(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixSize {
    pub width: usize,
    pub height: usize,
}

impl MatrixSize {
    /// Whether a grid of this size can be edited.
    pub fn is_supported(&self) -> bool {
        is_supported_dimension(self.width) && is_supported_dimension(self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceInfo {
    pub name: Option<String>,
    pub matrix: Option<MatrixSize>,
}

impl DeviceInfo {
    /// Read device metadata. Both the full state document (`{"info": {...}}`)
    /// and the bare info document are accepted.
    pub fn from_json(value: &Value) -> Self {
        let info = value.get("info").unwrap_or(value);
        let name = info
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);
        let matrix = info
            .pointer("/leds/matrix")
            .and_then(|matrix| {
                let width = matrix.get("w")?.as_u64()?;
                let height = matrix.get("h")?.as_u64()?;
                Some((width, height))
            })
            .filter(|(width, height)| *width > 0 && *height > 0)
            .and_then(|(width, height)| {
                let size = MatrixSize {
                    width: usize::try_from(width).ok()?,
                    height: usize::try_from(height).ok()?,
                };
                if !size.is_supported() {
                    tracing::warn!(width, height, "ignoring unsupported device matrix size");
                    return None;
                }
                Some(size)
            });
        Self { name, matrix }
    }
}

pub fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("parse device endpoint '{raw}'"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("device endpoint must use http or https, got '{other}'"),
    }
}

/// Network seam for the device. Implementations must be usable from a worker
/// thread.
pub trait DeviceTransport: Send + Sync {
    fn fetch_info(&self, endpoint: &Url) -> Result<DeviceInfo>;
    fn push_state(&self, endpoint: &Url, payload: &DevicePayload) -> Result<()>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent("led-canvas")
            .build()
            .context("build device http client")?;
        Ok(Self { client })
    }
}

impl DeviceTransport for HttpTransport {
    fn fetch_info(&self, endpoint: &Url) -> Result<DeviceInfo> {
        let resp = self
            .client
            .get(endpoint.clone())
            .send()
            .with_context(|| format!("request device info from {endpoint}"))?
            .error_for_status()
            .context("device info request failed")?;
        let value: Value = resp.json().context("decode device info")?;
        Ok(DeviceInfo::from_json(&value))
    }

    fn push_state(&self, endpoint: &Url, payload: &DevicePayload) -> Result<()> {
        self.client
            .post(endpoint.clone())
            .json(payload)
            .send()
            .with_context(|| format!("post state to {endpoint}"))?
            .error_for_status()
            .context("device rejected state update")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Push on the caller's thread and report the outcome immediately.
    Inline,
    /// Push from a short-lived worker thread; outcomes are collected later.
    #[default]
    Background,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    pub ticket: SendTicket,
    pub result: std::result::Result<(), String>,
}

pub struct DeviceClient {
    transport: Arc<dyn DeviceTransport>,
    mode: DeliveryMode,
    outcome_tx: Sender<SendOutcome>,
    outcome_rx: Receiver<SendOutcome>,
}

impl DeviceClient {
    pub fn new(transport: Arc<dyn DeviceTransport>, mode: DeliveryMode) -> Self {
        let (outcome_tx, outcome_rx) = channel();
        Self {
            transport,
            mode,
            outcome_tx,
            outcome_rx,
        }
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    pub fn fetch_info(&self, endpoint: &Url) -> Result<DeviceInfo> {
        self.transport.fetch_info(endpoint)
    }

    /// Start one push. Inline delivery returns its outcome directly;
    /// background delivery returns `None` and reports through
    /// [`DeviceClient::drain_outcomes`].
    pub fn dispatch(
        &self,
        endpoint: Url,
        payload: DevicePayload,
        ticket: SendTicket,
    ) -> Option<SendOutcome> {
        match self.mode {
            DeliveryMode::Inline => Some(SendOutcome {
                ticket,
                result: push(self.transport.as_ref(), &endpoint, &payload),
            }),
            DeliveryMode::Background => {
                let transport = Arc::clone(&self.transport);
                let tx = self.outcome_tx.clone();
                let spawned = std::thread::Builder::new()
                    .name("led-canvas-push".to_string())
                    .spawn(move || {
                        let result = push(transport.as_ref(), &endpoint, &payload);
                        let _ = tx.send(SendOutcome { ticket, result });
                    });
                match spawned {
                    Ok(_) => None,
                    Err(err) => Some(SendOutcome {
                        ticket,
                        result: Err(format!("spawn push worker: {err}")),
                    }),
                }
            }
        }
    }

    pub fn drain_outcomes(&self) -> Vec<SendOutcome> {
        let mut outcomes = Vec::new();
        loop {
            match self.outcome_rx.try_recv() {
                Ok(outcome) => outcomes.push(outcome),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::error!("push outcome channel closed");
                    break;
                }
            }
        }
        outcomes
    }
}

fn push(
    transport: &dyn DeviceTransport,
    endpoint: &Url,
    payload: &DevicePayload,
) -> std::result::Result<(), String> {
    transport
        .push_state(endpoint, payload)
        .map_err(|err| format!("{err:#}"))
}
