use std::{fs::read_to_string, net::SocketAddrV4, path::PathBuf, str::FromStr};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use codec::buffer::MAX_FRAME_LEN;
use serde::Deserialize;
use service::{ingress::DEFAULT_INGRESS_PORT, store::FlowState};

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" => Self::Warn,
            "error" => Self::Error,
            _ => return Err(format!("unknown log level: {value}")),
        })
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl LogLevel {
    pub fn as_level(&self) -> log::Level {
        match *self {
            Self::Error => log::Level::Error,
            Self::Debug => log::Level::Debug,
            Self::Trace => log::Level::Trace,
            Self::Warn => log::Level::Warn,
            Self::Info => log::Level::Info,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Log {
    ///
    /// log level
    ///
    /// Per-frame decisions are logged at debug, header arithmetic at trace.
    ///
    #[serde(default)]
    pub level: LogLevel,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Ingress {
    ///
    /// The UDP destination port that identifies relayed traffic coming in.
    ///
    #[serde(default = "Ingress::port")]
    pub port: u16,
}

impl Ingress {
    fn port() -> u16 {
        DEFAULT_INGRESS_PORT
    }
}

impl Default for Ingress {
    fn default() -> Self {
        Self { port: Self::port() }
    }
}

///
/// One flow state entry, keyed by the destination of the outbound datagram.
///
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Flow {
    pub destination: SocketAddrV4,
    ///
    /// The port the destination port is rewritten to, zero keeps it.
    ///
    #[serde(default)]
    pub local_port: u16,
    ///
    /// The TURN channel the datagram is framed for, zero sends it unframed.
    ///
    #[serde(default)]
    pub channel_id: u16,
}

impl Flow {
    pub fn state(&self) -> FlowState {
        FlowState {
            local_port: self.local_port,
            channel_id: self.channel_id,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Frame {
    ///
    /// The size a frame may grow to while it is rewritten.
    ///
    /// A frame that would need to grow past this is dropped.
    ///
    #[serde(default = "Frame::capacity")]
    pub capacity: usize,
}

impl Frame {
    fn capacity() -> usize {
        MAX_FRAME_LEN
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            capacity: Self::capacity(),
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub log: Log,
    #[serde(default)]
    pub ingress: Ingress,
    #[serde(default)]
    pub flows: Vec<Flow>,
    #[serde(default)]
    pub frame: Frame,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Rewrite frames leaving the host.
    Egress,
    /// Classify frames arriving at the host.
    Ingress,
}

#[derive(Parser, Debug)]
#[command(
    about = env!("CARGO_PKG_DESCRIPTION"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
)]
pub struct Cli {
    ///
    /// Specify the configuration file path
    ///
    /// Example: turn-offload --config /etc/turn-offload/config.json5
    ///
    #[arg(long, short)]
    pub config: Option<PathBuf>,
    ///
    /// Which packet program the frames are run through
    ///
    #[arg(long, short, value_enum, default_value_t = Direction::Egress)]
    pub direction: Direction,
    ///
    /// Directory accepted frames are written to, one file per input frame
    ///
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    ///
    /// Raw Ethernet frames, one frame per file
    ///
    pub frames: Vec<PathBuf>,
}

impl FromStr for Config {
    type Err = serde_json5::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        serde_json5::from_str(value)
    }
}

impl Config {
    ///
    /// Load configure from config file.
    ///
    /// Without a configuration file the default configuration is used, which
    /// holds no flow state.
    ///
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        Ok(match path {
            Some(path) => read_to_string(path)?.parse()?,
            None => Self::default(),
        })
    }
}
