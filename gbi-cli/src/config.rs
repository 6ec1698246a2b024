use anyhow::Context;
use gbi_core::EmulationConfig;
use gbi_proc_macros::{EnumDisplay, EnumFromStr, StrDeserialize};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Where bytes written to the serial port go.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, EnumDisplay, EnumFromStr, StrDeserialize,
)]
pub enum SerialSink {
    #[default]
    #[display = "stdout"]
    Stdout,
    #[display = "log"]
    Log,
    #[display = "none"]
    Discard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Stop after this many frames; runs until the program finishes if unset.
    pub frame_limit: Option<u64>,

    #[serde(default)]
    pub realtime: bool,

    #[serde(default)]
    pub serial_sink: SerialSink,

    #[serde(default = "default_stop_on_result")]
    pub stop_on_result: bool,

    #[serde(default)]
    pub emulation: EmulationConfig,
}

fn default_stop_on_result() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            frame_limit: Option::default(),
            realtime: bool::default(),
            serial_sink: SerialSink::default(),
            stop_on_result: default_stop_on_result(),
            emulation: EmulationConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_file<P>(path: P) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path> + std::fmt::Debug,
    {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("error reading TOML config file from '{path:?}'"))?;
        let config: Self = toml::from_str(&config_str)
            .with_context(|| format!("error parsing app config from TOML file at '{path:?}'"))?;

        Ok(config)
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.frame_limit {
            Some(frame_limit) => writeln!(f, "frame_limit: {frame_limit}")?,
            None => writeln!(f, "frame_limit: <None>")?,
        }
        writeln!(f, "realtime: {}", self.realtime)?;
        writeln!(f, "serial_sink: {}", self.serial_sink)?;
        writeln!(f, "stop_on_result: {}", self.stop_on_result)?;
        write!(f, "{}", self.emulation)?;

        Ok(())
    }
}
