//! Source configuration

use serde::Deserialize;

/// Kind of line-oriented input
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Character device or file path (e.g. `/dev/ttyUSB0`)
    Device,
    /// Standard input (default)
    #[default]
    Stdin,
    /// TCP bridge exposing a serial port (e.g. ser2net)
    Tcp,
}

/// Source configuration
///
/// ```toml
/// [source]
/// type = "tcp"
/// address = "10.0.0.5:4001"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Source type
    #[serde(rename = "type")]
    pub kind: SourceKind,

    /// Device path, required for `device`
    pub path: Option<String>,

    /// `host:port`, required for `tcp`
    pub address: Option<String>,

    /// Bytes requested per read
    /// Default: 4096
    pub read_buffer_size: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Stdin,
            path: None,
            address: None,
            read_buffer_size: 4096,
        }
    }
}
