//! The devices and statuses a [`VirtualIotApi`](crate::VirtualIotApi) serves.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use switchhub_domain::device::Device;
use switchhub_domain::status::Status;

/// Errors raised while loading a catalog file.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unable to read catalog {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Device list and initial statuses, in vendor JSON layout:
///
/// ```json
/// { "devices": [{ "deviceId": "…", … }], "statuses": [{ "deviceId": "…", … }] }
/// ```
///
/// A device without a status reports `power: "off"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VirtualCatalog {
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub statuses: Vec<Status>,
}

impl VirtualCatalog {
    /// A catalog with no device at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            devices: Vec::new(),
            statuses: Vec::new(),
        }
    }

    /// Two Plug Mini (US) smart plugs, one off and one on.
    #[must_use]
    pub fn demo() -> Self {
        let devices = vec![
            Device::new("6055F92FCFD2", "小風扇開關", "Plug Mini (US)"),
            Device::new("6055F930FF22", "風扇開關", "Plug Mini (US)"),
        ];
        let mut off = Status::new("6055F92FCFD2", "Plug Mini (US)", "6055F92FCFD2").with_power("off");
        off.version = Some("V1.4-1.4".to_string());
        off.voltage = Some(112.2);
        off.weight = Some(0.0);
        off.electricity_of_day = Some(43);
        off.electric_current = Some(0.0);
        let mut on = Status::new("6055F930FF22", "Plug Mini (US)", "6055F930FF22").with_power("on");
        on.version = Some("V1.4-1.4".to_string());
        on.voltage = Some(112.2);
        on.weight = Some(35.0);
        on.electricity_of_day = Some(184);
        on.electric_current = Some(3.09);
        Self {
            devices,
            statuses: vec![off, on],
        }
    }

    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] when the file cannot be read and
    /// [`CatalogError::Parse`] when it is not a valid catalog.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&raw).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for VirtualCatalog {
    fn default() -> Self {
        Self::demo()
    }
}
