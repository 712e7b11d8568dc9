//! Device settings view model.
//!
//! A view is created `Loading` with the device treated as locked. Mounting
//! hands out exactly one [`InfoRequest`]; the matching [`InfoResponse`] moves
//! the view to `Loaded` or `Failed`, both terminal. Responses for a request
//! that is no longer live (the view was unmounted or remounted) are dropped.
//! Rendering takes the translation catalog explicitly; the view holds no
//! reference to the process-wide one.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::cli::i18n::{texts, Catalog};
use crate::services::device::{strip_version_prefix, DeviceInfo};

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> u64 {
    REQUEST_SEQ.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsState {
    pub firmware_version: Option<String>,
    pub locked: bool,
}

impl Default for SettingsState {
    fn default() -> Self {
        Self {
            firmware_version: None,
            locked: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoRequest {
    pub request_id: u64,
    pub device_id: String,
}

#[derive(Debug, Clone)]
pub struct InfoResponse {
    pub request_id: u64,
    pub result: Result<DeviceInfo, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    ManageBackups { href: String, disabled: bool },
    MobilePairing { device_id: String, disabled: bool },
    DeviceLock { device_id: String },
    UpgradeFirmware {
        device_id: String,
        current_version: Option<String>,
    },
    Reset { device_id: String },
}

/// What activating a control leads to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Blocked,
    Navigate(String),
    /// Handled by the control's own flow.
    Delegated { device_id: String },
}

impl Control {
    pub fn label(&self, cat: &Catalog) -> String {
        match self {
            Control::ManageBackups { .. } => texts::manage_backups(cat),
            Control::MobilePairing { .. } => texts::mobile_pairing(cat),
            Control::DeviceLock { .. } => texts::device_lock(cat),
            Control::UpgradeFirmware {
                current_version, ..
            } => texts::upgrade_firmware(cat, current_version.as_deref()),
            Control::Reset { .. } => texts::reset_device(cat),
        }
    }

    /// Only the backup link and pairing are gated here; the rest decide
    /// their own enablement.
    pub fn is_disabled(&self) -> bool {
        match self {
            Control::ManageBackups { disabled, .. } | Control::MobilePairing { disabled, .. } => {
                *disabled
            }
            _ => false,
        }
    }

    pub fn activate(&self) -> Activation {
        if self.is_disabled() {
            return Activation::Blocked;
        }
        match self {
            Control::ManageBackups { href, .. } => Activation::Navigate(href.clone()),
            Control::MobilePairing { device_id, .. }
            | Control::DeviceLock { device_id }
            | Control::UpgradeFirmware { device_id, .. }
            | Control::Reset { device_id } => Activation::Delegated {
                device_id: device_id.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub text: String,
}

/// Everything the renderer draws, derived from the device ID, the catalog
/// and state only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsLayout {
    pub title: String,
    pub controls: Vec<Control>,
    pub footer: Option<String>,
    pub status: Option<StatusLine>,
}

#[derive(Debug, Clone)]
pub struct SettingsView {
    device_id: String,
    state: SettingsState,
    phase: Phase,
    mounted: bool,
    live_request: Option<u64>,
}

impl SettingsView {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            state: SettingsState::default(),
            phase: Phase::Loading,
            mounted: false,
            live_request: None,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn state(&self) -> &SettingsState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Returns the read to issue, or `None` when already mounted.
    pub fn mount(&mut self) -> Option<InfoRequest> {
        if self.mounted {
            return None;
        }
        self.mounted = true;
        self.state = SettingsState::default();
        self.phase = Phase::Loading;

        let request_id = next_request_id();
        self.live_request = Some(request_id);
        Some(InfoRequest {
            request_id,
            device_id: self.device_id.clone(),
        })
    }

    pub fn unmount(&mut self) {
        self.mounted = false;
        self.live_request = None;
    }

    /// Applies a fetch result. Returns whether the view changed.
    pub fn apply(&mut self, response: InfoResponse) -> bool {
        if self.live_request != Some(response.request_id) {
            log::debug!(
                "dropping device info response {} for {} (live: {:?})",
                response.request_id,
                self.device_id,
                self.live_request
            );
            return false;
        }
        self.live_request = None;

        match response.result {
            Ok(info) => {
                self.state = SettingsState {
                    firmware_version: strip_version_prefix(&info.version),
                    locked: info.lock,
                };
                self.phase = Phase::Loaded;
            }
            Err(err) => {
                log::warn!(
                    "failed to load device info for {}: {err}; keeping the device locked",
                    self.device_id
                );
                self.phase = Phase::Failed;
            }
        }
        true
    }

    pub fn layout(&self, cat: &Catalog) -> SettingsLayout {
        let locked = self.state.locked;
        let device_id = self.device_id.clone();

        let controls = vec![
            Control::ManageBackups {
                href: format!("/manage-backups/{device_id}"),
                disabled: locked,
            },
            Control::MobilePairing {
                device_id: device_id.clone(),
                disabled: locked,
            },
            Control::DeviceLock {
                device_id: device_id.clone(),
            },
            Control::UpgradeFirmware {
                device_id: device_id.clone(),
                current_version: self.state.firmware_version.clone(),
            },
            Control::Reset { device_id },
        ];

        let footer = self
            .state
            .firmware_version
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(|version| texts::firmware_version(cat, version));

        let status = match self.phase {
            Phase::Loading => Some(StatusLine {
                kind: StatusKind::Info,
                text: texts::loading_device_info(cat),
            }),
            Phase::Failed => Some(StatusLine {
                kind: StatusKind::Warning,
                text: texts::device_info_failed(cat),
            }),
            Phase::Loaded if locked => Some(StatusLine {
                kind: StatusKind::Info,
                text: texts::device_locked_hint(cat),
            }),
            Phase::Loaded => None,
        };

        SettingsLayout {
            title: texts::device_settings_title(cat),
            controls,
            footer,
            status,
        }
    }
}
