// ============================================================================
// src/wizard/mod.rs – Wizard session and its state machine
// ============================================================================
//
// ChooseDevice → EnterMountPoint → EnterPermissions → Executing → Done
//
// Each phase variant owns exactly what earlier phases produced, so a value
// cannot be read before the phase that sets it has been left.

pub mod input;
pub mod spinner;


use tracing::{debug, info};

use crate::devices::DeviceDescriptor;
use crate::pipeline::{PipelineOutcome, ProvisionRequest};
use input::{KeyInput, LineInput, ListCursor};
use spinner::Spinner;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    ChooseDevice,
    EnterMountPoint {
        device: DeviceDescriptor,
    },
    EnterPermissions {
        device: DeviceDescriptor,
        mount_point: String,
    },
    Executing {
        request: ProvisionRequest,
    },
    Done {
        request: ProvisionRequest,
        outcome: PipelineOutcome,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    ChooseDevice,
    EnterMountPoint,
    EnterPermissions,
    Executing,
    Done,
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::ChooseDevice => PhaseKind::ChooseDevice,
            Phase::EnterMountPoint { .. } => PhaseKind::EnterMountPoint,
            Phase::EnterPermissions { .. } => PhaseKind::EnterPermissions,
            Phase::Executing { .. } => PhaseKind::Executing,
            Phase::Done { .. } => PhaseKind::Done,
        }
    }
}

/// Everything that can drive the session forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    Key(KeyInput),
    Tick,
    PipelineFinished(PipelineOutcome),
}

/// Work the runtime must perform after an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Quit,
    Launch(ProvisionRequest),
    ScheduleTick,
}

#[derive(Debug)]
pub struct WizardSession {
    devices: Vec<DeviceDescriptor>,
    phase: Phase,
    cursor: ListCursor,
    input: LineInput,
    spinner: Spinner,
    terminated: bool,
}

impl WizardSession {
    pub fn new(devices: Vec<DeviceDescriptor>) -> Self {
        Self {
            devices,
            phase: Phase::ChooseDevice,
            cursor: ListCursor::default(),
            input: LineInput::default(),
            spinner: Spinner::default(),
            terminated: false,
        }
    }

    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn phase_kind(&self) -> PhaseKind {
        self.phase.kind()
    }

    pub fn cursor(&self) -> usize {
        self.cursor.index()
    }

    pub fn input(&self) -> &str {
        self.input.value()
    }

    pub fn spinner(&self) -> &Spinner {
        &self.spinner
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn selected_device(&self) -> Option<&DeviceDescriptor> {
        match &self.phase {
            Phase::ChooseDevice => None,
            Phase::EnterMountPoint { device } | Phase::EnterPermissions { device, .. } => {
                Some(device)
            }
            Phase::Executing { request } | Phase::Done { request, .. } => Some(&request.device),
        }
    }

    pub fn mount_point(&self) -> Option<&str> {
        match &self.phase {
            Phase::ChooseDevice | Phase::EnterMountPoint { .. } => None,
            Phase::EnterPermissions { mount_point, .. } => Some(mount_point),
            Phase::Executing { request } | Phase::Done { request, .. } => {
                Some(&request.mount_point)
            }
        }
    }

    pub fn permissions(&self) -> Option<&str> {
        match &self.phase {
            Phase::Executing { request } | Phase::Done { request, .. } => {
                Some(&request.permissions)
            }
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<&PipelineOutcome> {
        match &self.phase {
            Phase::Done { outcome, .. } => Some(outcome),
            _ => None,
        }
    }

    /// Feed one event in; the returned effects are for the runtime to carry out.
    pub fn update(&mut self, event: WizardEvent) -> Vec<Effect> {
        if self.terminated {
            return Vec::new();
        }
        match event {
            WizardEvent::Key(key) => self.on_key(key),
            WizardEvent::Tick => self.on_tick(),
            WizardEvent::PipelineFinished(outcome) => self.on_finished(outcome),
        }
    }

    fn quit(&mut self) -> Vec<Effect> {
        info!(phase = ?self.phase_kind(), "operator quit");
        self.terminated = true;
        vec![Effect::Quit]
    }

    fn on_key(&mut self, key: KeyInput) -> Vec<Effect> {
        match self.phase_kind() {
            PhaseKind::ChooseDevice => match key {
                KeyInput::Escape | KeyInput::Interrupt | KeyInput::Char('q') => self.quit(),
                KeyInput::Up | KeyInput::Char('k') => {
                    self.cursor.up();
                    Vec::new()
                }
                KeyInput::Down | KeyInput::Char('j') => {
                    self.cursor.down(self.devices.len());
                    Vec::new()
                }
                KeyInput::Enter => self.confirm(),
                _ => Vec::new(),
            },
            PhaseKind::EnterMountPoint | PhaseKind::EnterPermissions => match key {
                KeyInput::Escape | KeyInput::Interrupt => self.quit(),
                KeyInput::Enter => self.confirm(),
                KeyInput::Backspace => {
                    self.input.backspace();
                    Vec::new()
                }
                KeyInput::Char(c) => {
                    self.input.push(c);
                    Vec::new()
                }
                KeyInput::Up | KeyInput::Down => Vec::new(),
            },
            // No way out while destructive steps are in flight.
            PhaseKind::Executing => Vec::new(),
            PhaseKind::Done => match key {
                KeyInput::Escape | KeyInput::Interrupt | KeyInput::Char('q') => self.quit(),
                _ => Vec::new(),
            },
        }
    }

    fn confirm(&mut self) -> Vec<Effect> {
        match std::mem::replace(&mut self.phase, Phase::ChooseDevice) {
            Phase::ChooseDevice => {
                if let Some(device) = self.devices.get(self.cursor.index()).cloned() {
                    debug!(device = %device, "device selected");
                    self.input.take();
                    self.phase = Phase::EnterMountPoint { device };
                }
                Vec::new()
            }
            Phase::EnterMountPoint { device } => {
                let mount_point = self.input.take();
                debug!(mount_point = %mount_point, "mount point entered");
                self.phase = Phase::EnterPermissions {
                    device,
                    mount_point,
                };
                Vec::new()
            }
            Phase::EnterPermissions {
                device,
                mount_point,
            } => {
                let request = ProvisionRequest {
                    device,
                    mount_point,
                    permissions: self.input.take(),
                };
                info!(
                    device = %request.device,
                    mount_point = %request.mount_point,
                    permissions = %request.permissions,
                    "launching provisioning pipeline"
                );
                self.phase = Phase::Executing {
                    request: request.clone(),
                };
                vec![Effect::Launch(request), Effect::ScheduleTick]
            }
            other => {
                self.phase = other;
                Vec::new()
            }
        }
    }

    fn on_tick(&mut self) -> Vec<Effect> {
        if self.phase_kind() != PhaseKind::Executing {
            return Vec::new();
        }
        self.spinner.advance();
        vec![Effect::ScheduleTick]
    }

    fn on_finished(&mut self, outcome: PipelineOutcome) -> Vec<Effect> {
        match std::mem::replace(&mut self.phase, Phase::ChooseDevice) {
            Phase::Executing { request } => {
                match outcome.failure() {
                    None => info!("pipeline finished"),
                    Some(err) => info!(step = ?err.step(), error = %err, "pipeline failed"),
                }
                self.phase = Phase::Done { request, outcome };
            }
            other => {
                debug!(phase = ?other.kind(), "completion outside Executing ignored");
                self.phase = other;
            }
        }
        Vec::new()
    }
}
