// ============================================================================
// src/cmd/wizard.rs – Interactive event loop driving the wizard session
// ============================================================================

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::devices::DeviceDescriptor;
use crate::error::ProvisionError;
use crate::host::{HostOps, LinuxHost};
use crate::pipeline::{self, PipelineOutcome, ProvisionRequest};
use crate::render;
use crate::ui::TerminalUi;
use crate::util::audit::{audit_log, AuditEvent};
use crate::wizard::input::KeyInput;
use crate::wizard::{Effect, WizardEvent, WizardSession};

/// Upper bound on how long the loop sleeps waiting for a key.
const INPUT_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// A launched pipeline run. The worker holds the only sender, so a worker
/// that dies without reporting shows up as a disconnected channel.
struct InFlight {
    request: ProvisionRequest,
    done: Receiver<PipelineOutcome>,
}

/// Carries out the effects the session asks for: pipeline dispatch, tick
/// scheduling and collecting the completion.
struct Runtime {
    host: Arc<dyn HostOps + Send + Sync>,
    tick: Duration,
    next_tick: Option<Instant>,
    in_flight: Option<InFlight>,
    audit_path: PathBuf,
}

impl Runtime {
    fn new(host: Arc<dyn HostOps + Send + Sync>, tick: Duration, audit_path: PathBuf) -> Self {
        Self {
            host,
            tick,
            next_tick: None,
            in_flight: None,
            audit_path,
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) -> Result<Flow> {
        for effect in effects {
            match effect {
                Effect::Quit => return Ok(Flow::Quit),
                Effect::ScheduleTick => {
                    self.next_tick = Some(Instant::now() + self.tick);
                }
                Effect::Launch(request) => self.launch(request)?,
            }
        }
        Ok(Flow::Continue)
    }

    fn launch(&mut self, request: ProvisionRequest) -> Result<()> {
        let device = request.device.to_string();
        audit_log(
            &self.audit_path,
            AuditEvent::ProvisionStart,
            &[
                ("device", device.as_str()),
                ("mount_point", request.mount_point.as_str()),
                ("permissions", request.permissions.as_str()),
            ],
        );
        let (tx, rx) = mpsc::channel();
        pipeline::spawn(self.host.clone(), request.clone(), tx)?;
        self.in_flight = Some(InFlight { request, done: rx });
        Ok(())
    }

    /// The single completion, once it has arrived. A worker that ended
    /// without sending is reported as a lost-worker failure.
    fn take_completion(&mut self) -> Option<PipelineOutcome> {
        let flight = self.in_flight.take()?;
        let outcome = match flight.done.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => {
                self.in_flight = Some(flight);
                return None;
            }
            Err(TryRecvError::Disconnected) => {
                error!(device = %flight.request.device, "provisioning worker exited without reporting");
                PipelineOutcome::Failed(ProvisionError::WorkerLost(format!(
                    "no outcome received for {}",
                    flight.request.device
                )))
            }
        };
        self.record_outcome(&flight.request, &outcome);
        Some(outcome)
    }

    fn record_outcome(&self, request: &ProvisionRequest, outcome: &PipelineOutcome) {
        let device = request.device.to_string();
        match outcome {
            PipelineOutcome::Success => audit_log(
                &self.audit_path,
                AuditEvent::ProvisionOk,
                &[("device", device.as_str()), ("mount_point", request.mount_point.as_str())],
            ),
            PipelineOutcome::Failed(err) => {
                let step = err
                    .step()
                    .map(|s| s.number().to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                audit_log(
                    &self.audit_path,
                    AuditEvent::ProvisionFail,
                    &[
                        ("device", device.as_str()),
                        ("mount_point", request.mount_point.as_str()),
                        ("step", step.as_str()),
                        ("cause", err.cause()),
                    ],
                )
            }
        }
    }

    /// True once the armed tick deadline has passed; disarms it.
    fn tick_due(&mut self) -> bool {
        match self.next_tick {
            Some(at) if Instant::now() >= at => {
                self.next_tick = None;
                true
            }
            _ => false,
        }
    }

    fn poll_timeout(&self) -> Duration {
        match self.next_tick {
            Some(at) => at.saturating_duration_since(Instant::now()).min(INPUT_POLL),
            None => INPUT_POLL,
        }
    }
}

// ----------------------------------------------------------------------------
// Public entrypoint
// ----------------------------------------------------------------------------

/// Run the wizard until the operator quits. The terminal is restored before
/// this returns, on success and on error.
pub fn run_wizard(cfg: &Config, devices: Vec<DeviceDescriptor>) -> Result<WizardSession> {
    let host = LinuxHost::from_config(cfg).context("prepare host tooling")?;
    // sudo cannot prompt once the terminal is in raw mode.
    host.prime_credentials()?;
    let mut runtime = Runtime::new(
        Arc::new(host),
        Duration::from_millis(cfg.ui.tick_ms),
        cfg.log.audit_path.clone(),
    );
    let mut session = WizardSession::new(devices);

    let mut ui = TerminalUi::enter()?;
    let result = event_loop(&mut ui, &mut runtime, &mut session);
    ui.close()?;
    result?;

    info!(
        phase = ?session.phase_kind(),
        device = ?session.selected_device().map(|d| d.to_string()),
        mount_point = ?session.mount_point(),
        permissions = ?session.permissions(),
        "wizard closed"
    );
    Ok(session)
}

fn event_loop(ui: &mut TerminalUi, runtime: &mut Runtime, session: &mut WizardSession) -> Result<()> {
    let mut dirty = true;
    loop {
        if dirty {
            ui.draw(&render::view(session))?;
            dirty = false;
        }

        // Completion is handled before any further input.
        if let Some(outcome) = runtime.take_completion() {
            dirty = true;
            if runtime.apply(session.update(WizardEvent::PipelineFinished(outcome)))? == Flow::Quit {
                return Ok(());
            }
            continue;
        }

        if event::poll(runtime.poll_timeout()).context("poll terminal events")? {
            match event::read().context("read terminal event")? {
                Event::Key(ev) => {
                    if let Some(key) = KeyInput::from_event(ev) {
                        dirty = true;
                        if runtime.apply(session.update(WizardEvent::Key(key)))? == Flow::Quit {
                            return Ok(());
                        }
                    }
                }
                Event::Resize(..) => dirty = true,
                other => debug!(event = ?other, "ignored terminal event"),
            }
        }

        if runtime.tick_due() {
            dirty = true;
            if runtime.apply(session.update(WizardEvent::Tick))? == Flow::Quit {
                return Ok(());
            }
        }

        if session.is_terminated() {
            warn!("session terminated without a quit effect");
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::{FakeHost, OpKind};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn request() -> ProvisionRequest {
        ProvisionRequest {
            device: DeviceDescriptor::new("/dev/sdb"),
            mount_point: "/mnt/data".to_string(),
            permissions: "0755".to_string(),
        }
    }

    fn wait_for_completion(runtime: &mut Runtime) -> PipelineOutcome {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(outcome) = runtime.take_completion() {
                return outcome;
            }
            assert!(Instant::now() < deadline, "pipeline never reported");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn launch_delivers_one_completion_and_audits() {
        let dir = tempdir().unwrap();
        let audit = dir.path().join("audit.log");
        let host = Arc::new(FakeHost::new());
        let mut runtime = Runtime::new(host.clone(), Duration::from_millis(10), audit.clone());

        let flow = runtime
            .apply(vec![Effect::Launch(request()), Effect::ScheduleTick])
            .unwrap();
        assert_eq!(flow, Flow::Continue);
        assert!(runtime.next_tick.is_some());

        assert_eq!(wait_for_completion(&mut runtime), PipelineOutcome::Success);
        assert!(runtime.take_completion().is_none());

        let log = fs::read_to_string(&audit).unwrap();
        assert!(log.contains("PROVISION_START device=/dev/sdb mount_point=/mnt/data permissions=0755"));
        assert!(log.contains("PROVISION_OK device=/dev/sdb mount_point=/mnt/data"));
    }

    #[test]
    fn failure_is_audited_with_step_and_cause() {
        let dir = tempdir().unwrap();
        let audit = dir.path().join("audit.log");
        let host = Arc::new(FakeHost::new().failing(OpKind::Mount, "device busy"));
        let mut runtime = Runtime::new(host, Duration::from_millis(10), audit.clone());

        runtime.apply(vec![Effect::Launch(request())]).unwrap();
        assert!(!wait_for_completion(&mut runtime).is_success());

        let log = fs::read_to_string(&audit).unwrap();
        assert!(log.contains(r#"PROVISION_FAIL device=/dev/sdb mount_point=/mnt/data step=4 cause="device busy""#));
    }

    /// Host whose worker thread dies during formatting.
    struct PanickingHost;

    impl HostOps for PanickingHost {
        fn format_ext4(&self, _device: &Path) -> anyhow::Result<()> {
            panic!("mkfs wrapper crashed");
        }
        fn create_mount_point(&self, _path: &Path, _mode: u32) -> anyhow::Result<()> {
            Ok(())
        }
        fn mount(&self, _device: &Path, _target: &Path) -> anyhow::Result<()> {
            Ok(())
        }
        fn filesystem_uuid(&self, _device: &Path) -> anyhow::Result<String> {
            Ok("1234-5678\n".to_string())
        }
        fn append_mount_entry(&self, _line: &str) -> anyhow::Result<()> {
            Ok(())
        }
        fn mount_all(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn dead_worker_becomes_a_failure() {
        let dir = tempdir().unwrap();
        let audit = dir.path().join("audit.log");
        let mut runtime = Runtime::new(Arc::new(PanickingHost), Duration::from_millis(10), audit.clone());

        runtime.apply(vec![Effect::Launch(request())]).unwrap();
        let outcome = wait_for_completion(&mut runtime);

        assert!(matches!(
            outcome.failure(),
            Some(ProvisionError::WorkerLost(_))
        ));
        assert!(runtime.take_completion().is_none());

        let mut session = WizardSession::new(vec![DeviceDescriptor::new("/dev/sdb")]);
        session.update(WizardEvent::Key(KeyInput::Enter));
        for c in "/mnt/data".chars() {
            session.update(WizardEvent::Key(KeyInput::Char(c)));
        }
        session.update(WizardEvent::Key(KeyInput::Enter));
        session.update(WizardEvent::Key(KeyInput::Char('7')));
        session.update(WizardEvent::Key(KeyInput::Enter));
        session.update(WizardEvent::PipelineFinished(outcome));
        assert_eq!(
            session.update(WizardEvent::Key(KeyInput::Char('q'))),
            vec![Effect::Quit]
        );

        let log = fs::read_to_string(&audit).unwrap();
        assert!(log.contains("PROVISION_FAIL device=/dev/sdb mount_point=/mnt/data step=unknown"));
    }

    #[test]
    fn tick_fires_once_per_schedule() {
        let dir = tempdir().unwrap();
        let mut runtime = Runtime::new(
            Arc::new(FakeHost::new()),
            Duration::from_millis(1),
            dir.path().join("audit.log"),
        );
        assert!(!runtime.tick_due());
        assert_eq!(runtime.poll_timeout(), INPUT_POLL);

        runtime.apply(vec![Effect::ScheduleTick]).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert!(runtime.tick_due());
        assert!(!runtime.tick_due());
    }

    #[test]
    fn quit_stops_effect_processing() {
        let dir = tempdir().unwrap();
        let mut runtime = Runtime::new(
            Arc::new(FakeHost::new()),
            Duration::from_millis(10),
            dir.path().join("audit.log"),
        );
        let flow = runtime
            .apply(vec![Effect::Quit, Effect::ScheduleTick])
            .unwrap();
        assert_eq!(flow, Flow::Quit);
        assert!(runtime.next_tick.is_none());
    }
}
