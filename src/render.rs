// ============================================================================
// src/render.rs – Wizard state → screen lines
// ============================================================================

use crate::pipeline::PipelineOutcome;
use crate::wizard::{Phase, WizardSession};

pub const SUCCESS_MESSAGE: &str = "Disk successfully formatted and mounted!";
const MOUNT_POINT_PLACEHOLDER: &str = "Enter mount point (e.g., /mnt/data)";
const PERMISSIONS_PLACEHOLDER: &str = "Enter permissions (e.g., 0755)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Title,
    Normal,
    Selected,
    Muted,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub tone: Tone,
    pub text: String,
}

impl Line {
    fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self {
            tone,
            text: text.into(),
        }
    }

    fn blank() -> Self {
        Self::new(Tone::Normal, "")
    }
}

pub fn view(session: &WizardSession) -> Vec<Line> {
    match session.phase() {
        Phase::ChooseDevice => device_list(session),
        Phase::EnterMountPoint { device } => {
            let mut lines = vec![
                Line::new(Tone::Title, "Mount point"),
                Line::new(Tone::Muted, format!("Device: {device}")),
                Line::blank(),
            ];
            lines.push(prompt_line(
                "Enter mount point: ",
                session.input(),
                MOUNT_POINT_PLACEHOLDER,
            ));
            lines.push(Line::blank());
            lines.push(Line::new(Tone::Muted, "enter confirm · esc quit"));
            lines
        }
        Phase::EnterPermissions {
            device,
            mount_point,
        } => vec![
            Line::new(Tone::Title, "Permissions"),
            Line::new(Tone::Muted, format!("Device: {device}  →  {mount_point}")),
            Line::blank(),
            prompt_line(
                "Enter permissions (e.g., 0755): ",
                session.input(),
                PERMISSIONS_PLACEHOLDER,
            ),
            Line::blank(),
            Line::new(
                Tone::Error,
                "Confirming formats the device. All data on it will be lost.",
            ),
            Line::new(Tone::Muted, "enter confirm · esc quit"),
        ],
        Phase::Executing { request } => vec![
            Line::new(Tone::Title, "Formatting and mounting the disk..."),
            Line::new(
                Tone::Muted,
                format!("{}  →  {}", request.device, request.mount_point),
            ),
            Line::blank(),
            Line::new(Tone::Selected, session.spinner().current()),
            Line::blank(),
            Line::new(Tone::Muted, "This cannot be interrupted; please wait."),
        ],
        Phase::Done { outcome, .. } => {
            let mut lines = match outcome {
                PipelineOutcome::Success => vec![Line::new(Tone::Success, SUCCESS_MESSAGE)],
                PipelineOutcome::Failed(err) => {
                    let note = match err.step() {
                        Some(step) => format!("Stopped at {step}. Earlier steps were not undone."),
                        None => "Progress unknown. Check the device and fstab by hand.".to_string(),
                    };
                    vec![
                        Line::new(Tone::Error, format!("Error: {err}")),
                        Line::new(Tone::Muted, note),
                    ]
                }
            };
            lines.push(Line::new(Tone::Muted, "Press q to quit."));
            lines
        }
    }
}

fn device_list(session: &WizardSession) -> Vec<Line> {
    let mut lines = vec![Line::new(Tone::Title, "Select a disk"), Line::blank()];
    if session.devices().is_empty() {
        lines.push(Line::new(Tone::Muted, "No block devices found."));
    }
    for (idx, device) in session.devices().iter().enumerate() {
        if idx == session.cursor() {
            lines.push(Line::new(Tone::Selected, format!("> {device}")));
            lines.push(Line::new(Tone::Selected, "  Disk available for formatting"));
        } else {
            lines.push(Line::new(Tone::Normal, format!("  {device}")));
            lines.push(Line::new(Tone::Muted, "  Disk available for formatting"));
        }
    }
    lines.push(Line::blank());
    lines.push(Line::new(Tone::Muted, "↑/↓ move · enter select · q quit"));
    lines
}

fn prompt_line(label: &str, value: &str, placeholder: &str) -> Line {
    if value.is_empty() {
        Line::new(Tone::Normal, format!("{label}{placeholder}"))
    } else {
        Line::new(Tone::Normal, format!("{label}{value}▏"))
    }
}

/// One line printed after the terminal is restored, only when the wizard
/// reached Done.
pub fn summary(session: &WizardSession) -> Option<String> {
    session.outcome().map(|outcome| match outcome {
        PipelineOutcome::Success => "Program completed successfully!".to_string(),
        PipelineOutcome::Failed(err) => format!("An error occurred: {err}"),
    })
}

#[cfg(test)]
pub fn plain_text(lines: &[Line]) -> String {
    lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
