//! Derives the user facing camera job phase from the mirrored tree.
//!
//! Device state transitions are noisy and carry no "file written" signal, so
//! the phase keeps a one step memory of what it displayed last and a sticky
//! saved-path slot fed by the out-of-band image-saved notification.

use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::{CameraConfig, ConfigError, PhaseUpdate, PropertyRef, PropertyState, PropertyTree};

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum JobPhase {
    #[default]
    Idle,
    /// Remaining exposure time in seconds, rounded to one decimal.
    Exposing(f64),
    AwaitingData,
    Saved(String),
}

impl JobPhase {
    pub fn is_exposing(&self) -> bool {
        matches!(self, JobPhase::Exposing(_))
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobPhase::Idle => f.write_str("Idle"),
            JobPhase::Exposing(remaining) => write!(f, "Exposing ({:.1}s remaining)", remaining),
            JobPhase::AwaitingData => f.write_str("Awaiting data"),
            JobPhase::Saved(path) => write!(f, "Saved: {}", path),
        }
    }
}

/// What the inference reads from the exposure property on each recompute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureReading {
    pub state: PropertyState,
    pub remaining: f64,
}

/// Parses a remaining-time element text. Anything that is not a finite
/// number reads as `0`; the result is rounded to one decimal.
pub fn parse_remaining(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => (v * 10.0).round() / 10.0,
        _ => 0.0,
    }
}

/// One transition of the phase machine, rules in priority order.
pub fn next_phase(
    previous: &JobPhase,
    saved: Option<&str>,
    exposure: Option<ExposureReading>,
) -> JobPhase {
    if let Some(path) = saved {
        return JobPhase::Saved(path.to_owned());
    }
    match exposure {
        Some(ExposureReading {
            state: PropertyState::Busy,
            remaining,
        }) => JobPhase::Exposing(remaining),
        Some(ExposureReading {
            state: PropertyState::Ok,
            ..
        }) if previous.is_exposing() => JobPhase::AwaitingData,
        _ => JobPhase::Idle,
    }
}

/// Selects the distinguished camera device and its exposure property.
#[derive(Debug, Clone)]
pub struct CameraMatcher {
    device_pattern: Regex,
    exposure_property: String,
    exposure_element: String,
}

impl CameraMatcher {
    pub fn new(config: &CameraConfig) -> Result<Self, ConfigError> {
        let device_pattern = Regex::new(&config.device_pattern).map_err(|err| {
            ConfigError::InvalidDevicePattern {
                pattern: config.device_pattern.clone(),
                source: err,
            }
        })?;
        Ok(Self {
            device_pattern,
            exposure_property: config.exposure_property.clone(),
            exposure_element: config.exposure_element.clone(),
        })
    }

    pub fn matches_device(&self, device: &str) -> bool {
        self.device_pattern.is_match(device)
    }

    /// The exposure property of the camera, picking the lexically first
    /// matching device when several cameras are present.
    pub fn exposure_property(&self, tree: &PropertyTree) -> Option<PropertyRef> {
        tree.devices()
            .iter()
            .filter(|(name, device)| {
                self.matches_device(name) && device.property(&self.exposure_property).is_some()
            })
            .map(|(name, _)| name)
            .min()
            .map(|name| PropertyRef::new(name, &self.exposure_property))
    }

    pub fn read(&self, tree: &PropertyTree) -> Option<ExposureReading> {
        let prop = self.exposure_property(tree)?;
        let property = tree.get_property(&prop)?;
        Some(ExposureReading {
            state: property.state,
            remaining: property
                .elements
                .text(&self.exposure_element)
                .map(parse_remaining)
                .unwrap_or(0.0),
        })
    }
}

#[derive(Debug, Clone)]
pub struct JobPhaseInference {
    matcher: CameraMatcher,
    current: JobPhase,
    saved: Option<String>,
}

impl JobPhaseInference {
    pub fn new(config: &CameraConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            matcher: CameraMatcher::new(config)?,
            current: JobPhase::Idle,
            saved: None,
        })
    }

    pub fn phase(&self) -> &JobPhase {
        &self.current
    }

    pub fn matcher(&self) -> &CameraMatcher {
        &self.matcher
    }

    /// True if a change to `device` can influence the phase.
    pub fn affects(&self, device: &str) -> bool {
        self.matcher.matches_device(device)
    }

    pub fn recompute(&mut self, tree: &PropertyTree) -> PhaseUpdate {
        let next = next_phase(&self.current, self.saved.as_deref(), self.matcher.read(tree));
        self.set(next)
    }

    /// Records a persisted image. The phase stays `Saved` until [`Self::restart`].
    pub fn image_saved(&mut self, path: impl Into<String>) -> PhaseUpdate {
        let path = path.into();
        self.saved = Some(path.clone());
        self.set(JobPhase::Saved(path))
    }

    /// Releases the sticky saved phase so the next exposure is displayed again.
    pub fn restart(&mut self, tree: &PropertyTree) -> PhaseUpdate {
        self.saved = None;
        let next = next_phase(&JobPhase::Idle, None, self.matcher.read(tree));
        self.set(next)
    }

    pub fn reset(&mut self) -> PhaseUpdate {
        self.saved = None;
        self.set(JobPhase::Idle)
    }

    fn set(&mut self, next: JobPhase) -> PhaseUpdate {
        if self.current == next {
            return PhaseUpdate::Unchanged;
        }
        let from = std::mem::replace(&mut self.current, next.clone());
        log::debug!("Job phase {} -> {}", from, next);
        PhaseUpdate::Changed { from, to: next }
    }
}
