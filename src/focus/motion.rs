use super::timer::{FocusTimer, Phase, TimerEvent};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Open band of acceleration magnitudes (in g) counted as lying still
pub const STABLE_MIN: f64 = 0.95;
pub const STABLE_MAX: f64 = 1.05;

const STANDARD_GRAVITY: f64 = 9.80665;

#[derive(Debug, Error)]
pub enum MotionError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unexpected value {value:?} in {path}")]
    Parse { path: PathBuf, value: String },
}

/// One accelerometer reading in g
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl MotionSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn is_stable(&self) -> bool {
        let magnitude = self.magnitude();
        magnitude > STABLE_MIN && magnitude < STABLE_MAX
    }
}

/// Tracks whether the device is still and flags the moment it starts moving
#[derive(Debug, Clone)]
pub struct StabilityMonitor {
    stable: bool,
}

impl Default for StabilityMonitor {
    fn default() -> Self {
        Self { stable: true }
    }
}

impl StabilityMonitor {
    pub fn is_stable(&self) -> bool {
        self.stable
    }

    /// `DeviceMoved` only on a still-to-moving edge during a running Work phase
    pub fn observe(&mut self, sample: MotionSample, timer: &FocusTimer) -> Option<TimerEvent> {
        let stable = sample.is_stable();
        let moved = self.stable && !stable && timer.is_running() && timer.phase() == Phase::Work;
        self.stable = stable;
        moved.then_some(TimerEvent::DeviceMoved)
    }
}

/// Anything that can be asked for the current acceleration
pub trait MotionSource: Send {
    fn sample(&mut self) -> Result<MotionSample, MotionError>;

    fn describe(&self) -> String;
}

/// Reports a device lying flat; used when no sensor is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct StillDevice;

impl MotionSource for StillDevice {
    fn sample(&mut self) -> Result<MotionSample, MotionError> {
        Ok(MotionSample::new(0.0, 0.0, 1.0))
    }

    fn describe(&self) -> String {
        "no motion sensor".to_string()
    }
}

/// Linux industrial-I/O accelerometer, e.g. `/sys/bus/iio/devices/iio:device0`
#[derive(Debug, Clone)]
pub struct IioAccelerometer {
    dir: PathBuf,
    /// m/s² per raw unit
    scale: f64,
}

impl IioAccelerometer {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, MotionError> {
        let dir = dir.as_ref().to_path_buf();
        let scale_path = dir.join("in_accel_scale");
        let scale = if scale_path.exists() {
            read_number(&scale_path)?
        } else {
            1.0
        };
        let device = Self { dir, scale };
        // fail early when the axis files are missing
        device.read_axis("x")?;
        Ok(device)
    }

    fn read_axis(&self, axis: &str) -> Result<f64, MotionError> {
        read_number(&self.dir.join(format!("in_accel_{}_raw", axis)))
    }
}

impl MotionSource for IioAccelerometer {
    fn sample(&mut self) -> Result<MotionSample, MotionError> {
        let to_g = self.scale / STANDARD_GRAVITY;
        Ok(MotionSample::new(
            self.read_axis("x")? * to_g,
            self.read_axis("y")? * to_g,
            self.read_axis("z")? * to_g,
        ))
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

fn read_number(path: &Path) -> Result<f64, MotionError> {
    let content = fs::read_to_string(path).map_err(|source| MotionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    content.trim().parse().map_err(|_| MotionError::Parse {
        path: path.to_path_buf(),
        value: content.trim().to_string(),
    })
}
