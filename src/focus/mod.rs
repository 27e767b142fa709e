pub mod motion;
pub mod session;
pub mod timer;

pub use motion::{IioAccelerometer, MotionSource, StillDevice};
pub use session::{FocusExit, FocusSession};
pub use timer::{FocusTimer, Phase};

use crate::config::FocusConfig;
use tracing::warn;

/// Motion source for the configured device, or a still device when none is
/// configured or it can't be opened
pub fn motion_source(config: &FocusConfig) -> Box<dyn MotionSource> {
    match &config.motion_device {
        Some(dir) => match IioAccelerometer::open(dir) {
            Ok(device) => Box::new(device),
            Err(error) => {
                warn!(%error, "motion sensor unavailable, focus runs without it");
                Box::new(StillDevice)
            }
        },
        None => Box::new(StillDevice),
    }
}
