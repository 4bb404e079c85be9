use std::thread::JoinHandle;
use std::time::Duration;

use diffdrive_kinematics::WheelSpeeds;
use spin_sleep::SpinSleeper;
use tracing::info;

use crate::bus::LatestSender;
use crate::config::SourceSettings;

/// Stand-in for the motor controller: reports constant wheel speeds at a
/// fixed rate on its own thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelSpeedSource {
    speeds: WheelSpeeds,
    period: Duration,
}

impl WheelSpeedSource {
    pub fn new(speeds: WheelSpeeds, period: Duration) -> Self {
        WheelSpeedSource { speeds, period }
    }

    pub fn from_settings(settings: &SourceSettings, period: Duration) -> Self {
        WheelSpeedSource::new(WheelSpeeds::new(settings.right, settings.left), period)
    }

    /// Runs until the estimator side of the inlet is dropped.
    pub fn spawn(self, inlet: LatestSender<WheelSpeeds>) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("wheel-speed".into())
            .spawn(move || {
                info!(speeds = %self.speeds, period = ?self.period, "Wheel speed source started.");
                let sleeper = SpinSleeper::new(100_000);
                while inlet.send(self.speeds) {
                    sleeper.sleep(self.period);
                }
                info!("Wheel speed inlet closed; source stopping.");
            })
    }
}
