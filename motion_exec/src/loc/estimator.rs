//! Chassis pose estimator
//!
//! Each cycle the wheel distance deltas are integrated into the pose using the heading change
//! from the inertial sensor (or from the difference between the sides when the sensor is
//! unavailable). Vision samples arrive between cycles with a capture time in the past. They are
//! queued and applied at the start of the next cycle: the estimate at the capture time is
//! interpolated from a short history, and the weighted difference between the sample and that
//! past estimate is applied to the current pose and to the history recorded since.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use nalgebra::Vector2;
use serde::Serialize;
use std::collections::VecDeque;

// Internal
use super::{ChassisPose, LocError, Params};
use comms_if::eqpt::chassis::{ChassisSens, VisionPose};
use util::{maths::wrap_pi, module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The pose estimator state
#[derive(Debug, Clone)]
pub struct PoseEstimator {
    params: Params,

    pose: ChassisPose,

    /// Time of the current pose
    time_s: Option<f64>,

    /// Past poses, oldest first
    history: VecDeque<HistoryEntry>,

    /// Vision samples received since the last cycle
    pending_vision: Vec<VisionPose>,

    prev_left_m: Option<f64>,
    prev_right_m: Option<f64>,
    prev_yaw_rad: Option<f64>,

    /// Capture time of the last fused vision sample
    last_vision_s: Option<f64>,

    /// True while the wheel distances are invalid, used to log the fault only once.
    odometry_fault: bool,

    report: StatusReport,
}

#[derive(Debug, Clone, Copy)]
struct HistoryEntry {
    time_s: f64,
    pose: ChassisPose,
}

/// Input data to the estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Time of this cycle.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Wheel and inertial sensor data. `imu` is `None` if the inertial sensor is unavailable.
    pub sens: ChassisSens,
}

/// Status report for the estimator.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct StatusReport {
    /// Number of vision samples fused this cycle
    pub vision_applied: u32,

    /// Number of vision samples dropped this cycle
    pub vision_discarded: u32,

    /// No vision sample has been fused recently, the estimate is pure odometry
    pub vision_stale: bool,

    /// The heading change came from the inertial sensor
    pub imu_heading: bool,

    /// The wheel distances were invalid and the pose was not propagated
    pub odometry_fault: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for PoseEstimator {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl State for PoseEstimator {
    type InitData = &'static str;
    type InitError = LocError;

    type InputData = InputData;
    type OutputData = ChassisPose;
    type StatusReport = StatusReport;
    type ProcError = LocError;

    fn init(
        &mut self,
        init_data: Self::InitData,
        _session: &Session,
    ) -> Result<(), Self::InitError> {
        let params = params::load(init_data).map_err(LocError::ParamLoadError)?;
        *self = Self::new(params);

        Ok(())
    }

    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        self.report = StatusReport::default();

        // Vision samples are only applied on the cycle boundary
        let mut pending = std::mem::take(&mut self.pending_vision);
        pending.sort_by(|a, b| {
            a.timestamp_s
                .partial_cmp(&b.timestamp_s)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for sample in pending.iter() {
            self.apply_vision(sample);
        }

        self.propagate_odometry(&input_data.sens);
        self.record(input_data.time_s);

        self.report.vision_stale = match self.last_vision_s {
            Some(t) => input_data.time_s - t > self.params.stale_after_s,
            None => true,
        };

        Ok((self.pose, self.report))
    }
}

impl PoseEstimator {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            pose: ChassisPose::default(),
            time_s: None,
            history: VecDeque::new(),
            pending_vision: Vec::new(),
            prev_left_m: None,
            prev_right_m: None,
            prev_yaw_rad: None,
            last_vision_s: None,
            odometry_fault: false,
            report: StatusReport::default(),
        }
    }

    /// The current pose estimate.
    pub fn pose(&self) -> &ChassisPose {
        &self.pose
    }

    /// Queue a vision sample, it is fused at the start of the next cycle.
    pub fn add_vision_measurement(&mut self, sample: VisionPose) {
        self.pending_vision.push(sample);
    }

    /// Number of vision samples waiting for the next cycle.
    pub fn num_pending_vision(&self) -> usize {
        self.pending_vision.len()
    }

    /// Replace the estimate with a known pose, discarding the history and pending samples.
    pub fn reset(&mut self, pose: ChassisPose) {
        debug!("Pose estimate reset to {:?}", pose);

        self.pose = ChassisPose {
            position_m: pose.position_m,
            heading_rad: wrap_pi(pose.heading_rad),
        };
        self.history.clear();
        self.pending_vision.clear();
        self.prev_yaw_rad = None;
        self.last_vision_s = None;
    }

    /// Integrate the wheel distance deltas into the pose.
    fn propagate_odometry(&mut self, sens: &ChassisSens) {
        if !(sens.left_distance_m.is_finite() && sens.right_distance_m.is_finite()) {
            if self.odometry_fault {
                trace!("Odometry fault: {:?}", sens);
            } else {
                warn!("Odometry fault, pose held: {:?}", sens);
                self.odometry_fault = true;
            }

            self.report.odometry_fault = true;
            self.prev_left_m = None;
            self.prev_right_m = None;
            return;
        }

        self.odometry_fault = false;

        let (dl, dr) = match (self.prev_left_m, self.prev_right_m) {
            (Some(l), Some(r)) => (sens.left_distance_m - l, sens.right_distance_m - r),
            _ => (0.0, 0.0),
        };

        self.prev_left_m = Some(sens.left_distance_m);
        self.prev_right_m = Some(sens.right_distance_m);

        let yaw_rad = sens
            .imu
            .map(|i| i.yaw_deg)
            .filter(|y| y.is_finite())
            .map(f64::to_radians);

        let dh = match (yaw_rad, self.prev_yaw_rad) {
            (Some(y), Some(p)) => wrap_pi(y - p),
            _ => (dr - dl) / self.params.track_width_m,
        };

        self.report.imu_heading = yaw_rad.is_some();
        self.prev_yaw_rad = yaw_rad;

        let dist = 0.5 * (dl + dr);

        if dist == 0.0 && dh == 0.0 {
            return;
        }

        // Midpoint heading integration
        let mid_heading = self.pose.heading_rad + 0.5 * dh;

        self.pose.position_m += Vector2::new(mid_heading.cos(), mid_heading.sin()) * dist;
        self.pose.heading_rad = wrap_pi(self.pose.heading_rad + dh);
    }

    /// Append the current pose to the history and drop entries outside the window.
    fn record(&mut self, time_s: f64) {
        while let Some(back) = self.history.back() {
            if back.time_s >= time_s {
                self.history.pop_back();
            } else {
                break;
            }
        }

        self.history.push_back(HistoryEntry {
            time_s,
            pose: self.pose,
        });

        let oldest_s = time_s - self.params.history_window_s;
        while let Some(front) = self.history.front() {
            if front.time_s < oldest_s {
                self.history.pop_front();
            } else {
                break;
            }
        }

        self.time_s = Some(time_s);
    }

    /// Estimate of the pose at a past time, `None` if outside the history.
    fn pose_at(&self, time_s: f64) -> Option<ChassisPose> {
        let newest = self.history.back()?;
        if time_s > newest.time_s {
            return None;
        }
        if time_s == newest.time_s {
            return Some(newest.pose);
        }

        self.history
            .iter()
            .zip(self.history.iter().skip(1))
            .find(|(a, b)| a.time_s <= time_s && time_s <= b.time_s)
            .map(|(a, b)| {
                let span = b.time_s - a.time_s;
                let t = if span > 0.0 {
                    (time_s - a.time_s) / span
                } else {
                    0.0
                };
                a.pose.lerp(&b.pose, t)
            })
    }

    /// Blend a vision sample into the estimate at its capture time.
    fn apply_vision(&mut self, sample: &VisionPose) {
        let finite = [
            sample.x_m,
            sample.y_m,
            sample.heading_rad,
            sample.timestamp_s,
            sample.confidence,
        ]
        .iter()
        .all(|v| v.is_finite());

        if !finite {
            debug!("Vision sample discarded, not finite: {:?}", sample);
            self.report.vision_discarded += 1;
            return;
        }

        let now_s = match self.time_s {
            Some(t) => t,
            None => {
                debug!("Vision sample discarded, no odometry yet");
                self.report.vision_discarded += 1;
                return;
            }
        };

        if sample.timestamp_s > now_s {
            debug!(
                "Vision sample discarded, captured at {:.3} s which is after the estimate ({:.3} s)",
                sample.timestamp_s, now_s
            );
            self.report.vision_discarded += 1;
            return;
        }

        let past = match self.pose_at(sample.timestamp_s) {
            Some(p) => p,
            None => {
                debug!(
                    "Vision sample discarded, captured at {:.3} s which is outside the history",
                    sample.timestamp_s
                );
                self.report.vision_discarded += 1;
                return;
            }
        };

        let weight = (self.params.vision_weight * sample.confidence.max(0.0).min(1.0))
            .max(0.0)
            .min(1.0);

        let d_pos = (Vector2::new(sample.x_m, sample.y_m) - past.position_m) * weight;
        let d_heading = wrap_pi(sample.heading_rad - past.heading_rad) * weight;

        self.pose.position_m += d_pos;
        self.pose.heading_rad = wrap_pi(self.pose.heading_rad + d_heading);

        for entry in self.history.iter_mut() {
            if entry.time_s >= sample.timestamp_s {
                entry.pose.position_m += d_pos;
                entry.pose.heading_rad = wrap_pi(entry.pose.heading_rad + d_heading);
            }
        }

        trace!(
            "Vision sample at {:.3} s fused, correction ({:.3}, {:.3}) m {:.4} rad",
            sample.timestamp_s,
            d_pos.x,
            d_pos.y,
            d_heading
        );

        self.last_vision_s = Some(match self.last_vision_s {
            Some(t) => t.max(sample.timestamp_s),
            None => sample.timestamp_s,
        });
        self.report.vision_applied += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comms_if::eqpt::chassis::ImuSens;

    const DT: f64 = 0.02;
    const EPSILON: f64 = 1e-9;

    fn sens(left: f64, right: f64, yaw_deg: Option<f64>) -> ChassisSens {
        ChassisSens {
            left_distance_m: left,
            right_distance_m: right,
            imu: yaw_deg.map(|y| ImuSens {
                pitch_deg: 0.0,
                yaw_deg: y,
            }),
            ..Default::default()
        }
    }

    fn step(est: &mut PoseEstimator, i: usize, s: ChassisSens) -> (ChassisPose, StatusReport) {
        est.proc(&InputData {
            time_s: i as f64 * DT,
            sens: s,
        })
        .unwrap()
    }

    #[test]
    fn test_drift_free_at_rest() {
        let mut est = PoseEstimator::default();
        est.reset(ChassisPose::new(1.0, 2.0, 0.5));
        let start = *est.pose();

        for i in 0..500 {
            let (pose, rpt) = step(&mut est, i, sens(3.0, 3.0, Some(27.0)));
            assert_eq!(pose, start);
            assert!(rpt.vision_stale);
        }

        // Also without the inertial sensor
        for i in 500..1000 {
            let (pose, _) = step(&mut est, i, sens(3.0, 3.0, None));
            assert_eq!(pose, start);
        }
    }

    #[test]
    fn test_straight_line() {
        let mut est = PoseEstimator::default();

        for i in 0..=100 {
            let d = i as f64 * 0.01;
            step(&mut est, i, sens(d, d, Some(0.0)));
        }

        let p = est.pose();
        assert!((p.position_m.x - 1.0).abs() < EPSILON);
        assert!(p.position_m.y.abs() < EPSILON);
        assert!(p.heading_rad.abs() < EPSILON);
    }

    #[test]
    fn test_heading_from_track_width() {
        let params = Params::default();
        let tw = params.track_width_m;
        let mut est = PoseEstimator::new(params);

        // Turn on the spot by a quarter turn without the inertial sensor
        let arc = 0.25 * std::f64::consts::PI * tw;
        for i in 0..=10 {
            let d = arc * i as f64 / 20.0;
            step(&mut est, i, sens(-d, d, None));
        }

        let p = est.pose();
        assert!((p.heading_rad - std::f64::consts::FRAC_PI_4).abs() < 1e-9);
        assert!(p.position_m.norm() < EPSILON);
    }

    #[test]
    fn test_heading_from_imu_wraps() {
        let mut est = PoseEstimator::default();
        est.reset(ChassisPose::new(0.0, 0.0, 3.0));

        step(&mut est, 0, sens(0.0, 0.0, Some(179.0)));
        let (pose, rpt) = step(&mut est, 1, sens(0.0, 0.0, Some(-179.0)));

        // +2 degrees across the wrap
        assert!(rpt.imu_heading);
        assert!((pose.heading_rad - wrap_pi(3.0 + 2f64.to_radians())).abs() < 1e-9);
    }

    #[test]
    fn test_vision_applied_at_capture_time() {
        let mut est = PoseEstimator::default();

        // Drive forward 1 cm per cycle
        for i in 0..=50 {
            let d = i as f64 * 0.01;
            step(&mut est, i, sens(d, d, Some(0.0)));
        }
        assert!((est.pose().position_m.x - 0.5).abs() < EPSILON);

        // Vision saw the robot 0.2 m further along at t = 0.6 s (odometry said 0.3 m then)
        est.add_vision_measurement(VisionPose {
            x_m: 0.5,
            y_m: 0.0,
            heading_rad: 0.0,
            timestamp_s: 0.6,
            confidence: 1.0,
        });

        // Not applied until the next cycle
        assert!((est.pose().position_m.x - 0.5).abs() < EPSILON);
        assert_eq!(est.num_pending_vision(), 1);

        let (pose, rpt) = step(&mut est, 51, sens(0.51, 0.51, Some(0.0)));

        // Half weight correction of 0.2 m, plus the cycle's own 1 cm
        assert_eq!(rpt.vision_applied, 1);
        assert!(!rpt.vision_stale);
        assert!((pose.position_m.x - (0.51 + 0.1)).abs() < 1e-9);
    }

    #[test]
    fn test_vision_discards() {
        let mut est = PoseEstimator::default();
        for i in 0..=200 {
            step(&mut est, i, sens(0.0, 0.0, Some(0.0)));
        }

        let sample = |timestamp_s: f64| VisionPose {
            x_m: 5.0,
            y_m: 5.0,
            heading_rad: 1.0,
            timestamp_s,
            confidence: 1.0,
        };

        // From the future, and older than the history window
        est.add_vision_measurement(sample(10.0));
        est.add_vision_measurement(sample(0.1));
        est.add_vision_measurement(VisionPose {
            x_m: f64::NAN,
            ..sample(3.9)
        });

        let (pose, rpt) = step(&mut est, 201, sens(0.0, 0.0, Some(0.0)));
        assert_eq!(rpt.vision_discarded, 3);
        assert_eq!(rpt.vision_applied, 0);
        assert_eq!(pose, ChassisPose::default());
    }

    #[test]
    fn test_odometry_fault_holds_pose() {
        let mut est = PoseEstimator::default();
        step(&mut est, 0, sens(0.0, 0.0, None));
        step(&mut est, 1, sens(0.1, 0.1, None));

        let (pose, rpt) = step(&mut est, 2, sens(f64::NAN, 0.2, None));
        assert!(rpt.odometry_fault);
        assert!((pose.position_m.x - 0.1).abs() < EPSILON);

        // The distances are re-seeded on recovery, so the jump while faulty is not integrated
        let (pose, rpt) = step(&mut est, 3, sens(5.0, 5.0, None));
        assert!(!rpt.odometry_fault);
        assert!((pose.position_m.x - 0.1).abs() < EPSILON);
    }
}
