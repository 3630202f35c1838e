//! Implementations for the BalanceCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace, warn};
use serde::Serialize;

// Internal
use super::{BalanceCtrlError, Params};
use util::{module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Balance controller state
#[derive(Debug, Clone, Default)]
pub struct BalanceCtrl {
    params: Params,

    state: BalanceState,

    /// Pitch on the previous cycle, `None` after a start or a missing reading
    prev_pitch_deg: Option<f64>,

    /// True while the pitch is missing, used to log the fault only once.
    pitch_fault: bool,

    report: StatusReport,
}

/// Input data to the balance controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Chassis pitch, positive nose up, or `None` if the inertial sensor is unavailable.
    ///
    /// Units: degrees
    pub pitch_deg: Option<f64>,

    /// Period of this cycle.
    ///
    /// Units: seconds
    pub dt_s: f64,
}

/// The chassis demand from the balance controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BalanceOutput {
    /// Forward speed.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Engage the brake idle mode.
    pub brake: bool,
}

/// Status report for BalanceCtrl processing.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct StatusReport {
    pub state: BalanceState,

    /// Units: degrees/second
    pub pitch_rate_degs: f64,

    /// The pitch rate was at or above the threshold, speed zeroed.
    pub tipping: bool,

    /// No valid pitch reading, speed zeroed.
    pub pitch_fault: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BalanceState {
    /// Not running.
    Inactive,

    /// Started, the platform has not yet been seen tipping or reached the on-platform pitch.
    Approaching,

    /// On the platform, driving towards the low side.
    Correcting,

    /// Level and braked. Remains here until cancelled.
    Settled,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for BalanceState {
    fn default() -> Self {
        BalanceState::Inactive
    }
}

impl State for BalanceCtrl {
    type InitData = &'static str;
    type InitError = BalanceCtrlError;

    type InputData = InputData;
    type OutputData = BalanceOutput;
    type StatusReport = StatusReport;
    type ProcError = BalanceCtrlError;

    fn init(
        &mut self,
        init_data: Self::InitData,
        _session: &Session,
    ) -> Result<(), Self::InitError> {
        let params = params::load(init_data).map_err(BalanceCtrlError::ParamLoadError)?;
        *self = Self::new(params);

        Ok(())
    }

    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        self.report = StatusReport::default();

        let output = match self.state {
            BalanceState::Inactive => BalanceOutput::default(),
            BalanceState::Settled => BalanceOutput {
                speed_ms: 0.0,
                brake: true,
            },
            BalanceState::Approaching | BalanceState::Correcting => self.drive(input_data),
        };

        self.report.state = self.state;

        trace!("BalanceCtrl {:?}: {:?}", self.state, output);

        Ok((output, self.report))
    }
}

impl BalanceCtrl {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// Begin the behaviour.
    ///
    /// The chassis should already be on the ramp. Started on level ground the behaviour settles
    /// on the first tick.
    pub fn start(&mut self) {
        self.prev_pitch_deg = None;
        self.transition(BalanceState::Approaching);
    }

    /// Abandon the behaviour. The returned demand is zero speed without the brake, and applies
    /// immediately.
    pub fn cancel(&mut self) -> BalanceOutput {
        self.prev_pitch_deg = None;
        self.transition(BalanceState::Inactive);

        BalanceOutput::default()
    }

    pub fn state(&self) -> BalanceState {
        self.state
    }

    /// True if the chassis demand should come from this controller.
    pub fn is_active(&self) -> bool {
        self.state != BalanceState::Inactive
    }

    fn drive(&mut self, input_data: &InputData) -> BalanceOutput {
        let pitch_deg = match input_data.pitch_deg.filter(|p| p.is_finite()) {
            Some(p) => p,
            None => {
                if !self.pitch_fault {
                    warn!("BalanceCtrl has no pitch reading, stopping");
                    self.pitch_fault = true;
                }
                self.report.pitch_fault = true;
                self.prev_pitch_deg = None;
                return BalanceOutput::default();
            }
        };
        self.pitch_fault = false;

        // The first sample after a start or a fault has no rate
        let rate_degs = match self.prev_pitch_deg {
            Some(prev) if input_data.dt_s > 0.0 => (pitch_deg - prev) / input_data.dt_s,
            _ => 0.0,
        };
        self.prev_pitch_deg = Some(pitch_deg);
        self.report.pitch_rate_degs = rate_degs;

        // Platform still moving, the pitch sign cannot be trusted
        if rate_degs.abs() >= self.params.pitch_rate_threshold_degs {
            self.report.tipping = true;
            self.transition(BalanceState::Correcting);
            return BalanceOutput::default();
        }

        if pitch_deg.abs() < self.params.level_tolerance_deg {
            self.transition(BalanceState::Settled);
            return BalanceOutput {
                speed_ms: 0.0,
                brake: true,
            };
        }

        if pitch_deg.abs() >= self.params.on_platform_tolerance_deg {
            self.transition(BalanceState::Correcting);
        }

        BalanceOutput {
            speed_ms: if pitch_deg > 0.0 {
                self.params.balance_speed_ms
            } else {
                -self.params.balance_speed_ms
            },
            brake: false,
        }
    }

    fn transition(&mut self, next: BalanceState) {
        if self.state != next {
            info!("BalanceCtrl {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Slow enough that a 1 degree step is well under the default rate threshold
    const DT: f64 = 0.2;

    fn run(ctrl: &mut BalanceCtrl, pitch: Option<f64>) -> (BalanceOutput, StatusReport) {
        run_dt(ctrl, pitch, DT)
    }

    fn run_dt(
        ctrl: &mut BalanceCtrl,
        pitch: Option<f64>,
        dt_s: f64,
    ) -> (BalanceOutput, StatusReport) {
        ctrl.proc(&InputData {
            pitch_deg: pitch,
            dt_s,
        })
        .unwrap()
    }

    #[test]
    fn test_inactive_does_nothing() {
        let mut ctrl = BalanceCtrl::default();
        let (out, rpt) = run(&mut ctrl, Some(12.0));
        assert_eq!(out, BalanceOutput::default());
        assert_eq!(rpt.state, BalanceState::Inactive);
    }

    #[test]
    fn test_approach() {
        let mut ctrl = BalanceCtrl::default();
        ctrl.start();
        assert!(ctrl.is_active());

        // Up the ramp, slow enough not to trip the rate check
        for p in [5.0, 6.0, 7.0, 8.0, 9.0].iter() {
            let (out, rpt) = run(&mut ctrl, Some(*p));
            assert_eq!(rpt.state, BalanceState::Approaching);
            assert_eq!(out.speed_ms, Params::default().balance_speed_ms);
        }

        let (out, rpt) = run(&mut ctrl, Some(10.0));
        assert_eq!(rpt.state, BalanceState::Correcting);
        assert_eq!(out.speed_ms, Params::default().balance_speed_ms);
    }

    #[test]
    fn test_rate_spike_while_approaching() {
        let mut ctrl = BalanceCtrl::default();
        ctrl.start();

        let (out, _) = run_dt(&mut ctrl, Some(5.0), 0.02);
        assert!(out.speed_ms > 0.0);

        // 4 degrees in one 20 ms cycle
        let (out, rpt) = run_dt(&mut ctrl, Some(9.0), 0.02);
        assert!(rpt.tipping);
        assert_eq!(out, BalanceOutput::default());
        assert_eq!(rpt.state, BalanceState::Correcting);
    }

    #[test]
    fn test_level_sequence() {
        let mut ctrl = BalanceCtrl::default();
        ctrl.start();

        let mut last = BalanceOutput::default();
        let pitches = [10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0, 0.5];
        for (i, p) in pitches.iter().enumerate() {
            let (out, rpt) = run(&mut ctrl, Some(*p));
            assert!(!rpt.tipping);

            if *p >= 2.0 {
                assert_eq!(rpt.state, BalanceState::Correcting, "step {}", i);
                assert_eq!(out.speed_ms, Params::default().balance_speed_ms);
                assert!(!out.brake);
            }
            last = out;
        }

        assert_eq!(ctrl.state(), BalanceState::Settled);
        assert_eq!(last.speed_ms, 0.0);
        assert!(last.brake);
    }

    #[test]
    fn test_level_sequence_below_platform_pitch() {
        let mut ctrl = BalanceCtrl::default();
        ctrl.start();

        let mut last = BalanceOutput::default();
        let pitches = [9.5, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0, 0.5];
        for p in pitches.iter() {
            let (out, rpt) = run(&mut ctrl, Some(*p));
            assert!(!rpt.tipping);
            last = out;
        }

        assert_eq!(ctrl.state(), BalanceState::Settled);
        assert_eq!(last.speed_ms, 0.0);
        assert!(last.brake);
    }

    #[test]
    fn test_level_ground_settles_at_once() {
        let mut ctrl = BalanceCtrl::default();
        ctrl.start();

        let (out, rpt) = run(&mut ctrl, Some(0.5));
        assert_eq!(rpt.state, BalanceState::Settled);
        assert_eq!(out.speed_ms, 0.0);
        assert!(out.brake);
    }

    #[test]
    fn test_tipping_zeroes_speed() {
        let mut ctrl = BalanceCtrl::default();
        ctrl.start();

        run(&mut ctrl, Some(12.0));
        let (out, _) = run(&mut ctrl, Some(11.0));
        assert!(out.speed_ms > 0.0);

        // Platform swings past level, 8 degrees in one cycle
        let (out, rpt) = run(&mut ctrl, Some(-5.0));
        assert!(rpt.tipping);
        assert_eq!(out.speed_ms, 0.0);
        assert!(!out.brake);
        assert_eq!(rpt.state, BalanceState::Correcting);

        // Settled momentarily nose down, reverse
        let (out, rpt) = run(&mut ctrl, Some(-5.5));
        assert!(!rpt.tipping);
        assert_eq!(out.speed_ms, -Params::default().balance_speed_ms);
    }

    #[test]
    fn test_cancel_releases_brake() {
        let mut ctrl = BalanceCtrl::default();
        ctrl.start();
        run(&mut ctrl, Some(11.0));
        run(&mut ctrl, Some(10.5));

        let out = ctrl.cancel();
        assert_eq!(out, BalanceOutput::default());
        assert!(!ctrl.is_active());

        let (out, rpt) = run(&mut ctrl, Some(0.0));
        assert_eq!(out, BalanceOutput::default());
        assert_eq!(rpt.state, BalanceState::Inactive);
    }

    #[test]
    fn test_missing_pitch() {
        let mut ctrl = BalanceCtrl::default();
        ctrl.start();
        run(&mut ctrl, Some(11.0));

        let (out, rpt) = run(&mut ctrl, None);
        assert!(rpt.pitch_fault);
        assert_eq!(out.speed_ms, 0.0);

        // A large jump across the gap is not read as a rate
        let (out, rpt) = run(&mut ctrl, Some(6.0));
        assert!(!rpt.pitch_fault);
        assert_eq!(rpt.pitch_rate_degs, 0.0);
        assert!(out.speed_ms > 0.0);
    }
}
