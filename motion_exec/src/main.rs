//! Main motion executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules and the simulated plant
//!     - Main loop:
//!         - Telecommand processing (from a script)
//!         - Sensor acquisition from the plant, including delayed vision samples
//!         - Control cycle:
//!             - Arm control
//!             - Pose estimation
//!             - Balance control (when active)
//!             - Chassis control
//!         - Demands to the plant
//!         - Telemetry archiving
//!
//! # Modules
//!
//! All modules (e.g. `arm_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!     2. Be constructible from their parameters alone, without any global state.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, error, info, warn};
use std::{
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};
use structopt::StructOpt;

// Internal
use motion_lib::{
    data_store::{DataStore, SafeModeCause},
    params::MotionExecParams,
    sim::SimPlant,
    tc_processor,
    tm::TmSample,
    CYCLE_FREQUENCY_HZ, CYCLE_PERIOD_S,
};
use util::{
    archive::Archived,
    host,
    logger::{level_from_str, logger_init},
    module::State,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(
    name = "motion_exec",
    about = "Runs the motion-control core against the simulated plant"
)]
struct Opt {
    /// TC script to execute, lines of `<time_s>: <json tc>;`
    #[structopt(parse(from_os_str))]
    script: Option<PathBuf>,

    /// Minimum log level (info, debug or trace)
    #[structopt(short, long, default_value = "info")]
    log_level: String,

    /// Run time in seconds when no script is given, overrides the parameter file
    #[structopt(short, long)]
    duration: Option<f64>,

    /// Run cycles back to back rather than in real time
    #[structopt(long)]
    fast: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session =
        Session::new("motion_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    let log_level = level_from_str(&opt.log_level)
        .ok_or_else(|| eyre!("Invalid log level \"{}\"", opt.log_level))?;
    logger_init(log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Motion Executable\n");
    info!("Started at {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!(
        "Software root: {:?}",
        host::get_motion_sw_root().wrap_err("Failed to get the software root")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: MotionExecParams =
        util::params::load("motion_exec.toml").wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SOURCE ----

    let mut script = match opt.script {
        Some(ref path) => {
            info!("Loading script from {:?}", path);

            let si = ScriptInterpreter::new(path).wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} TCs\n",
                si.get_duration(),
                si.get_num_tcs()
            );

            Some(si)
        }
        None => None,
    };

    let duration_s = opt.duration.unwrap_or(exec_params.default_duration_s);
    if script.is_none() {
        info!("No script provided, running for {:.02} s\n", duration_s);
    }

    let real_time = exec_params.real_time && !opt.fast;

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.arm_ctrl
        .init("arm_ctrl.toml", &session)
        .wrap_err("Failed to initialise ArmCtrl")?;
    info!("ArmCtrl init complete");

    ds.chassis_ctrl
        .init("chassis_ctrl.toml", &session)
        .wrap_err("Failed to initialise ChassisCtrl")?;
    info!("ChassisCtrl init complete");

    ds.pose_estimator
        .init("loc.toml", &session)
        .wrap_err("Failed to initialise the pose estimator")?;
    info!("Pose estimator init complete");

    ds.balance_ctrl
        .init("balance_ctrl.toml", &session)
        .wrap_err("Failed to initialise BalanceCtrl")?;
    info!("BalanceCtrl init complete");

    if exec_params.archive_tm {
        ds.init_archive(&session)
            .wrap_err("Failed to open the telemetry archive")?;
    }

    info!("Module initialisation complete\n");

    // ---- INITIALISE PLANT ----

    let mut sim = SimPlant::from_params_file("sim.toml").wrap_err("Failed to initialise the sim")?;

    if !sim.imu_available() {
        ds.report_imu_init_fault();
    }

    info!("Simulated plant initialised");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let cycle_period = Duration::from_secs_f64(CYCLE_PERIOD_S);

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- TELECOMMAND PROCESSING ----

        match script {
            Some(ref mut si) => match si.get_pending_tcs(ds.time_s) {
                PendingTcs::None => (),
                PendingTcs::Some(tc_vec) => {
                    for tc in tc_vec.iter() {
                        tc_processor::exec(&mut ds, tc);
                    }
                }
                // Exit if end of script reached
                PendingTcs::EndOfScript => {
                    info!("End of TC script reached, stopping");
                    break;
                }
            },
            None => {
                if ds.time_s >= duration_s {
                    info!("Run time elapsed, stopping");
                    break;
                }
            }
        }

        // ---- DATA INPUT ----

        for sample in sim.take_vision() {
            ds.add_vision_measurement(sample);
        }

        let sens = sim.sens();

        // ---- CONTROL ALGORITHM PROCESSING ----

        ds.cycle(&sens, CYCLE_PERIOD_S);

        // ---- DEMANDS OUTPUT ----

        sim.step(&ds.arm_ctrl_output, &ds.chassis_ctrl_output, CYCLE_PERIOD_S);

        // ---- TELEMETRY ----

        if exec_params.archive_tm {
            if let Err(e) = ds.write() {
                warn!("Could not archive telemetry: {}", e);
            }
        }

        if ds.num_cycles % (CYCLE_FREQUENCY_HZ as u128) == 0 {
            debug!(
                "Arm ({:.1}, {:.1}) deg, pose ({:.2}, {:.2}) m {:.2} rad, balance {:?}",
                ds.arm_ctrl.shoulder().state().measured_angle_deg,
                ds.arm_ctrl.elbow().state().measured_angle_deg,
                ds.pose.position_m.x,
                ds.pose.position_m.y,
                ds.pose.heading_rad,
                ds.balance_ctrl.state()
            );
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        match cycle_period.checked_sub(cycle_dur) {
            Some(remaining) => {
                ds.num_consec_cycle_overruns = 0;
                ds.make_unsafe(SafeModeCause::CycleOverrun).ok();

                if real_time {
                    thread::sleep(remaining);
                }
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;

                if ds.num_consec_cycle_overruns > exec_params.max_consec_cycle_overruns && !ds.safe
                {
                    error!(
                        "{} consecutive cycle overruns, entering safe mode",
                        ds.num_consec_cycle_overruns
                    );
                    ds.make_safe(SafeModeCause::CycleOverrun);
                }
            }
        }
    }

    // ---- SHUTDOWN ----

    let final_tm = serde_json::to_string_pretty(&TmSample::from_ds(&ds))
        .wrap_err("Could not serialise the final telemetry")?;

    info!("Final state after {} cycles:\n{}", ds.num_cycles, final_tm);
    info!("True pose: {:?}", sim.true_pose());

    Ok(())
}
