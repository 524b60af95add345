//! Navigation simulation executable entry point.
//!
//! # Architecture
//!
//! - Start a session and the logger
//! - Load and check the parameters, from `params/nav_exec.toml` under the software root or the
//!   file given as the first argument
//! - Build the scene and modules
//! - Run the sense/plan/act loop until the robot reaches the ball, collides or runs out of time
//! - Save the result into the session directory

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info};
use std::env;

// Internal
use nav_lib::{params::NavExecParams, sim::SimLoop};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default parameter file, relative to the software root's params directory.
const PARAMS_FILE: &str = "nav_exec.toml";

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("nav_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Info, LevelFilter::Debug, Some(&session))
        .wrap_err("Failed to initialise logging")?;

    info!("Navigation Simulation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    let params: NavExecParams = match args.get(1) {
        Some(path) => {
            info!("Loading parameters from \"{}\"", path);
            util::params::load_from_path(path)
        }
        None => util::params::load(PARAMS_FILE),
    }
    .wrap_err("Could not load exec params")?;

    params.validate().wrap_err("Invalid exec params")?;

    info!("Exec parameters loaded (scene seed {})", params.sim.seed);

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut sim = SimLoop::new(&params, Some(&session)).wrap_err("Failed to build the simulation")?;

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Beginning main loop\n");

    let result = sim.run().wrap_err("Simulation failed")?;

    info!("Result: {:#?}", result);

    session
        .save_json("result.json", &result)
        .wrap_err("Could not save the result")?;

    info!("End of execution");

    Ok(())
}
