mod defaults;
mod io;
mod schema;
mod validate;

pub use io::load_config;
#[allow(unused_imports)]
pub use schema::{
    Alerts, Config, ConsumableDefaults, FleetRatios, Health, Monitor, PrinterEntry, RuntimeConfig,
    Simulation,
};
pub use validate::ConfigError;
