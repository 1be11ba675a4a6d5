//! Energy networks: how throttle becomes thrust, and what it costs.

mod battery_propeller;
mod turbofan;

pub use battery_propeller::BatteryPropeller;
pub use turbofan::TurbofanNetwork;
