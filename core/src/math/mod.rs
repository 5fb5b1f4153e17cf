pub mod integrate;
pub mod interp;
pub mod stats;

pub use integrate::IntegrationHelper;
pub use interp::{linspace, NewtonPolynomial};
pub use stats::StatsHelper;
