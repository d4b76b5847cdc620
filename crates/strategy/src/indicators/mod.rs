pub mod flag;
pub mod points;
pub mod slope;

pub use flag::{FlagIndicator, FlagParams, FlagVerdict};
pub use points::to_points;
pub use slope::{
    angle_between_slopes, naive_slope, within_absolute_tolerance, within_percent_tolerance,
};
