pub mod bands;
pub mod config;
pub mod conflict;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod models;
pub mod rules;
pub mod spatial;
pub mod urgency;

pub use bands::{
    compute_axis, Axis, AxisConfig, AxisDomain, Bands, BandsMerger, BandsRange, ColoredValue,
    Interval, LevelDetector, Region, SearchContext,
};
pub use config::{DaaConfig, UrgencyKind, VerticalKind};
pub use conflict::{
    ConflictData, ConflictInterval, Cylinder, Detection, HorizontalCriterion, VerticalCriterion,
    WellClear,
};
pub use diagnostics::Diagnostics;
pub use engine::{DaaEngine, DaaReport, IntruderReport};
pub use error::{ConfigError, DaaError, FrameError, MergeError};
pub use models::{AircraftId, KinematicState, Role, TrafficFrame, Vect2, Vect3, Velocity};
pub use rules::{validate_horizon, AlertLevel, WcvTable};
pub use urgency::UrgencyStrategy;
