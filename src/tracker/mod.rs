pub mod normalize;
pub mod turn;

pub use normalize::CoordinateNormalizer;
pub use turn::{AxisState, CalibratedDistances, TurnEstimator, TurnEvent, TurnOutput, TurnState};
