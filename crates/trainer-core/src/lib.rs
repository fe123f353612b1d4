//! Opening trainer session engine.
//!
//! The opponent never searches: its replies are drawn from opening-explorer
//! statistics, weighted by how often each move was played in real games.

pub mod board;
pub mod error;
pub mod lookup;
pub mod model;
pub mod position;
pub mod record;
pub mod resolver;
pub mod sampler;
pub mod session;

pub use shakmaty;

pub use board::BoardView;
pub use error::{LookupError, PositionError, ResolveError, SessionError};
pub use lookup::{EvalLookup, StatsLookup};
pub use model::{
    Evaluation, Filters, OpeningStatEntry, PlayedMove, RatingBand, SessionConfig, Speed, StatsRow,
};
pub use resolver::{OpponentResolver, Resolution};
pub use sampler::Sample;
pub use session::{OpponentRequest, Phase, Session, Step};
