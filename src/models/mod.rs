//! Domain models shared across the whole dashboard backend.

pub mod candle;
pub mod market;
pub mod position;
pub mod response;
pub mod symbol;

pub use candle::Candle;
pub use market::MarketSnapshot;
pub use position::Position;
pub use response::ApiResponse;
pub use symbol::{Symbol, Timeframe};
