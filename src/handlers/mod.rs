pub mod analyze;

pub use analyze::{AnalyzeHandler, BridgeReply};
