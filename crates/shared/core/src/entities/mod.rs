mod data;
mod features;
mod pattern;
mod signal;
mod signal_type;

pub use data::{FeedbackData, InteractionData, MetricData, SearchData, SignalData};
pub use features::{FeatureValue, Features};
pub use pattern::{Pattern, PatternType};
pub use signal::{Signal, SignalBuilder};
pub use signal_type::SignalType;
