pub use crate::backoff::RetryPolicy;
pub use crate::errors::AnalyticsError;
pub use crate::event::AnalyticsEvent;
pub use crate::queue::{spawn, AnalyticsHandle};
pub use crate::sink::{AnalyticsSink, HttpSink, MemorySink, NullSink};
