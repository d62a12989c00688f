pub mod aggregate;
pub mod pricing;

pub use aggregate::{line_total, summarize, LineItemsSummary};
pub use pricing::{recompute, recompute_with_trace, PricingResult, PricingTraceStep};
