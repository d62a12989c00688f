pub mod amount;
pub mod clock;
pub mod config;
pub mod cpq;
pub mod document;
pub mod domain;
pub mod errors;
pub mod exchange;
pub mod format;

pub use clock::{Clock, FixedClock, SystemClock};
pub use cpq::{recompute, LineItemsSummary};
pub use document::{assemble, assemble_quote, Document};
pub use domain::history::{HistoryEntry, HistorySummary, SequenceState, HISTORY_LIMIT};
pub use domain::quote::{
    ClientInfo, CompanyInfo, FinancialSummary, Item, ItemPatch, Observations, Quote,
    QuoteMetadata, QuoteStats,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use exchange::{import_quote, ImportError, QuoteExport};
