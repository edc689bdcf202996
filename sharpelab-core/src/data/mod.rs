//! Price ingestion: tabular files, the remote quote API, and date alignment.

pub mod align;
pub mod alpha_vantage;
pub mod coverage;
pub mod fields;
pub mod provider;
pub mod remote;
pub mod tabular;
pub mod universe;

pub use align::SeriesArena;
pub use alpha_vantage::{parse_daily_payload, AlphaVantageClient, DailyCloses};
pub use coverage::{coverage, CoverageReport};
pub use fields::{parse_date, parse_price};
pub use provider::{DataError, DownloadProgress, QuoteTransport, SilentProgress, StdoutProgress};
pub use remote::RemoteSource;
pub use tabular::TabularSource;
pub use universe::Universe;
