//! Bill lifecycle classification.
//!
//! Pure, synchronous projections over a legislative bill snapshot: which
//! stage it has reached, how much momentum it carries, and whether it is
//! trending right now.

pub mod cache;
pub mod dates;
pub mod momentum;
pub mod progress;
pub mod report;
pub mod schema;
pub mod settings;
pub mod timeline;
pub mod trending;

pub use momentum::{MomentumLevel, MomentumResult, score_momentum};
pub use progress::{ProgressResult, ProgressStatus, Stage, StageRecord, StageRecords, classify_progress};
pub use report::{BillReport, Classifier};
pub use schema::Bill;
pub use settings::{ChamberSizes, ChamberTable, Settings};
pub use trending::{TrendingSignal, is_trending, trending_signal};
