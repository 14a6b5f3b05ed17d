use crate::dates::{Clock, SystemClock};
use crate::momentum::{MomentumResult, score_momentum};
use crate::progress::{ProgressResult, classify_progress};
use crate::schema::Bill;
use crate::settings::{ChamberTable, Settings};
use crate::trending::{TrendingSignal, trending_signal};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BillReport {
    pub id: String,
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub jurisdiction: Option<String>,
    pub progress: ProgressResult,
    pub momentum: MomentumResult,
    pub trending: bool,
    pub trending_signal: Option<TrendingSignal>,
}

/// Runs all three classifiers against one snapshot of "now".
#[derive(Clone)]
pub struct Classifier {
    settings: Settings,
    chambers: ChamberTable,
    clock: Arc<dyn Clock>,
}

impl Classifier {
    pub fn new(settings: Settings, chambers: ChamberTable) -> Self {
        Self {
            settings,
            chambers,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn progress(&self, bill: &Bill) -> ProgressResult {
        classify_progress(bill)
    }

    pub fn momentum(&self, bill: &Bill) -> MomentumResult {
        score_momentum(bill, &self.settings.windows, self.clock.now())
    }

    pub fn is_trending(&self, bill: &Bill) -> bool {
        trending_signal(bill, &self.settings.trending, &self.chambers, self.clock.now()).is_some()
    }

    pub fn report(&self, bill: &Bill) -> BillReport {
        let now = self.clock.now();
        let signal = trending_signal(bill, &self.settings.trending, &self.chambers, now);
        BillReport {
            id: bill.id.clone(),
            identifier: bill.identifier.clone(),
            title: bill.title.clone(),
            jurisdiction: bill.jurisdiction_name().map(str::to_string),
            progress: classify_progress(bill),
            momentum: score_momentum(bill, &self.settings.windows, now),
            trending: signal.is_some(),
            trending_signal: signal,
        }
    }

    pub fn report_all(&self, bills: &[Bill]) -> Vec<BillReport> {
        bills.iter().map(|bill| self.report(bill)).collect()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(Settings::default(), ChamberTable::default())
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("settings", &self.settings)
            .field("chambers", &self.chambers.len())
            .finish()
    }
}
