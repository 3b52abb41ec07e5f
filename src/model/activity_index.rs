//! Daily solar and geomagnetic activity indices
//!
//! Index files are JSON arrays of `{"date": "YYYY-MM-DD", "f107": .., "ap": ..}`
//! records. Parsed tables are cached per path for the life of the process,
//! so many providers pointing at the same file share one copy.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Days, NaiveDate, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};
use crate::model::background::{ActivityIndexProvider, ActivityIndices};

static INDEX_CACHE: Lazy<Mutex<HashMap<PathBuf, Arc<ActivityIndexTable>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct DailyIndex {
    pub date: NaiveDate,
    pub f107: f64,
    pub ap: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ActivityIndexTable {
    days: BTreeMap<NaiveDate, DailyIndex>,
}

impl ActivityIndexTable {
    pub fn from_records(records: impl IntoIterator<Item = DailyIndex>) -> Self {
        ActivityIndexTable {
            days: records.into_iter().map(|r| (r.date, r)).collect(),
        }
    }

    pub fn from_json_str(json: &str) -> GridResult<Self> {
        let records: Vec<DailyIndex> = serde_json::from_str(json)
            .map_err(|e| GridError::unavailable("activity_index", format!("bad index data: {}", e)))?;
        Ok(Self::from_records(records))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    fn day(&self, date: NaiveDate) -> GridResult<&DailyIndex> {
        self.days.get(&date).ok_or_else(|| {
            GridError::unavailable("activity_index", format!("no index record for {}", date))
        })
    }

    /// F10.7 and Ap of `date`, F10.7 averaged over `smoothing_days` centred on it.
    pub fn lookup(&self, date: NaiveDate, smoothing_days: u32) -> GridResult<ActivityIndices> {
        if smoothing_days == 0 {
            return Err(GridError::invalid_range(
                "smoothing window",
                "at least one day is required",
            ));
        }
        let today = self.day(date)?;

        let first = date
            .checked_sub_days(Days::new(u64::from(smoothing_days / 2)))
            .ok_or_else(|| GridError::invalid_range("smoothing window", "out of calendar range"))?;

        let mut total = 0.0;
        for offset in 0..smoothing_days {
            let day = first
                .checked_add_days(Days::new(u64::from(offset)))
                .ok_or_else(|| GridError::invalid_range("smoothing window", "out of calendar range"))?;
            total += self.day(day)?.f107;
        }

        Ok(ActivityIndices {
            f107: today.f107,
            f107_smoothed: total / f64::from(smoothing_days),
            ap: today.ap,
        })
    }
}

impl ActivityIndexProvider for ActivityIndexTable {
    fn name(&self) -> &str {
        "activity_index_table"
    }

    fn indices(&self, date: DateTime<Utc>, smoothing_days: u32) -> GridResult<ActivityIndices> {
        self.lookup(date.date_naive(), smoothing_days)
    }
}

/// Reads its table from disk on first use.
#[derive(Debug)]
pub struct FileActivityIndexProvider {
    path: PathBuf,
}

impl FileActivityIndexProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileActivityIndexProvider {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn table(&self) -> GridResult<Arc<ActivityIndexTable>> {
        let mut cache = INDEX_CACHE
            .lock()
            .map_err(|_| GridError::unavailable("activity_index", "index cache poisoned"))?;
        if let Some(table) = cache.get(&self.path) {
            return Ok(table.clone());
        }

        let json = fs::read_to_string(&self.path).map_err(|e| {
            GridError::unavailable(
                "activity_index",
                format!("failed to read {}: {}", self.path.display(), e),
            )
        })?;
        let table = Arc::new(ActivityIndexTable::from_json_str(&json)?);
        cache.insert(self.path.clone(), table.clone());
        Ok(table)
    }

    pub fn clear_cache() {
        if let Ok(mut cache) = INDEX_CACHE.lock() {
            cache.clear();
        }
    }
}

impl ActivityIndexProvider for FileActivityIndexProvider {
    fn name(&self) -> &str {
        "activity_index_file"
    }

    fn indices(&self, date: DateTime<Utc>, smoothing_days: u32) -> GridResult<ActivityIndices> {
        self.table()?.lookup(date.date_naive(), smoothing_days)
    }
}
