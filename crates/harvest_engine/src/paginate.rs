use std::time::Duration;

use harvest_core::{normalize, Record};
use harvest_logging::{harvest_info, harvest_warn};

use crate::source::PageSource;
use crate::{HarvestError, HarvestEvent};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: HarvestEvent);
}

/// Sink that writes every event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: HarvestEvent) {
        match event {
            HarvestEvent::CountResolved { total } => harvest_info!("total = {}", total),
            HarvestEvent::PageFetched {
                accumulated, total, ..
            } => harvest_info!("fetched {}/{}", accumulated, total),
            HarvestEvent::ItemSkipped { offset, reason } => {
                harvest_warn!("skipped item on page at offset {}: {}", offset, reason)
            }
            HarvestEvent::EmptyPage { offset } => {
                harvest_warn!("empty page at offset {}, the source may be rate limiting", offset)
            }
        }
    }
}

/// Result of one pagination run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Harvest {
    /// Records in source page order, then in-page order.
    pub records: Vec<Record>,
    pub total: usize,
    pub pages_fetched: usize,
    pub skipped: usize,
    /// An empty page ended the run before `total` was reached.
    pub stopped_early: bool,
}

/// Drives fetch -> parse -> normalize over offset windows of a [`PageSource`].
///
/// Any transport or parse error aborts the whole run; there is no per-page
/// retry and no partial result.
pub struct Paginator<'a> {
    source: &'a dyn PageSource,
    sink: &'a dyn ProgressSink,
    cooldown: Duration,
}

impl<'a> Paginator<'a> {
    pub fn new(source: &'a dyn PageSource, sink: &'a dyn ProgressSink) -> Self {
        Self {
            source,
            sink,
            cooldown: Duration::ZERO,
        }
    }

    /// Delay between successive page fetches. Zero disables it.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub async fn collect(&self, page_size: usize, total: Option<usize>) -> Result<Harvest, HarvestError> {
        if page_size == 0 {
            return Err(HarvestError::InvalidPageSize);
        }
        let total = match total {
            Some(total) => total,
            None => self.source.total_count().await?,
        };
        self.sink.emit(HarvestEvent::CountResolved { total });

        let mut harvest = Harvest {
            total,
            ..Harvest::default()
        };
        let mut offset = 0;
        while offset < total {
            if harvest.pages_fetched > 0 && !self.cooldown.is_zero() {
                tokio::time::sleep(self.cooldown).await;
            }

            let items = self.source.fetch_page(offset, page_size).await?;
            harvest.pages_fetched += 1;
            if items.is_empty() {
                self.sink.emit(HarvestEvent::EmptyPage { offset });
                harvest.stopped_early = true;
                break;
            }

            let yielded = items.len();
            for item in &items {
                match normalize(item) {
                    Ok(record) => harvest.records.push(record),
                    Err(err) => {
                        harvest.skipped += 1;
                        self.sink.emit(HarvestEvent::ItemSkipped {
                            offset,
                            reason: err.to_string(),
                        });
                    }
                }
            }
            self.sink.emit(HarvestEvent::PageFetched {
                offset,
                yielded,
                accumulated: harvest.records.len(),
                total,
            });
            offset += page_size;
        }

        Ok(harvest)
    }
}
