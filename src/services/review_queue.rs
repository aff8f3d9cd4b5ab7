use crate::database::sqlite::SqliteDatabase;
use crate::errors::{AppError, Result};
use crate::models::appeal::AppealRecord;
use crate::models::verification::{VerificationRecord, VerificationStatus};
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: i64 = 8;
pub const MAX_PAGE_SIZE: i64 = 100;

/// One page of a review queue. `next_cursor` is the id of the last item and
/// feeds the next call. `has_more` is exact: the page query over-fetches by
/// one row, so a full final page does not trigger a wasted follow-up fetch.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<Uuid>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct StatusCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

/// Cursor-paginated, status-filtered queue views for administrators, over
/// both verifications and appeals.
pub struct ReviewQueueService {
    store: Arc<SqliteDatabase>,
}

impl ReviewQueueService {
    pub fn new(store: Arc<SqliteDatabase>) -> Self {
        Self { store }
    }

    fn clamp_page_size(page_size: Option<i64>) -> i64 {
        page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub async fn list_verifications(
        &self,
        status: VerificationStatus,
        page_size: Option<i64>,
        cursor: Option<Uuid>,
    ) -> Result<Page<VerificationRecord>> {
        let limit = Self::clamp_page_size(page_size);
        let after = match cursor {
            Some(id) => {
                let record = self.store.get_verification(&id).await?.ok_or_else(|| {
                    AppError::InvalidCursor(
                        "Cursor not found. Reset pagination and try again.".to_string(),
                    )
                })?;
                Some((record.created_at, record.id))
            }
            None => None,
        };
        let items = self
            .store
            .list_verifications_page(status, limit + 1, after)
            .await?;
        Ok(Self::page_from(items, limit, |r| r.id))
    }

    pub async fn list_appeals(
        &self,
        status: VerificationStatus,
        page_size: Option<i64>,
        cursor: Option<Uuid>,
    ) -> Result<Page<AppealRecord>> {
        let limit = Self::clamp_page_size(page_size);
        let after = match cursor {
            Some(id) => {
                let appeal = self.store.get_appeal(&id).await?.ok_or_else(|| {
                    AppError::InvalidCursor(
                        "Cursor not found. Reset pagination and try again.".to_string(),
                    )
                })?;
                Some((appeal.created_at, appeal.id))
            }
            None => None,
        };
        let items = self.store.list_appeals_page(status, limit + 1, after).await?;
        Ok(Self::page_from(items, limit, |a| a.id))
    }

    fn page_from<T>(mut items: Vec<T>, limit: i64, id_of: impl Fn(&T) -> Uuid) -> Page<T> {
        let has_more = items.len() as i64 > limit;
        if has_more {
            items.truncate(limit as usize);
        }
        let next_cursor = items.last().map(id_of);
        Page {
            items,
            next_cursor,
            has_more,
        }
    }

    /// Three independent count queries; not transactionally consistent with
    /// each other or with a concurrent listing.
    pub async fn verification_stats(&self) -> Result<StatusCounts> {
        Ok(StatusCounts {
            pending: self
                .store
                .count_verifications(VerificationStatus::Pending)
                .await?,
            approved: self
                .store
                .count_verifications(VerificationStatus::Approved)
                .await?,
            rejected: self
                .store
                .count_verifications(VerificationStatus::Rejected)
                .await?,
        })
    }

    pub async fn appeal_stats(&self) -> Result<StatusCounts> {
        Ok(StatusCounts {
            pending: self.store.count_appeals(VerificationStatus::Pending).await?,
            approved: self
                .store
                .count_appeals(VerificationStatus::Approved)
                .await?,
            rejected: self
                .store
                .count_appeals(VerificationStatus::Rejected)
                .await?,
        })
    }
}
