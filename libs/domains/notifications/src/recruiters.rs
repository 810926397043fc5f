//! Lookup of recruiters, interviewers, and hiring managers.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{NotificationError, NotifyResult};
use crate::models::{Recruiter, RecruiterRole};

/// Lookup of hiring-team members
///
/// Backed by the talent application's persistence layer in production.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecruiterService: Send + Sync {
    /// Get a recruiter by id, failing with `RecruiterNotFound` when absent
    async fn get_by_id(&self, id: i32) -> NotifyResult<Recruiter>;

    /// All recruiters with the interviewer role
    async fn get_all_interviewers(&self) -> NotifyResult<Vec<Recruiter>>;

    /// All recruiters with the hiring manager role
    async fn get_all_hiring_managers(&self) -> NotifyResult<Vec<Recruiter>>;
}

/// In-memory implementation of RecruiterService (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecruiterService {
    recruiters: Arc<RwLock<HashMap<i32, Recruiter>>>,
}

impl InMemoryRecruiterService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recruiters(recruiters: impl IntoIterator<Item = Recruiter>) -> Self {
        let map = recruiters.into_iter().map(|r| (r.id, r)).collect();
        Self {
            recruiters: Arc::new(RwLock::new(map)),
        }
    }

    /// Insert or replace a recruiter
    pub async fn upsert(&self, recruiter: Recruiter) {
        self.recruiters.write().await.insert(recruiter.id, recruiter);
    }

    async fn by_role(&self, role: RecruiterRole) -> Vec<Recruiter> {
        let recruiters = self.recruiters.read().await;
        let mut matching: Vec<Recruiter> = recruiters
            .values()
            .filter(|r| r.role == role)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.id);
        matching
    }
}

#[async_trait]
impl RecruiterService for InMemoryRecruiterService {
    async fn get_by_id(&self, id: i32) -> NotifyResult<Recruiter> {
        self.recruiters
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(NotificationError::RecruiterNotFound(id))
    }

    async fn get_all_interviewers(&self) -> NotifyResult<Vec<Recruiter>> {
        Ok(self.by_role(RecruiterRole::Interviewer).await)
    }

    async fn get_all_hiring_managers(&self) -> NotifyResult<Vec<Recruiter>> {
        Ok(self.by_role(RecruiterRole::HiringManager).await)
    }
}
