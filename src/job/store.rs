use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use super::model::Job;

/// In-memory registry of jobs keyed by ID.
///
/// Each job is held behind an `Arc`; mutation clones the current snapshot,
/// applies the change, and swaps in a fresh `Arc` under the shard lock
/// `DashMap` already holds for that key. Readers calling [`JobStore::get`]
/// only ever clone an `Arc`, so a reader never observes a torn `Job` — it
/// gets either the pre- or the post-mutation snapshot, never a mix of both.
#[derive(Default)]
pub struct JobStore {
    jobs: DashMap<Uuid, Arc<Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
        }
    }

    pub fn insert(&self, job: Job) -> Arc<Job> {
        let job = Arc::new(job);
        self.jobs.insert(job.id, job.clone());
        job
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<Job>> {
        self.jobs.get(&id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.jobs.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Applies `mutate` to a clone of the current job and stores the result,
    /// bumping `updated_at`. Returns `None` if no job with that ID exists.
    pub fn update(&self, id: Uuid, mutate: impl FnOnce(&mut Job)) -> Option<Arc<Job>> {
        let mut entry = self.jobs.get_mut(&id)?;
        let mut next = (**entry).clone();
        mutate(&mut next);
        next.touch(Utc::now());
        let next = Arc::new(next);
        *entry = next.clone();
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrawlConfig, WebhookConfig};
    use crate::job::model::JobConfig;
    use std::collections::HashMap;

    fn sample_job() -> Job {
        let cfg = CrawlConfig::builder()
            .start_url("example.com")
            .unwrap()
            .webhook(WebhookConfig {
                url: "https://hooks.example.com/cb".into(),
                headers: HashMap::new(),
                retries: 3,
                on: None,
            })
            .build()
            .unwrap();
        Job::new(Uuid::new_v4(), JobConfig::Crawl(cfg), Utc::now())
    }

    #[test]
    fn readers_never_see_a_torn_job() {
        let store = JobStore::new();
        let job = sample_job();
        let id = job.id;
        let inserted = store.insert(job);
        let before = store.get(id).unwrap();
        store.update(id, |j| j.progress.pages_analyzed = 5);
        let after = store.get(id).unwrap();
        assert_eq!(before.progress.pages_analyzed, 0);
        assert_eq!(after.progress.pages_analyzed, 5);
        assert!(after.updated_at >= inserted.created_at);
    }

    #[test]
    fn update_on_missing_job_is_none() {
        let store = JobStore::new();
        assert!(store.update(Uuid::new_v4(), |_| {}).is_none());
    }
}
