// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `CrawlerWorker`: the reference `ReturnsChildJobs=true` worker (§4.J),
//! registered under one `WorkerType` for both the Definition and Job roles.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cookie::Cookie;
use qo_core::{Document, Event, JobDefinitionId, JobId, JobStep, LogLevel, QueueJob, WorkItem, WorkStrategy, WorkerInitResult, WorkerType};
use qo_registry::{CredentialResolver, DefinitionWorker, JobWorker, RenderError, Renderer, WorkerContext, WorkerError};
use serde_json::json;
use url::Url;

use crate::config::CrawlConfig;
use crate::extract;
use crate::filter::is_allowed;

/// The `WorkerType` both roles register under; also the `QueueJob.type` of
/// every `crawler_url` message this worker enqueues.
pub const CRAWLER_WORKER_TYPE: &str = "crawler_url";

pub struct CrawlerWorker {
    worker_type: WorkerType,
    renderer: Arc<dyn Renderer>,
    credentials: Arc<dyn CredentialResolver>,
}

impl CrawlerWorker {
    pub fn new(renderer: Arc<dyn Renderer>, credentials: Arc<dyn CredentialResolver>) -> Self {
        Self { worker_type: WorkerType::new(CRAWLER_WORKER_TYPE), renderer, credentials }
    }
}

/// What a dequeued `crawler_url` message carries, reconstructed from
/// `QueueJob.config` at every hop (the trait surface has no job-definition
/// lookup, so this is self-contained rather than re-derived from context).
struct CrawlPayload {
    url: String,
    config: CrawlConfig,
    run_job_id: JobId,
}

impl CrawlPayload {
    fn from_queue_job(job: &QueueJob) -> Result<Self, WorkerError> {
        let url = job
            .config
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| WorkerError::ConfigInvalid("crawler_url message missing url".to_string()))?
            .to_string();
        let config_value = job.config.get("crawl_config").cloned().unwrap_or(serde_json::Value::Null);
        let config: CrawlConfig = serde_json::from_value(config_value).map_err(|e| WorkerError::ConfigInvalid(e.to_string()))?;
        let run_job_id = job
            .config
            .get("run_job_id")
            .and_then(|v| v.as_str())
            .map(JobId::from)
            .unwrap_or(job.parent_id);
        Ok(Self { url, config, run_job_id })
    }
}

#[async_trait]
impl DefinitionWorker for CrawlerWorker {
    fn get_type(&self) -> WorkerType {
        self.worker_type.clone()
    }

    fn validate_config(&self, step: &JobStep) -> Result<(), WorkerError> {
        CrawlConfig::from_step_config(&step.config).map(|_| ())
    }

    async fn init(&self, _ctx: &dyn WorkerContext, step: &JobStep, _job_definition_id: JobDefinitionId) -> Result<WorkerInitResult, WorkerError> {
        let config = CrawlConfig::from_step_config(&step.config)?;
        let items = config
            .start_urls
            .iter()
            .enumerate()
            .map(|(i, url)| WorkItem {
                id: format!("seed-{i}"),
                name: format!("crawl:{url}"),
                worker_type: self.worker_type.clone(),
                config: seed_config(url, &config),
            })
            .collect();
        Ok(WorkerInitResult::new(items, WorkStrategy::Parallel))
    }

    async fn create_jobs(
        &self,
        ctx: &dyn WorkerContext,
        step: &JobStep,
        job_definition_id: JobDefinitionId,
        step_job_id: JobId,
        init_result: Option<WorkerInitResult>,
    ) -> Result<JobId, WorkerError> {
        let init_result = match init_result {
            Some(r) => r,
            None => self.init(ctx, step, job_definition_id).await?,
        };
        for item in &init_result.work_items {
            let mut config = item.config.clone();
            config.insert("run_job_id".to_string(), json!(step_job_id.to_string()));
            let mut job = QueueJob::new(step_job_id, self.worker_type.clone(), item.name.clone(), 0);
            job.config = config;
            job.validate().map_err(|e| WorkerError::ConfigInvalid(e.to_string()))?;
            ctx.enqueue(job).await?;
        }
        Ok(step_job_id)
    }

    fn returns_child_jobs(&self) -> bool {
        true
    }
}

fn seed_config(url: &str, config: &CrawlConfig) -> HashMap<String, serde_json::Value> {
    let mut map = HashMap::new();
    map.insert("url".to_string(), json!(url));
    map.insert("crawl_config".to_string(), serde_json::to_value(config).unwrap_or(serde_json::Value::Null));
    map
}

#[async_trait]
impl JobWorker for CrawlerWorker {
    fn get_worker_type(&self) -> WorkerType {
        self.worker_type.clone()
    }

    fn validate(&self, job: &QueueJob) -> Result<(), WorkerError> {
        CrawlPayload::from_queue_job(job).map(|_| ())
    }

    async fn execute(&self, ctx: &dyn WorkerContext, job: &QueueJob) -> Result<(), WorkerError> {
        let payload = CrawlPayload::from_queue_job(job)?;

        if !payload.config.force_refresh {
            if let Some(cache_hours) = payload.config.cache_hours {
                if let Some(existing) = ctx.document_get_by_source(&payload.config.source_type, &payload.url).await {
                    if existing.is_fresh(chrono::Utc::now(), cache_hours) {
                        let last_synced = existing.last_synced.map(|ts| ts.to_rfc3339()).unwrap_or_default();
                        ctx.add_job_log(payload.run_job_id, LogLevel::Info, format!("using cached data for {} (last_synced {last_synced})", payload.url)).await?;
                        return Ok(());
                    }
                }
            }
        }

        if let Some(auth_id) = &payload.config.auth_id {
            let raw = self.credentials.resolve(auth_id).await.map_err(|e| WorkerError::Fatal(e.to_string()))?;
            let cookies = parse_cookie_header(&raw);
            if !cookies.is_empty() {
                if let Some(mismatch) = domain_mismatch_report(&payload.url, &cookies) {
                    ctx.add_job_log(payload.run_job_id, LogLevel::Warn, mismatch).await?;
                }
                self.renderer.set_cookies(cookies).await.map_err(render_err)?;
            }
        }

        ctx.update_job_progress(job.id, 0, 2).await?;
        let timeout = Duration::from_millis(payload.config.render_timeout_ms);
        let render_started = Instant::now();
        let rendered = self.renderer.render(&payload.url, timeout).await.map_err(render_err)?;
        let render_time_ms = render_started.elapsed().as_millis() as u64;
        ctx.update_job_progress(job.id, 1, 2).await?;

        let page = extract::extract(&payload.url, &rendered.html);
        let links_discovered = page.links.len();
        let follow = payload.config.follow_links && job.depth < payload.config.max_depth;
        let mut spawned: Vec<String> = if follow {
            page.links.into_iter().filter(|link| is_allowed(link, &payload.config)).collect()
        } else {
            Vec::new()
        };
        spawned.truncate(payload.config.max_pages as usize);

        let mut metadata = HashMap::new();
        metadata.insert("depth".to_string(), json!(job.depth));
        metadata.insert("discovered_by".to_string(), json!(job.parent_id.to_string()));
        metadata.insert("http_status".to_string(), json!(rendered.status));
        metadata.insert("render_time_ms".to_string(), json!(render_time_ms));
        metadata.insert("content_size".to_string(), json!(page.content_size));
        metadata.insert("links_discovered".to_string(), json!(links_discovered));
        metadata.insert("links_spawned".to_string(), json!(spawned.len()));
        metadata.insert("links_skipped".to_string(), json!(links_discovered.saturating_sub(spawned.len())));

        let mut document = Document::new(payload.config.source_type.clone(), payload.url.clone(), page.title, page.markdown, payload.config.detail_level.clone());
        document.url = Some(payload.url.clone());
        document.metadata = metadata;
        document.last_synced = Some(chrono::Utc::now());
        ctx.document_upsert(document).await?;
        ctx.update_job_progress(job.id, 2, 2).await?;

        for link in &spawned {
            let mut config = job.config.clone();
            config.insert("url".to_string(), json!(link));
            let mut child = QueueJob::new(job.id, self.worker_type.clone(), format!("crawl:{link}"), job.depth + 1);
            child.config = config;
            match child.validate() {
                Ok(()) => {
                    let child_id = child.id;
                    if let Err(error) = ctx.enqueue(child).await {
                        tracing::warn!(%error, %link, "failed to enqueue discovered link, skipping");
                    } else {
                        ctx.publish(Event::JobSpawned { job_id: child_id, parent_id: job.id, at_ms: chrono::Utc::now().timestamp_millis().max(0) as u64 });
                    }
                }
                Err(error) => tracing::warn!(%error, %link, "discovered link produced an invalid child job, skipping"),
            }
        }

        ctx.add_job_log(payload.run_job_id, LogLevel::Info, format!("crawled {} ({} links spawned)", payload.url, spawned.len())).await?;
        Ok(())
    }
}

fn render_err(error: RenderError) -> WorkerError {
    match error {
        RenderError::Timeout(_) => WorkerError::Transient(error.to_string()),
        RenderError::Failed(_) => WorkerError::Fatal(error.to_string()),
    }
}

/// The resolved credential is a raw `"name=value; name2=value2"` cookie
/// header (the `CredentialResolver` trait returns an opaque `String`, not a
/// list of stored cookie records); malformed pairs are skipped.
fn parse_cookie_header(raw: &str) -> Vec<Cookie<'static>> {
    raw.split(';')
        .filter_map(|pair| Cookie::parse(pair.trim().to_string()).ok())
        .collect()
}

/// Compares the crawl target's host against each cookie's `Domain`
/// attribute (§4.J step 1) and reports any mismatch instead of silently
/// sending a cookie to a host it wasn't scoped for. `None` if the target
/// URL doesn't parse or every cookie domain matches (including cookies with
/// no `Domain` attribute at all, which scope to the exact request host).
fn domain_mismatch_report(url: &str, cookies: &[Cookie<'static>]) -> Option<String> {
    let target_host = Url::parse(url).ok()?.host_str()?.to_string();
    let mismatched: Vec<String> = cookies
        .iter()
        .filter_map(|cookie| {
            let domain = cookie.domain()?.trim_start_matches('.').to_string();
            let matches = target_host.eq_ignore_ascii_case(&domain) || target_host.to_lowercase().ends_with(&format!(".{}", domain.to_lowercase()));
            (!matches).then(|| format!("{}={}", cookie.name(), domain))
        })
        .collect();
    if mismatched.is_empty() {
        None
    } else {
        Some(format!("cookie domain mismatch for {target_host}: {}", mismatched.join(", ")))
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
