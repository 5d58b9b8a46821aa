use std::sync::Arc;
use std::time::Duration;

use registrar_sdk::{Service, ServiceSource};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::domain::cache::{CacheEntry, RegistrationCache};
use crate::domain::catalog::AgentConnector;
use crate::domain::error::RegistrarError;
use crate::domain::model::ServiceRegistration;
use crate::domain::pool::AgentPool;
use crate::domain::upstreams::UpstreamStore;

/// `tokio::time::interval` panics on a zero period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// Registered with the catalog and its backend record written.
    Registered,
    /// Already tracked; only the liveness mark was refreshed.
    AlreadyTracked,
}

/// Result of one [`Reconciler::deregister`] sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Marked entries reset for the next pass.
    pub retained: usize,
    pub deregistered: usize,
    /// Stale entries kept because the catalog call failed.
    pub failed: usize,
}

/// Counters for one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub registered: usize,
    pub already_tracked: usize,
    pub register_failed: usize,
    pub retained: usize,
    pub deregistered: usize,
    pub deregister_failed: usize,
}

impl PassReport {
    fn record_sweep(&mut self, sweep: SweepReport) {
        self.retained = sweep.retained;
        self.deregistered = sweep.deregistered;
        self.deregister_failed = sweep.failed;
    }
}

/// Drives catalog state towards the desired service set.
///
/// Owns the registration cache and the agent pool. Every mutating method takes
/// `&mut self`, so two passes can never interleave.
pub struct Reconciler {
    pool: AgentPool,
    cache: RegistrationCache,
    upstreams: UpstreamStore,
}

impl Reconciler {
    #[must_use]
    pub fn new(connector: Arc<dyn AgentConnector>) -> Self {
        Self {
            pool: AgentPool::new(connector),
            cache: RegistrationCache::new(),
            upstreams: UpstreamStore::default(),
        }
    }

    #[must_use]
    pub fn cache(&self) -> &RegistrationCache {
        &self.cache
    }

    /// Register `service` unless it is already tracked, and mark it live.
    ///
    /// A service enters the cache only after both the catalog registration and
    /// the backend record write succeeded; on any failure nothing is cached
    /// and the next pass tries again.
    ///
    /// # Errors
    ///
    /// Recoverable errors for failures that only concern this service,
    /// `RegistrarError::Connect` (fatal) when no agent connection can be built.
    pub async fn register(&mut self, service: &Service) -> Result<RegisterOutcome, RegistrarError> {
        if self.cache.contains(&service.id) {
            tracing::debug!(service_id = %service.id, "service already registered");
            self.cache.mark(&service.id);
            return Ok(RegisterOutcome::AlreadyTracked);
        }

        let agent = self.pool.client(&service.agent)?;

        tracing::info!(service_id = %service.id, agent = %service.agent, "registering service");
        let registration = ServiceRegistration::from(service);
        if let Err(source) = agent.register_service(&registration).await {
            tracing::warn!(service_id = %service.id, error = %source, "unable to register service");
            return Err(RegistrarError::Register {
                service_id: service.id.clone(),
                source,
            });
        }

        if let Err(e) = self
            .upstreams
            .upsert(agent.as_ref(), &service.name, &service.agent, service.port)
            .await
        {
            tracing::warn!(service_id = %service.id, error = %e, "backend record not written");
            return Err(e);
        }

        self.cache.insert(CacheEntry::new(registration, &service.agent));
        self.cache.mark(&service.id);
        Ok(RegisterOutcome::Registered)
    }

    /// Sweep the cache: deregister every entry not marked since the previous
    /// sweep and reset the marks of the others.
    ///
    /// A failed catalog deregistration keeps the entry for the next sweep. A
    /// failed backend record delete is logged and does not keep the entry.
    ///
    /// # Errors
    ///
    /// Only `RegistrarError::Connect` (fatal).
    pub async fn deregister(&mut self) -> Result<SweepReport, RegistrarError> {
        let mut report = SweepReport::default();

        for id in self.cache.tracked_ids() {
            if !self.cache.is_stale(&id) {
                self.cache.unmark(&id);
                report.retained += 1;
                continue;
            }
            let Some(entry) = self.cache.get(&id).cloned() else {
                continue;
            };

            tracing::info!(service_id = %id, agent = %entry.agent, "deregistering service");
            let agent = match self.pool.client(&entry.agent) {
                Ok(agent) => agent,
                Err(e) if e.is_fatal() => return Err(e),
                Err(_) => {
                    report.failed += 1;
                    continue;
                }
            };

            if let Err(source) = agent.deregister_service(&id).await {
                let e = RegistrarError::Deregister {
                    service_id: id.clone(),
                    source,
                };
                tracing::warn!(service_id = %id, error = %e, "deregistration failed, keeping entry");
                report.failed += 1;
                continue;
            }

            if let Err(e) = self.upstreams.remove(agent.as_ref(), &entry).await {
                tracing::warn!(service_id = %id, error = %e, "backend record not removed");
            }
            self.cache.remove(&id);
            report.deregistered += 1;
        }

        Ok(report)
    }

    /// One full pass: register every desired service, then sweep.
    ///
    /// # Errors
    ///
    /// Only fatal errors; per-service failures are counted in the report.
    pub async fn reconcile_once(&mut self, services: &[Service]) -> Result<PassReport, RegistrarError> {
        let mut report = PassReport::default();

        for service in services {
            match self.register(service).await {
                Ok(RegisterOutcome::Registered) => report.registered += 1,
                Ok(RegisterOutcome::AlreadyTracked) => report.already_tracked += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(_) => report.register_failed += 1,
            }
        }

        let sweep = self.deregister().await?;
        report.record_sweep(sweep);
        Ok(report)
    }

    /// Run a pass every `interval` until `cancel` fires.
    ///
    /// The first pass starts immediately. A pass in flight is finished before
    /// cancellation is observed. When the source fails the pass is skipped
    /// entirely, so an unreadable source never deregisters anything.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error; the loop stops there.
    pub async fn run_until_cancelled(
        &mut self,
        source: &dyn ServiceSource,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Result<(), RegistrarError> {
        let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut pass: u64 = 0;

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::info!(passes = pass, "reconciliation loop stopped");
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }

            pass += 1;
            let span = tracing::info_span!("reconcile", pass);
            self.run_pass(source).instrument(span).await?;
        }
    }

    async fn run_pass(&mut self, source: &dyn ServiceSource) -> Result<Option<PassReport>, RegistrarError> {
        let services = match source.desired_services().await {
            Ok(services) => services,
            Err(e) => {
                tracing::warn!(error = %e, "service source failed, skipping pass");
                return Ok(None);
            }
        };

        let report = self.reconcile_once(&services).await?;
        tracing::info!(
            desired = services.len(),
            registered = report.registered,
            already_tracked = report.already_tracked,
            register_failed = report.register_failed,
            deregistered = report.deregistered,
            deregister_failed = report.deregister_failed,
            tracked = self.cache.len(),
            "reconciliation pass complete"
        );
        Ok(Some(report))
    }
}
