//! In-memory catalog doubles recording every call.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use registrar_sdk::{HealthCheck, Service, ServiceSource, SourceError};
use tokio_util::sync::CancellationToken;

use crate::domain::catalog::{AgentConnector, CatalogAgent};
use crate::domain::error::CatalogError;
use crate::domain::model::ServiceRegistration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Register(String),
    Deregister(String),
    KvCreate(String),
    KvDelete(String),
}

#[derive(Default)]
pub struct MockAgent {
    calls: Mutex<Vec<Call>>,
    registrations: Mutex<Vec<ServiceRegistration>>,
    kv: Mutex<HashMap<String, Vec<u8>>>,
    failing_registers: Mutex<HashSet<String>>,
    failing_deregisters: Mutex<HashSet<String>>,
    kv_create_fails: Mutex<bool>,
    kv_delete_fails: Mutex<bool>,
}

impl MockAgent {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn registrations(&self) -> Vec<ServiceRegistration> {
        self.registrations.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| pred(call)).count()
    }

    pub fn kv_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.kv.lock().keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    pub fn kv_value(&self, key: &str) -> Option<String> {
        self.kv
            .lock()
            .get(key)
            .map(|value| String::from_utf8_lossy(value).into_owned())
    }

    pub fn put_kv(&self, key: &str, value: &str) {
        self.kv.lock().insert(key.to_owned(), value.as_bytes().to_vec());
    }

    pub fn fail_register(&self, id: &str) {
        self.failing_registers.lock().insert(id.to_owned());
    }

    pub fn fail_deregister(&self, id: &str) {
        self.failing_deregisters.lock().insert(id.to_owned());
    }

    pub fn heal_deregister(&self, id: &str) {
        self.failing_deregisters.lock().remove(id);
    }

    pub fn fail_kv_create(&self) {
        *self.kv_create_fails.lock() = true;
    }

    pub fn fail_kv_delete(&self) {
        *self.kv_delete_fails.lock() = true;
    }
}

#[async_trait]
impl CatalogAgent for MockAgent {
    async fn register_service(
        &self,
        registration: &ServiceRegistration,
    ) -> Result<(), CatalogError> {
        self.calls.lock().push(Call::Register(registration.id.clone()));
        if self.failing_registers.lock().contains(&registration.id) {
            return Err(CatalogError::request("register service", "connection refused"));
        }
        self.registrations.lock().push(registration.clone());
        Ok(())
    }

    async fn deregister_service(&self, service_id: &str) -> Result<(), CatalogError> {
        self.calls.lock().push(Call::Deregister(service_id.to_owned()));
        if self.failing_deregisters.lock().contains(service_id) {
            return Err(CatalogError::request("deregister service", "500 Internal Server Error"));
        }
        Ok(())
    }

    async fn kv_create(&self, key: &str, value: &[u8]) -> Result<bool, CatalogError> {
        self.calls.lock().push(Call::KvCreate(key.to_owned()));
        if *self.kv_create_fails.lock() {
            return Err(CatalogError::request("create key", "timed out"));
        }
        let mut kv = self.kv.lock();
        if kv.contains_key(key) {
            return Ok(false);
        }
        kv.insert(key.to_owned(), value.to_vec());
        Ok(true)
    }

    async fn kv_delete(&self, key: &str) -> Result<(), CatalogError> {
        self.calls.lock().push(Call::KvDelete(key.to_owned()));
        if *self.kv_delete_fails.lock() {
            return Err(CatalogError::request("delete key", "timed out"));
        }
        self.kv.lock().remove(key);
        Ok(())
    }
}

/// Hands out one shared [`MockAgent`] per address.
#[derive(Default)]
pub struct MockConnector {
    agents: Mutex<HashMap<String, Arc<MockAgent>>>,
    connects: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl MockConnector {
    pub fn agent(&self, address: &str) -> Arc<MockAgent> {
        Arc::clone(
            self.agents
                .lock()
                .entry(address.to_owned())
                .or_default(),
        )
    }

    pub fn connects(&self) -> Vec<String> {
        self.connects.lock().clone()
    }

    pub fn fail_connect(&self, address: &str) {
        self.failing.lock().insert(address.to_owned());
    }
}

impl AgentConnector for MockConnector {
    fn connect(&self, address: &str) -> Result<Arc<dyn CatalogAgent>, CatalogError> {
        self.connects.lock().push(address.to_owned());
        if self.failing.lock().contains(address) {
            return Err(CatalogError::Connect {
                address: address.to_owned(),
                reason: "no TLS roots".to_owned(),
            });
        }
        let agent: Arc<dyn CatalogAgent> = self.agent(address);
        Ok(agent)
    }
}

/// Source returning scripted results, one per call; the last one repeats.
pub struct ScriptedSource {
    passes: Mutex<Vec<Result<Vec<Service>, String>>>,
    calls: Mutex<usize>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl ScriptedSource {
    pub fn new(passes: Vec<Result<Vec<Service>, String>>) -> Self {
        Self {
            passes: Mutex::new(passes),
            calls: Mutex::new(0),
            cancel_after: None,
        }
    }

    /// Cancel `token` while serving call number `calls`.
    pub fn cancel_after(mut self, calls: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((calls, token));
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl ServiceSource for ScriptedSource {
    async fn desired_services(&self) -> Result<Vec<Service>, SourceError> {
        let mut calls = self.calls.lock();
        *calls += 1;
        if let Some((limit, token)) = &self.cancel_after
            && *calls >= *limit
        {
            token.cancel();
        }
        let passes = self.passes.lock();
        let index = (*calls - 1).min(passes.len().saturating_sub(1));
        match passes.get(index) {
            Some(Ok(services)) => Ok(services.clone()),
            Some(Err(reason)) => Err(SourceError::Unavailable(reason.clone())),
            None => Ok(Vec::new()),
        }
    }
}

pub fn service(id: &str, name: &str, agent: &str, port: u16) -> Service {
    Service {
        id: id.to_owned(),
        name: name.to_owned(),
        agent: agent.to_owned(),
        port,
        address: "10.0.0.5".to_owned(),
        tags: Vec::new(),
        check: HealthCheck::ttl("15s"),
    }
}
