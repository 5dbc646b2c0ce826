//! # Provider
//!
//! Registry of reconcilers keyed by resource type name, and the entry points
//! the orchestrator calls. Every entry point:
//!
//! 1. Resolves the reconciler (`UnknownResourceType` otherwise)
//! 2. Applies schema defaults and validation before Create/Update
//! 3. Runs the operation under the call's timeout and cancellation signal
//! 4. Records metrics and a `provider.operation` span
//!
//! On success the returned record's current attributes are also its new baseline.
//! A Create that fails after the remote resource was made returns
//! [`ProviderError::Incomplete`] carrying the new identifier.

use crate::client::{ClientSession, ContainerNlbClient, PowerVpnClient};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::observability::metrics;
use crate::reconciler::{CallContext, Operation, Reconciler};
use crate::resources::{IkePolicyReconciler, NlbDnsReconciler};
use crate::schema::{Diagnostic, ResourceSchema};
use crate::state::{AttributeMap, ResourceData};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, field, info, info_span, warn, Instrument};

#[derive(Debug)]
pub struct Provider {
    config: ProviderConfig,
    reconcilers: HashMap<&'static str, Arc<dyn Reconciler>>,
}

impl Provider {
    /// Empty registry; reconcilers are added with [`Provider::register`]
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            reconcilers: HashMap::new(),
        }
    }

    /// Build the session and register every REST-backed resource type
    ///
    /// # Errors
    /// The session cannot be built (e.g. no IAM token) or metrics fail to register.
    pub fn from_config(config: ProviderConfig) -> Result<Self> {
        if config.enable_metrics {
            metrics::register_metrics().context("Failed to register provider metrics")?;
        }
        let session =
            Arc::new(ClientSession::new(&config).context("Failed to build client session")?);
        Ok(Self::with_session(config, session))
    }

    /// Register every REST-backed resource type on an existing session
    pub fn with_session(config: ProviderConfig, session: Arc<ClientSession>) -> Self {
        let policy = config.not_found_policy;
        let mut provider = Self::new(config);
        provider.register(Arc::new(
            IkePolicyReconciler::new(Arc::new(PowerVpnClient::new(Arc::clone(&session))))
                .with_not_found_policy(policy),
        ));
        provider.register(Arc::new(
            NlbDnsReconciler::new(Arc::new(ContainerNlbClient::new(session)))
                .with_not_found_policy(policy),
        ));
        provider
    }

    /// Add or replace the reconciler for its schema's type name
    pub fn register(&mut self, reconciler: Arc<dyn Reconciler>) {
        let type_name = reconciler.schema().type_name;
        if self.reconcilers.insert(type_name, reconciler).is_some() {
            warn!(resource.type = type_name, "Replaced existing reconciler");
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Registered resource type names, sorted
    pub fn resource_types(&self) -> Vec<&'static str> {
        let mut types: Vec<&'static str> = self.reconcilers.keys().copied().collect();
        types.sort_unstable();
        types
    }

    pub fn schema(&self, resource_type: &str) -> Option<&ResourceSchema> {
        self.reconcilers.get(resource_type).map(|r| r.schema())
    }

    /// # Errors
    /// Validation failure, remote failure, timeout or cancellation. When the remote
    /// resource already exists the error is `Incomplete` with its identifier.
    pub async fn create(
        &self,
        resource_type: &str,
        config: AttributeMap,
        ctx: &CallContext,
    ) -> Result<ResourceData, ProviderError> {
        let prepared = self.reconciler(resource_type).and_then(|reconciler| {
            let schema = reconciler.schema();
            let mut config = config;
            schema.apply_defaults(&mut config);
            schema.validate(&config)?;
            Ok((reconciler, ResourceData::for_create(config)))
        });
        let (reconciler, data) = self.fail_fast(resource_type, Operation::Create, prepared)?;
        self.execute(reconciler, Operation::Create, data, ctx).await
    }

    /// # Errors
    /// Malformed identifier, remote failure (or not-found under `Propagate`), timeout or cancellation.
    pub async fn read(
        &self,
        resource_type: &str,
        id: &str,
        state: AttributeMap,
        ctx: &CallContext,
    ) -> Result<ResourceData, ProviderError> {
        let reconciler =
            self.fail_fast(resource_type, Operation::Read, self.reconciler(resource_type))?;
        let data = ResourceData::from_state(id, state);
        self.execute(reconciler, Operation::Read, data, ctx).await
    }

    /// Apply the difference between `prior` (last reconciled state) and `desired`
    ///
    /// # Errors
    /// Validation failure (including changes to attributes that force replacement),
    /// malformed identifier, remote failure, timeout or cancellation.
    pub async fn update(
        &self,
        resource_type: &str,
        id: &str,
        prior: AttributeMap,
        desired: AttributeMap,
        ctx: &CallContext,
    ) -> Result<ResourceData, ProviderError> {
        let prepared = self.reconciler(resource_type).and_then(|reconciler| {
            let schema = reconciler.schema();
            let mut desired = desired;
            schema.apply_defaults(&mut desired);
            schema.validate(&desired)?;

            let mut data = ResourceData::for_update(id, prior, desired);
            schema.carry_computed(&mut data);

            let replaced = schema.force_new_changes(&data);
            if !replaced.is_empty() {
                return Err(ProviderError::Validation {
                    resource_type: schema.type_name.to_string(),
                    diagnostics: replaced
                        .into_iter()
                        .map(|name| {
                            Diagnostic::new(name, "cannot be changed in place; replace the resource")
                        })
                        .collect(),
                });
            }
            Ok((reconciler, data))
        });
        let (reconciler, data) = self.fail_fast(resource_type, Operation::Update, prepared)?;
        self.execute(reconciler, Operation::Update, data, ctx).await
    }

    /// # Errors
    /// Malformed identifier, remote failure (or not-found under `Propagate`), timeout or cancellation.
    pub async fn delete(
        &self,
        resource_type: &str,
        id: &str,
        state: AttributeMap,
        ctx: &CallContext,
    ) -> Result<ResourceData, ProviderError> {
        let reconciler =
            self.fail_fast(resource_type, Operation::Delete, self.reconciler(resource_type))?;
        let data = ResourceData::from_state(id, state);
        self.execute(reconciler, Operation::Delete, data, ctx).await
    }

    /// Adopt an existing remote resource knowing only its identifier
    ///
    /// # Errors
    /// Malformed identifier, remote failure, timeout or cancellation.
    pub async fn import(
        &self,
        resource_type: &str,
        id: &str,
        ctx: &CallContext,
    ) -> Result<ResourceData, ProviderError> {
        let reconciler =
            self.fail_fast(resource_type, Operation::Import, self.reconciler(resource_type))?;
        let data = ResourceData::for_import(id);
        self.execute(reconciler, Operation::Import, data, ctx).await
    }

    fn reconciler(&self, resource_type: &str) -> Result<Arc<dyn Reconciler>, ProviderError> {
        self.reconcilers
            .get(resource_type)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownResourceType(resource_type.to_string()))
    }

    /// Count a failure raised before the operation reached its reconciler
    fn fail_fast<T>(
        &self,
        resource_type: &str,
        operation: Operation,
        result: Result<T, ProviderError>,
    ) -> Result<T, ProviderError> {
        result.inspect_err(|e| {
            debug!(
                resource.type = resource_type,
                operation = operation.as_str(),
                "Rejected before any remote call: {}",
                e
            );
            metrics::increment_operation_errors(resource_type, operation.as_str(), e.kind());
        })
    }

    async fn execute(
        &self,
        reconciler: Arc<dyn Reconciler>,
        operation: Operation,
        mut data: ResourceData,
        ctx: &CallContext,
    ) -> Result<ResourceData, ProviderError> {
        let resource_type = reconciler.schema().type_name;
        let span = info_span!(
            "provider.operation",
            resource.type = resource_type,
            resource.id = data.id().unwrap_or_default(),
            operation = operation.as_str(),
            operation.success = field::Empty,
            operation.duration_ms = field::Empty,
            error.kind = field::Empty,
        );
        let start = Instant::now();
        let timeout = self.config.timeouts.for_operation(operation);

        let result = ctx
            .run(operation, resource_type, timeout, async {
                match operation {
                    Operation::Create => reconciler.create(&mut data).await,
                    Operation::Read => reconciler.read(&mut data).await,
                    Operation::Update => reconciler.update(&mut data).await,
                    Operation::Delete => reconciler.delete(&mut data).await,
                    Operation::Import => reconciler.import(&mut data).await,
                }
            })
            .instrument(span.clone())
            .await;

        let elapsed = start.elapsed();
        metrics::record_operation(resource_type, operation.as_str(), elapsed.as_secs_f64());
        span.record(
            "operation.duration_ms",
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        );

        match result {
            Ok(()) => {
                span.record("operation.success", true);
                if matches!(operation, Operation::Create | Operation::Update | Operation::Delete) {
                    span.in_scope(|| {
                        info!(
                            resource.id = data.id().unwrap_or_default(),
                            absent = data.is_absent(),
                            "{} of {} complete",
                            operation,
                            resource_type
                        );
                    });
                }
                data.commit();
                Ok(data)
            }
            Err(e) => {
                let e = match data.id() {
                    Some(id) if operation == Operation::Create => ProviderError::Incomplete {
                        id: id.to_string(),
                        source: Box::new(e),
                    },
                    _ => e,
                };
                span.record("operation.success", false);
                span.record("error.kind", e.kind());
                span.in_scope(|| warn!("{} of {} failed: {}", operation, resource_type, e));
                metrics::increment_operation_errors(resource_type, operation.as_str(), e.kind());
                Err(e)
            }
        }
    }
}
