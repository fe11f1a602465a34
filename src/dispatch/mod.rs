//! Request Dispatcher
//!
//! The orchestrating core: selects candidate providers in priority order,
//! consults the rate window and circuit breaker, probes availability,
//! executes with a caller-side timeout, and falls through on any failure,
//! terminating at the local processor.
//!
//! ## Availability contract
//!
//! For every validated request, exactly one response is produced. Provider
//! failures never propagate to the caller; they are recorded in the
//! response's attempt diagnostics and the chain moves on. The local
//! processor has no failure path, which makes the guarantee provable.
//!
//! ## Modules
//!
//! - `rate_limiter`: rolling per-provider request window (lazy reset)
//! - `circuit_breaker`: 2-state consecutive-failure breaker
//! - `state`: unified per-provider runtime state under one lock
//! - `prober`: short-timeout availability gate

mod circuit_breaker;
mod prober;
mod rate_limiter;
mod state;

pub use circuit_breaker::Breaker;
pub use prober::Prober;
pub use rate_limiter::{RateLimitStatus, RateWindow};
pub use state::{ProviderState, StateSnapshot};

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::config::{Config, DispatcherConfig};
use crate::providers::{
    Invocation, LocalProcessor, SharedProvider, create_provider, estimate_tokens,
    LOCAL_PROVIDER_NAME,
};
use crate::registry::{ProviderDescriptor, ProviderRegistry};
use crate::timeout::with_timeout;
use crate::types::{
    AttemptError, AttemptRecord, GateError, HealthReport, ProviderStatus, Result,
    RoutingRequest, RoutingResponse, StatusReport,
};

/// Multi-provider request dispatcher
pub struct Dispatcher {
    registry: ProviderRegistry,
    providers: HashMap<String, SharedProvider>,
    local: LocalProcessor,
    /// Per-provider runtime state, initialized lazily on first touch
    states: DashMap<String, Arc<ProviderState>>,
    prober: Prober,
    invoke_timeout: Duration,
    breaker_threshold: u32,
}

impl Dispatcher {
    /// Build a dispatcher with explicit provider instances. Every registry
    /// descriptor must have a matching provider by name.
    pub fn new(
        registry: ProviderRegistry,
        providers: Vec<SharedProvider>,
        config: DispatcherConfig,
    ) -> Result<Self> {
        let providers: HashMap<String, SharedProvider> = providers
            .into_iter()
            .map(|p| (p.name().to_string(), p))
            .collect();

        for descriptor in registry.list() {
            if !providers.contains_key(&descriptor.name) {
                return Err(GateError::Config(format!(
                    "no provider instance registered for descriptor '{}'",
                    descriptor.name
                )));
            }
        }

        Ok(Self {
            registry,
            providers,
            local: LocalProcessor::new(),
            states: DashMap::new(),
            prober: Prober::new(Duration::from_millis(config.probe_timeout_ms)),
            invoke_timeout: Duration::from_secs(config.invoke_timeout_secs),
            breaker_threshold: config.breaker_threshold,
        })
    }

    /// Build a dispatcher from configuration: registry plus one remote HTTP
    /// provider per descriptor.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = ProviderRegistry::from_config(config)?;
        let invoke_timeout = Duration::from_secs(config.dispatcher.invoke_timeout_secs);

        let mut providers: Vec<SharedProvider> = Vec::with_capacity(registry.len());
        for descriptor in registry.list() {
            providers.push(create_provider(descriptor, invoke_timeout)?);
        }

        Self::new(registry, providers, config.dispatcher.clone())
    }

    /// The registry backing this dispatcher
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    fn state_for(&self, descriptor: &ProviderDescriptor) -> Arc<ProviderState> {
        self.states
            .entry(descriptor.name.clone())
            .or_insert_with(|| {
                Arc::new(ProviderState::new(
                    descriptor.rate_limit,
                    self.breaker_threshold,
                ))
            })
            .clone()
    }

    // =========================================================================
    // Routing
    // =========================================================================

    /// Route a request through the provider chain.
    ///
    /// The only error is request validation, raised before any provider is
    /// touched. Every validated request yields exactly one response.
    #[instrument(skip(self, request), fields(request_id = %request.id, request_type = %request.request_type))]
    pub async fn route(&self, request: &RoutingRequest) -> Result<RoutingResponse> {
        request.validate()?;

        if let Some(forced) = &request.force_provider {
            match self.registry.describe(forced) {
                Some(descriptor) => {
                    let descriptor = descriptor.clone();
                    return Ok(self.route_forced(&descriptor, request).await);
                }
                None => {
                    warn!(provider = %forced, "Forced provider not registered, using normal chain");
                }
            }
        }

        if request.force_local {
            debug!("Local processing forced by request");
            return Ok(self.local_response(request, Vec::new()));
        }

        let eligible: Vec<&ProviderDescriptor> = self
            .registry
            .list()
            .iter()
            .filter(|d| d.supports(request.request_type))
            .collect();

        let mut attempts: Vec<AttemptRecord> = Vec::new();

        for (index, descriptor) in eligible.iter().enumerate() {
            let name = descriptor.name.as_str();

            if !descriptor.credentials_present {
                debug!(provider = name, "Skipping provider (no credentials)");
                attempts.push(AttemptRecord::new(name, AttemptError::NoCredentials));
                continue;
            }

            let state = self.state_for(descriptor);
            if let Err(reason) = state.try_admit() {
                debug!(provider = name, reason = reason.label(), "Skipping provider");
                attempts.push(AttemptRecord::new(name, reason));
                continue;
            }

            let Some(provider) = self.providers.get(name) else {
                state.refund();
                attempts.push(AttemptRecord::new(
                    name,
                    AttemptError::InvocationFailed("provider not constructed".to_string()),
                ));
                continue;
            };

            // Rate-limited and circuit-open candidates were already filtered,
            // so this probe is the first network cost paid for the candidate.
            if !self.prober.probe(provider.as_ref()).await {
                state.refund();
                attempts.push(AttemptRecord::new(name, AttemptError::ProviderUnavailable));
                continue;
            }

            match with_timeout(
                self.invoke_timeout,
                provider.invoke(request),
                "provider invocation",
            )
            .await
            {
                Ok(invocation) => {
                    state.record_success();
                    info!(
                        provider = name,
                        attempts = attempts.len(),
                        "Request dispatched"
                    );
                    return Ok(Self::success_response(
                        name,
                        invocation,
                        index != 0,
                        attempts,
                    ));
                }
                Err(err) => {
                    state.refund();
                    state.record_failure();
                    warn!(provider = name, error = %err, "Provider invocation failed");
                    attempts.push(AttemptRecord::new(
                        name,
                        AttemptError::InvocationFailed(err.to_string()),
                    ));
                }
            }
        }

        info!(
            attempts = attempts.len(),
            "Provider chain exhausted, answering locally"
        );
        Ok(self.local_response(request, attempts))
    }

    /// Exclusive attempt of an explicitly forced provider. On any failure
    /// the local processor answers directly; an explicit override failing
    /// means the best option was already tried, so the full chain is not
    /// walked.
    async fn route_forced(
        &self,
        descriptor: &ProviderDescriptor,
        request: &RoutingRequest,
    ) -> RoutingResponse {
        let name = descriptor.name.as_str();
        let mut attempts: Vec<AttemptRecord> = Vec::new();

        if !descriptor.credentials_present {
            attempts.push(AttemptRecord::new(name, AttemptError::NoCredentials));
            return self.local_response(request, attempts);
        }

        let state = self.state_for(descriptor);
        if let Err(reason) = state.try_admit() {
            debug!(provider = name, reason = reason.label(), "Forced provider blocked");
            attempts.push(AttemptRecord::new(name, reason));
            return self.local_response(request, attempts);
        }

        let Some(provider) = self.providers.get(name) else {
            state.refund();
            attempts.push(AttemptRecord::new(
                name,
                AttemptError::InvocationFailed("provider not constructed".to_string()),
            ));
            return self.local_response(request, attempts);
        };

        match with_timeout(
            self.invoke_timeout,
            provider.invoke(request),
            "provider invocation",
        )
        .await
        {
            Ok(invocation) => {
                state.record_success();
                info!(provider = name, "Forced dispatch succeeded");
                Self::success_response(name, invocation, false, attempts)
            }
            Err(err) => {
                state.refund();
                state.record_failure();
                warn!(provider = name, error = %err, "Forced provider failed");
                attempts.push(AttemptRecord::new(
                    name,
                    AttemptError::InvocationFailed(err.to_string()),
                ));
                self.local_response(request, attempts)
            }
        }
    }

    fn success_response(
        provider: &str,
        invocation: Invocation,
        fallback_used: bool,
        attempts: Vec<AttemptRecord>,
    ) -> RoutingResponse {
        RoutingResponse {
            token_estimate: invocation
                .tokens_used
                .unwrap_or_else(|| estimate_tokens(&invocation.text)),
            provider_used: provider.to_string(),
            model_used: invocation.model,
            confidence: invocation.confidence,
            text: invocation.text,
            fallback_used,
            attempted_providers: attempts,
        }
    }

    /// Terminal answer from the local processor. `fallback_used` is true
    /// exactly when at least one remote candidate was considered first;
    /// an explicit `force_local` request is not a fallback.
    fn local_response(
        &self,
        request: &RoutingRequest,
        attempts: Vec<AttemptRecord>,
    ) -> RoutingResponse {
        let invocation = self.local.process(request);
        RoutingResponse {
            token_estimate: invocation
                .tokens_used
                .unwrap_or_else(|| estimate_tokens(&invocation.text)),
            provider_used: LOCAL_PROVIDER_NAME.to_string(),
            model_used: invocation.model,
            confidence: invocation.confidence,
            text: invocation.text,
            fallback_used: !attempts.is_empty(),
            attempted_providers: attempts,
        }
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    /// Per-provider runtime counters plus aggregates, in the status-endpoint
    /// shape.
    pub fn status(&self) -> StatusReport {
        let mut providers = Vec::with_capacity(self.registry.len());
        let mut active = 0usize;

        for descriptor in self.registry.list() {
            let snapshot = self.state_for(descriptor).snapshot();
            let available = descriptor.credentials_present && !snapshot.breaker_open;
            if available {
                active += 1;
            }
            providers.push(ProviderStatus {
                name: descriptor.name.clone(),
                available,
                priority: descriptor.priority,
                request_count: snapshot.request_count,
                rate_limit_status: snapshot.rate_limit_status.as_str().to_string(),
            });
        }

        StatusReport {
            providers,
            active_providers: active,
            total_providers: self.registry.len(),
            emergency_fallback: true,
        }
    }

    /// Probe every registered provider concurrently. Providers without
    /// credentials report unhealthy without a probe. The primary provider is
    /// the highest-priority healthy one, or `"local"` when none are.
    pub async fn health(&self) -> HealthReport {
        let probes = self.registry.list().iter().map(|descriptor| async move {
            let alive = if !descriptor.credentials_present {
                false
            } else {
                match self.providers.get(&descriptor.name) {
                    Some(provider) => self.prober.probe(provider.as_ref()).await,
                    None => false,
                }
            };
            (descriptor.name.clone(), alive)
        });

        let results = futures::future::join_all(probes).await;

        // Registry order is priority order, so the first healthy entry wins
        let primary_provider = results
            .iter()
            .find(|(_, alive)| *alive)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| LOCAL_PROVIDER_NAME.to_string());
        let healthy = results.iter().any(|(_, alive)| *alive);

        HealthReport {
            healthy,
            providers: results.into_iter().collect(),
            primary_provider,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Provider;
    use crate::registry::RateLimitPolicy;
    use crate::types::RequestType;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct MockProvider {
        name: String,
        probe_ok: bool,
        /// Per-invocation outcomes; exhausted script falls back to `default_ok`
        script: Mutex<VecDeque<bool>>,
        default_ok: bool,
        invoke_delay: Option<Duration>,
        invocations: AtomicU32,
    }

    impl MockProvider {
        fn healthy(name: &str) -> Self {
            Self::scripted(name, &[], true)
        }

        fn broken(name: &str) -> Self {
            Self::scripted(name, &[], false)
        }

        fn unreachable(name: &str) -> Self {
            let mut p = Self::scripted(name, &[], true);
            p.probe_ok = false;
            p
        }

        fn scripted(name: &str, outcomes: &[bool], default_ok: bool) -> Self {
            Self {
                name: name.to_string(),
                probe_ok: true,
                script: Mutex::new(outcomes.iter().copied().collect()),
                default_ok,
                invoke_delay: None,
                invocations: AtomicU32::new(0),
            }
        }

        fn hung(name: &str, delay: Duration) -> Self {
            let mut p = Self::scripted(name, &[], true);
            p.invoke_delay = Some(delay);
            p
        }

        fn calls(&self) -> u32 {
            self.invocations.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Provider for MockProvider {
        async fn invoke(&self, _request: &RoutingRequest) -> crate::types::Result<Invocation> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.invoke_delay {
                tokio::time::sleep(delay).await;
            }
            let ok = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.default_ok);
            if ok {
                Ok(Invocation {
                    text: format!("{} answer", self.name),
                    model: "mock-model".to_string(),
                    tokens_used: Some(5),
                    confidence: 0.9,
                })
            } else {
                Err(GateError::Provider(format!("{} upstream error", self.name)))
            }
        }

        async fn probe(&self) -> crate::types::Result<bool> {
            Ok(self.probe_ok)
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }

    fn descriptor(name: &str, priority: u32, max_requests: u32, window: Duration) -> ProviderDescriptor {
        ProviderDescriptor {
            name: name.to_string(),
            priority,
            capabilities: Vec::new(),
            rate_limit: RateLimitPolicy {
                max_requests,
                window,
            },
            endpoint: "https://api.example.com/v1".to_string(),
            model: "mock-model".to_string(),
            credentials_present: true,
            api_key: None,
        }
    }

    fn dispatcher(
        descriptors: Vec<ProviderDescriptor>,
        providers: Vec<Arc<MockProvider>>,
    ) -> Dispatcher {
        let shared: Vec<SharedProvider> = providers
            .into_iter()
            .map(|p| p as SharedProvider)
            .collect();
        Dispatcher::new(
            ProviderRegistry::new(descriptors),
            shared,
            DispatcherConfig {
                breaker_threshold: 3,
                probe_timeout_ms: 200,
                invoke_timeout_secs: 5,
            },
        )
        .unwrap()
    }

    fn chat(prompt: &str) -> RoutingRequest {
        RoutingRequest::new(RequestType::Chat, prompt)
    }

    const LONG_WINDOW: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_routes_highest_priority_first() {
        let a = Arc::new(MockProvider::healthy("a"));
        let b = Arc::new(MockProvider::healthy("b"));
        let d = dispatcher(
            vec![
                descriptor("a", 1, 10, LONG_WINDOW),
                descriptor("b", 2, 10, LONG_WINDOW),
            ],
            vec![a.clone(), b.clone()],
        );

        let resp = d.route(&chat("hi")).await.unwrap();
        assert_eq!(resp.provider_used, "a");
        assert!(!resp.fallback_used);
        assert!(resp.attempted_providers.is_empty());
        assert_eq!(b.calls(), 0);
    }

    #[tokio::test]
    async fn test_falls_through_to_next_priority() {
        let a = Arc::new(MockProvider::broken("a"));
        let b = Arc::new(MockProvider::healthy("b"));
        let d = dispatcher(
            vec![
                descriptor("a", 1, 10, LONG_WINDOW),
                descriptor("b", 2, 10, LONG_WINDOW),
            ],
            vec![a, b],
        );

        let resp = d.route(&chat("hi")).await.unwrap();
        assert_eq!(resp.provider_used, "b");
        assert!(resp.fallback_used);
        assert_eq!(resp.attempted_names(), vec!["a"]);
        assert!(matches!(
            resp.attempted_providers[0].error,
            AttemptError::InvocationFailed(_)
        ));
    }

    #[tokio::test]
    async fn test_broken_and_limited_fall_to_local() {
        // A always fails, B has a single-request window: the second call
        // exhausts the chain and lands on the local processor.
        let a = Arc::new(MockProvider::broken("a"));
        let b = Arc::new(MockProvider::healthy("b"));
        let d = dispatcher(
            vec![
                descriptor("a", 1, 10, LONG_WINDOW),
                descriptor("b", 2, 1, LONG_WINDOW),
            ],
            vec![a, b],
        );

        let first = d.route(&chat("hi")).await.unwrap();
        assert_eq!(first.provider_used, "b");

        let second = d.route(&chat("hi")).await.unwrap();
        assert_eq!(second.provider_used, "local");
        assert!(second.fallback_used);
        assert_eq!(second.attempted_names(), vec!["a", "b"]);
        assert_eq!(second.attempted_providers[1].error, AttemptError::RateLimited);
    }

    #[tokio::test]
    async fn test_force_provider_overrides_priority() {
        let a = Arc::new(MockProvider::healthy("a"));
        let b = Arc::new(MockProvider::healthy("b"));
        let d = dispatcher(
            vec![
                descriptor("a", 1, 10, LONG_WINDOW),
                descriptor("b", 2, 10, LONG_WINDOW),
            ],
            vec![a.clone(), b.clone()],
        );

        let resp = d
            .route(&chat("hi").with_force_provider("b"))
            .await
            .unwrap();
        assert_eq!(resp.provider_used, "b");
        assert!(!resp.fallback_used);
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn test_forced_failure_answers_locally_without_chain() {
        // An explicit override failing does not walk the rest of the chain.
        let a = Arc::new(MockProvider::healthy("a"));
        let b = Arc::new(MockProvider::broken("b"));
        let d = dispatcher(
            vec![
                descriptor("a", 1, 10, LONG_WINDOW),
                descriptor("b", 2, 10, LONG_WINDOW),
            ],
            vec![a.clone(), b],
        );

        let resp = d
            .route(&chat("hi").with_force_provider("b"))
            .await
            .unwrap();
        assert_eq!(resp.provider_used, "local");
        assert!(resp.fallback_used);
        assert_eq!(resp.attempted_names(), vec!["b"]);
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_forced_provider_uses_chain() {
        let a = Arc::new(MockProvider::healthy("a"));
        let d = dispatcher(vec![descriptor("a", 1, 10, LONG_WINDOW)], vec![a]);

        let resp = d
            .route(&chat("hi").with_force_provider("missing"))
            .await
            .unwrap();
        assert_eq!(resp.provider_used, "a");
    }

    #[tokio::test]
    async fn test_force_local_is_not_a_fallback() {
        let a = Arc::new(MockProvider::healthy("a"));
        let d = dispatcher(vec![descriptor("a", 1, 10, LONG_WINDOW)], vec![a.clone()]);

        let resp = d.route(&chat("hi").with_force_local()).await.unwrap();
        assert_eq!(resp.provider_used, "local");
        assert!(!resp.fallback_used);
        assert!(resp.attempted_providers.is_empty());
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn test_breaker_skips_provider_after_threshold() {
        let x = Arc::new(MockProvider::broken("x"));
        let d = dispatcher(vec![descriptor("x", 1, 100, LONG_WINDOW)], vec![x.clone()]);

        for _ in 0..3 {
            let resp = d.route(&chat("hi")).await.unwrap();
            assert_eq!(resp.provider_used, "local");
        }
        assert_eq!(x.calls(), 3);

        // Fourth call: circuit is open, provider never invoked
        let resp = d.route(&chat("hi")).await.unwrap();
        assert_eq!(x.calls(), 3);
        assert_eq!(resp.attempted_providers[0].error, AttemptError::CircuitOpen);
        assert_eq!(resp.provider_used, "local");
    }

    #[tokio::test]
    async fn test_breaker_recovers_after_cooldown() {
        // Cooldown is the remainder of the rate window; with a 100ms window
        // the circuit closes again shortly after opening.
        let x = Arc::new(MockProvider::scripted("x", &[false, false, false], true));
        let d = dispatcher(
            vec![descriptor("x", 1, 100, Duration::from_millis(100))],
            vec![x.clone()],
        );

        for _ in 0..3 {
            d.route(&chat("hi")).await.unwrap();
        }
        assert_eq!(d.route(&chat("hi")).await.unwrap().provider_used, "local");
        assert_eq!(x.calls(), 3);

        tokio::time::sleep(Duration::from_millis(150)).await;

        let resp = d.route(&chat("hi")).await.unwrap();
        assert_eq!(resp.provider_used, "x");
        assert_eq!(x.calls(), 4);
    }

    #[tokio::test]
    async fn test_success_resets_failure_streak() {
        // fail, fail, success, fail, fail: never reaches three consecutive
        let x = Arc::new(MockProvider::scripted(
            "x",
            &[false, false, true, false, false],
            true,
        ));
        let d = dispatcher(vec![descriptor("x", 1, 100, LONG_WINDOW)], vec![x.clone()]);

        for _ in 0..5 {
            d.route(&chat("hi")).await.unwrap();
        }

        // Breaker still closed: the provider is invoked again
        let resp = d.route(&chat("hi")).await.unwrap();
        assert_eq!(resp.provider_used, "x");
        assert_eq!(x.calls(), 6);
    }

    #[tokio::test]
    async fn test_rate_window_readmits_after_reset() {
        let x = Arc::new(MockProvider::healthy("x"));
        let d = dispatcher(
            vec![descriptor("x", 1, 1, Duration::from_millis(100))],
            vec![x.clone()],
        );

        assert_eq!(d.route(&chat("1")).await.unwrap().provider_used, "x");

        let limited = d.route(&chat("2")).await.unwrap();
        assert_eq!(limited.provider_used, "local");
        assert_eq!(limited.attempted_providers[0].error, AttemptError::RateLimited);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(d.route(&chat("3")).await.unwrap().provider_used, "x");
    }

    #[tokio::test]
    async fn test_probe_failure_skips_without_consuming_budget() {
        let a = Arc::new(MockProvider::unreachable("a"));
        let b = Arc::new(MockProvider::healthy("b"));
        let d = dispatcher(
            vec![
                descriptor("a", 1, 10, LONG_WINDOW),
                descriptor("b", 2, 10, LONG_WINDOW),
            ],
            vec![a.clone(), b],
        );

        let resp = d.route(&chat("hi")).await.unwrap();
        assert_eq!(resp.provider_used, "b");
        assert_eq!(
            resp.attempted_providers[0].error,
            AttemptError::ProviderUnavailable
        );
        assert_eq!(a.calls(), 0);

        // Probing did not count against a's rate window
        let status = d.status();
        assert_eq!(status.providers[0].request_count, 0);
    }

    #[tokio::test]
    async fn test_missing_credentials_recorded_and_skipped() {
        let mut no_creds = descriptor("a", 1, 10, LONG_WINDOW);
        no_creds.credentials_present = false;
        let a = Arc::new(MockProvider::healthy("a"));
        let b = Arc::new(MockProvider::healthy("b"));
        let d = dispatcher(
            vec![no_creds, descriptor("b", 2, 10, LONG_WINDOW)],
            vec![a.clone(), b],
        );

        let resp = d.route(&chat("hi")).await.unwrap();
        assert_eq!(resp.provider_used, "b");
        assert_eq!(resp.attempted_providers[0].error, AttemptError::NoCredentials);
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn test_capability_filter_excludes_silently() {
        // A capability mismatch means the provider was never a candidate:
        // no attempt record and no fallback flag.
        let mut chat_only = descriptor("a", 1, 10, LONG_WINDOW);
        chat_only.capabilities = vec![RequestType::Chat];
        let a = Arc::new(MockProvider::healthy("a"));
        let b = Arc::new(MockProvider::healthy("b"));
        let d = dispatcher(
            vec![chat_only, descriptor("b", 2, 10, LONG_WINDOW)],
            vec![a.clone(), b],
        );

        let resp = d
            .route(&RoutingRequest::new(RequestType::Debug, "broken code"))
            .await
            .unwrap();
        assert_eq!(resp.provider_used, "b");
        assert!(!resp.fallback_used);
        assert!(resp.attempted_providers.is_empty());
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn test_total_exhaustion_always_answers() {
        let a = Arc::new(MockProvider::broken("a"));
        let b = Arc::new(MockProvider::broken("b"));
        let d = dispatcher(
            vec![
                descriptor("a", 1, 10, LONG_WINDOW),
                descriptor("b", 2, 10, LONG_WINDOW),
            ],
            vec![a, b],
        );

        let resp = d.route(&chat("hi")).await.unwrap();
        assert_eq!(resp.provider_used, "local");
        assert!(resp.fallback_used);
        assert_eq!(resp.attempted_names(), vec!["a", "b"]);
        assert!(!resp.text.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_request_fails_before_any_provider() {
        let a = Arc::new(MockProvider::healthy("a"));
        let d = dispatcher(vec![descriptor("a", 1, 10, LONG_WINDOW)], vec![a.clone()]);

        let err = d.route(&chat("   ")).await.unwrap_err();
        assert!(matches!(err, GateError::InvalidRequest(_)));
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invocation_timeout_counts_as_failure() {
        let x = Arc::new(MockProvider::hung("x", Duration::from_secs(600)));
        let d = dispatcher(vec![descriptor("x", 1, 10, LONG_WINDOW)], vec![x]);

        let resp = d.route(&chat("hi")).await.unwrap();
        assert_eq!(resp.provider_used, "local");
        assert!(matches!(
            resp.attempted_providers[0].error,
            AttemptError::InvocationFailed(_)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_dispatches_respect_window_limit() {
        let x = Arc::new(MockProvider::healthy("x"));
        let d = Arc::new(dispatcher(
            vec![descriptor("x", 1, 10, LONG_WINDOW)],
            vec![x],
        ));

        let calls = (0..50).map(|i| {
            let d = Arc::clone(&d);
            async move { d.route(&chat(&format!("req {}", i))).await.unwrap() }
        });
        let responses = futures::future::join_all(calls).await;

        let remote = responses.iter().filter(|r| r.provider_used == "x").count();
        let local = responses.iter().filter(|r| r.provider_used == "local").count();
        assert_eq!(remote, 10);
        assert_eq!(local, 40);
        assert_eq!(d.status().providers[0].request_count, 10);
    }

    #[tokio::test]
    async fn test_status_report_shapes() {
        let x = Arc::new(MockProvider::healthy("x"));
        let d = dispatcher(vec![descriptor("x", 1, 1, LONG_WINDOW)], vec![x]);

        let before = d.status();
        assert_eq!(before.total_providers, 1);
        assert_eq!(before.active_providers, 1);
        assert!(before.emergency_fallback);
        assert_eq!(before.providers[0].rate_limit_status, "OK");

        d.route(&chat("hi")).await.unwrap();

        let after = d.status();
        assert_eq!(after.providers[0].request_count, 1);
        assert_eq!(after.providers[0].rate_limit_status, "LIMIT_REACHED");
    }

    #[tokio::test]
    async fn test_breaker_open_marks_unavailable_in_status() {
        let x = Arc::new(MockProvider::broken("x"));
        let d = dispatcher(vec![descriptor("x", 1, 100, LONG_WINDOW)], vec![x]);

        for _ in 0..3 {
            d.route(&chat("hi")).await.unwrap();
        }
        let status = d.status();
        assert!(!status.providers[0].available);
        assert_eq!(status.active_providers, 0);
    }

    #[tokio::test]
    async fn test_health_reports_primary_and_per_provider() {
        let a = Arc::new(MockProvider::unreachable("a"));
        let b = Arc::new(MockProvider::healthy("b"));
        let d = dispatcher(
            vec![
                descriptor("a", 1, 10, LONG_WINDOW),
                descriptor("b", 2, 10, LONG_WINDOW),
            ],
            vec![a, b],
        );

        let health = d.health().await;
        assert!(health.healthy);
        assert_eq!(health.primary_provider, "b");
        assert_eq!(health.providers.get("a"), Some(&false));
        assert_eq!(health.providers.get("b"), Some(&true));
    }

    #[tokio::test]
    async fn test_health_with_all_providers_down() {
        let a = Arc::new(MockProvider::unreachable("a"));
        let d = dispatcher(vec![descriptor("a", 1, 10, LONG_WINDOW)], vec![a]);

        let health = d.health().await;
        assert!(!health.healthy);
        assert_eq!(health.primary_provider, "local");
    }

    #[tokio::test]
    async fn test_equal_priority_ties_resolve_to_registration_order() {
        let a = Arc::new(MockProvider::healthy("first"));
        let b = Arc::new(MockProvider::healthy("second"));
        let d = dispatcher(
            vec![
                descriptor("first", 1, 10, LONG_WINDOW),
                descriptor("second", 1, 10, LONG_WINDOW),
            ],
            vec![a, b.clone()],
        );

        let resp = d.route(&chat("hi")).await.unwrap();
        assert_eq!(resp.provider_used, "first");
        assert_eq!(b.calls(), 0);
    }
}
