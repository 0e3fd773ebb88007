use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::Context;
use chrono::Utc;
use content_service::clients::{HttpIdentityVerifier, HttpProfileClient, IdentityVerifier};
use content_service::db::{self, ContentStore, InMemoryContentStore, PgContentStore};
use content_service::handlers;
use content_service::realtime::EventHub;
use content_service::services::{FeedService, MutationService, ProfileResolver};
use content_service::Config;
use serde::Serialize;
use shared_cache::invalidation::InvalidationSubscriber;
use shared_cache::{CacheMetrics, RedisCache, SharedCache};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct HealthState {
    store: Arc<dyn ContentStore>,
    cache: SharedCache,
    hub: Arc<EventHub>,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

async fn health_summary(state: web::Data<HealthState>) -> HttpResponse {
    match state.store.ping().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "content-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("Content store check failed: {}", e),
            "service": "content-service"
        })),
    }
}

async fn readiness_summary(state: web::Data<HealthState>) -> HttpResponse {
    let mut checks = HashMap::new();
    let mut ready = true;

    let start = Instant::now();
    let store_result = state.store.ping().await;
    let store_latency = Some(start.elapsed().as_millis() as u64);
    let store_check = match store_result {
        Ok(_) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "Content store reachable".to_string(),
            latency_ms: store_latency,
        },
        Err(e) => {
            ready = false;
            ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: format!("Content store check failed: {}", e),
                latency_ms: store_latency,
            }
        }
    };
    checks.insert("content_store".to_string(), store_check);

    // The cache is an accelerator; running without it is degraded, not down
    let cache_check = if state.cache.is_enabled() {
        ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "Shared cache enabled".to_string(),
            latency_ms: None,
        }
    } else {
        ComponentCheck {
            status: ComponentStatus::Degraded,
            message: "Shared cache disabled, every read goes to the store".to_string(),
            latency_ms: None,
        }
    };
    checks.insert("cache".to_string(), cache_check);

    let hub_check = if state.hub.is_closed() {
        ready = false;
        ComponentCheck {
            status: ComponentStatus::Unhealthy,
            message: "Event hub closed".to_string(),
            latency_ms: None,
        }
    } else {
        ComponentCheck {
            status: ComponentStatus::Healthy,
            message: format!("{} viewers connected", state.hub.connection_count().await),
            latency_ms: None,
        }
    };
    checks.insert("event_hub".to_string(), hub_check);

    let status = if ready {
        ComponentStatus::Healthy
    } else {
        ComponentStatus::Unhealthy
    };

    let response = ReadinessResponse {
        ready,
        status,
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn ContentStore>> {
    match &config.database.url {
        Some(url) => {
            let pool = db::init_pool(url, config.database.max_connections)
                .await
                .context("Failed to initialize content store")?;
            tracing::info!("Connected to PostgreSQL content store");
            Ok(Arc::new(PgContentStore::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory content store");
            Ok(Arc::new(InMemoryContentStore::new()))
        }
    }
}

/// Connect the shared cache and start listening for cross-service
/// invalidations. Any failure leaves the service running uncached.
async fn open_cache(config: &Config) -> (SharedCache, Option<JoinHandle<()>>) {
    let Some(url) = &config.cache.url else {
        tracing::warn!("REDIS_URL not set; shared cache disabled");
        return (SharedCache::disabled(), None);
    };

    let cache = match RedisCache::connect(url, config.cache.op_timeout()).await {
        Ok(backend) => SharedCache::new(Arc::new(backend)),
        Err(e) => {
            tracing::warn!(error = %e, "Redis unreachable; shared cache disabled");
            return (SharedCache::disabled(), None);
        }
    };

    let subscriber = match InvalidationSubscriber::with_channel(
        url,
        config.cache.invalidation_channel.clone(),
    ) {
        Ok(subscriber) => subscriber,
        Err(e) => {
            tracing::warn!(error = %e, "Invalidation subscriber unavailable");
            return (cache, None);
        }
    };

    match subscriber.subscribe_cache(cache.clone()).await {
        Ok(handle) => (cache, Some(handle)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to subscribe to cache invalidations");
            (cache, None)
        }
    }
}

/// Content Service
///
/// Serves the enriched feed, applies content mutations and streams domain
/// events to connected viewers.
///
/// # Routes
///
/// - `/api/v1/feed`, `/api/v1/users/{owner_id}/posts` - Enriched feeds
/// - `/api/v1/posts/*` - Posts, likes, comments, replies
/// - `/api/v1/events` - WebSocket event stream
/// - `/api/v1/health*`, `/metrics` - Unauthenticated health and metrics
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Support container healthchecks via CLI subcommand
    if let Some(cmd) = std::env::args().nth(1) {
        if cmd == "healthcheck" || cmd == "healthcheck-http" {
            let port = std::env::var("CONTENT_SERVICE_PORT").unwrap_or_else(|_| "8081".into());
            let url = format!("http://127.0.0.1:{}/api/v1/health", port);
            let resp = reqwest::Client::new()
                .get(&url)
                .send()
                .await
                .context("healthcheck HTTP error")?;
            anyhow::ensure!(
                resp.status().is_success(),
                "healthcheck HTTP status: {}",
                resp.status()
            );
            return Ok(());
        }
    }

    dotenvy::dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            anyhow::bail!("Failed to load configuration: {}", e);
        }
    };

    tracing::info!("Starting content-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    if let Err(e) = CacheMetrics::register(prometheus::default_registry()) {
        tracing::warn!("Failed to register cache metrics: {}", e);
    }

    let store = open_store(&config).await?;
    let (cache, invalidation_task) = open_cache(&config).await;

    let verifier: Arc<dyn IdentityVerifier> = Arc::new(
        HttpIdentityVerifier::new(
            &config.upstream.identity_service_url,
            config.upstream.request_timeout(),
        )
        .context("Failed to build identity client")?,
    );
    let profile_client = Arc::new(
        HttpProfileClient::new(
            &config.upstream.profile_service_url,
            config.upstream.request_timeout(),
        )
        .context("Failed to build profile client")?,
    );

    let hub = Arc::new(EventHub::new());
    let profiles = Arc::new(ProfileResolver::new(
        profile_client,
        cache.clone(),
        config.upstream.enrichment_timeout(),
        config.cache.profile_ttl(),
    ));
    let feed = Arc::new(FeedService::new(
        store.clone(),
        profiles.clone(),
        cache.clone(),
        config.cache.feed_ttl(),
        config.feed.max_items,
    ));
    let mutations = Arc::new(MutationService::new(
        store.clone(),
        feed.clone(),
        profiles,
        hub.clone(),
    ));

    let feed_data = web::Data::from(feed);
    let mutations_data = web::Data::from(mutations);
    let hub_data = web::Data::from(hub.clone());
    let realtime_data = web::Data::new(config.realtime.clone());
    let health_state = web::Data::new(HealthState {
        store,
        cache,
        hub: hub.clone(),
    });

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        let verifier = verifier.clone();
        App::new()
            .app_data(feed_data.clone())
            .app_data(mutations_data.clone())
            .app_data(hub_data.clone())
            .app_data(realtime_data.clone())
            .app_data(health_state.clone())
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(
                "/metrics",
                web::get().to(content_service::metrics::serve_metrics),
            )
            // Health check endpoints
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/ready", web::get().to(readiness_summary))
            .route("/api/v1/health/live", web::get().to(liveness_check))
            .configure(move |cfg| handlers::configure_api(cfg, verifier))
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    let server_handle = server.handle();
    let mut server_task = tokio::spawn(server);

    let result = tokio::select! {
        joined = &mut server_task => {
            tracing::warn!("HTTP server exited");
            match joined {
                Ok(served) => served.context("HTTP server failed"),
                Err(e) => Err(anyhow::anyhow!("HTTP server task failed: {}", e)),
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            // Close viewer sessions first so graceful stop does not wait on them
            hub.shutdown().await;
            server_handle.stop(true).await;
            Ok(())
        }
    };

    if let Some(task) = invalidation_task {
        task.abort();
    }
    if !hub.is_closed() {
        hub.shutdown().await;
    }

    tracing::info!("Content-service shutting down");
    result
}
