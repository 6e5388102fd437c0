//! CreditExplain server entry point.
//!
//! Constructs every collaborator client once, wires them into a
//! [`SelfReflectiveRag`], and serves the HTTP façade.

use std::net::SocketAddr;
use std::sync::Arc;

use credit_explain_audit::JsonlAuditSink;
use credit_explain_config::Settings;
use credit_explain_llm::{GroqClient, GroqConfig, GroqCritic, GroqGenerator};
use credit_explain_orchestrator::{Deadlines, OrchestratorConfig, SelfReflectiveRag};
use credit_explain_rag::{
    cross_encoder::CrossEncoderConfig, embedder::EmbedderConfig, vector_index::QdrantConfig, HttpCrossEncoder,
    HttpEmbedder, QdrantVectorIndex,
};
use credit_explain_server::{create_router, AppState, Metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    init_tracing(&settings);
    metrics_exporter_prometheus::PrometheusBuilder::new().install()?;

    tracing::info!(
        port = settings.server_port,
        top_k = settings.top_k,
        top_n = settings.top_n,
        "starting credit-explain server"
    );

    let mut critic_config = GroqConfig::new(
        settings.groq_api_key.clone(),
        settings.critic_model.clone(),
        settings.deadlines.critic(),
    );
    let mut generator_config = GroqConfig::new(
        settings.groq_api_key.clone(),
        settings.generator_model.clone(),
        settings.deadlines.generator(),
    );
    if let Some(endpoint) = &settings.groq_endpoint {
        critic_config.endpoint = endpoint.clone();
        generator_config.endpoint = endpoint.clone();
    }
    let critic_client = GroqClient::new(critic_config)?;
    let generator_client = GroqClient::new(generator_config)?;
    let critic: Arc<dyn credit_explain_core::Critic> = Arc::new(GroqCritic::new(critic_client));
    let generator: Arc<dyn credit_explain_core::Generator> = Arc::new(GroqGenerator::new(generator_client));

    let embedder: Arc<dyn credit_explain_core::Embedder> = Arc::new(HttpEmbedder::new(EmbedderConfig {
        endpoint: settings.embed_endpoint.clone(),
        model: settings.embed_model.clone(),
        timeout: settings.deadlines.embedder(),
    })?);

    let cross_encoder: Arc<dyn credit_explain_core::CrossEncoder> = Arc::new(HttpCrossEncoder::new(CrossEncoderConfig {
        endpoint: settings.rerank_endpoint.clone(),
        timeout: settings.deadlines.rerank(),
    })?);

    let vector_index = QdrantVectorIndex::new(QdrantConfig {
        endpoint: settings.qdrant_endpoint.clone(),
        collection: settings.qdrant_collection.clone(),
        vector_dim: settings.vector_dim,
        api_key: settings.qdrant_api_key.clone(),
    })
    .await?;
    vector_index.ensure_collection().await?;
    let vector_index: Arc<dyn credit_explain_core::VectorIndex> = Arc::new(vector_index);

    let audit_sink = Arc::new(JsonlAuditSink::new(settings.audit_dir.clone()));

    let orchestrator_config = OrchestratorConfig {
        weights: credit_explain_core::SelectionWeights {
            isrel: settings.weights.weight_isrel,
            issup: settings.weights.weight_issup,
            isuse: settings.weights.weight_isuse,
        },
        top_k: settings.top_k,
        top_n: settings.top_n,
        support_threshold: settings.support_threshold,
        deadlines: Deadlines {
            critic: settings.deadlines.critic(),
            generator: settings.deadlines.generator(),
            embedder: settings.deadlines.embedder(),
            index: settings.deadlines.index(),
            rerank: settings.deadlines.rerank(),
            audit: settings.deadlines.audit(),
            run: settings.deadlines.run(),
        },
    };

    let rag = Arc::new(SelfReflectiveRag::new(
        critic,
        embedder,
        vector_index,
        cross_encoder,
        generator,
        audit_sink.clone() as Arc<dyn credit_explain_core::AuditSink>,
        orchestrator_config,
    ));

    let port = settings.server_port;
    let state = AppState::new(rag, audit_sink, Arc::new(settings), Arc::new(Metrics::default()));
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl+c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received sigterm, shutting down"),
    }
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("credit_explain={},tower_http=info", settings.log_level).into());

    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter);
    if settings.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
