//! DocVault REST API Server
//!
//! This binary serves the document management REST API: document CRUD with
//! version history, metadata field and document type registries, file
//! upload and download.
//!
//! ## Usage
//!
//! ```bash
//! # Start the server
//! DATABASE_URL=postgresql://localhost/docvault cargo run --bin docvault_server --features server
//!
//! # Test endpoints
//! curl http://localhost:3000/api/health
//!
//! curl -X POST http://localhost:3000/api/documents \
//!   -H "Content-Type: application/json" \
//!   -d '{"title": "Lease", "metadata": {}}'
//!
//! curl http://localhost:3000/api/documents?search=lease
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docvault::api::create_api_router;
use docvault::{DatabaseManager, LocalFileStorage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("🚀 Starting DocVault REST API Server");

    // Connect and make sure the schema exists
    let db = DatabaseManager::with_default_config().await?;
    db.run_migrations().await?;

    println!("✅ Database connection established");

    let storage = Arc::new(LocalFileStorage::from_env()?);

    // Create router with CORS and tracing
    let app = create_api_router(db.pool().clone(), storage)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
        .parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    println!("\n🌐 Server running on http://{}", addr);
    println!("\n📖 Available endpoints:");
    println!("  POST   http://{addr}/api/documents");
    println!("  GET    http://{addr}/api/documents");
    println!("  GET    http://{addr}/api/documents/:id");
    println!("  POST   http://{addr}/api/documents/:id/versions");
    println!("  GET    http://{addr}/api/documents/:id/download");
    println!("  POST   http://{addr}/api/metadata-fields");
    println!("  POST   http://{addr}/api/document-types");
    println!("  GET    http://{addr}/api/health");
    println!("\n✨ Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;

    Ok(())
}
