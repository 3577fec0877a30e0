// 🌐 Tracker Vendor Database - Lookup Server
// Read-only REST API over a merged vendors.json

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracker_vendor_db::logging;
use tracker_vendor_db::{Category, DatabaseStats, Tier, VendorDatabase, VendorIndex, VendorRecord};

#[derive(Parser)]
#[command(name = "vendor-server")]
#[command(version, about = "Read-only lookup API for the tracker vendor database")]
struct Args {
    /// Merged vendor database
    #[arg(long, env = "VENDOR_DB_PATH", default_value = "data/vendors.json")]
    database: PathBuf,

    /// Listen address
    #[arg(long, env = "VENDOR_DB_BIND", default_value = "0.0.0.0:3000")]
    bind: String,
}

/// Shared application state (loaded once, never mutated)
#[derive(Clone)]
struct AppState {
    index: Arc<VendorIndex>,
    stats: Arc<DatabaseStats>,
    version: Arc<String>,
    last_updated: Arc<String>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Serialize)]
struct StatsResponse {
    version: String,
    last_updated: String,
    #[serde(flatten)]
    stats: DatabaseStats,
}

#[derive(Serialize)]
struct LookupResponse {
    host: String,
    vendor: VendorRecord,
}

#[derive(Deserialize)]
struct VendorFilter {
    category: Option<String>,
    tier: Option<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/stats - Database statistics
async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(StatsResponse {
        version: state.version.as_ref().clone(),
        last_updated: state.last_updated.as_ref().clone(),
        stats: state.stats.as_ref().clone(),
    }))
}

/// GET /api/vendors?category=&tier= - List vendors, optionally filtered
async fn list_vendors(
    State(state): State<AppState>,
    Query(filter): Query<VendorFilter>,
) -> impl IntoResponse {
    let category = match filter.category.as_deref().map(Category::parse) {
        Some(None) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<Vec<VendorRecord>>::error("unknown category")),
            )
                .into_response()
        }
        Some(category) => category,
        None => None,
    };
    let tier = match filter.tier.as_deref().map(Tier::parse) {
        Some(None) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<Vec<VendorRecord>>::error("unknown tier")),
            )
                .into_response()
        }
        Some(tier) => tier,
        None => None,
    };

    let vendors: Vec<&VendorRecord> = state
        .index
        .vendors()
        .iter()
        .filter(|v| category.map_or(true, |c| v.category == c))
        .filter(|v| tier.map_or(true, |t| v.tier == t))
        .collect();

    (StatusCode::OK, Json(ApiResponse::ok(vendors))).into_response()
}

/// GET /api/vendors/:id - One vendor by id
async fn get_vendor(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match state.index.get(&id) {
        Some(vendor) => (StatusCode::OK, Json(ApiResponse::ok(vendor.clone()))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<VendorRecord>::error(format!("no vendor '{}'", id))),
        )
            .into_response(),
    }
}

/// GET /api/lookup/:host - Vendor owning a host (parent domains included)
async fn lookup_host(State(state): State<AppState>, Path(host): Path<String>) -> impl IntoResponse {
    match state.index.find(&host) {
        Some(vendor) => (
            StatusCode::OK,
            Json(ApiResponse::ok(LookupResponse {
                host,
                vendor: vendor.clone(),
            })),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<LookupResponse>::error(format!(
                "no known vendor for '{}'",
                host
            ))),
        )
            .into_response(),
    }
}

// ============================================================================
// Main Server
// ============================================================================

fn load_state(path: &std::path::Path) -> Result<AppState> {
    let db = VendorDatabase::load(path)
        .with_context(|| format!("Run `vendor-db merge` to build {}", path.display()))?;
    let stats = DatabaseStats::from_vendors(&db.vendors);

    Ok(AppState {
        index: Arc::new(VendorIndex::new(db.vendors)),
        stats: Arc::new(stats),
        version: Arc::new(db.version),
        last_updated: Arc::new(db.last_updated),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init(None);

    let args = Args::parse();

    let state = load_state(&args.database)?;
    info!(
        "Loaded {} vendors ({} domains) from {}",
        state.stats.total_vendors,
        state.index.domain_count(),
        args.database.display()
    );

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(get_stats))
        .route("/vendors", get(list_vendors))
        .route("/vendors/:id", get(get_vendor))
        .route("/lookup/:host", get(lookup_host))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", args.bind))?;

    info!("Server running on http://{}", args.bind);
    info!("   Lookup: http://{}/api/lookup/<host>", args.bind);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
