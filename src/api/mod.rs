//! REST API for a finished fleet run.
//!
//! Provides four GET endpoints:
//! - `/state`: run info and fleet KPIs
//! - `/soc`: SOC samples with optional agent and time filtering
//! - `/power`: power-draw samples, same filters as `/soc`
//! - `/load`: aggregate fleet load and hourly energy

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use chrono::TimeDelta;

use crate::diagnostics::Diagnostics;
use crate::sim::controller::Controller;
use crate::sim::kpi::FleetKpi;
use crate::sim::load::{EnergyBucket, LoadPoint, LoadProfile};
use crate::sim::types::{RunInfo, Sample};

pub use types::{ErrorResponse, LoadResponse, SampleQuery, StateResponse};

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the simulation run completes and wrapped in
/// `Arc`. Everything is read-only, so handlers need no locks.
pub struct AppState {
    pub run: RunInfo,
    pub kpi: FleetKpi,
    /// Flattened SOC reports of every agent.
    pub soc: Vec<Sample>,
    /// Flattened power-draw reports of every agent.
    pub power: Vec<Sample>,
    pub load: Vec<LoadPoint>,
    /// Fleet energy per hour from the run start.
    pub hourly_energy: Vec<EnergyBucket>,
}

impl AppState {
    /// Snapshots the controller's event data.
    pub fn new(run: RunInfo, kpi: FleetKpi, controller: &Controller, tick: TimeDelta) -> Self {
        let power = controller.power_samples();
        let profile = LoadProfile::from_samples(&power);
        let hourly_energy = profile.bucketed_energy(run.start, tick, TimeDelta::hours(1));
        Self {
            soc: controller.soc_samples(),
            load: profile.points().to_vec(),
            run,
            kpi,
            power,
            hourly_energy,
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/soc", get(handlers::get_soc))
        .route("/power", get(handlers::get_power))
        .route("/load", get(handlers::get_load))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind to `addr` or the
/// server fails.
pub async fn serve(
    state: Arc<AppState>,
    addr: SocketAddr,
    diagnostics: Diagnostics,
) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    diagnostics.info(format_args!("API server listening on http://{local}"));
    axum::serve(listener, app).await
}
