//! Tutor dashboard endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::dashboard::{DashboardStats, GradeQuery};
use crate::error::Result;
use crate::server::state::AppState;
use crate::types::GradeRecord;

/// GET /api/dashboard/grades?q=&top= - Search grade records
pub async fn search_grades(
    State(state): State<AppState>,
    Query(query): Query<GradeQuery>,
) -> Result<Json<Vec<GradeRecord>>> {
    Ok(Json(state.dashboard().grades(&query)?))
}

/// GET /api/dashboard/stats - Grade distribution and activity
pub async fn stats(State(state): State<AppState>) -> Result<Json<DashboardStats>> {
    Ok(Json(state.dashboard().stats()?))
}
