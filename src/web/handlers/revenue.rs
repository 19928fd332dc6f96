//! Revenue aggregate handlers over an inclusive order-date range

use axum::{
    extract::{Query, State},
    response::Response,
};
use std::collections::BTreeMap;

use crate::errors::AppResult;
use crate::models::{RevenueByProduct, TotalRevenue};
use crate::web::{extractors::DateRangeParams, responses::handle_result, AppState};

pub async fn revenue_by_product(
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> Response {
    handle_result(product_revenue(&state, params).await)
}

pub async fn revenue_by_category(
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> Response {
    handle_result(category_revenue(&state, params).await)
}

pub async fn revenue_by_region(
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> Response {
    handle_result(region_revenue(&state, params).await)
}

pub async fn total_revenue(
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> Response {
    handle_result(overall_revenue(&state, params).await)
}

async fn product_revenue(
    state: &AppState,
    params: DateRangeParams,
) -> AppResult<Vec<RevenueByProduct>> {
    let range = params.into_range()?;
    Ok(state.database.revenue_by_product(range).await?)
}

async fn category_revenue(
    state: &AppState,
    params: DateRangeParams,
) -> AppResult<BTreeMap<String, f64>> {
    let range = params.into_range()?;
    Ok(state.database.revenue_by_category(range).await?)
}

async fn region_revenue(
    state: &AppState,
    params: DateRangeParams,
) -> AppResult<BTreeMap<String, f64>> {
    let range = params.into_range()?;
    Ok(state.database.revenue_by_region(range).await?)
}

async fn overall_revenue(state: &AppState, params: DateRangeParams) -> AppResult<TotalRevenue> {
    let range = params.into_range()?;
    let total_revenue = state.database.total_revenue(range).await?;
    Ok(TotalRevenue { total_revenue })
}
