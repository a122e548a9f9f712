use axum::{
    extract::{Query, State},
    response::Response,
};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::resume::params::ResumeParams;
use crate::resume::query::build_resume_query;
use crate::resume::response::{build_resume_response, landing_page, pretty_json_response};
use crate::resume::transform::shape_resume;
use crate::state::AppState;

/// GET|POST /api/getresumedata
///
/// Without `id` and `lang` this serves the landing page. Otherwise it returns
/// the shaped résumé and bumps the visitor counter. POST behaves like GET; the
/// landing page's script uses it to register a visit.
pub async fn handle_get_resume_data(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let params = ResumeParams::from_pairs(pairs);
    info!(
        "Query parameters - ID: {:?}, Lang: {:?}, Filter: {:?}, Theme: {:?}, Page: {:?}, Page Size: {:?}",
        params.id, params.lang, params.filter, params.theme, params.page, params.page_size
    );

    let Some((id, lang)) = params.identity() else {
        return Ok(landing_page());
    };

    let query = build_resume_query(id, lang, params.filter());
    let mut docs = state.store.query(&query).await?.into_iter();
    let Some(doc) = docs.next() else {
        return Err(AppError::NotFound(format!("ID: {id}, Lang: {lang}")));
    };
    let duplicates = docs.len();
    if duplicates > 0 {
        warn!("{duplicates} extra document(s) match ID: {id}, Lang: {lang}; using the first");
    }

    let page = params.pagination()?;
    let data = shape_resume(doc, params.theme(), page);

    // A failed increment must not fail the read; the count below reflects it.
    if let Err(e) = state.visitors.increment().await {
        error!("Error incrementing visitor count: {e}");
    }
    let visitor_count = state.visitors.get_count().await;

    let response = build_resume_response(state.config.success_message(), visitor_count, data);
    pretty_json_response(&response).map_err(|e| AppError::Internal(e.into()))
}
