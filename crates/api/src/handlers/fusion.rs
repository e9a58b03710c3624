use axum::extract::{Path, State};
use axum::Json;
use floodwatch_core::fusion::FusionAnalysisData;
use floodwatch_core::types::{DbId, LocationId};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /locations/{location_id}/fusion
///
/// `data` is `null` until all three sources have reported for the location.
pub async fn get_fusion(
    State(state): State<AppState>,
    Path(location_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Option<FusionAnalysisData>>>> {
    let analysis = state.registry.get(LocationId(location_id)).await?;
    Ok(Json(DataResponse { data: analysis }))
}
