use axum::{
    Form, Json,
    extract::{
        Query, State,
        rejection::{FormRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::AppState;
use crate::core::conversion::{self, ConversionResult, ConvertError, ConvertParams};

impl IntoResponse for ConvertError {
    fn into_response(self) -> Response {
        let status = match self {
            ConvertError::InvalidInput => StatusCode::BAD_REQUEST,
            ConvertError::RateNotFound => StatusCode::NOT_FOUND,
        };
        (status, self.to_string()).into_response()
    }
}

type Pairs = Vec<(String, String)>;

fn query_params(query: Result<Query<Pairs>, QueryRejection>) -> ConvertParams {
    match query {
        Ok(Query(pairs)) => ConvertParams::from_pairs(pairs),
        Err(rejection) => {
            debug!(error = %rejection, "Ignoring malformed query string");
            ConvertParams::default()
        }
    }
}

/// GET /convert?from=..&to=..&amount=..
pub async fn convert(
    State(state): State<AppState>,
    query: Result<Query<Pairs>, QueryRejection>,
) -> Result<Json<ConversionResult>, ConvertError> {
    let params = query_params(query);
    conversion::convert(state.provider.as_ref(), params)
        .await
        .map(Json)
}

/// POST /convert, form-encoded body values win over the query string.
pub async fn convert_form(
    State(state): State<AppState>,
    query: Result<Query<Pairs>, QueryRejection>,
    form: Result<Form<Pairs>, FormRejection>,
) -> Result<Json<ConversionResult>, ConvertError> {
    let query = query_params(query);
    let params = match form {
        Ok(Form(body)) => ConvertParams::from_pairs(body).or(query),
        Err(rejection) => {
            debug!(error = %rejection, "No usable form body, using query string");
            query
        }
    };
    conversion::convert(state.provider.as_ref(), params)
        .await
        .map(Json)
}
