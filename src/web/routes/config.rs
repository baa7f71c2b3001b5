// Configuration route handler (read-only; the API key never leaves the process)

use hyper::{Body, Response, StatusCode};
use serde::Serialize;
use std::convert::Infallible;

use label_forge_config::AppConfig;

use crate::web::{response_helpers::json_response, state::SharedState};

#[derive(Serialize)]
struct ConfigView<'a> {
    #[serde(flatten)]
    config: &'a AppConfig,
    api_key: &'static str,
    tool_available: bool,
}

pub async fn handle_get_config(state: SharedState) -> Result<Response<Body>, Infallible> {
    let view = ConfigView {
        config: &state.config,
        api_key: "****",
        tool_available: state.config.tool_command.is_some(),
    };
    Ok(json_response(StatusCode::OK, &view))
}
