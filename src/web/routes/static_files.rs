// Form page route handlers

use hyper::{Body, Response, StatusCode};
use std::convert::Infallible;

use crate::web::response_helpers::{cors_preflight, html_response};

const INDEX_HTML: &str = include_str!("../../../assets/index.html");

pub async fn handle_index() -> Result<Response<Body>, Infallible> {
    Ok(html_response(StatusCode::OK, INDEX_HTML))
}

pub async fn handle_options() -> Result<Response<Body>, Infallible> {
    Ok(cors_preflight())
}
