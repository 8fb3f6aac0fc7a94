// m13 - REST facade for live debugging sessions
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use m13_common::types::ErrorBody;
use serde::Serialize;
use tracing::error;

/// Content type of every response; existing clients match the exact spelling
pub const CONTENT_TYPE: &str = "application/json; charset=utf8";

/// A JSON document sent with status 200 and [`CONTENT_TYPE`]
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl JsonBody<ErrorBody> {
    /// An in-body error carrying `message`
    pub fn error(message: impl Into<String>) -> Self {
        Self(ErrorBody::new(message))
    }
}

impl<T: Serialize> IntoResponse for JsonBody<T> {
    fn into_response(self) -> Response {
        let bytes = match serde_json::to_vec(&self.0) {
            Ok(bytes) => bytes,
            Err(err) => {
                error!("Failed to serialize response: {err}");
                serde_json::to_vec(&ErrorBody::new(format!("Failed to serialize response: {err}")))
                    .unwrap_or_default()
            }
        };
        ([(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE))], bytes).into_response()
    }
}
