use serde::Serialize;

/// Body of every failed response. Never carries internal details.
#[derive(Debug, Serialize)]
pub struct Error {
    error: &'static str,
}

impl Error {
    pub fn internal() -> (axum::http::StatusCode, axum::Json<Self>) {
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(Self {
                error: "Internal Server Error",
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn internal_error_hides_details() {
        let (status, axum::Json(body)) = Error::internal();
        assert_eq!(status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({ "error": "Internal Server Error" })
        );
    }
}
