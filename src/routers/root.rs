use crate::controllers::RootController;

pub async fn root_route() -> impl axum::response::IntoResponse {
    RootController::root().await
}

pub async fn health_check_route() -> impl axum::response::IntoResponse {
    RootController::health_check().await
}

pub async fn docs_route() -> impl axum::response::IntoResponse {
    RootController::docs().await
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .route("/", get(root_route))
            .route("/health", get(health_check_route))
            .route("/docs", get(docs_route))
    }

    #[tokio::test]
    async fn health_check_responds_ok() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn root_and_docs_respond_ok() {
        for uri in ["/", "/docs"] {
            let response = app()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "uri: {}", uri);
        }
    }
}
