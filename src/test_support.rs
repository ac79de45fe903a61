use axum::Router;

/// Serve `app` on an ephemeral loopback port and return its base URL.
pub async fn spawn_router(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read test listener address");

    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Test server stopped");
    });

    format!("http://{}", addr)
}
