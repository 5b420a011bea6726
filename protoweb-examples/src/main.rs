use std::time::Duration;

use anyhow::Context as _;
use axum::Router;
use protoweb::futures::future::BoxFuture;
use protoweb::prelude::*;
use protoweb::HandlerResult;
use protoweb_examples::hello::HelloService;
use tracing_subscriber::EnvFilter;

/// Logs every request and response in protobuf text format.
fn text_logger() -> impl Middleware {
    FnMiddleware::new(
        |ctx: CallContext, req: Box<dyn AnyMessage>, next: Next| -> BoxFuture<'static, HandlerResult> {
            Box::pin(async move {
                let method = ctx.method().to_owned();
                tracing::info!(%method, "Request: {}", req.to_dynamic().to_text_format());
                let result = next.call(ctx, req).await;
                match &result {
                    Ok(res) => tracing::info!(%method, "Response: {}", res.to_dynamic().to_text_format()),
                    Err(err) => tracing::info!(%method, "Response: error {err}"),
                }
                result
            })
        },
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,protoweb=debug")),
        )
        .init();

    let dispatcher = ServiceBuilder::new()
        .timeout(Duration::from_secs(30))
        .middleware(text_logger())
        .service(HelloService)
        .build();

    // POST /api/hello?method=Hello, and POST /api/methods/hello
    let app: Router = Router::new()
        .merge(dispatcher.clone().into_router("/api/hello"))
        .nest("/api/methods", dispatcher.into_path_router());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080")
        .await
        .context("bind 127.0.0.1:8080")?;

    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await.context("serve")?;
    Ok(())
}
