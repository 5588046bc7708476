use axum::Router;
use log::info;
use tower_http::services::ServeDir;

use crate::error::Result;
use crate::output;
use crate::reports::ReportsDir;

/// Serve the reports directory over HTTP until interrupted.
///
/// Runs in the foreground; detaching (the original compose `-d`
/// behavior) is the invoker's concern.
pub async fn serve(reports: &ReportsDir, port: u16) -> Result<()> {
    reports.ensure()?;

    let app = Router::new().nest_service("/", ServeDir::new(reports.root()));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;

    info!("Serving {} on port {port}", reports.root().display());
    output::info(format!(
        "Reports available at http://localhost:{port}/ (ctrl-c to stop)"
    ));

    axum::serve(listener, app).await?;
    Ok(())
}
