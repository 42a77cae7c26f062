//! HTTP server command handler.

use std::net::SocketAddr;

use color_eyre::Result;

use crate::server;

use super::App;

impl App {
    /// Run the HTTP API until the process is stopped.
    pub async fn run_serve(&self, host: &str, port: Option<u16>) -> Result<()> {
        tracing::info!("Starting Stackscan HTTP server");

        let ctx = self.context()?;
        if ctx.config.api_key.is_empty() {
            tracing::warn!("No API key configured - every /api request will be rejected");
        }

        let port = port.unwrap_or(ctx.config.port);
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| color_eyre::eyre::eyre!("Invalid address {}:{}: {}", host, port, e))?;

        server::serve(ctx, addr).await?;

        tracing::info!("HTTP server shutting down");
        Ok(())
    }
}
