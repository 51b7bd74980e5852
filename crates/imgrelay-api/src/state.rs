use imgrelay_core::Config;

use crate::upstream::UpstreamClient;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub upstream: UpstreamClient,
    /// Client used by the proxy endpoint for arbitrary image fetches.
    pub fetch_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        let upstream = UpstreamClient::new(&config)?;
        let fetch_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            config,
            upstream,
            fetch_client,
        })
    }
}
