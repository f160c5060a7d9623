use reqwest::Client;

use crate::config::Config;
use crate::orchestrator::Orchestrator;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub orchestrator: std::sync::Arc<Orchestrator>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Orchestrator) -> Self {
        Self {
            config,
            orchestrator: std::sync::Arc::new(orchestrator),
        }
    }
}

pub fn build_http_client(user_agent: &str) -> anyhow::Result<Client> {
    Ok(Client::builder()
        .user_agent(user_agent.to_string())
        .timeout(std::time::Duration::from_secs(10))
        .build()?)
}
