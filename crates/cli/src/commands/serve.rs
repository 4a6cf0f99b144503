//! `chatrelay serve`: Start the HTTP API server.

use chatrelay_config::AppConfig;

pub async fn run(mut config: AppConfig, port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    let keyed: Vec<&str> = chatrelay_core::ApiProvider::ALL
        .iter()
        .filter(|p| config.api_key(**p).is_some())
        .map(|p| p.as_str())
        .collect();

    println!("chatrelay gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Knowledge: {}", config.knowledge.source);
    println!(
        "   Server keys: {}",
        if keyed.is_empty() { "none (clients must send X-Api-Key)".to_string() } else { keyed.join(", ") }
    );

    chatrelay_gateway::start(config).await?;

    Ok(())
}
