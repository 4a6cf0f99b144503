//! `chatrelay config`: Show the effective configuration.

use chatrelay_config::AppConfig;

pub fn show(config: &AppConfig, default: bool) {
    print!("{}", render(config, default));
}

fn render(config: &AppConfig, default: bool) -> String {
    if default {
        AppConfig::default_toml()
    } else {
        config.redacted_toml()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatrelay_config::ProviderConfig;

    #[test]
    fn default_flag_ignores_loaded_config() {
        let mut config = AppConfig::default();
        config.gateway.port = 9999;
        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: Some("sk-secret".into()),
                ..ProviderConfig::default()
            },
        );

        let defaults = render(&config, true);
        assert!(defaults.contains("port = 3000"));
        assert!(!defaults.contains("openai"));

        let effective = render(&config, false);
        assert!(effective.contains("port = 9999"));
        assert!(!effective.contains("sk-secret"));
    }
}
