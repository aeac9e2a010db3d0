pub mod fallback;
pub mod health;
pub mod presence;
pub mod profile;

#[cfg(test)]
pub(crate) mod test_util {
    use crate::core::config::{
        AccountsConfig, AuthConfig, Config, LoggingConfig, MediaConfig, PresenceConfig, ServerConfig,
    };
    use crate::core::state::AppState;
    use crate::stores::user_store::InMemoryUserStore;
    use crate::utils::time::Clock;
    use std::sync::Arc;
    use tempfile::TempDir;

    pub fn create_test_config(temp_dir: &TempDir) -> Config {
        Config {
            server: ServerConfig {
                port: 3000,
                num_threads: 2,
            },
            media: MediaConfig {
                public_root: temp_dir.path().join("public"),
                fetch_timeout_secs: 5,
                ..MediaConfig::default()
            },
            presence: PresenceConfig::default(),
            auth: AuthConfig::default(),
            accounts: AccountsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn create_test_state(temp_dir: &TempDir, clock: Arc<dyn Clock>) -> Arc<AppState> {
        let config = create_test_config(temp_dir);
        Arc::new(AppState::new(config, Arc::new(InMemoryUserStore::new()), clock).unwrap())
    }
}
