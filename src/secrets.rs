// secrets
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;
use tracing::info;
pub static SECRET_MANAGER: Lazy<SecretManager> = Lazy::new(|| SecretManager::new());

enum MODE {
    DEV,
    PROD,
}

pub struct SecretManager {
    secrets: HashMap<String, String>,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl SecretManager {
    fn new() -> Self {
        let mut secrets: HashMap<String, String> = HashMap::new();
        let mode = match env::var("MODE") {
            Ok(mode) if mode.to_lowercase() == "prod" => MODE::PROD,
            _ => MODE::DEV,
        };
        match mode {
            MODE::DEV => {
                secrets.insert(
                    "FRONTEND_URL".to_string(),
                    "http://localhost:3000".to_string(),
                );
                secrets.insert(
                    "MUSIC_API_URL".to_string(),
                    env_or("MUSIC_API_URL", "http://localhost:8080"),
                );
            }
            MODE::PROD => {
                secrets.insert(
                    "FRONTEND_URL".to_string(),
                    env::var("FRONTEND_URL").unwrap_or_default(),
                );
                secrets.insert(
                    "MUSIC_API_URL".to_string(),
                    env::var("MUSIC_API_URL").unwrap_or_default(),
                );
            }
        }

        // PORT falls back to 8000 in every mode
        secrets.insert("PORT".to_string(), env_or("PORT", "8000"));

        secrets.insert(
            "MUSIC_API_KEY".to_string(),
            env::var("MUSIC_API_KEY").unwrap_or_default(),
        );

        // RapidAPI lyrics upstream
        secrets.insert(
            "RAPIDAPI_KEY".to_string(),
            env::var("RAPIDAPI_KEY").unwrap_or_default(),
        );
        secrets.insert(
            "RAPIDAPI_HOST".to_string(),
            env_or("RAPIDAPI_HOST", "spotify-web-api3.p.rapidapi.com"),
        );

        // Log which secrets are configured (NOT their values!)
        let configured: Vec<&str> = secrets
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, _)| k.as_str())
            .collect();
        info!("Secrets configured: {:?}", configured);

        SecretManager { secrets }
    }

    pub fn get(&self, key: &str) -> String {
        self.secrets.get(key).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_when_unset() {
        assert_eq!(env_or("DJ_BACKEND_NO_SUCH_VAR", "8000"), "8000");
    }

    #[test]
    fn get_returns_empty_for_unknown_key() {
        let manager = SecretManager {
            secrets: HashMap::new(),
        };
        assert_eq!(manager.get("NOPE"), "");
    }
}
