//! Local peers that must keep reaching mongo once the firewall is up.
//!
//! Which containers talk to mongo depends on how TLS is terminated in front
//! of the app.

use crate::config::{AppConfig, SslMode};

/// Container names allowed through the firewall for this app
pub fn plan(app: &AppConfig) -> Vec<String> {
    match app.ssl_mode() {
        SslMode::None => vec![app.name.clone()],
        SslMode::Autogenerate => vec![
            format!("{}-nginx-letsencrypt", app.name),
            format!("{}-nginx-proxy", app.name),
        ],
        SslMode::Custom => vec![format!("{}-frontend", app.name)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AutogenerateConfig, SslConfig};

    #[test]
    fn test_plain_app() {
        assert_eq!(plan(&AppConfig::new("shop")), ["shop"]);
    }

    #[test]
    fn test_autogenerate_ssl() {
        for name in ["shop", "a", "my-app-2"] {
            let app = AppConfig::new(name).with_ssl(SslConfig {
                autogenerate: Some(AutogenerateConfig::default()),
                ..Default::default()
            });
            let peers = plan(&app);
            assert_eq!(peers.len(), 2);
            assert!(peers[0].ends_with("-nginx-letsencrypt"));
            assert!(peers[1].ends_with("-nginx-proxy"));
            assert!(peers.iter().all(|p| p.starts_with(name)));
        }
    }

    #[test]
    fn test_custom_ssl() {
        let app = AppConfig::new("shop").with_ssl(SslConfig {
            crt: Some("bundle.crt".to_string()),
            key: Some("private.key".to_string()),
            ..Default::default()
        });
        assert_eq!(plan(&app), ["shop-frontend"]);
    }
}
