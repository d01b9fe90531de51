//! Configuration management
//!
//! Connection parameters for both targets come from a KEY=VALUE file,
//! resolved once at startup. Values are parsed with dotenvy without
//! touching the process environment, so secrets never leak into child
//! processes.

use std::collections::HashMap;
use std::path::Path;

use clap::ValueEnum;
use vpsops_core::{Error, Result, Target};

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "vpsops.env";

const REQUIRED_FIELDS: &[&str] = &[
    "PRIMARY_ADDR",
    "SECONDARY_ADDR",
    "SSH_KEY_PATH",
    "SSH_USER",
    "SSH_PORT",
];

/// Which targets a fan-out command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TargetScope {
    Primary,
    Secondary,
    Both,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub primary: Target,
    pub secondary: Target,
    /// Low-privilege account that owns the compose stacks
    pub service_user: String,
    /// Name of the gateway container on the primary target
    pub gateway_container: String,
    /// Command line of the agent CLI inside the gateway container
    pub agent_command: String,
    /// Gateway health endpoint, probed from the primary target itself
    pub gateway_health_url: String,
    /// Mesh (WireGuard) addresses of the two targets
    pub mesh_primary_ip: String,
    pub mesh_secondary_ip: String,
    /// `host` label the primary's log shipper attaches to its streams
    pub log_host_label: String,
    /// Path of the agent's config file on the primary target
    pub agent_config_path: String,
}

impl Config {
    /// Load and validate configuration from a KEY=VALUE file.
    pub fn load(path: &Path) -> Result<Self> {
        let vars = read_env_file(path)?;

        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .filter(|field| !vars.contains_key(**field))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing required fields in {}: {}",
                path.display(),
                missing.join(", ")
            )));
        }

        let key_path = expand_home(&vars["SSH_KEY_PATH"]);
        let user = vars["SSH_USER"].clone();
        let port: u16 = vars["SSH_PORT"]
            .parse()
            .map_err(|_| Error::Config(format!("invalid SSH_PORT: {}", vars["SSH_PORT"])))?;
        let connect_timeout: u64 = match vars.get("SSH_CONNECT_TIMEOUT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::Config(format!("invalid SSH_CONNECT_TIMEOUT: {}", raw)))?,
            None => 10,
        };

        let get_or = |key: &str, default: &str| -> String {
            vars.get(key).cloned().unwrap_or_else(|| default.to_string())
        };

        let primary = Target {
            name: "primary".to_string(),
            host: vars["PRIMARY_ADDR"].clone(),
            port,
            user: user.clone(),
            key_path: key_path.clone(),
            connect_timeout,
            stack_dir: get_or("PRIMARY_STACK_DIR", "/srv/gateway"),
        };
        let secondary = Target {
            name: "secondary".to_string(),
            host: vars["SECONDARY_ADDR"].clone(),
            port,
            user,
            key_path,
            connect_timeout,
            stack_dir: get_or("SECONDARY_STACK_DIR", "/srv/monitoring"),
        };

        Ok(Config {
            primary,
            secondary,
            service_user: get_or("SERVICE_USER", "svcops"),
            gateway_container: get_or("GATEWAY_CONTAINER", "gateway"),
            agent_command: get_or("AGENT_COMMAND", "node dist/index.js"),
            gateway_health_url: get_or("GATEWAY_HEALTH_URL", "http://localhost:18789/health"),
            mesh_primary_ip: get_or("MESH_PRIMARY_IP", "10.0.0.1"),
            mesh_secondary_ip: get_or("MESH_SECONDARY_IP", "10.0.0.2"),
            log_host_label: get_or("LOG_HOST_LABEL", "gateway"),
            agent_config_path: get_or("AGENT_CONFIG_PATH", "/home/svcops/.agent/agent.json"),
        })
    }

    /// Targets addressed by a scope, in primary-first order.
    pub fn targets(&self, scope: TargetScope) -> Vec<&Target> {
        match scope {
            TargetScope::Primary => vec![&self.primary],
            TargetScope::Secondary => vec![&self.secondary],
            TargetScope::Both => vec![&self.primary, &self.secondary],
        }
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let iter = dotenvy::from_path_iter(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;

    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) =
            item.map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))?;
        vars.insert(key, value);
    }
    Ok(vars)
}

/// Expand a bare `~` or a leading `~/` against $HOME. `~user` forms are
/// left alone.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return format!("{}{}", home, &path[1..]);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_config(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("vpsops-test-{}-{}", std::process::id(), name));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    const FULL: &str = "\
# connection
PRIMARY_ADDR=203.0.113.10
SECONDARY_ADDR=203.0.113.20
SSH_KEY_PATH=/keys/id_ed25519
SSH_USER=admin
SSH_PORT=222

SERVICE_USER=deploy
PRIMARY_STACK_DIR=/opt/gw
";

    #[test]
    fn loads_required_and_optional_fields() {
        let path = write_config("full.env", FULL);
        let config = Config::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.primary.host, "203.0.113.10");
        assert_eq!(config.primary.port, 222);
        assert_eq!(config.primary.stack_dir, "/opt/gw");
        assert_eq!(config.secondary.name, "secondary");
        assert_eq!(config.secondary.stack_dir, "/srv/monitoring");
        assert_eq!(config.service_user, "deploy");
        assert_eq!(config.primary.connect_timeout, 10);
        assert_eq!(config.log_host_label, "gateway");
        assert_eq!(config.agent_config_path, "/home/svcops/.agent/agent.json");
    }

    #[test]
    fn missing_required_fields_fail_with_their_names() {
        let path = write_config("partial.env", "PRIMARY_ADDR=203.0.113.10\nSSH_PORT=22\n");
        let err = Config::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        let msg = err.to_string();
        assert!(msg.contains("SECONDARY_ADDR"));
        assert!(msg.contains("SSH_KEY_PATH"));
        assert!(msg.contains("SSH_USER"));
        assert!(!msg.contains("PRIMARY_ADDR,"));
    }

    #[test]
    fn invalid_port_is_a_config_error() {
        let content = FULL.replace("SSH_PORT=222", "SSH_PORT=not-a-port");
        let path = write_config("badport.env", &content);
        let err = Config::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.to_string().contains("SSH_PORT"));
    }

    #[test]
    fn tilde_expands_against_home() {
        std::env::set_var("HOME", "/home/op");
        assert_eq!(expand_home("~/.ssh/id_ed25519"), "/home/op/.ssh/id_ed25519");
        assert_eq!(expand_home("~"), "/home/op");
        assert_eq!(expand_home("/abs/path"), "/abs/path");
    }

    #[test]
    fn other_users_home_is_not_expanded() {
        std::env::set_var("HOME", "/home/op");
        assert_eq!(expand_home("~alice/.ssh/key"), "~alice/.ssh/key");
    }

    #[test]
    fn scope_selects_targets_in_order() {
        let path = write_config("scope.env", FULL);
        let config = Config::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let both: Vec<&str> = config
            .targets(TargetScope::Both)
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(both, vec!["primary", "secondary"]);
        assert_eq!(config.targets(TargetScope::Secondary)[0].name, "secondary");
    }
}
