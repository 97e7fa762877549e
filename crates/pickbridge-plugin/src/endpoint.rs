//! Plugin endpoint validation and URL building.

use pickbridge_db::PluginEndpoint;
use url::Url;

use crate::error::PluginError;

/// Path the plugin listens on.
pub const ACTION_PATH: &str = "/action";

/// Normalize user input into an endpoint: trims the host, drops empty tokens.
pub fn normalize_endpoint(host: &str, port: u16, auth_token: Option<String>) -> PluginEndpoint {
    PluginEndpoint {
        host: host.trim().to_string(),
        port,
        auth_token: auth_token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
    }
}

/// Check host and port without touching the network.
pub fn validate_endpoint(endpoint: &PluginEndpoint) -> Result<(), PluginError> {
    let host = endpoint.host.as_str();
    if host.is_empty() {
        return Err(PluginError::InvalidEndpoint("host is required".into()));
    }
    if host.contains("://") {
        return Err(PluginError::InvalidEndpoint(
            "host must not include a scheme".into(),
        ));
    }
    if host
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '@'))
    {
        return Err(PluginError::InvalidEndpoint(format!(
            "host contains invalid characters: {host}"
        )));
    }
    if endpoint.port == 0 {
        return Err(PluginError::InvalidEndpoint(
            "port must be between 1 and 65535".into(),
        ));
    }
    action_url(endpoint).map(|_| ())
}

/// `http://{host}:{port}/action`
pub fn action_url(endpoint: &PluginEndpoint) -> Result<Url, PluginError> {
    let host = if endpoint.host.contains(':') && !endpoint.host.starts_with('[') {
        format!("[{}]", endpoint.host)
    } else {
        endpoint.host.clone()
    };
    let raw = format!("http://{host}:{}{ACTION_PATH}", endpoint.port);
    let url = Url::parse(&raw).map_err(|e| PluginError::InvalidEndpoint(format!("{raw}: {e}")))?;
    if url.host_str().is_none() {
        return Err(PluginError::InvalidEndpoint(format!("{raw}: missing host")));
    }
    Ok(url)
}
