//! JDBC URL construction for MySQL-protocol fixtures
//!
//! The URLs are handed to the pipeline under test, which connects through a
//! JDBC driver. TLS is disabled and public key retrieval allowed unless the
//! caller already set those parameters.

const USE_SSL: (&str, &str) = ("useSSL", "false");
const ALLOW_PUBLIC_KEY_RETRIEVAL: (&str, &str) = ("allowPublicKeyRetrieval", "true");

/// Inserts or replaces a URL parameter, keeping insertion order.
pub fn set_param(params: &mut Vec<(String, String)>, key: &str, value: &str) {
    match params.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value.to_string(),
        None => params.push((key.to_string(), value.to_string())),
    }
}

/// Builds `?k=v&...` from the extra parameters plus the required defaults.
pub fn query_string(params: &[(String, String)]) -> String {
    let mut pairs: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    for (key, value) in [USE_SSL, ALLOW_PUBLIC_KEY_RETRIEVAL] {
        if !params.iter().any(|(k, _)| k == key) {
            pairs.push(format!("{key}={value}"));
        }
    }
    format!("?{}", pairs.join("&"))
}

/// Host as written in a URL authority; IPv6 literals are bracketed.
pub fn url_host(host: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host.to_string()
    }
}

/// `jdbc:mysql://host:port/database?...`
pub fn mysql_url(host: &str, port: u16, database: &str, params: &[(String, String)]) -> String {
    format!(
        "jdbc:mysql://{}:{port}/{database}{}",
        url_host(host),
        query_string(params)
    )
}
