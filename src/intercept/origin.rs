//! URL origin parsing for the same-origin cookie rule

/// Scheme, host, and effective port of a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

/// Parse the origin of a URL. Relative URLs (no scheme) default to http;
/// missing ports resolve to the scheme default.
pub fn parse_origin(url: &str) -> Option<Origin> {
    let (scheme, remainder) = if let Some(pos) = url.find("://") {
        (&url[..pos], &url[pos + 3..])
    } else {
        ("http", url)
    };

    let authority = match remainder.find(['/', '?', '#']) {
        Some(pos) => &remainder[..pos],
        None => remainder,
    };

    let (host, port) = split_host_port(authority, scheme);
    if host.is_empty() {
        return None;
    }
    Some(Origin {
        scheme: scheme.to_ascii_lowercase(),
        host: host.to_ascii_lowercase(),
        port,
    })
}

fn split_host_port(authority: &str, scheme: &str) -> (String, u16) {
    if authority.is_empty() {
        return (String::new(), default_port(scheme));
    }

    if authority.starts_with('[') {
        if let Some(end) = authority.find(']') {
            let host = authority[..=end].to_string();
            let remainder = &authority[end + 1..];
            if let Some(stripped) = remainder.strip_prefix(':') {
                if let Ok(port) = stripped.parse::<u16>() {
                    return (host, port);
                }
            }
            return (host, default_port(scheme));
        }
    }

    if let Some(pos) = authority.rfind(':') {
        if authority[pos + 1..].chars().all(|c| c.is_ascii_digit()) {
            if let Ok(port) = authority[pos + 1..].parse::<u16>() {
                return (authority[..pos].to_string(), port);
            }
        }
    }

    (authority.to_string(), default_port(scheme))
}

fn default_port(scheme: &str) -> u16 {
    if scheme.eq_ignore_ascii_case("https") {
        443
    } else {
        80
    }
}

/// Whether two URLs share scheme, host, and effective port.
pub fn same_origin(a: &str, b: &str) -> bool {
    match (parse_origin(a), parse_origin(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
