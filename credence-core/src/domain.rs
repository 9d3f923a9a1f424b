//! Domain canonicalization
//!
//! Every ledger lookup is keyed by the canonical host of a URL.

/// Reduce a URL (or bare host) to its canonical domain.
///
/// Strips the scheme, userinfo, port, path, query, fragment and a leading
/// `www.`, then lowercases. Input that has no recognizable host falls back
/// to the trimmed, lowercased raw string. Never fails.
pub fn canonicalize_domain(url: &str) -> String {
    let raw = url.trim();
    let lowered = raw.to_lowercase();

    let rest = match lowered.find("://") {
        Some(idx) => &lowered[idx + 3..],
        None => lowered.strip_prefix("//").unwrap_or(&lowered),
    };

    let authority = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();
    let host = strip_port(host_port);

    if !is_plausible_host(host) {
        return lowered;
    }

    host.strip_prefix("www.").unwrap_or(host).to_string()
}

fn strip_port(host_port: &str) -> &str {
    // Bracketed IPv6 literal
    if let Some(inner) = host_port.strip_prefix('[') {
        return inner.split(']').next().unwrap_or_default();
    }
    match host_port.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => host_port,
    }
}

fn is_plausible_host(host: &str) -> bool {
    !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_scheme_and_www() {
        assert_eq!(canonicalize_domain("https://www.CoinDesk.com/markets/btc"), "coindesk.com");
        assert_eq!(canonicalize_domain("http://reuters.com"), "reuters.com");
    }

    #[test]
    fn test_bare_hosts_and_ports() {
        assert_eq!(canonicalize_domain("www.example.org"), "example.org");
        assert_eq!(canonicalize_domain("example.org:8443/path?q=1"), "example.org");
        assert_eq!(canonicalize_domain("https://user:pw@api.example.org:443/"), "api.example.org");
    }

    #[test]
    fn test_keeps_subdomains_other_than_www() {
        assert_eq!(canonicalize_domain("https://news.ycombinator.com/item"), "news.ycombinator.com");
    }

    #[test]
    fn test_unparsable_input_falls_back_to_raw() {
        assert_eq!(canonicalize_domain("Not A Url"), "not a url");
        assert_eq!(canonicalize_domain(""), "");
        assert_eq!(canonicalize_domain("https://"), "https://");
    }
}
