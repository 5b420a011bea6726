//! Call deadlines.
//!
//! A client may shorten the server's timeout with an `Rpc-Timeout-Ms` header
//! holding a positive number of milliseconds. `0` or an unparsable value
//! means the client sets no timeout.

use http::HeaderMap;
use std::time::Duration;

pub const RPC_TIMEOUT_MS_HEADER: &str = "rpc-timeout-ms";

/// The client's timeout from `Rpc-Timeout-Ms`, if any.
pub fn client_timeout(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RPC_TIMEOUT_MS_HEADER)?.to_str().ok()?;
    parse_millis(value)
}

pub fn parse_millis(value: &str) -> Option<Duration> {
    match value.trim().parse::<u64>().ok()? {
        0 => None,
        ms => Some(Duration::from_millis(ms)),
    }
}

/// The shorter of the two timeouts.
pub fn effective_timeout(server: Option<Duration>, client: Option<Duration>) -> Option<Duration> {
    server.into_iter().chain(client).min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_millis() {
        assert_eq!(parse_millis("250"), Some(Duration::from_millis(250)));
        assert_eq!(parse_millis(" 250 "), Some(Duration::from_millis(250)));
        assert_eq!(parse_millis("0"), None);
        assert_eq!(parse_millis("-5"), None);
        assert_eq!(parse_millis("1.5"), None);
        assert_eq!(parse_millis(""), None);
    }

    #[test]
    fn test_client_timeout_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_timeout(&headers), None);

        headers.insert("Rpc-Timeout-Ms", "1500".parse().unwrap());
        assert_eq!(client_timeout(&headers), Some(Duration::from_millis(1500)));

        headers.insert(RPC_TIMEOUT_MS_HEADER, "soon".parse().unwrap());
        assert_eq!(client_timeout(&headers), None);
    }

    #[test]
    fn test_effective_timeout_takes_shorter() {
        let short = Some(Duration::from_secs(1));
        let long = Some(Duration::from_secs(60));

        assert_eq!(effective_timeout(long, short), short);
        assert_eq!(effective_timeout(short, long), short);
        assert_eq!(effective_timeout(None, long), long);
        assert_eq!(effective_timeout(long, None), long);
        assert_eq!(effective_timeout(None, None), None);
    }
}
