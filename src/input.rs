//! Host list input.
//!
//! Reads one host per line (or the first field of a CSV row), from a file or
//! stdin, and yields normalized hostnames lazily so that arbitrarily large
//! lists are never held in memory.

use std::io;
use std::path::Path;

use futures::stream::{self, BoxStream, Stream};
use futures::StreamExt;
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};

use crate::config::{HOST_PREFIXES, MAX_HOSTNAME_LENGTH};

/// Extracts a hostname from one input line.
///
/// Blank lines and `#` comments yield `None`. Only the first CSV field is
/// used and it is lowercased; a URL scheme (optionally followed by `www.`),
/// anything from the first `/` onwards and a trailing `:port` are removed.
pub fn normalize_host(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let field = trimmed
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches('"')
        .trim()
        .to_ascii_lowercase();

    let without_scheme = HOST_PREFIXES
        .iter()
        .find_map(|prefix| field.strip_prefix(prefix))
        .unwrap_or(&field);

    let authority = without_scheme.split('/').next().unwrap_or_default();
    // A single colon is a port; bare IPv6 literals carry several
    let host = match authority.split_once(':') {
        Some((host, port)) if !port.contains(':') => host,
        _ => authority,
    }
    .trim();

    if host.is_empty() {
        return None;
    }
    if host.len() > MAX_HOSTNAME_LENGTH {
        warn!(
            "Skipping host exceeding maximum length ({} > {}): {}...",
            host.len(),
            MAX_HOSTNAME_LENGTH,
            host.chars().take(50).collect::<String>()
        );
        return None;
    }
    Some(host.to_string())
}

/// True when `suffixes` is empty or `host` ends with one of them (ASCII
/// case-insensitive).
pub fn matches_suffix(host: &str, suffixes: &[String]) -> bool {
    if suffixes.is_empty() {
        return true;
    }
    let host = host.to_ascii_lowercase();
    suffixes
        .iter()
        .any(|suffix| host.ends_with(&suffix.to_ascii_lowercase()))
}

/// Opens `path` (or stdin for `-`) as a lazy stream of hostnames.
///
/// # Errors
///
/// Returns an error if the file cannot be opened. Read errors after that
/// end the stream with a warning.
pub async fn host_stream(
    path: &Path,
    suffixes: &[String],
    skip_header: bool,
) -> io::Result<BoxStream<'static, String>> {
    let reader: Box<dyn AsyncRead + Unpin + Send> = if path.as_os_str() == "-" {
        info!("Reading hosts from stdin");
        Box::new(tokio::io::stdin())
    } else {
        info!("Reading hosts from {}", path.display());
        Box::new(tokio::fs::File::open(path).await?)
    };
    Ok(hosts_from_reader(reader, suffixes.to_vec(), skip_header).boxed())
}

/// Builds the host stream over any async reader.
pub fn hosts_from_reader<R>(
    reader: R,
    suffixes: Vec<String>,
    skip_header: bool,
) -> impl Stream<Item = String>
where
    R: AsyncRead + Unpin,
{
    let state = LineState {
        lines: BufReader::new(reader).lines(),
        skip_next: skip_header,
        suffixes,
    };
    stream::unfold(state, |mut state| async move {
        let host = state.next_host().await?;
        Some((host, state))
    })
}

struct LineState<R> {
    lines: Lines<BufReader<R>>,
    skip_next: bool,
    suffixes: Vec<String>,
}

impl<R: AsyncRead + Unpin> LineState<R> {
    async fn next_host(&mut self) -> Option<String> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    warn!("Skipping unreadable input line: {e}");
                    continue;
                }
                Err(e) => {
                    warn!("Failed to read input, stopping: {e}");
                    return None;
                }
            };

            if std::mem::take(&mut self.skip_next) {
                continue;
            }
            let Some(host) = normalize_host(&line) else {
                continue;
            };
            if matches_suffix(&host, &self.suffixes) {
                return Some(host);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_normalize_plain_host() {
        assert_eq!(normalize_host("example.com"), Some("example.com".into()));
        assert_eq!(normalize_host("  example.com  "), Some("example.com".into()));
    }

    #[test]
    fn test_normalize_strips_scheme_and_www() {
        assert_eq!(normalize_host("https://www.example.com.br"), Some("example.com.br".into()));
        assert_eq!(normalize_host("https://example.ru"), Some("example.ru".into()));
        assert_eq!(normalize_host("http://www.example.in"), Some("example.in".into()));
        assert_eq!(normalize_host("http://example.za"), Some("example.za".into()));
    }

    #[test]
    fn test_normalize_is_case_insensitive() {
        assert_eq!(normalize_host("HTTPS://WWW.Example.COM.BR"), Some("example.com.br".into()));
        assert_eq!(normalize_host("Http://Example.ru/Path"), Some("example.ru".into()));
    }

    #[test]
    fn test_normalize_drops_port() {
        assert_eq!(normalize_host("example.com:8443"), Some("example.com".into()));
        assert_eq!(normalize_host("https://www.example.in:443/x"), Some("example.in".into()));
        assert_eq!(normalize_host("::1"), Some("::1".into()));
    }

    #[test]
    fn test_normalize_drops_path() {
        assert_eq!(
            normalize_host("https://example.com/some/path?q=1"),
            Some("example.com".into())
        );
    }

    #[test]
    fn test_normalize_takes_first_csv_field() {
        assert_eq!(normalize_host("example.cn,42,extra"), Some("example.cn".into()));
        assert_eq!(normalize_host("\"example.cn\",42"), Some("example.cn".into()));
    }

    #[test]
    fn test_normalize_skips_blank_and_comments() {
        assert_eq!(normalize_host(""), None);
        assert_eq!(normalize_host("   "), None);
        assert_eq!(normalize_host("# a comment"), None);
        assert_eq!(normalize_host("https://"), None);
    }

    #[test]
    fn test_normalize_rejects_overlong_host() {
        let host = format!("{}.com", "a".repeat(300));
        assert_eq!(normalize_host(&host), None);
    }

    #[test]
    fn test_matches_suffix() {
        let suffixes = vec![".br".to_string(), ".ru".to_string()];
        assert!(matches_suffix("example.com.br", &suffixes));
        assert!(matches_suffix("EXAMPLE.RU", &suffixes));
        assert!(!matches_suffix("example.com", &suffixes));
        assert!(matches_suffix("example.com", &[]));
    }

    #[tokio::test]
    async fn test_stream_filters_and_skips_header() {
        let input = "domain,rank\nhttps://www.a.com.br,1\n\n# comment\nb.com,2\nhttp://c.ru/x,3\n";
        let hosts: Vec<String> = hosts_from_reader(
            input.as_bytes(),
            vec![".br".to_string(), ".ru".to_string()],
            true,
        )
        .collect()
        .await;
        assert_eq!(hosts, vec!["a.com.br", "c.ru"]);
    }

    #[tokio::test]
    async fn test_stream_without_header_keeps_first_line() {
        let hosts: Vec<String> = hosts_from_reader("a.com\nb.com\n".as_bytes(), Vec::new(), false)
            .collect()
            .await;
        assert_eq!(hosts, vec!["a.com", "b.com"]);
    }

    #[tokio::test]
    async fn test_host_stream_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "one.example").unwrap();
        writeln!(file, "https://two.example/").unwrap();
        file.flush().unwrap();

        let hosts: Vec<String> = host_stream(file.path(), &[], false)
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(hosts, vec!["one.example", "two.example"]);
    }

    #[tokio::test]
    async fn test_host_stream_missing_file() {
        let result = host_stream(Path::new("/nonexistent/hosts.txt"), &[], false).await;
        assert!(result.is_err());
    }
}
