//! Tests for the request parser.

#[cfg(test)]
mod tests {
    use crate::parser::{read_headers, read_line, Error, Method, ParsedRequest, RequestLine};

    #[tokio::test]
    async fn test_read_line_strips_crlf() {
        let mut input: &[u8] = b"GET / HTTP/1.0\r\nHost: a\r\n";
        assert_eq!(read_line(&mut input, 1024).await, b"GET / HTTP/1.0");
        assert_eq!(read_line(&mut input, 1024).await, b"Host: a");
        assert_eq!(read_line(&mut input, 1024).await, b"");
    }

    #[tokio::test]
    async fn test_read_line_accepts_bare_lf() {
        let mut input: &[u8] = b"first\nsecond\n";
        assert_eq!(read_line(&mut input, 1024).await, b"first");
        assert_eq!(read_line(&mut input, 1024).await, b"second");
    }

    #[tokio::test]
    async fn test_read_line_keeps_lone_cr() {
        let mut input: &[u8] = b"a\rb\n";
        assert_eq!(read_line(&mut input, 1024).await, b"a\rb");
    }

    #[tokio::test]
    async fn test_read_line_returns_partial_on_eof() {
        let mut input: &[u8] = b"no terminator";
        assert_eq!(read_line(&mut input, 1024).await, b"no terminator");
        assert_eq!(read_line(&mut input, 1024).await, b"");
    }

    #[tokio::test]
    async fn test_read_line_stops_at_max_length() {
        let mut input: &[u8] = b"abcdefgh\n";
        assert_eq!(read_line(&mut input, 4).await, b"abcd");
        assert_eq!(read_line(&mut input, 4).await, b"efgh");
        // the terminator is all that is left
        assert_eq!(read_line(&mut input, 4).await, b"");
    }

    #[tokio::test]
    async fn test_read_line_empty_stream() {
        let mut input: &[u8] = b"";
        assert_eq!(read_line(&mut input, 1024).await, b"");
    }

    #[tokio::test]
    async fn test_read_headers_until_blank_line() {
        let mut input: &[u8] = b"Host: example.com\r\nAccept: */*\r\n\r\nignored\r\n";
        let headers = read_headers(&mut input, 1024).await;
        assert_eq!(headers, vec![b"Host: example.com".to_vec(), b"Accept: */*".to_vec()]);
    }

    #[tokio::test]
    async fn test_read_headers_without_blank_line() {
        let mut input: &[u8] = b"X-One: 1\r\nX-Two: 2";
        let headers = read_headers(&mut input, 1024).await;
        assert_eq!(headers, vec![b"X-One: 1".to_vec(), b"X-Two: 2".to_vec()]);
    }

    #[test]
    fn test_parse_full_request_line() {
        let line = RequestLine::parse("GET /index.html HTTP/1.1").unwrap();
        assert_eq!(line.method, Method::GET);
        assert_eq!(line.path, "/index.html");
        assert_eq!(line.version, "HTTP/1.1");
        assert_eq!(line.raw, "GET /index.html HTTP/1.1");
    }

    #[test]
    fn test_parse_missing_version_defaults_to_http10() {
        let line = RequestLine::parse("GET /").unwrap();
        assert_eq!(line.path, "/");
        assert_eq!(line.version, "HTTP/1.0");
    }

    #[test]
    fn test_parse_method_only() {
        let line = RequestLine::parse("GET").unwrap();
        assert_eq!(line.method, Method::GET);
        assert_eq!(line.path, "");
        assert_eq!(line.version, "HTTP/1.0");
    }

    #[test]
    fn test_parse_collapses_spaces_before_path() {
        let line = RequestLine::parse("GET   /a HTTP/1.0").unwrap();
        assert_eq!(line.path, "/a");
        assert_eq!(line.version, "HTTP/1.0");
    }

    #[test]
    fn test_parse_keeps_query_in_path() {
        let line = RequestLine::parse("GET /search?q=rust HTTP/1.0").unwrap();
        assert_eq!(line.path, "/search?q=rust");
    }

    #[test]
    fn test_parse_unknown_method_is_kept() {
        let line = RequestLine::parse("BREW /pot HTTP/1.0").unwrap();
        assert_eq!(line.method, Method::Other("BREW".to_string()));
        assert_eq!(line.method.to_string(), "BREW");
    }

    #[test]
    fn test_parse_rejects_non_http_version() {
        let result = RequestLine::parse("GET /x BOGUS");
        assert_eq!(result, Err(Error::InvalidVersion("BOGUS".to_string())));

        let result = RequestLine::parse("GET /x HTCPCP/1.0");
        assert!(matches!(result, Err(Error::InvalidVersion(_))));
    }

    #[test]
    fn test_parse_rejects_extra_components() {
        let result = RequestLine::parse("GET /x HTTP/1.0 extra");
        assert!(matches!(result, Err(Error::MalformedRequestLine(ref l)) if l == "GET /x HTTP/1.0 extra"));

        // a second space before the version belongs to the version token
        let result = RequestLine::parse("GET /x  HTTP/1.0");
        assert!(matches!(result, Err(Error::MalformedRequestLine(_))));
    }

    #[test]
    fn test_parse_empty_line() {
        assert_eq!(RequestLine::parse(""), Err(Error::EmptyRequest));
    }

    #[test]
    fn test_echo_detection() {
        assert!(RequestLine::parse("TRACE /anything HTTP/1.0").unwrap().is_echo());
        assert!(RequestLine::parse("POST /echo HTTP/1.0").unwrap().is_echo());
        assert!(!RequestLine::parse("GET /echo/ HTTP/1.0").unwrap().is_echo());
        assert!(!RequestLine::parse("GET /echo?x HTTP/1.0").unwrap().is_echo());
    }

    fn parsed(raw_line: &[u8], headers: &[&[u8]]) -> ParsedRequest {
        let line = RequestLine::parse(&String::from_utf8_lossy(raw_line)).unwrap();
        ParsedRequest::new(line, raw_line.to_vec(), headers.iter().map(|h| h.to_vec()).collect())
    }

    #[test]
    fn test_echo_body() {
        let request = parsed(b"TRACE / HTTP/1.1", &[b"Host: example.com", b"X-Test: yes"]);
        assert_eq!(
            request.echo_body(),
            b"TRACE / HTTP/1.1\r\nHost: example.com\r\nX-Test: yes\r\n"
        );
    }

    #[test]
    fn test_echo_body_without_headers() {
        let request = parsed(b"TRACE /", &[]);
        assert_eq!(request.echo_body(), b"TRACE /\r\n\r\n");
    }

    #[tokio::test]
    async fn test_read_line_keeps_non_utf8_bytes() {
        let mut input: &[u8] = b"X-A: \xff\xfe\r\n";
        assert_eq!(read_line(&mut input, 1024).await, b"X-A: \xff\xfe");
    }

    #[test]
    fn test_echo_body_reflects_raw_bytes() {
        let request = parsed(b"TRACE /caf\xe9 HTTP/1.0", &[b"X-A: \xff\xfe"]);
        assert_eq!(request.line.path, "/caf\u{fffd}");
        assert_eq!(
            request.echo_body(),
            b"TRACE /caf\xe9 HTTP/1.0\r\nX-A: \xff\xfe\r\n"
        );
    }
}
