//! CONNECT response head parsing

use std::io::{self, Read};

use http::StatusCode;

const MAX_HEADERS: usize = 64;

/// Parsed status of the proxy's answer to CONNECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub status_line: String,
}

impl ResponseHead {
    /// Error describing a refused tunnel.
    #[must_use]
    pub fn refusal(&self) -> io::Error {
        let kind = if self.status == StatusCode::PROXY_AUTHENTICATION_REQUIRED {
            io::ErrorKind::PermissionDenied
        } else {
            io::ErrorKind::Other
        };
        io::Error::new(
            kind,
            format!(
                "Unable to tunnel through proxy. Proxy returns \"{}\"",
                self.status_line
            ),
        )
    }
}

/// Reads the response head one byte at a time so nothing past the blank line
/// is consumed; bytes after it already belong to the tunnel.
///
/// # Errors
///
/// `UnexpectedEof` if the proxy closes early, `InvalidData` if the head is
/// larger than `limit` or is not HTTP.
pub fn read_response_head<R: Read + ?Sized>(reader: &mut R, limit: usize) -> io::Result<ResponseHead> {
    let mut head = Vec::with_capacity(256);
    let mut byte = [0u8; 1];

    while !head.ends_with(b"\r\n\r\n") {
        if head.len() >= limit {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("proxy response head exceeds {limit} bytes"),
            ));
        }
        match reader.read(&mut byte) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "proxy closed the connection before completing the CONNECT response",
                ));
            }
            Ok(_) => head.push(byte[0]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    parse_head(&head)
}

fn parse_head(head: &[u8]) -> io::Result<ResponseHead> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut response = httparse::Response::new(&mut headers);

    match response.parse(head) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "incomplete proxy response"));
        }
        Err(e) => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("malformed proxy response: {e}"),
            ));
        }
    }

    let code = response.code.unwrap_or_default();
    let status = StatusCode::from_u16(code)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let status_line = format!(
        "HTTP/1.{} {} {}",
        response.version.unwrap_or(1),
        code,
        response.reason.unwrap_or_default()
    )
    .trim_end()
    .to_string();

    Ok(ResponseHead {
        status,
        status_line,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn stops_at_blank_line() {
        let mut input = Cursor::new(b"HTTP/1.1 200 Connection established\r\nVia: p\r\n\r\nTUNNELED".to_vec());
        let head = read_response_head(&mut input, 8192).expect("parse");
        assert_eq!(head.status, StatusCode::OK);
        assert_eq!(head.status_line, "HTTP/1.1 200 Connection established");

        let mut rest = String::new();
        input.read_to_string(&mut rest).expect("rest");
        assert_eq!(rest, "TUNNELED");
    }

    #[test]
    fn refusal_carries_status_line() {
        let mut input = Cursor::new(b"HTTP/1.0 407 Proxy Authentication Required\r\n\r\n".to_vec());
        let head = read_response_head(&mut input, 8192).expect("parse");
        let err = head.refusal();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(
            err.to_string(),
            "Unable to tunnel through proxy. Proxy returns \"HTTP/1.0 407 Proxy Authentication Required\""
        );
    }

    #[test]
    fn early_close_and_oversize_fail() {
        let mut truncated = Cursor::new(b"HTTP/1.1 200 OK\r\n".to_vec());
        assert_eq!(
            read_response_head(&mut truncated, 8192).expect_err("eof").kind(),
            io::ErrorKind::UnexpectedEof
        );

        let mut huge = Cursor::new(vec![b'a'; 100]);
        assert_eq!(
            read_response_head(&mut huge, 32).expect_err("too big").kind(),
            io::ErrorKind::InvalidData
        );
    }

    #[test]
    fn garbage_is_invalid_data() {
        let mut input = Cursor::new(b"SSH-2.0-OpenSSH\r\n\r\n".to_vec());
        assert_eq!(
            read_response_head(&mut input, 8192).expect_err("not http").kind(),
            io::ErrorKind::InvalidData
        );
    }
}
