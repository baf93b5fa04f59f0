#![allow(dead_code)]

pub mod temp_files {
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    pub const ROOT_SPEC: &str = "openapi: 3.0.0
info: !include info.yml
servers:
  - url: /api
paths:
  /people: !include paths/people.yml
  /people/{person_id}: !include paths/person.yml
  /people-update:
    get:
      operationId: list_people_update
      responses:
        200:
          description: OK
";

    pub const INFO: &str = "title: People\nversion: \"1.0\"\n";

    pub const PEOPLE_PATH: &str = "get:
  operationId: read_all_people
  responses:
    200:
      description: OK
";

    pub const PERSON_PATH: &str = "get:
  operationId: read_one_person
  parameters:
    - name: person_id
      in: path
      required: true
      schema:
        type: integer
  responses:
    200:
      description: OK
";

    /// A directory holding the given `(relative path, content)` files.
    pub fn spec_tree(files: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            write(dir.path(), name, content);
        }
        dir
    }

    /// The people API split over four files, root at `swagger.yml`.
    pub fn people_tree() -> TempDir {
        spec_tree(&[
            ("swagger.yml", ROOT_SPEC),
            ("info.yml", INFO),
            ("paths/people.yml", PEOPLE_PATH),
            ("paths/person.yml", PERSON_PATH),
        ])
    }

    pub fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn canonical(dir: &Path, name: &str) -> PathBuf {
        fs::canonicalize(dir.join(name)).unwrap()
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(300)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {:?}", e),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    pub fn get(addr: &SocketAddr, path: &str) -> String {
        send_request(
            addr,
            &format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"),
        )
    }

    /// Status, content type and body of a raw HTTP/1.1 response.
    pub fn parse_response_parts(resp: &str) -> (u16, String, String) {
        let mut parts = resp.splitn(2, "\r\n\r\n");
        let headers = parts.next().unwrap_or("");
        let body = parts.next().unwrap_or("").to_string();
        let mut status = 0;
        let mut content_type = String::new();
        for line in headers.lines() {
            if line.starts_with("HTTP/1.1") {
                status = line
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("0")
                    .parse()
                    .unwrap();
            } else if let Some((name, val)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-type") {
                    content_type = val.trim().to_string();
                }
            }
        }
        (status, content_type, body)
    }

    pub fn parse_json(resp: &str) -> (u16, serde_json::Value) {
        let (status, _, body) = parse_response_parts(resp);
        (status, serde_json::from_str(&body).unwrap_or_default())
    }
}

pub mod test_server {
    use std::net::{SocketAddr, TcpListener};
    use std::sync::Once;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }

    pub fn free_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    /// Per-test subscriber writing through the test harness.
    pub fn test_tracing() -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("debug")
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}
