/// End-to-end tests over a real socket.
use ferrous_host::{
    Context, ControllerBase, ExceptionFilter, ExceptionFilterChain, HostConfig, HostError, HttpError, HttpHost, Response,
    ServiceCollection,
};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

fn send(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.write_all(raw.as_bytes()).unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

fn start() -> ferrous_host::ServerHandle {
    let mut services = ServiceCollection::new();
    services.add_singleton(String::from("anvil")).unwrap();

    let config = HostConfig {
        bind_address: "127.0.0.1:0".into(),
        worker_threads: 2,
        ..HostConfig::default()
    };
    let mut host = HttpHost::new(services.build(), config);
    let mut api = ControllerBase::new("/api");
    api.get("/product", |ctx| Ok(ctx.resolve::<String>()?.to_string()))
        .post("/echo", |ctx| {
            ctx.set_header("x-echo", "1")?;
            Ok(String::from_utf8_lossy(ctx.body()).into_owned())
        })
        .get("/locked", |_| Err(HttpError::Forbidden("nope".into()).into()));
    host.add_routes(&api).unwrap();
    host.start().unwrap()
}

#[test]
fn test_serves_requests_over_tcp() {
    let server = start();
    assert!(server.is_running());
    assert_ne!(server.addr().port(), 0);

    let response = send(
        server.addr(),
        "GET /api/product HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.ends_with("anvil"), "{response}");

    server.shutdown();
    assert!(!server.is_running());
}

#[test]
fn test_body_and_headers_round_trip() {
    let server = start();
    let response = send(
        server.addr(),
        "POST /api/echo HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
    );
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.to_ascii_lowercase().contains("x-echo: 1"), "{response}");
    assert!(response.ends_with("hello"), "{response}");
}

#[test]
fn test_errors_and_404_over_tcp() {
    let server = start();

    let missing = send(
        server.addr(),
        "GET /nowhere HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");
    assert!(missing.contains("\"path\":\"/nowhere\""), "{missing}");

    let locked = send(
        server.addr(),
        "GET /api/locked HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    assert!(locked.starts_with("HTTP/1.1 403"), "{locked}");

    // Filters can be swapped while serving.
    server.set_exception_filters(ExceptionFilterChain::new(false));
    let locked = send(
        server.addr(),
        "GET /api/locked HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    assert!(locked.starts_with("HTTP/1.1 500"), "{locked}");
}

#[test]
fn test_bind_failure_is_transport_error() {
    let first = start();
    let config = HostConfig {
        bind_address: first.addr().to_string(),
        ..HostConfig::default()
    };
    let host = HttpHost::new(ServiceCollection::new().build(), config);
    assert!(matches!(host.start(), Err(HostError::Transport(_))));
}

#[test]
fn test_invalid_config_rejected_at_start() {
    let config = HostConfig {
        bind_address: "127.0.0.1:0".into(),
        worker_threads: 0,
        ..HostConfig::default()
    };
    let host = HttpHost::new(ServiceCollection::new().build(), config);
    assert!(matches!(host.start(), Err(HostError::Config(message)) if message.contains("worker_threads")));
}

#[test]
fn test_single_worker_survives_failing_filter() {
    struct Broken;
    impl ExceptionFilter for Broken {
        fn catch(&self, _error: &anyhow::Error, _ctx: &Context) -> Option<Response> {
            panic!("filter bug")
        }
    }

    let config = HostConfig {
        bind_address: "127.0.0.1:0".into(),
        worker_threads: 1,
        ..HostConfig::default()
    };
    let mut host = HttpHost::new(ServiceCollection::new().build(), config);
    let mut api = ControllerBase::new("/api");
    api.get("/fail", |_| Err(anyhow::anyhow!("boom")));
    host.add_routes(&api).unwrap();
    host.add_exception_filter(Broken);
    let server = host.start().unwrap();

    for _ in 0..2 {
        let response = send(
            server.addr(),
            "GET /api/fail HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        );
        assert!(response.starts_with("HTTP/1.1 500"), "{response}");
    }
    assert!(server.is_running());
}
