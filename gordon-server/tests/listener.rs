use gordon_protocol::{Decoder, Encoder, Frame, Metadata, Page, Request, Status, Verb};
use gordon_server::{handler_fn, DocumentStore, Handler, Listener, ListenerConfig, ServerError};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use uuid::Uuid;

struct Running {
    listener: Arc<Listener>,
    addr: SocketAddr,
    task: JoinHandle<Result<(), ServerError>>,
}

async fn start(handler: Arc<dyn Handler>, config: ListenerConfig) -> Running {
    let listener = Arc::new(Listener::new(handler, config));
    let socket = listener.bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let serving = listener.clone();
    let task = tokio::spawn(async move { serving.serve(socket).await });
    Running {
        listener,
        addr,
        task,
    }
}

/// Sends raw bytes and returns everything the server wrote back.
async fn send_raw(addr: SocketAddr, bytes: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    // A server that gives up on the request may reset the connection at any
    // point, so only the bytes read back matter.
    let _ = stream.write_all(bytes).await;
    let _ = stream.shutdown().await;

    let mut response = Vec::new();
    let _ = stream.read_to_end(&mut response).await;
    response
}

async fn send(addr: SocketAddr, request: &Request) -> Page {
    let bytes = Encoder::encode_request(request).unwrap();
    let response = send_raw(addr, &bytes).await;

    let mut decoder = Decoder::new();
    decoder.extend(&response);
    decoder.decode_page().unwrap().expect("complete page")
}

fn doc(id: Uuid, title: &str) -> Page {
    let mut page = Page::new(Metadata::now(id, "jspc"), title);
    page.preamble = format!("{} preamble", title);
    page
}

#[tokio::test]
async fn test_index_enumerates_every_document() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let store = DocumentStore::from_pages([doc(a, "A"), doc(b, "B")]);
    let server = start(Arc::new(store), ListenerConfig::default()).await;

    let index = send(server.addr, &Request::index()).await;
    assert_eq!(index.status, Status::Ok);
    assert_eq!(index.title, "Page Index");

    let mut linked: Vec<Uuid> = index.links.iter().map(|l| l.page).collect();
    linked.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(linked, expected);

    server.listener.close();
}

#[tokio::test]
async fn test_known_and_unknown_documents() {
    let id = Uuid::new_v4();
    let store = DocumentStore::from_pages([doc(id, "Known")]);
    let server = start(Arc::new(store), ListenerConfig::default()).await;

    let page = send(server.addr, &Request::read(id)).await;
    assert_eq!(page.title, "Known");
    assert_eq!(page.status, Status::Ok);

    let missing = Uuid::new_v4();
    let page = send(server.addr, &Request::read(missing)).await;
    assert_eq!(page.status, Status::Error);
    assert_eq!(page.title, "Page Not Found");
    assert_eq!(page.meta.id, missing);

    let page = send(server.addr, &Request::new(Verb::Delete, id)).await;
    assert_eq!(page.status, Status::Error);
    assert_eq!(page.title, "Verb Not Supported");

    server.listener.close();
}

#[tokio::test]
async fn test_malformed_request_closes_without_response() {
    let server = start(Arc::new(DocumentStore::new()), ListenerConfig::default()).await;

    let frame = Frame::new(bytes::Bytes::from_static(b"\x00not a request"))
        .encode()
        .unwrap();
    assert!(send_raw(server.addr, &frame).await.is_empty());

    // The listener keeps serving other connections.
    let index = send(server.addr, &Request::index()).await;
    assert_eq!(index.title, "Page Index");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(server.listener.stats().errors_total() >= 1);

    server.listener.close();
}

#[tokio::test]
async fn test_unframed_text_closes_without_response() {
    let server = start(Arc::new(DocumentStore::new()), ListenerConfig::default()).await;

    // Shorter than a frame header.
    assert!(send_raw(server.addr, b"hi\n").await.is_empty());
    // Read as a length far over the request limit.
    assert!(send_raw(server.addr, b"GET / HTTP/1.0\r\n\r\n")
        .await
        .is_empty());

    let index = send(server.addr, &Request::index()).await;
    assert_eq!(index.title, "Page Index");

    server.listener.close();
}

#[tokio::test]
async fn test_oversized_request_closes_without_response() {
    let config = ListenerConfig {
        max_request_size: 64,
        ..Default::default()
    };
    let server = start(Arc::new(DocumentStore::new()), config).await;

    let request = Request::index().with_arg("padding", "x".repeat(128));
    let bytes = Encoder::encode_request(&request).unwrap();
    assert!(send_raw(server.addr, &bytes).await.is_empty());

    server.listener.close();
}

#[tokio::test]
async fn test_nil_page_closes_without_response() {
    let handler = handler_fn(|_: &Request| Ok(None));
    let server = start(Arc::new(handler), ListenerConfig::default()).await;

    let bytes = Encoder::encode_request(&Request::index()).unwrap();
    assert!(send_raw(server.addr, &bytes).await.is_empty());

    server.listener.close();
}

#[tokio::test]
async fn test_handler_error_closes_without_response() {
    let handler = handler_fn(|_: &Request| Err("no backing store".into()));
    let server = start(Arc::new(handler), ListenerConfig::default()).await;

    let bytes = Encoder::encode_request(&Request::index()).unwrap();
    assert!(send_raw(server.addr, &bytes).await.is_empty());

    server.listener.close();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_admission_ceiling_bounds_concurrency() {
    const CEILING: usize = 2;
    const CLIENTS: usize = 6;

    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    // Handlers only proceed in groups of CEILING, so the ceiling must be
    // reached for any request to finish.
    let gate = Arc::new(Barrier::new(CEILING));

    let handler = {
        let active = active.clone();
        let peak = peak.clone();
        handler_fn(move |req: &Request| {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            gate.wait();
            std::thread::sleep(Duration::from_millis(50));
            active.fetch_sub(1, Ordering::SeqCst);
            Ok(Some(Page::new(Metadata::now(req.id, "slow"), "Slow")))
        })
    };

    let config = ListenerConfig::default().with_max_connections(CEILING);
    let server = start(Arc::new(handler), config).await;

    let clients: Vec<_> = (0..CLIENTS)
        .map(|_| {
            let addr = server.addr;
            tokio::spawn(async move { send(addr, &Request::read(Uuid::new_v4())).await })
        })
        .collect();

    for client in clients {
        let page = tokio::time::timeout(Duration::from_secs(10), client)
            .await
            .expect("admitted requests finish")
            .unwrap();
        assert_eq!(page.title, "Slow");
    }

    assert_eq!(peak.load(Ordering::SeqCst), CEILING);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(server.listener.stats().requests_total(), CLIENTS as u64);

    server.listener.close();
}

#[tokio::test]
async fn test_close_leaves_in_flight_requests_running() {
    let handler = handler_fn(|req: &Request| {
        std::thread::sleep(Duration::from_millis(100));
        Ok(Some(Page::new(Metadata::now(req.id, "slow"), "Finished")))
    });
    let server = start(Arc::new(handler), ListenerConfig::default()).await;

    let addr = server.addr;
    let in_flight = tokio::spawn(async move { send(addr, &Request::index()).await });

    // Give the request time to be accepted.
    tokio::time::sleep(Duration::from_millis(30)).await;
    server.listener.close();

    let served = tokio::time::timeout(Duration::from_secs(5), server.task)
        .await
        .expect("serve returns after close")
        .unwrap();
    assert!(served.is_ok());

    let page = in_flight.await.unwrap();
    assert_eq!(page.title, "Finished");
}

#[tokio::test]
async fn test_silent_peer_is_dropped_at_read_deadline() {
    let config = ListenerConfig::default().with_read_timeout(Duration::from_millis(200));
    let server = start(Arc::new(DocumentStore::new()), config).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(&[0, 0]).await.unwrap();

    let start = Instant::now();
    let mut response = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("server closes the connection");
    assert!(read.is_err() || response.is_empty());
    assert!(start.elapsed() >= Duration::from_millis(150));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(server.listener.stats().errors_total(), 1);

    server.listener.close();
}

#[tokio::test]
async fn test_idle_peer_releases_its_admission_slot() {
    let config = ListenerConfig::default()
        .with_max_connections(1)
        .with_read_timeout(Duration::from_millis(200));
    let server = start(Arc::new(DocumentStore::new()), config).await;

    // Takes the only slot and never finishes its request.
    let mut idle = TcpStream::connect(server.addr).await.unwrap();
    idle.write_all(&[0, 0]).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let index = tokio::time::timeout(Duration::from_secs(5), send(server.addr, &Request::index()))
        .await
        .expect("slot freed by the read deadline");
    assert_eq!(index.title, "Page Index");

    drop(idle);
    server.listener.close();
}
