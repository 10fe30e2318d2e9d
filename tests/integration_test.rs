use mockito::{Matcher, Server};
use netlog_sink::http::HttpSink;
use netlog_sink::record::LogRecord;
use netlog_sink::{NetLogWriter, WriterConfig};
use std::net::TcpListener;
use tokio::time::{sleep, timeout, Duration};

const FORM: &str = "application/x-www-form-urlencoded";

#[tokio::test]
async fn http_sink_posts_form_encoded_batch() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/log")
        .match_header("content-type", FORM)
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("app".into(), "svc".into()),
            Matcher::UrlEncoded("logs".into(), r#"["a","b"]"#.into()),
        ]))
        .with_status(200)
        .with_body("ok")
        .expect(1)
        .create_async()
        .await;

    let sink = HttpSink::new(&format!("{}/log", server.url()), None).expect("valid url");
    sink.transmit("svc", &["a".to_string(), "b".to_string()])
        .await
        .expect("batch delivered");

    mock.assert_async().await;
}

#[tokio::test]
async fn empty_batch_sends_no_request() {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", "/log").expect(0).create_async().await;

    let sink = HttpSink::new(&format!("{}/log", server.url()), None).expect("valid url");
    sink.transmit("svc", &[]).await.expect("empty batch is a no-op");

    mock.assert_async().await;
}

#[tokio::test]
async fn error_status_is_not_a_failure() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/log")
        .with_status(500)
        .with_body("Internal Server Error")
        .expect(1)
        .create_async()
        .await;

    let sink = HttpSink::new(&format!("{}/log", server.url()), None).expect("valid url");
    assert!(sink.transmit("svc", &["boom".to_string()]).await.is_ok());

    mock.assert_async().await;
}

#[tokio::test]
async fn writer_ships_one_batch_per_tick() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/log")
        .match_header("content-type", FORM)
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("app".into(), "billing".into()),
            Matcher::UrlEncoded("logs".into(), r#"["[WARN] (db) slow query"]"#.into()),
        ]))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let config = WriterConfig::new("billing", format!("{}/log", server.url()))
        .with_format("[%L] (%S) %M")
        .with_send_interval(Duration::from_millis(200));
    let writer = NetLogWriter::new(config).expect("writer");

    writer.write(&LogRecord::new("WARN", "db", "slow query"));

    let delivered = async {
        while !mock.matched_async().await {
            sleep(Duration::from_millis(20)).await;
        }
    };
    timeout(Duration::from_secs(2), delivered)
        .await
        .expect("timed out before the collector received the batch");

    // Further ticks find an empty cache and stay quiet.
    sleep(Duration::from_millis(500)).await;
    mock.assert_async().await;
    assert_eq!(writer.stats().sent_batches, 1);

    writer.close().await;
}

#[tokio::test]
async fn unreachable_collector_never_reaches_the_caller() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("local addr").port()
    };

    let config = WriterConfig::new("svc", format!("http://127.0.0.1:{}/log", port))
        .with_send_interval(Duration::from_millis(50))
        .with_request_timeout(Some(Duration::from_secs(1)));
    let writer = NetLogWriter::new(config).expect("writer");

    writer.write_line("first");
    let dropped = async {
        while writer.stats().dropped_batches == 0 {
            sleep(Duration::from_millis(10)).await;
        }
    };
    timeout(Duration::from_secs(5), dropped)
        .await
        .expect("batch should have been dropped");

    // Writes keep buffering normally after a failed send.
    writer.write_line("second");
    writer.write_line("third");
    assert_eq!(writer.stats().written_lines, 3);
    assert_eq!(writer.stats().sent_batches, 0);

    writer.close().await;
    assert_eq!(writer.pending(), 0);
}

#[tokio::test]
async fn close_delivers_pending_lines() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/log")
        .match_body(Matcher::UrlEncoded("logs".into(), r#"["bye"]"#.into()))
        .expect(1)
        .create_async()
        .await;

    let config = WriterConfig::new("svc", format!("{}/log", server.url()))
        .with_send_interval(Duration::from_secs(3600));
    let writer = NetLogWriter::new(config).expect("writer");

    writer.write_line("bye");
    writer.close().await;

    mock.assert_async().await;
}
