mod common;

use common::{FakeViewer, RecordingSink, Reply};
use sved::{JsonChannel, SourceListener};

fn viewer() -> FakeViewer {
    FakeViewer::new(Reply::Ok(String::new()), Reply::Ok(vec![]))
}

#[tokio::test]
async fn local_file_notification_dispatches_navigation() {
    let bus = viewer().with_source("file:///a%20b.tex", 5, 2);
    let sink = RecordingSink::default();

    SourceListener::new(sink.clone()).run(&bus).await.unwrap();

    let commands = sink.commands.lock().unwrap().clone();
    assert_eq!(commands.len(), 1);
    assert!(commands[0].contains(r#"fnameescape("/a b.tex")"#));
    assert!(commands[0].contains("'buffer +5 '"));
    assert!(commands[0].contains("'split +5 '"));
}

#[tokio::test]
async fn non_local_notifications_are_discarded() {
    let bus = viewer()
        .with_source("http://example.org/a.tex", 5, 2)
        .with_source("/no/scheme.tex", 7, 0);
    let sink = RecordingSink::default();

    SourceListener::new(sink.clone()).run(&bus).await.unwrap();

    assert!(sink.commands.lock().unwrap().is_empty());
}

#[tokio::test]
async fn vim_channel_receives_json_lines() {
    let bus = viewer()
        .with_source("ftp://host/x.tex", 1, 0)
        .with_source("file:///home/user/%22quoted%22.tex", 42, 0);
    let mut listener = SourceListener::new(JsonChannel::new(Vec::new()));

    listener.run(&bus).await.unwrap();

    let out = String::from_utf8(listener.into_sink().into_inner()).unwrap();
    let lines: Vec<serde_json::Value> = out
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0][0], "ex");
    let cmd = lines[0][1].as_str().unwrap();
    assert!(cmd.contains(r#"fnameescape("/home/user/\"quoted\".tex")"#));
    assert!(cmd.contains("+42 "));
    assert_eq!(lines[1], serde_json::json!(["ex", "redraw"]));
}
