//! End-to-end pipeline tests for the text sinks.
//!
//! These drive `run_stream_with_cancel` with real files under a temp
//! directory and assert on the bytes the sinks produce, so they cover
//! detection, folding, and sink behavior together.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use xmlstream::{run_stream_with_cancel, Config, Mode, OutputFormat};

fn write_input(dir: &TempDir, name: &str, xml: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, xml).expect("write test input");
    path
}

fn config(input: PathBuf, output: PathBuf) -> Config {
    Config {
        input,
        output,
        ..Config::default()
    }
}

#[tokio::test]
async fn test_generic_mode_emits_one_line_per_record() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_input(
        &dir,
        "items.xml",
        r#"<catalog>
            <item id="1"><name>Alpha</name></item>
            <item id="2"><name>Beta</name><name>Gamma</name></item>
            <item id="3"/>
        </catalog>"#,
    );
    let output = dir.path().join("out.jsonl");

    let mut config = config(input, output.clone());
    config.record_tag = Some("item".into());

    let report = run_stream_with_cancel(config, CancellationToken::new())
        .await
        .expect("pipeline run");
    assert_eq!(report.records, 3);
    assert_eq!(report.skipped_fragments, 0);
    assert!(!report.cancelled);

    let text = fs::read_to_string(&output).expect("read output");
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 3);

    let first: serde_json::Value = serde_json::from_str(lines[0]).expect("line 1 parses");
    assert_eq!(first["_tag"], "item");
    assert_eq!(first["@id"], "1");
    assert_eq!(first["name"], "Alpha");

    // repeated children group into an array
    let second: serde_json::Value = serde_json::from_str(lines[1]).expect("line 2 parses");
    assert_eq!(second["name"], serde_json::json!(["Beta", "Gamma"]));

    // an empty element still yields a record with the discriminator
    let third: serde_json::Value = serde_json::from_str(lines[2]).expect("line 3 parses");
    assert_eq!(third["_tag"], "item");
    assert_eq!(third["@id"], "3");
}

#[tokio::test]
async fn test_discriminator_is_first_key_on_every_line() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_input(
        &dir,
        "items.xml",
        r#"<root><item a="1"><b>x</b></item><item a="2">text</item></root>"#,
    );
    let output = dir.path().join("out.jsonl");

    let mut config = config(input, output.clone());
    config.record_tag = Some("item".into());
    run_stream_with_cancel(config, CancellationToken::new())
        .await
        .expect("pipeline run");

    let text = fs::read_to_string(&output).expect("read output");
    for line in text.lines() {
        assert!(
            line.starts_with(r#"{"_tag":"item""#),
            "discriminator must lead the object: {line}"
        );
    }
}

#[tokio::test]
async fn test_nmap_mode_normalizes_hosts() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_input(
        &dir,
        "scan.xml",
        r#"<nmaprun scanner="nmap">
            <scaninfo type="syn" protocol="tcp"/>
            <host starttime="1700000001">
                <status state="up" reason="syn-ack"/>
                <address addr="10.0.0.5" addrtype="ipv4"/>
                <ports>
                    <port protocol="tcp" portid="443">
                        <state state="open" reason="syn-ack"/>
                        <service name="https" product="nginx"/>
                    </port>
                </ports>
            </host>
            <host starttime="1700000002">
                <status state="down" reason="no-response"/>
                <address addr="10.0.0.6" addrtype="ipv4"/>
            </host>
            <runstats><finished time="1700000100"/></runstats>
        </nmaprun>"#,
    );
    let output = dir.path().join("hosts.jsonl");

    let mut config = config(input, output.clone());
    config.mode = Mode::Nmap;
    config.coerce_numbers = true;

    let report = run_stream_with_cancel(config, CancellationToken::new())
        .await
        .expect("pipeline run");
    assert_eq!(report.records, 2);

    let text = fs::read_to_string(&output).expect("read output");
    let hosts: Vec<serde_json::Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).expect("host line parses"))
        .collect();

    assert_eq!(hosts[0]["_tag"], "host");
    assert_eq!(hosts[0]["status"], "up");
    assert_eq!(hosts[0]["addresses"][0]["addr"], "10.0.0.5");
    assert_eq!(hosts[0]["ports"][0]["portid"], 443);
    assert_eq!(hosts[0]["ports"][0]["service"]["name"], "https");

    assert_eq!(hosts[1]["status"], "down");
    assert!(hosts[1].get("ports").is_none(), "no ports section, no key");
}

#[tokio::test]
async fn test_mongo_jsonl_is_byte_identical_to_jsonl() {
    let dir = TempDir::new().expect("temp dir");
    let xml = r#"<root><item id="1"><v>a</v></item><item id="2"><v>b</v></item></root>"#;
    let input = write_input(&dir, "items.xml", xml);

    let out_jsonl = dir.path().join("a.jsonl");
    let mut config_a = config(input.clone(), out_jsonl.clone());
    config_a.record_tag = Some("item".into());
    run_stream_with_cancel(config_a, CancellationToken::new())
        .await
        .expect("jsonl run");

    let out_mongo = dir.path().join("b.jsonl");
    let mut config_b = config(input, out_mongo.clone());
    config_b.record_tag = Some("item".into());
    config_b.format = OutputFormat::MongoJsonl;
    run_stream_with_cancel(config_b, CancellationToken::new())
        .await
        .expect("mongo-jsonl run");

    let a = fs::read(&out_jsonl).expect("read jsonl");
    let b = fs::read(&out_mongo).expect("read mongo-jsonl");
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_truncated_input_keeps_the_partial_record() {
    let dir = TempDir::new().expect("temp dir");
    // stream cut off mid-record, as when a producer died
    let input = write_input(
        &dir,
        "cut.xml",
        r#"<root><item id="1"><name>Alpha</name></item><item id="2"><name>Be"#,
    );
    let output = dir.path().join("out.jsonl");

    let mut config = config(input, output.clone());
    config.record_tag = Some("item".into());

    let report = run_stream_with_cancel(config, CancellationToken::new())
        .await
        .expect("pipeline run");
    assert_eq!(report.records, 2);

    let text = fs::read_to_string(&output).expect("read output");
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let partial: serde_json::Value = serde_json::from_str(lines[1]).expect("partial parses");
    assert_eq!(partial["@id"], "2");
}

#[tokio::test]
async fn test_mysql_dump_is_importable_text() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_input(
        &dir,
        "items.xml",
        r#"<root><item id="1"><note>it's fine</note></item><item id="2"/></root>"#,
    );
    let output = dir.path().join("out.sql");

    let mut config = config(input, output.clone());
    config.record_tag = Some("item".into());
    config.format = OutputFormat::MysqlSql;
    config.table = "scan_items".into();

    let report = run_stream_with_cancel(config, CancellationToken::new())
        .await
        .expect("pipeline run");
    assert_eq!(report.records, 2);

    let text = fs::read_to_string(&output).expect("read output");
    assert_eq!(text.matches("CREATE TABLE IF NOT EXISTS `scan_items`").count(), 1);
    assert_eq!(text.matches("INSERT INTO `scan_items`").count(), 2);
    assert!(text.contains(r"it\'s fine"), "quotes escaped inside the literal");
    assert!(text.trim_end().ends_with("SET FOREIGN_KEY_CHECKS=1;"));
}
