use predicates::prelude::*;
use test_env::{json_output, TestEnv, HOUR, NOW};

fn seeded() -> TestEnv {
    let env = TestEnv::new();
    env.employee(1, "Rita Rep");
    env.client(1, "Quick Close", Some(1));
    env.client(2, "Slow Close", Some(1));
    env.client(3, "Still Touring", Some(1));
    env.client(4, "Went Dead", Some(1));
    // A: 2h from first to last, B: 10h
    env.event(1, 2, NOW - 50 * HOUR);
    env.event(1, 8, NOW - 48 * HOUR);
    env.event(2, 2, NOW - 40 * HOUR);
    env.event(2, 5, NOW - 35 * HOUR);
    env.event(2, 8, NOW - 30 * HOUR);
    // Not at stage 8 now
    env.event(3, 2, NOW - 100 * HOUR);
    env.event(3, 4, NOW - HOUR);
    env.event(4, 8, NOW - 90 * HOUR);
    env.event(4, 9, NOW - HOUR);
    env
}

#[test]
fn test_threshold_and_classes() {
    let env = seeded();
    let report = json_output(env.cmd().args(["durations", "--json"]));

    assert_eq!(report["terminal_stage"], 8);
    assert_eq!(report["threshold_hours"], 6.0);
    let clients = report["clients"].as_array().unwrap();
    assert_eq!(clients.len(), 2);
    assert_eq!(clients[0]["client_name"], "Quick Close");
    assert_eq!(clients[0]["elapsed_hours"], 2.0);
    assert_eq!(clients[0]["class"], "NORMAL");
    assert_eq!(clients[1]["client_name"], "Slow Close");
    assert_eq!(clients[1]["class"], "NOT_NORMAL");
}

#[test]
fn test_text_output() {
    let env = seeded();
    env.cmd()
        .arg("durations")
        .assert()
        .success()
        .stdout(predicate::str::contains("Average time to Commission Collection: 6.00h across 2 clients"))
        .stdout(predicate::str::contains("NOT NORMAL"))
        .stdout(predicate::str::contains("Still Touring").not())
        .stdout(predicate::str::contains("Went Dead").not())
        .stdout(predicate::str::contains("1 NORMAL, 1 NOT NORMAL"));
}

#[test]
fn test_terminal_stage_override() {
    let env = seeded();
    let report = json_output(env.cmd().args(["durations", "--terminal-stage", "9", "--json"]));
    let clients = report["clients"].as_array().unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0]["client_name"], "Went Dead");
    assert_eq!(clients[0]["elapsed_hours"], 89.0);
}

#[test]
fn test_terminal_stage_from_config() {
    let env = TestEnv::with_rc("report.terminal_stage=4");
    env.employee(1, "Rita Rep");
    env.client(3, "Still Touring", Some(1));
    env.event(3, 2, NOW - 3 * HOUR);
    env.event(3, 4, NOW);

    let report = json_output(env.cmd().args(["durations", "--json"]));
    assert_eq!(report["terminal_stage_name"], "Property Touring");
    assert_eq!(report["threshold_hours"], 3.0);
}

#[test]
fn test_no_terminal_clients_is_not_an_error() {
    let env = TestEnv::new();
    env.employee(1, "Rita Rep");
    env.client(3, "Still Touring", Some(1));
    env.event(3, 4, NOW);

    let report = json_output(env.cmd().args(["durations", "--json"]));
    assert!(report["threshold_hours"].is_null());
    assert!(report["clients"].as_array().unwrap().is_empty());

    env.cmd()
        .arg("durations")
        .assert()
        .success()
        .stdout(predicate::str::contains("average duration is undefined"));
}

#[test]
fn test_invalid_terminal_stage() {
    let env = TestEnv::new();
    env.cmd()
        .args(["durations", "--terminal-stage", "12"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid stage: 12"));
}
