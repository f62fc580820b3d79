use std::process::Command;

#[derive(Debug)]
struct Report {
    successful: u32,
    unsuccessful: u32,
    compliance_pct: f64,
}

#[test]
fn presets_run_via_cli_and_produce_distinct_outcomes() {
    let baseline = run_and_parse_report(&["--preset", "baseline"]);
    let non_compliant = run_and_parse_report(&["--preset", "non_compliant"]);

    assert_eq!(baseline.successful, 2, "baseline: {baseline:?}");
    assert_eq!(baseline.unsuccessful, 0, "baseline: {baseline:?}");
    assert!(
        (baseline.compliance_pct - 100.0).abs() < 0.05,
        "expected a fully compliant baseline, got {:.1}",
        baseline.compliance_pct
    );

    assert!(
        non_compliant.compliance_pct < baseline.compliance_pct - 10.0,
        "expected non_compliant to trail baseline: baseline={:.1}, non_compliant={:.1}",
        baseline.compliance_pct,
        non_compliant.compliance_pct
    );
}

#[test]
fn scenario_file_runs_via_cli() {
    let report = run_and_parse_report(&["--scenario", "scenarios/evening_peak.toml"]);
    assert_eq!(report.successful, 2, "evening_peak: {report:?}");
    assert_eq!(report.unsuccessful, 0, "evening_peak: {report:?}");
}

#[test]
fn unknown_preset_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_bacnet-shed"))
        .args(["--preset", "nonexistent"])
        .output()
        .expect("bacnet-shed process should run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nonexistent"), "stderr={stderr}");
}

fn run_and_parse_report(args: &[&str]) -> Report {
    let output = Command::new(env!("CARGO_BIN_EXE_bacnet-shed"))
        .args(args)
        .output()
        .expect("bacnet-shed process should run");

    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={} ",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    parse_report(&stdout)
}

fn parse_report(stdout: &str) -> Report {
    // "Sheds finished:        2 successful, 0 unsuccessful"
    let finished = metric_line(stdout, "Sheds finished:");
    let mut counts = finished
        .split(',')
        .map(|part| part.split_whitespace().next().unwrap_or_default());
    let successful = parse_number(counts.next().unwrap_or_default(), finished);
    let unsuccessful = parse_number(counts.next().unwrap_or_default(), finished);

    // "Compliance:            100.0% (10 of 10 steps)"
    let compliance = metric_line(stdout, "Compliance:");
    let pct = compliance.split('%').next().unwrap_or_default().trim();

    Report {
        successful,
        unsuccessful,
        compliance_pct: parse_number(pct, compliance),
    }
}

fn metric_line<'a>(stdout: &'a str, label: &str) -> &'a str {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing report line `{label}` in output: {stdout}"));

    line.split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid report format for line `{line}`"))
}

fn parse_number<T: std::str::FromStr>(raw: &str, line: &str) -> T {
    raw.parse::<T>()
        .unwrap_or_else(|_| panic!("failed parsing `{raw}` from report line `{line}`"))
}
