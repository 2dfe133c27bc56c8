use super::*;
use crate::layer::parse_layer;
use crate::types::{CheckKind, Override};

fn layer(label: &str, order: i64, yaml: &str) -> Layer {
    let registry = ExtensionRegistry::new();
    parse_layer(label, order, yaml, &registry).unwrap()
}

#[test]
fn replace_override_drops_prior_fields() {
    let base = layer(
        "base",
        0,
        r#"
services:
  srv1:
    override: replace
    command: "echo base"
    after: [x]
"#,
    );
    let top = layer(
        "top",
        1,
        r#"
services:
  srv1:
    override: replace
    command: "echo top"
"#,
    );
    let registry = ExtensionRegistry::new();
    let plan = combine_layers(vec![base, top], &registry).unwrap();
    let srv = plan.get_service("srv1").unwrap();
    assert_eq!(srv.command, "echo top");
    assert!(srv.after.is_empty());
}

#[test]
fn merge_override_unions_env_and_concatenates_lists() {
    let base = layer(
        "base",
        0,
        r#"
services:
  srv1:
    override: replace
    command: "echo base"
    after: [x]
    environment:
      A: "1"
"#,
    );
    let top = layer(
        "top",
        1,
        r#"
services:
  srv1:
    override: merge
    after: [y]
    environment:
      B: "2"
"#,
    );
    let registry = ExtensionRegistry::new();
    let plan = combine_layers(vec![base, top], &registry).unwrap();
    let srv = plan.get_service("srv1").unwrap();
    assert_eq!(srv.command, "echo base");
    assert_eq!(srv.after, vec!["x".to_string(), "y".to_string()]);
    assert_eq!(srv.environment.get("A").map(String::as_str), Some("1"));
    assert_eq!(srv.environment.get("B").map(String::as_str), Some("2"));
}

#[test]
fn missing_override_on_existing_entry_is_a_format_error() {
    let base = layer(
        "base",
        0,
        r#"
services:
  srv1:
    override: replace
    command: "echo base"
"#,
    );
    let top = layer(
        "top",
        1,
        r#"
services:
  srv1:
    command: "echo top"
"#,
    );
    let registry = ExtensionRegistry::new();
    let err = combine_layers(vec![base, top], &registry).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("srv1"));
    assert!(msg.contains("top"));
}

#[test]
fn defaults_are_filled_and_timeout_capped_at_period() {
    let l = layer(
        "base",
        0,
        r#"
checks:
  chk1:
    override: replace
    period: "1s"
    timeout: "30s"
    http:
      url: "http://localhost/health"
"#,
    );
    let registry = ExtensionRegistry::new();
    let plan = combine_layers(vec![l], &registry).unwrap();
    let chk = plan.get_check("chk1").unwrap();
    assert_eq!(chk.period, std::time::Duration::from_secs(1));
    assert_eq!(chk.timeout, std::time::Duration::from_secs(1));
    assert_eq!(chk.threshold, 3);
    match &chk.kind {
        CheckKind::Http(h) => assert_eq!(h.url, "http://localhost/health"),
        _ => panic!("expected http check"),
    }
}

#[test]
fn tcp_check_host_defaults_to_localhost() {
    let l = layer(
        "base",
        0,
        r#"
checks:
  chk1:
    override: replace
    tcp:
      port: 8080
"#,
    );
    let registry = ExtensionRegistry::new();
    let plan = combine_layers(vec![l], &registry).unwrap();
    match &plan.get_check("chk1").unwrap().kind {
        CheckKind::Tcp(t) => assert_eq!(t.host, "localhost"),
        _ => panic!("expected tcp check"),
    }
}

#[test]
fn check_with_two_kinds_is_rejected() {
    let l = layer(
        "base",
        0,
        r#"
checks:
  chk1:
    override: replace
    tcp:
      port: 8080
    http:
      url: "http://localhost"
"#,
    );
    let registry = ExtensionRegistry::new();
    let err = combine_layers(vec![l], &registry).unwrap_err();
    assert!(err.to_string().contains("exactly one of"));
}

fn empty_combined() -> Combined {
    Combined {
        summary: String::new(),
        description: String::new(),
        services: HashMap::new(),
        checks: HashMap::new(),
        log_targets: HashMap::new(),
    }
}

/// Treat an already-combined result as a single layer whose entries fully
/// replace (it has no more per-field override information to merge with).
fn combined_as_layer(label: &str, order: i64, c: &Combined) -> Layer {
    Layer {
        order,
        label: label.to_string(),
        summary: c.summary.clone(),
        description: c.description.clone(),
        services: c
            .services
            .iter()
            .map(|(k, v)| {
                let mut v = v.clone();
                v.override_ = Some("replace".to_string());
                (k.clone(), v)
            })
            .collect(),
        checks: c
            .checks
            .iter()
            .map(|(k, v)| {
                let mut v = v.clone();
                v.override_ = Some("replace".to_string());
                (k.clone(), v)
            })
            .collect(),
        log_targets: c
            .log_targets
            .iter()
            .map(|(k, v)| {
                let mut v = v.clone();
                v.override_ = Some("replace".to_string());
                (k.clone(), v)
            })
            .collect(),
        sections: HashMap::new(),
    }
}

#[test]
fn combine_left_fold_matches_combining_a_pre_folded_prefix() {
    let l1 = layer(
        "l1",
        0,
        "services:\n  srv1:\n    override: replace\n    command: a\n    after: [x]\n",
    );
    let l2 = layer(
        "l2",
        1,
        "services:\n  srv1:\n    override: merge\n    after: [y]\n",
    );
    let l3 = layer(
        "l3",
        2,
        "services:\n  srv1:\n    override: merge\n    after: [z]\n",
    );

    let direct = combine_two(
        combine_two(combine_two(empty_combined(), &l1).unwrap(), &l2).unwrap(),
        &l3,
    )
    .unwrap();

    let prefix = combine_two(combine_two(empty_combined(), &l1).unwrap(), &l2).unwrap();
    let prefix_layer = combined_as_layer("l1+l2", 1, &prefix);
    let folded = combine_two(empty_combined(), &prefix_layer).unwrap();
    let folded = combine_two(folded, &l3).unwrap();

    assert_eq!(direct.services["srv1"].after, folded.services["srv1"].after);
    assert_eq!(
        direct.services["srv1"].after,
        Some(vec!["x".to_string(), "y".to_string(), "z".to_string()])
    );
}

#[test]
fn override_parse_rejects_unknown_values() {
    assert_eq!(Override::parse(Some("bogus")), None);
}

proptest::proptest! {
    #[test]
    fn timeout_is_never_greater_than_period(period_secs in 1u64..120, timeout_secs in 1u64..600) {
        let yaml = format!(
            "checks:\n  chk1:\n    override: replace\n    period: \"{period_secs}s\"\n    timeout: \"{timeout_secs}s\"\n    tcp:\n      port: 1\n"
        );
        let l = layer("base", 0, &yaml);
        let registry = ExtensionRegistry::new();
        let plan = combine_layers(vec![l], &registry).unwrap();
        let chk = plan.get_check("chk1").unwrap();
        prop_assert!(chk.timeout <= chk.period);
    }
}
