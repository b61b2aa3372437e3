use std::sync::Once;

use harvest_core::{RoutingDecision, RoutingTable};
use pretty_assertions::assert_eq;

static INIT: Once = Once::new();

fn table(skip: &str, render: &str, recursive: &str) -> RoutingTable {
    INIT.call_once(harvest_logging::initialize_for_tests);
    let (table, warnings) = RoutingTable::from_sources(skip, render, recursive);
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    table
}

#[test]
fn unknown_urls_use_the_default_loader() {
    let table = table("", "", "");
    assert_eq!(
        table.classify("https://anything.example/page"),
        RoutingDecision::Default
    );
}

#[test]
fn skip_wins_over_recursive_and_render() {
    let table = table(
        "example.com",
        "example.com",
        "https://example.com/start 3",
    );
    assert_eq!(
        table.classify("https://example.com/page"),
        RoutingDecision::Skip
    );
}

#[test]
fn recursive_wins_over_render() {
    let table = table("", "example.com", "example.com 2");
    assert_eq!(
        table.classify("https://example.com/"),
        RoutingDecision::Recursive { depth: 2 }
    );
}

#[test]
fn subdomains_match_a_listed_domain() {
    let table = table("example.com", "", "");
    assert_eq!(
        table.classify("https://docs.example.com/a"),
        RoutingDecision::Skip
    );
    assert_eq!(
        table.classify("https://a.b.example.com/"),
        RoutingDecision::Skip
    );
}

#[test]
fn suffix_matching_respects_label_boundaries() {
    let table = table("example.com", "", "");
    assert_eq!(
        table.classify("https://notexample.com/"),
        RoutingDecision::Default
    );
}

#[test]
fn matching_is_case_insensitive() {
    let table = table("Example.COM", "", "");
    assert_eq!(
        table.classify("https://WWW.EXAMPLE.com/Page"),
        RoutingDecision::Skip
    );
}

#[test]
fn full_urls_are_accepted_as_list_entries() {
    let table = table("https://skip.example/path", "https://render.example", "");
    assert_eq!(
        table.classify("https://skip.example/other"),
        RoutingDecision::Skip
    );
    assert_eq!(
        table.classify("https://render.example/x"),
        RoutingDecision::ForceRender
    );
}

#[test]
fn comments_and_blank_lines_are_ignored() {
    let table = table("# heading\n\nexample.com\n", "", "");
    assert_eq!(table.classify("https://example.com/"), RoutingDecision::Skip);
}

#[test]
fn missing_depth_defaults_to_one_with_a_warning() {
    let (table, warnings) = RoutingTable::from_sources("", "", "crawl.example");
    assert_eq!(
        table.classify("https://crawl.example/"),
        RoutingDecision::Recursive { depth: 1 }
    );
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("missing depth"));
}

#[test]
fn non_integer_depth_defaults_to_one_with_a_warning() {
    let (table, warnings) = RoutingTable::from_sources("", "", "crawl.example deep");
    assert_eq!(
        table.classify("https://crawl.example/"),
        RoutingDecision::Recursive { depth: 1 }
    );
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("not an integer"));
}

#[test]
fn negative_depth_clamps_to_zero() {
    let (table, warnings) = RoutingTable::from_sources("", "", "crawl.example -4");
    assert_eq!(
        table.classify("https://crawl.example/"),
        RoutingDecision::Recursive { depth: 0 }
    );
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("clamped"));
}

#[test]
fn malformed_lines_warn_and_are_skipped() {
    let (table, warnings) = RoutingTable::from_sources("not a domain at all", "", "");
    assert_eq!(
        table.classify("https://anything.example/"),
        RoutingDecision::Default
    );
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].list, "skip");
}
