//! Probe Operations Benchmarks
//!
//! Benchmarks for locator parsing, single probes and table text search
//! against the in-memory DOM.
//!
//! Run with: `cargo bench --bench probe_ops`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pagesync::prelude::*;

fn wide_page(rows: usize) -> MockDriver {
    let body = (0..rows).fold(MockNode::new("tbody"), |tbody, i| {
        let name = format!("user{i}");
        let role = if i % 2 == 0 { "Admin" } else { "User" };
        tbody.child(MockNode::row(&[name.as_str(), role, "Active"]))
    });
    MockDriver::new(
        MockNode::new("body")
            .child(MockNode::new("table").id("employees").child(body))
            .child(MockNode::input("text").id("employee_username"))
            .child(MockNode::new("div").id("spinner").hidden()),
    )
}

fn bench_locator_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("locator_parsing");

    let locators = vec![
        ("id", "id=employee_username"),
        ("name", "name=commit"),
        ("css", "css=form#login > input.primary"),
        ("xpath", r#"xpath=//*[@id="content"]/h1"#),
        ("link_text", "link text=Sign out"),
    ];

    for (name, raw) in locators {
        group.bench_with_input(BenchmarkId::from_parameter(name), &raw, |bench, raw| {
            bench.iter(|| {
                let parsed: Locator = black_box(*raw).parse().unwrap();
                black_box(parsed);
            });
        });
    }

    group.finish();
}

fn bench_probes(c: &mut Criterion) {
    let mut group = c.benchmark_group("probes");
    let driver = wide_page(50);

    let cases = vec![
        ("present", Locator::id("employee_username"), WaitCondition::Present),
        ("visible", Locator::id("employee_username"), WaitCondition::Visible),
        ("hidden", Locator::id("spinner"), WaitCondition::Hidden),
        ("enabled", Locator::id("employee_username"), WaitCondition::Enabled),
        (
            "contains_text",
            Locator::xpath("//td[text()='user25']"),
            WaitCondition::contains_text("user"),
        ),
    ];

    let reporter = MemoryReporter::new();
    let waiter = SyncWaiter::new(&driver, &reporter);

    for (name, locator, condition) in cases {
        group.bench_function(name, |bench| {
            bench.iter(|| black_box(waiter.probe(black_box(&locator), &condition)));
        });
    }

    group.finish();
}

fn bench_table_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_search");

    for rows in [10_usize, 50, 200] {
        let driver = wide_page(rows);
        let target = format!("user{}", rows - 1);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &target, |bench, target| {
            bench.iter(|| {
                let table = TableReader::new(Locator::id("employees"), &driver);
                black_box(table.find_cell_with_text(black_box(target)).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_locator_parsing, bench_probes, bench_table_search);
criterion_main!(benches);
