use std::time::Instant;

use sift_core::{DiscoveryState, EngineConfig, Filters, Item, Privacy, SortStrategy, Tab};
use sift_search::discover;

const WORDS: [&str; 8] = ["react", "rust", "async", "css", "grid", "hooks", "wasm", "postgres"];

fn gen_item(i: usize) -> Item {
    let title = format!("{} {} notes {i:06}", WORDS[i % 8], WORDS[(i / 8) % 8]);
    let tags = [WORDS[i % 8], WORDS[(i + 3) % 8]];
    let item = match i % 10 {
        0..=6 => Item::post(format!("p{i}"), title, &format!("author{}", i % 50), 1_577_836_800 + i as i64, (i % 997) as u64),
        7 => Item::user(format!("u{i}"), title, &format!("user{i}"), (i % 5_000) as u64, i % 3 == 0),
        8 => Item::topic(format!("t{i}"), title, (i % 300) as u64, (i % 7_000) as u64),
        _ => Item::group(format!("g{i}"), title, (i % 900) as u64, if i % 2 == 0 { Privacy::Public } else { Privacy::Private }),
    };
    let item = item.with_tags(tags);
    if i % 4 == 0 { item.with_similarity((i % 100) as f32 / 100.0) } else { item }
}

fn percentile_us(xs: &mut [u128], p: f64) -> u128 {
    xs.sort_unstable();
    let idx = ((xs.len() as f64 - 1.0) * p).round() as usize;
    xs[idx]
}

fn main() {
    let n: usize = std::env::var("SIFT_BENCH_ITEMS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(100_000);
    let rounds: usize = std::env::var("SIFT_BENCH_ROUNDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(50);

    eprintln!("building pool: {} items", n);
    let t0 = Instant::now();
    let pool: Vec<Item> = (0..n).map(gen_item).collect();
    let build_ms = t0.elapsed().as_secs_f64() * 1_000.0;
    println!("pool_build: {:.1}ms items={}", build_ms, n);

    let cfg = EngineConfig::default();
    let base = DiscoveryState::new(&cfg);
    let states: Vec<(&str, DiscoveryState)> = vec![
        ("unfiltered", base.clone()),
        ("query", base.with_query("react")),
        ("query+popularity", base.with_query("rust").with_filters(Filters { sort_by: SortStrategy::Popularity, ..Filters::default() })),
        (
            "relevance+interests",
            base.with_filters(Filters { sort_by: SortStrategy::Relevance, ..Filters::default() }).with_interests(["wasm", "css"]),
        ),
        ("tags+users tab", base.with_filters(Filters { tags: vec!["hooks".into()], ..Filters::default() }).with_tab(Tab::User)),
    ];

    for (label, state) in &states {
        let mut times: Vec<u128> = Vec::with_capacity(rounds);
        let mut matched = 0;
        for _ in 0..rounds {
            let t = Instant::now();
            let d = discover(&pool, state, &cfg);
            times.push(t.elapsed().as_micros());
            matched = d.debug.matcher.after_verified;
        }
        let p50 = percentile_us(&mut times.clone(), 0.50) as f64 / 1000.0;
        let p99 = percentile_us(&mut times, 0.99) as f64 / 1000.0;
        println!("{}: p50={:.3}ms p99={:.3}ms matched={} ({} rounds)", label, p50, p99, matched, rounds);
    }
}
