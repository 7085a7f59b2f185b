use std::time::Instant;

use crate::model::{Item, OwnerInfo, Snapshot, TabRecord, WindowRecord};
use crate::search::search;

fn p95_ms(samples: &mut [f64]) -> f64 {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let last = samples.len().saturating_sub(1);
    let idx = ((last as f64) * 0.95).round() as usize;
    samples[idx.min(last)]
}

fn large_snapshot() -> Snapshot {
    let windows = (0..400)
        .map(|i| {
            Item::from_window(WindowRecord {
                id: i.to_string(),
                title: format!("Document_{i:05}.txt - Text Editor"),
                visible: true,
                owner: OwnerInfo {
                    name: "Text Editor".to_string(),
                    pid: 1000 + i,
                },
                ..Default::default()
            })
        })
        .collect();
    let tabs = (0..400)
        .map(|i| {
            Item::from_tab(TabRecord {
                id: format!("T{i}"),
                title: format!("Issue #{i} - tracker"),
                url: format!("https://tracker.example.com/issues/{i}"),
                favicon_url: None,
            })
        })
        .collect();
    Snapshot::new(windows, tabs, 1)
}

#[test]
fn warm_query_p95_under_15ms() {
    let snapshot = large_snapshot();

    for _ in 0..30 {
        let _ = search(&snapshot, "issue tracker");
    }

    let mut batch_p95 = Vec::with_capacity(5);
    for _ in 0..5 {
        let mut samples = Vec::with_capacity(80);
        for _ in 0..80 {
            let start = Instant::now();
            let _ = search(&snapshot, "issue tracker");
            samples.push(start.elapsed().as_secs_f64() * 1000.0);
        }
        batch_p95.push(p95_ms(&mut samples));
    }

    batch_p95.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median_p95 = batch_p95[batch_p95.len() / 2];

    assert!(
        median_p95 <= 15.0,
        "median batch p95 too high: {median_p95:.3}ms (budget 15.0ms); batches={batch_p95:?}",
    );
}
