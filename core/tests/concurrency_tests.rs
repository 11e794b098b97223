use fts_core::{Document, SearchEngine, SearchOptions};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn readers_never_see_a_half_applied_update() {
    let engine = Arc::new(SearchEngine::new());
    engine.index_document(Document::new("doc", "alpha"));
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let engine = Arc::clone(&engine);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for i in 0..2_000 {
                let content = if i % 2 == 0 { "beta" } else { "alpha" };
                engine.update_document(Document::new("doc", content));
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    let res = engine.search("alpha beta", &SearchOptions::default());
                    assert_eq!(res.total, 1);
                    assert_eq!(res.results[0].score, 1.0);
                    assert!(engine.get_document("doc").is_ok());
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
}

#[test]
fn concurrent_writers_index_everything() {
    let engine = Arc::new(SearchEngine::new());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..50 {
                    engine.index_document(Document::new(format!("t{t}-{i}"), format!("common worker{t}")));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let stats = engine.stats();
    assert_eq!(stats.total_documents, 400);
    let res = engine.search("common", &SearchOptions { limit: 1_000, ..Default::default() });
    assert_eq!(res.total, 400);
    assert_eq!(engine.search("worker3", &SearchOptions::default()).total, 50);
}
