use crate::services::MetadataStore;
use crate::utils::get_data_dir;

pub fn run(feature: String, code: String, limit: usize) {
    let store = MetadataStore::new(get_data_dir());
    let history = store.load_history(&feature, &code);

    if history.is_empty() {
        println!("No update history for {}/{}", feature, code);
        return;
    }

    println!("Update history for {}/{} (newest last)\n", feature, code);

    let tail = history.len().saturating_sub(limit);
    for entry in &history[tail..] {
        let start = entry.date_range.start.as_deref().unwrap_or("-");
        let end = entry.date_range.end.as_deref().unwrap_or("-");
        println!(
            "  {}  {:<11} {:>8} records  ({} -> {})",
            entry.timestamp,
            entry.mode.as_str(),
            entry.records,
            start,
            end,
        );
    }

    if tail > 0 {
        println!("\n  ({} older entries not shown)", tail);
    }
}
