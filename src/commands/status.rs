use crate::services::MetadataStore;
use crate::utils::get_data_dir;

pub fn run(feature: Option<String>, code: Option<String>) {
    match show_status(feature, code) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn show_status(
    feature: Option<String>,
    code: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = MetadataStore::new(get_data_dir());

    let features = match feature {
        Some(f) => vec![f],
        None => store.list_feature_paths()?,
    };

    if features.is_empty() {
        println!("No collected datasets found under {}", store.base_dir().display());
        return Ok(());
    }

    for feature_path in &features {
        let codes = match &code {
            Some(c) => vec![c.clone()],
            None => store.list_codes(feature_path)?,
        };

        println!("{}", feature_path);

        if codes.is_empty() {
            println!("  (no datasets)");
            continue;
        }

        for code in &codes {
            match store.load(feature_path, code) {
                Some(desc) => {
                    let start = desc.date_range.start.as_deref().unwrap_or("-");
                    let end = desc.date_range.end.as_deref().unwrap_or("-");
                    println!(
                        "  {:<10} {:>8} records  ({} -> {})  {} @ {}",
                        desc.code,
                        desc.total_records,
                        start,
                        end,
                        desc.collection_mode.as_str(),
                        desc.last_update_timestamp,
                    );
                    if let Some(err) = &desc.last_error {
                        println!("             last error: {} (retries: {})", err, desc.retry_count);
                    }
                }
                None => println!("  {:<10} (no metadata)", code),
            }
        }
        println!();
    }

    Ok(())
}
