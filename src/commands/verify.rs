use std::path::Path;

use crate::services::{file_sha256, MetadataStore};
use crate::utils::get_data_dir;

pub fn run(feature: Option<String>, code: Option<String>) {
    match verify(feature, code) {
        Ok(drifted) => {
            if drifted > 0 {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Compare every descriptor against the file it describes.
///
/// Returns the number of drifted datasets.
fn verify(
    feature: Option<String>,
    code: Option<String>,
) -> Result<usize, Box<dyn std::error::Error>> {
    let store = MetadataStore::new(get_data_dir());

    let features = match feature {
        Some(f) => vec![f],
        None => store.list_feature_paths()?,
    };

    let mut checked = 0usize;
    let mut drifted = 0usize;

    for feature_path in &features {
        let codes = match &code {
            Some(c) => vec![c.clone()],
            None => store.list_codes(feature_path)?,
        };

        for code in &codes {
            let Some(desc) = store.load(feature_path, code) else {
                println!("DRIFT  {}/{}: descriptor missing", feature_path, code);
                drifted += 1;
                continue;
            };

            checked += 1;
            let table_path = store.table_path(feature_path, code);

            if let Some(reason) = check_dataset(&store, &table_path, &desc)? {
                println!("DRIFT  {}/{}: {}", feature_path, code, reason);
                drifted += 1;
            } else {
                println!("OK     {}/{}: {} records", feature_path, code, desc.total_records);
            }
        }
    }

    println!("\nChecked {} datasets, {} drifted", checked, drifted);
    Ok(drifted)
}

fn check_dataset(
    store: &MetadataStore,
    table_path: &Path,
    desc: &crate::models::DatasetDescriptor,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    if !table_path.exists() {
        if desc.total_records > 0 {
            return Ok(Some(format!(
                "table file missing but descriptor claims {} records",
                desc.total_records
            )));
        }
        return Ok(None);
    }

    let actual_hash = file_sha256(table_path)?;
    if actual_hash != desc.data_hash {
        return Ok(Some("content hash mismatch".to_string()));
    }

    let table = crate::models::DataTable::from_csv(table_path)?;
    if table.len() != desc.total_records {
        return Ok(Some(format!(
            "row count mismatch: file has {}, descriptor claims {}",
            table.len(),
            desc.total_records
        )));
    }

    Ok(None)
}
