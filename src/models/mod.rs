mod dataset_kind;
mod descriptor;
mod table;

pub use dataset_kind::{DatasetKind, DatasetSpec};
pub use descriptor::{
    CollectionMode, DatasetDescriptor, DateRange, HistoryEntry, IncrementalStats,
};
pub use table::DataTable;
