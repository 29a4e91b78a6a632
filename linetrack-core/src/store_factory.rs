use crate::store::{ProgressStore, StoreParams};
use crate::store_csv::CsvStore;

pub enum Backend {
    Csv,
}

pub fn open_store(backend: Backend, p: StoreParams) -> Box<dyn ProgressStore> {
    match backend {
        Backend::Csv => Box::new(CsvStore::new(p)),
    }
}
