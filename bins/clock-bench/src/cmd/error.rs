use clock_api::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("{0}")]
    Config(String),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("report: {0}")]
    Report(#[from] std::io::Error),
}
