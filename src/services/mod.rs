pub mod worker_selection_service;

pub use worker_selection_service::{
    SelectedWorker, TaskWorkerAvailability, WorkerSelectionError, WorkerSelectionService,
    WorkerSelectionStatistics, WorkerSummary,
};
