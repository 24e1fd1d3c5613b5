//! The pipeline's command-line entry points: one module per offline task
//! (`build`, `stac`, `tile`, `schedule`, `prepare`, `deploy`) plus `serve`,
//! which launches the Worker's HTTP dispatch server. The actual pipeline
//! logic lives in the library crates this binary wires together
//! (`satex_geometry`, `satex_scheduler`, `satex_archive`, `satex_extractor`,
//! `satex_worker`); this crate is just the composition layer.

pub mod commands;
