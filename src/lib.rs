// Library root
// -----------
// `chayan` saves named HTTP API calls to a local JSON file and replays
// them. The binary (`main.rs`) only parses arguments and wires these
// modules together.
//
// Module responsibilities:
// - `models`: the saved `ApiConfig` record.
// - `store`: reading and appending saved APIs on disk.
// - `api`: building, sending and rendering one HTTP request.
// - `ui`: the interactive `saveapi` / `listapis` / `apitest` flows.
// - `error`: typed errors shared by the modules above.
pub mod api;
pub mod error;
pub mod models;
pub mod store;
pub mod ui;

pub use api::{ApiClient, ApiResponse};
pub use models::ApiConfig;
pub use store::{ConfigStore, LoadOutcome, SaveReport};
