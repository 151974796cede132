pub mod app;
pub mod clock;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod projection;
pub mod schedule;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod storage;
pub mod streak;
pub mod ticker;

pub use app::router;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use ledger::AttendanceLedger;
pub use models::AppData;
pub use projection::{project, Projection};
pub use state::AppState;
pub use storage::load_data;
