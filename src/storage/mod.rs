//! Persistence layer.
//!
//! Plain files only: the wallet list, the previous-scores snapshot, the
//! per-round result file, the append-only summary log and the JSON
//! history log. Missing state files mean "first run", never an error.

pub mod history;
pub mod reports;
pub mod scores;
pub mod wallets;

pub use history::{append_history_record, last_history_record, load_history};
pub use reports::{append_summary, write_result_file};
pub use scores::{load_previous_scores, save_current_scores};
pub use wallets::load_wallets;
