pub mod data_loop;
pub mod state;

pub use state::SharedState;
