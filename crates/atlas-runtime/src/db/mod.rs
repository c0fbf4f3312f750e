mod pool;
mod store;

pub use pool::Database;
pub use store::CountryStore;
