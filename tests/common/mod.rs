pub mod test_db;
pub mod builders;
pub mod strategies;
pub mod mock_delegate;

pub use test_db::*;
pub use builders::*;
pub use strategies::*;
pub use mock_delegate::*;