pub mod directory;
pub mod memory;
pub mod notifications;
pub mod wallet;

pub use directory::InMemoryDirectory;
pub use memory::{AccountLimits, FaultInjector, FaultPoint, InMemoryNetwork, NetworkSession};
pub use notifications::{ChannelSink, RecordingSink, TracingSink};
pub use wallet::LocalWallet;
