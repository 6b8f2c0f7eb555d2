//! The request → load → realize pipeline.

pub mod factory;
pub mod manager;
pub mod pot;
pub mod queue;
pub mod settings;
pub mod table;

pub use factory::{Diagnostic, Realized, TextureFactory};
pub use manager::{CommitReport, FrameToken, PendingLoad, TextureManager};
pub use queue::{LoadQueue, LoadSender, LoadedEntry, TextureData};
pub use settings::{StalenessPolicy, TextureManagerSettings};
pub use table::{TextureSlot, TextureStatus, TextureTable};
