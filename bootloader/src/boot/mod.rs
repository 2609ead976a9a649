// Boot module - staging, boot parameters and kernel handoff

pub mod atags;
pub mod cmdline;
pub mod handoff;
pub mod identity;
pub mod loader;
pub mod stager;

pub use atags::BootParams;
pub use cmdline::{hwaddr_clause, CommandLine};
pub use handoff::{dispatch, teardown, BootTransfer, CacheControl, Handoff};
pub use identity::{identify, read_identity, Identity, IdentityDevice, IdentityError, RegisterRead};
pub use loader::{prepare, run, Board, LogicDevice, PreparedBoot};
pub use stager::{BlockMedium, Medium, StorageStager, Volume};
