//! Provider driver implementations and the registry that holds them.

pub mod dummy;
pub mod proxmox_lxc;
pub mod registry;

pub use dummy::{DriverCall, DummyDriver, DUMMY_CUID_PREFIX, DUMMY_YAML_TAG};
pub use proxmox_lxc::{ProxmoxLxcDriver, PROXMOX_LXC_CUID_PREFIX, PROXMOX_LXC_YAML_TAG};
pub use registry::DriverRegistry;
