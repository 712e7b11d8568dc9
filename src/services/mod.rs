pub mod device;

pub use device::{strip_version_prefix, DeviceApi, DeviceInfo, DeviceInfoFetcher};
