pub mod clock;
pub mod color;
pub mod controller;
pub mod device;
pub mod history;
pub mod messages;
pub mod model;
pub mod persist;
pub mod state;
pub mod store;
pub mod sync;

pub use color::PixelColor;
pub use controller::GridController;
pub use device::{DeliveryMode, DeviceClient, DeviceTransport, HttpTransport};
pub use model::GridConfig;
pub use persist::{JsonFileStore, KeyValueStore, MemoryStore};
