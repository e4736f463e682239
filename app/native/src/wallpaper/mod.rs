//! Wallpaper images: synthesis, encoding, storage, and applying to the desktop.

pub mod apply;
pub mod encode;
pub mod gradient;
pub mod store;

pub use apply::{ApplyError, DisabledApplier, SystemWallpaper, WallpaperApplier};
pub use gradient::GradientError;
pub use store::{ImageStore, StoreError, StoredImage};
