pub mod entity;
pub mod gate;
pub mod io;
pub mod navigation;
pub mod review;
pub mod sample;
pub mod session;
pub mod settings;
pub mod workbench;

pub use entity::*;
pub use gate::*;
pub use navigation::*;
pub use session::*;
pub use workbench::*;
