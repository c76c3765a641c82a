//! ### English
//! Frame pipeline internals: format negotiation, the libvlc callback bridge, the frame surface,
//! UI-thread publication, and the view binding.
//!
//! ### 中文
//! 帧管线内部模块：格式协商、libvlc 回调 bridge、帧 surface、UI 线程发布以及视图绑定。
pub mod bridge;
pub(crate) mod cache;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod flags;
pub mod format;
pub mod lifecycle;
pub(crate) mod lockfree;
pub mod options;
pub mod player;
pub mod publisher;
pub mod render;
pub mod surface;
pub mod view;

pub use bridge::{BridgeConfig, CallbackBridge, FrameStatsSnapshot, VideoSourceProvider};
pub use dispatch::{UiDispatcher, UiThreadQueue};
pub use error::{BridgeError, Result};
pub use options::{BridgeOptions, RenderingMode};
pub use player::{MediaPlayer, NativeWindowHandle, VideoCallbacks};
pub use publisher::PresentedFrame;
pub use surface::{Dpi, FrameSurface};
pub use view::VideoView;
