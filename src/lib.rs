//! ### English
//! `vlc_frame_bridge` crate root.
//!
//! Hands decoded libvlc video frames to a retained-mode UI: libvlc's decoder thread negotiates a
//! BGRA format, decodes into a scratch buffer, and the bridge copies each frame into a
//! double-buffered surface and publishes it to the UI thread. Exposes the C ABI via `ffi`; core
//! implementation lives under `engine`.
//!
//! ### 中文
//! `vlc_frame_bridge` 的 crate 根。
//!
//! 把 libvlc 解码出的视频帧交给保留模式 UI：libvlc 解码线程协商 BGRA 格式并解码到 scratch 缓冲区，
//! bridge 把每一帧拷贝进双缓冲 surface 并发布到 UI 线程。通过 `ffi` 导出 C ABI；核心实现位于
//! `engine` 模块。
pub mod engine;
pub mod ffi;
