//! End-to-end frame pipeline: a fake libvlc player drives the registered callbacks from its own
//! decode thread while the test thread plays the UI thread.

use std::ffi::{c_char, c_uint, c_void};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use parking_lot::Mutex;
use tracing_test::traced_test;
use vlc_frame_bridge::engine::lifecycle::LifecycleState;
use vlc_frame_bridge::engine::player::{
    VideoCleanupCb, VideoDisplayCb, VideoFormatCb, VideoLockCb, VideoUnlockCb,
};
use vlc_frame_bridge::engine::{
    BridgeConfig, MediaPlayer, NativeWindowHandle, Result, UiThreadQueue, VideoSourceProvider,
};

#[derive(Default)]
struct CapturingPlayer {
    format: Mutex<Option<(VideoFormatCb, VideoCleanupCb)>>,
    video: Mutex<Option<(VideoLockCb, VideoUnlockCb, VideoDisplayCb, usize)>>,
    clears: AtomicUsize,
}

impl CapturingPlayer {
    fn decoder(&self) -> Decoder {
        let (format, cleanup) = self.format.lock().expect("format callbacks registered");
        let (lock, unlock, display, opaque) =
            self.video.lock().expect("video callbacks registered");
        Decoder {
            format,
            cleanup,
            lock,
            unlock,
            display,
            opaque,
            layout: None,
        }
    }
}

impl MediaPlayer for CapturingPlayer {
    fn set_video_format_callbacks(&self, format: VideoFormatCb, cleanup: VideoCleanupCb) {
        *self.format.lock() = Some((format, cleanup));
    }

    fn set_video_callbacks(
        &self,
        lock: VideoLockCb,
        unlock: VideoUnlockCb,
        display: VideoDisplayCb,
        opaque: *mut c_void,
    ) {
        *self.video.lock() = Some((lock, unlock, display, opaque as usize));
    }

    fn clear_video_callbacks(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }

    fn set_native_handle(&self, _handle: NativeWindowHandle) -> Result<()> {
        Ok(())
    }
}

/// What libvlc's decoder does with the registered callbacks.
#[derive(Clone, Copy)]
struct Decoder {
    format: VideoFormatCb,
    cleanup: VideoCleanupCb,
    lock: VideoLockCb,
    unlock: VideoUnlockCb,
    display: VideoDisplayCb,
    opaque: usize,
    layout: Option<(u32, u32)>,
}

impl Decoder {
    fn opaque(&self) -> *mut c_void {
        self.opaque as *mut c_void
    }

    fn negotiate(&mut self, width: u32, height: u32) -> u32 {
        let mut opaque = self.opaque();
        let mut chroma = [0 as c_char; 4];
        let (mut width, mut height): (c_uint, c_uint) = (width, height);
        let (mut pitch, mut lines): (c_uint, c_uint) = (0, 0);
        let count = unsafe {
            (self.format)(
                &mut opaque,
                chroma.as_mut_ptr(),
                &mut width,
                &mut height,
                &mut pitch,
                &mut lines,
            )
        };
        if count > 0 {
            assert_eq!(chroma.map(|c| c as u8), *b"BGRA");
            self.layout = Some((pitch, lines));
        }
        count
    }

    /// Decodes one picture filled with `value`; `false` when the bridge refused the lock.
    fn decode(&self, value: u8) -> bool {
        let mut plane = std::ptr::null_mut();
        let picture = unsafe { (self.lock)(self.opaque(), &mut plane) };
        if picture.is_null() {
            return false;
        }
        if let Some((pitch, lines)) = self.layout {
            unsafe {
                std::ptr::write_bytes(plane.cast::<u8>(), value, pitch as usize * lines as usize)
            };
        }
        unsafe {
            (self.unlock)(self.opaque(), picture, &plane);
            (self.display)(self.opaque(), picture);
        }
        true
    }

    fn display_only(&self) {
        unsafe { (self.display)(self.opaque(), std::ptr::null_mut()) };
    }

    fn cleanup(&self) {
        unsafe { (self.cleanup)(self.opaque()) };
    }
}

fn setup(config: BridgeConfig) -> (Arc<UiThreadQueue>, Arc<CapturingPlayer>, VideoSourceProvider) {
    let queue = Arc::new(UiThreadQueue::new());
    assert!(queue.bind_current_thread());
    let player = Arc::new(CapturingPlayer::default());
    let provider = VideoSourceProvider::init(player.clone(), queue.clone(), config);
    (queue, player, provider)
}

/// Runs `f` on a fresh thread inside the caller's span, so captured logs stay attributed.
fn on_decode_thread<R: Send + 'static>(f: impl FnOnce() -> R + Send + 'static) -> R {
    let span = tracing::Span::current();
    thread::spawn(move || span.in_scope(f))
        .join()
        .expect("decode thread panicked")
}

#[test]
fn presented_frame_matches_decoded_bytes() {
    let (queue, player, provider) = setup(BridgeConfig::default());
    let mut decoder = player.decoder();

    let layout = on_decode_thread(move || {
        assert_eq!(decoder.negotiate(640, 360), 1);
        assert!(decoder.decode(0xAB));
        decoder.layout
    });
    let (pitch, lines) = layout.unwrap();
    assert_eq!((pitch, lines), (2560, 384));

    assert!(provider.video_source().is_none());
    queue.run_pending();

    let frame = provider.video_source().unwrap();
    assert_eq!(frame.sequence, 1);
    assert_eq!((frame.format.width, frame.format.height), (640, 360));
    let (len, all_set) = frame
        .surface
        .read(|bitmap| {
            (
                bitmap.pixels().len(),
                bitmap.pixels().iter().all(|&byte| byte == 0xAB),
            )
        })
        .unwrap();
    assert_eq!(len, pitch as usize * lines as usize);
    assert!(all_set);
    assert_eq!(provider.bridge().stats().displayed, 1);
}

#[test]
fn frames_published_between_ui_turns_coalesce_to_the_latest() {
    let (queue, player, provider) = setup(BridgeConfig::default());
    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = seen.clone();
        provider
            .bridge()
            .frames()
            .subscribe(move |frame| seen.lock().push(frame.map(|frame| frame.sequence)));
    }

    let mut decoder = player.decoder();
    on_decode_thread(move || {
        decoder.negotiate(64, 64);
        for value in 1..=3 {
            assert!(decoder.decode(value));
        }
    });
    queue.run_pending();

    assert_eq!(*seen.lock(), vec![Some(3)]);
    let frame = provider.video_source().unwrap();
    let first = frame.surface.read(|bitmap| bitmap.pixels()[0]).unwrap();
    assert_eq!(first, 3);
}

#[test]
fn cleanup_clears_the_presented_frame() {
    let (queue, player, provider) = setup(BridgeConfig::default());
    let mut decoder = player.decoder();
    on_decode_thread(move || {
        decoder.negotiate(32, 32);
        decoder.decode(1);
        decoder.cleanup();
    });
    queue.run_pending();

    assert!(provider.video_source().is_none());
    assert!(!provider.bridge().surface().has_frame());
    assert!(!provider.bridge().has_scratch());
}

#[test]
fn keep_last_frame_survives_cleanup() {
    let config = BridgeConfig {
        keep_last_frame: true,
        ..BridgeConfig::default()
    };
    let (queue, player, provider) = setup(config);
    let mut decoder = player.decoder();
    on_decode_thread(move || {
        decoder.negotiate(32, 32);
        decoder.decode(1);
        decoder.cleanup();
    });
    queue.run_pending();

    assert_eq!(provider.video_source().map(|frame| frame.sequence), Some(1));
    assert!(provider.bridge().surface().has_frame());
}

#[test]
fn callbacks_after_dispose_are_ignored() {
    let (queue, player, mut provider) = setup(BridgeConfig::default());
    let mut decoder = player.decoder();
    on_decode_thread(move || {
        decoder.negotiate(32, 32);
        decoder.decode(7);
    });
    queue.run_pending();
    assert!(provider.video_source().is_some());

    provider.dispose();
    provider.dispose();
    assert_eq!(player.clears.load(Ordering::SeqCst), 1);
    assert!(provider.is_disposed());
    assert!(provider.video_source().is_none());

    // A stale decoder still holding the opaque pointer must not fault.
    let mut stale = player.decoder();
    on_decode_thread(move || {
        assert_eq!(stale.negotiate(32, 32), 0);
        assert!(!stale.decode(9));
        stale.display_only();
        stale.cleanup();
    });
    queue.run_pending();

    assert!(provider.video_source().is_none());
    assert!(!provider.bridge().has_scratch());
    assert_eq!(provider.bridge().state(), LifecycleState::Disposed);
}

#[test]
fn dispose_waits_out_a_running_decoder() {
    let (queue, player, mut provider) = setup(BridgeConfig::default());
    let mut decoder = player.decoder();
    let (started_tx, started_rx) = mpsc::channel();

    let decode = thread::spawn(move || {
        decoder.negotiate(128, 72);
        let mut frames = 0u32;
        while decoder.decode((frames % 251) as u8) {
            frames += 1;
            if frames == 1 {
                let _ = started_tx.send(());
            }
        }
        frames
    });

    started_rx.recv().unwrap();
    provider.dispose();
    let frames = decode.join().unwrap();
    queue.run_pending();

    assert!(frames >= 1);
    assert!(provider.is_disposed());
    assert!(provider.video_source().is_none());
    assert_eq!(provider.bridge().surface().pixel_size().ok(), None);
}

#[test]
#[traced_test]
fn display_without_a_buffer_is_a_dropped_frame() {
    let (queue, player, provider) = setup(BridgeConfig::default());
    let mut decoder = player.decoder();
    on_decode_thread(move || {
        decoder.negotiate(16, 16);
        decoder.cleanup();
        decoder.display_only();
    });
    queue.run_pending();

    assert!(logs_contain("frame dropped"));
    let stats = provider.bridge().stats();
    assert_eq!((stats.displayed, stats.dropped), (0, 1));
    assert!(provider.video_source().is_none());
}

#[test]
fn renegotiation_resets_the_stream() {
    let (queue, player, provider) = setup(BridgeConfig::default());
    let formats = Arc::new(Mutex::new(Vec::new()));
    {
        let formats = formats.clone();
        provider
            .bridge()
            .formats()
            .subscribe(move |format| formats.lock().extend(format.map(|f| f.width)));
    }

    let mut decoder = player.decoder();
    on_decode_thread(move || {
        decoder.negotiate(320, 240);
        decoder.decode(1);
        decoder.decode(2);
    });
    queue.run_pending();
    assert_eq!(provider.video_source().map(|frame| frame.sequence), Some(2));

    let mut decoder = player.decoder();
    on_decode_thread(move || {
        decoder.negotiate(160, 120);
        decoder.decode(3);
    });
    queue.run_pending();

    let frame = provider.video_source().unwrap();
    assert_eq!(frame.sequence, 1);
    assert_eq!(frame.format.width, 160);
    assert_eq!(provider.bridge().stats().displayed, 1);
    assert_eq!(formats.lock().last(), Some(&160));
}

#[test]
fn cleanup_does_not_erase_the_next_stream() {
    let (queue, player, provider) = setup(BridgeConfig::default());
    let mut decoder = player.decoder();
    on_decode_thread(move || {
        decoder.negotiate(16, 16);
        decoder.decode(1);
    });
    queue.run_pending();

    let mut decoder = player.decoder();
    on_decode_thread(move || {
        decoder.cleanup();
        decoder.negotiate(32, 32);
        decoder.decode(2);
    });
    queue.run_pending();
    queue.run_pending();

    let frame = provider.video_source();
    assert_eq!(
        frame.as_ref().map(|frame| (frame.sequence, frame.format.width)),
        Some((1, 32))
    );
    assert!(provider.bridge().surface().has_frame());
}
