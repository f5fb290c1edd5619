mod mjpeg;
mod sink;
mod watcher;

pub use mjpeg::{mjpeg_frames, MjpegParser};
pub use sink::StreamSink;
pub use watcher::FrameWatcher;
