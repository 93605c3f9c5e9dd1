pub mod audio;
pub mod download;
pub mod error;
pub mod frames;
pub mod probe;
pub mod temp;

pub use audio::extract_wav_mono_16k;
pub use download::download_video;
pub use error::{MediaError, MediaResult};
pub use frames::{decode_frame, GrayFrame, GrayFrames};
pub use probe::{probe_video, sample_positions, VideoInfo};
pub use temp::TempMedia;
