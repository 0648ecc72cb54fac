//! The external frame-source boundary.
//!
//! Raw socket acquisition is explicitly out of scope for this crate (it's
//! tied to a particular operating system); [`FrameSource`] is the
//! capability an embedder implements to feed real captured frames into
//! [`crate::pipeline`]. [`VecFrameSource`] is a pure-Rust test double used
//! by this crate's own tests and demo binary.

use crate::error::SourceFatal;

/// Yields one complete raw Ethernet II frame per call.
pub trait FrameSource: Send {
    /// Block until one frame is available, or return a terminal error.
    /// A `SourceFatal` error ends the capture thread that owns this
    /// source; the thread releases its resources and does not retry.
    fn read_frame(&mut self) -> Result<Vec<u8>, SourceFatal>;
}

/// A [`FrameSource`] backed by an in-memory list of frames, for tests and
/// for demoing the pipeline without a privileged raw socket. Exhausting
/// the list yields `SourceFatal`, ending the owning capture thread.
pub struct VecFrameSource {
    frames: std::vec::IntoIter<Vec<u8>>,
}

impl VecFrameSource {
    pub fn new(frames: Vec<Vec<u8>>) -> Self {
        VecFrameSource {
            frames: frames.into_iter(),
        }
    }
}

impl FrameSource for VecFrameSource {
    fn read_frame(&mut self) -> Result<Vec<u8>, SourceFatal> {
        self.frames
            .next()
            .ok_or_else(|| SourceFatal(anyhow::anyhow!("frame source exhausted")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_source_yields_frames_then_fails() {
        let mut source = VecFrameSource::new(vec![vec![1, 2, 3], vec![4, 5, 6]]);
        assert_eq!(source.read_frame().unwrap(), vec![1, 2, 3]);
        assert_eq!(source.read_frame().unwrap(), vec![4, 5, 6]);
        assert!(source.read_frame().is_err());
    }

    #[test]
    fn empty_source_fails_immediately() {
        let mut source = VecFrameSource::new(vec![]);
        assert!(source.read_frame().is_err());
    }
}
