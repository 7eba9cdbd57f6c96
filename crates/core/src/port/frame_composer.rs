// Frame Composer Port - turns a snapshot into two panel planes

use crate::domain::{Frame, Geometry, StatusSnapshot};
use crate::error::Result;

pub trait FrameComposer: Send + Sync {
    /// Build a fresh frame at `geometry`; `iteration` selects the artwork
    fn compose(&self, snapshot: &StatusSnapshot, iteration: u64, geometry: Geometry)
        -> Result<Frame>;
}

pub mod mocks {
    use super::*;

    /// Draws one ink pixel per non-empty status line; enough to tell frames apart
    pub struct TallyComposer;

    impl FrameComposer for TallyComposer {
        fn compose(
            &self,
            snapshot: &StatusSnapshot,
            _iteration: u64,
            geometry: Geometry,
        ) -> Result<Frame> {
            let mut frame = Frame::new(geometry);
            for (i, line) in snapshot.status_lines().iter().enumerate() {
                if !line.is_empty() {
                    frame.ink.set(i as i32, 0, true);
                }
            }
            Ok(frame)
        }
    }
}
