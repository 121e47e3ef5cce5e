use std::sync::Arc;

use crate::source::IndexedTile;

/// One animation frame of a sprite, seen from one direction.
#[derive(Debug, Clone)]
pub struct SpriteFrame {
    /// Direction (angle index) this frame belongs to.
    pub direction: u8,
    /// Frame number within that direction's animation.
    pub index: usize,
    pub tile: Arc<IndexedTile>,
}

impl SpriteFrame {
    /// Key used for this frame in atlas metadata: `sprite/direction/frame`.
    pub fn key(&self, sprite: &str) -> String {
        format!("{}/{}/{}", sprite, self.direction, self.index)
    }
}

/// A named sprite made of frames across one or more directions.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub name: String,
    frames: Vec<SpriteFrame>,
}

impl Sprite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frames: Vec::new(),
        }
    }

    /// Appends a frame to `direction`, numbered after the frames already there.
    pub fn push_frame(&mut self, direction: u8, tile: Arc<IndexedTile>) -> &mut Self {
        let index = self
            .frames
            .iter()
            .filter(|f| f.direction == direction)
            .count();
        self.frames.push(SpriteFrame {
            direction,
            index,
            tile,
        });
        self
    }

    /// Inserts a frame with an explicit frame number.
    pub fn insert_frame(&mut self, direction: u8, index: usize, tile: Arc<IndexedTile>) {
        self.frames.push(SpriteFrame {
            direction,
            index,
            tile,
        });
    }

    pub fn frames(&self) -> &[SpriteFrame] {
        &self.frames
    }

    /// Frames for one direction, or every frame when `direction` is `None`.
    pub fn frames_for(&self, direction: Option<u8>) -> impl Iterator<Item = &SpriteFrame> + '_ {
        self.frames
            .iter()
            .filter(move |f| direction.is_none_or(|d| f.direction == d))
    }

    /// Sorted, deduplicated list of directions present.
    pub fn directions(&self) -> Vec<u8> {
        let mut dirs: Vec<u8> = self.frames.iter().map(|f| f.direction).collect();
        dirs.sort_unstable();
        dirs.dedup();
        dirs
    }
}
