//! 交互层
//!
//! 悬停提示与发音播放。对注释索引只读，所需数据全部来自标记上的元数据。

pub mod playback;
pub mod tooltip;

use std::collections::HashSet;

pub use playback::{
    build_utterance, select_voice, PlaybackController, PlaybackState, SpeechSynthesizer,
    UnavailableSynthesizer, Utterance, Voice,
};
pub use tooltip::{Rect, ScrollOffset, Tooltip, TooltipView};

/// 会话内已悬停过的原词
#[derive(Debug, Default)]
pub struct HoverTracker {
    seen: HashSet<String>,
}

impl HoverTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 第一次悬停该原词时返回 `true`
    pub fn first_hover(&mut self, original: &str) -> bool {
        self.seen.insert(original.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
