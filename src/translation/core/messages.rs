//! 跨组件消息与文档事件

use markup5ever_rcdom::Handle;
use serde::{Deserialize, Serialize};

use crate::parsers::html::SelectionRange;
use crate::translation::interaction::{PlaybackState, Rect, ScrollOffset, TooltipView};
use crate::translation::pipeline::CopyOutcome;
use crate::translation::storage::Settings;

/// 发给控制器的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum InboundMessage {
    SettingsUpdated { settings: Settings },
    TranslationToggled { enabled: bool },
}

/// 控制器向外发出的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum OutboundMessage {
    UpdateStats { count: usize },
}

/// 文档事件源交给控制器的事件
#[derive(Debug, Clone)]
pub enum DocumentEvent {
    /// 指针进入节点；`rect` 是目标的视口边界框
    PointerEnter {
        target: Handle,
        rect: Rect,
        scroll: ScrollOffset,
    },
    PointerLeave { target: Handle },
    Click { target: Handle },
    /// 复制；没有选区时为 `None`
    Copy { selection: Option<SelectionRange> },
}

/// 事件处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum EventResponse {
    /// 事件与引擎输出无关
    Ignored,
    TooltipShown(TooltipView),
    TooltipHidden,
    Playback(PlaybackState),
    Copy(CopyOutcome),
}
