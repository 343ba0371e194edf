//! 变更监视器
//!
//! 过滤文档变更批次中由引擎自身产生的节点，只有真正新增的未翻译内容才会
//! 安排一次防抖后的重新处理。

use std::time::{Duration, Instant};

use markup5ever_rcdom::Handle;

use crate::parsers::html::classify::{
    classify, contains_engine_output, has_engine_ancestor, NodeKind,
};
use crate::parsers::html::dom::text_content;
use crate::parsers::html::MutationRecord;

/// 批次中是否存在需要处理的新增内容
pub fn qualifies(records: &[MutationRecord]) -> bool {
    records
        .iter()
        .any(|record| record.added.iter().any(|node| addition_qualifies(record, node)))
}

/// 单个新增节点是否需要处理
pub fn addition_qualifies(record: &MutationRecord, node: &Handle) -> bool {
    let kind = classify(node);
    if kind.blocks_extraction() || kind == NodeKind::Other {
        return false;
    }
    // 目标节点本身也算祖先链的一部分；节点可能已被后续批次移走
    if classify(&record.target).is_engine_output() || has_engine_ancestor(&record.target) {
        return false;
    }
    if has_engine_ancestor(node) || contains_engine_output(node) {
        return false;
    }
    !text_content(node).trim().is_empty()
}

/// 一个已安排的防抖任务
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask {
    pub deadline: Instant,
    /// 每次重新安排都会递增，用来区分被取代的任务
    pub generation: u64,
}

/// 尾沿防抖：每次安排都会把截止时间推迟到 `now + delay`
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<ScheduledTask>,
    generation: u64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            generation: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// 安排（或重置）任务
    pub fn schedule(&mut self, now: Instant) -> ScheduledTask {
        self.generation += 1;
        let task = ScheduledTask {
            deadline: now + self.delay,
            generation: self.generation,
        };
        self.pending = Some(task);
        tracing::trace!("防抖任务 #{} 已安排", task.generation);
        task
    }

    /// 截止时间已到则消费任务并返回 `true`
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(task) if now >= task.deadline => {
                self.pending = None;
                tracing::debug!("防抖任务 #{} 触发", task.generation);
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            tracing::trace!("防抖任务 #{} 已取消", task.generation);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<ScheduledTask> {
        self.pending
    }
}

/// 监视器：过滤 + 防抖
#[derive(Debug)]
pub struct ChangeWatcher {
    debouncer: Debouncer,
    active: bool,
}

impl ChangeWatcher {
    pub fn new(delay: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(delay),
            active: false,
        }
    }

    /// 开始观察
    pub fn start(&mut self) {
        self.active = true;
    }

    /// 停止观察并丢弃未触发的任务
    pub fn stop(&mut self) {
        self.active = false;
        self.debouncer.cancel();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 处理一个变更批次；批次合格时重置防抖计时并返回 `true`
    pub fn observe(&mut self, records: &[MutationRecord], now: Instant) -> bool {
        if !self.active || records.is_empty() {
            return false;
        }
        if !qualifies(records) {
            tracing::trace!("忽略 {} 条自身产生或无文本的变更", records.len());
            return false;
        }
        self.debouncer.schedule(now);
        true
    }

    /// 防抖任务是否到期
    pub fn poll(&mut self, now: Instant) -> bool {
        self.active && self.debouncer.fire(now)
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }
}
