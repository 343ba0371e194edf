//! 发音播放
//!
//! 语音合成属于平台能力，这里只负责选择声音、组装朗读请求，并在发音按钮上
//! 显示短暂的播放/错误状态。

use std::rc::Rc;
use std::time::{Duration, Instant};

use markup5ever_rcdom::Handle;

use crate::parsers::html::dom::set_node_attr;
use crate::parsers::html::utils::ATTR_PLAYBACK_STATE;
use crate::translation::config::constants::{DEFAULT_SPEECH_PITCH, DEFAULT_SPEECH_VOLUME};
use crate::translation::config::locale_for;
use crate::translation::error::{PlaybackFailure, TranslationError};

/// 平台提供的一个声音
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    pub lang: String,
}

impl Voice {
    pub fn new(name: &str, lang: &str) -> Self {
        Self {
            name: name.to_string(),
            lang: lang.to_string(),
        }
    }
}

/// 一次朗读请求
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// 语音合成能力
pub trait SpeechSynthesizer {
    fn is_available(&self) -> bool;
    fn voices(&self) -> Vec<Voice>;
    /// 提交朗读请求后立即返回
    fn speak(&self, utterance: Utterance) -> Result<(), PlaybackFailure>;
}

/// 平台不支持语音合成时的占位实现
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSynthesizer;

impl SpeechSynthesizer for UnavailableSynthesizer {
    fn is_available(&self) -> bool {
        false
    }

    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn speak(&self, _utterance: Utterance) -> Result<(), PlaybackFailure> {
        Err(PlaybackFailure::Unsupported)
    }
}

/// 先精确匹配地区代码，再按语言前缀匹配
pub fn select_voice(voices: &[Voice], locale: &str) -> Option<Voice> {
    let locale = locale.to_lowercase();
    let primary = locale.split('-').next().unwrap_or(&locale).to_string();

    voices
        .iter()
        .find(|v| v.lang.to_lowercase() == locale)
        .or_else(|| {
            voices
                .iter()
                .find(|v| v.lang.to_lowercase().starts_with(&primary))
        })
        .cloned()
}

/// 为目标语言组装朗读请求
pub fn build_utterance(text: &str, target_language: &str, voices: &[Voice], rate: f32) -> Utterance {
    let locale = locale_for(target_language);
    match select_voice(voices, locale) {
        Some(voice) => {
            tracing::debug!("使用声音 {} ({})", voice.name, voice.lang);
            Utterance {
                text: text.to_string(),
                lang: voice.lang.clone(),
                voice: Some(voice),
                rate,
                pitch: DEFAULT_SPEECH_PITCH,
                volume: DEFAULT_SPEECH_VOLUME,
            }
        }
        None => {
            tracing::debug!("没有匹配的声音，使用默认声音: {}", locale);
            Utterance {
                text: text.to_string(),
                lang: locale.to_string(),
                voice: None,
                rate,
                pitch: DEFAULT_SPEECH_PITCH,
                volume: DEFAULT_SPEECH_VOLUME,
            }
        }
    }
}

/// 发音按钮的视觉状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Error,
}

impl PlaybackState {
    fn as_attr(self) -> &'static str {
        match self {
            PlaybackState::Playing => "playing",
            PlaybackState::Error => "error",
        }
    }
}

/// 按钮状态及其到期时间
#[derive(Debug)]
struct Feedback {
    button: Handle,
    state: PlaybackState,
    expires_at: Instant,
}

/// 发音控制：提交朗读请求并管理按钮反馈
#[derive(Debug)]
pub struct PlaybackController {
    feedback_duration: Duration,
    rate: f32,
    active: Vec<Feedback>,
}

impl PlaybackController {
    pub fn new(feedback_duration: Duration, rate: f32) -> Self {
        Self {
            feedback_duration,
            rate,
            active: Vec::new(),
        }
    }

    /// 播放译文；失败只体现为按钮上的错误状态
    pub fn play(
        &mut self,
        synth: &dyn SpeechSynthesizer,
        button: &Handle,
        text: &str,
        target_language: &str,
        now: Instant,
    ) -> PlaybackState {
        let state = match self.dispatch(synth, text, target_language) {
            Ok(()) => PlaybackState::Playing,
            Err(failure) => {
                let error = TranslationError::from(failure);
                tracing::warn!(
                    "{} [类别: {:?}, 可重试: {}]",
                    error,
                    error.category(),
                    error.is_retryable()
                );
                PlaybackState::Error
            }
        };
        self.set_feedback(button, state, now);
        state
    }

    fn dispatch(
        &self,
        synth: &dyn SpeechSynthesizer,
        text: &str,
        target_language: &str,
    ) -> Result<(), PlaybackFailure> {
        if !synth.is_available() {
            return Err(PlaybackFailure::Unsupported);
        }
        let utterance = build_utterance(text, target_language, &synth.voices(), self.rate);
        synth.speak(utterance)
    }

    fn set_feedback(&mut self, button: &Handle, state: PlaybackState, now: Instant) {
        self.active.retain(|f| !Rc::ptr_eq(&f.button, button));
        set_node_attr(button, ATTR_PLAYBACK_STATE, Some(state.as_attr()));
        self.active.push(Feedback {
            button: button.clone(),
            state,
            expires_at: now + self.feedback_duration,
        });
    }

    /// 清除已到期的按钮状态，返回清除数量
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.active.len();
        self.active.retain(|f| {
            if now >= f.expires_at {
                set_node_attr(&f.button, ATTR_PLAYBACK_STATE, None);
                tracing::trace!("按钮状态 {:?} 已恢复", f.state);
                false
            } else {
                true
            }
        });
        before - self.active.len()
    }
}
