use crate::window::WindowUid;

/// Generic browser event as delivered by the native callback, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBrowserEvent {
    pub uid: WindowUid,
    pub event_type: i32,
    pub data0: i32,
    pub data1: i32,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenPhase {
    WillEnter,
    DidEnter,
    WillExit,
    DidExit,
}

impl FullscreenPhase {
    const TABLE: [FullscreenPhase; 4] = [
        FullscreenPhase::WillEnter,
        FullscreenPhase::DidEnter,
        FullscreenPhase::WillExit,
        FullscreenPhase::DidExit,
    ];

    #[inline]
    pub fn from_native(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::TABLE.get(i).copied())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImeState {
    Show {
        text: String,
        caret_index: i32,
        multiline: bool,
    },
    Hide,
}

/// Decoded browser event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEvent {
    Nop,
    Shutdown,
    LoadStateChanged { loading: bool },
    ImeStateChanged(ImeState),
    /// `None` when the native phase code is out of range.
    FullscreenStateChanged(Option<FullscreenPhase>),
    HistoryChanged { can_go_back: bool, can_go_forward: bool },
    TitleChanged,
    UrlChanged,
    Unknown(i32),
}

pub mod code {
    pub const NOP: i32 = 0;
    pub const SHUTDOWN: i32 = 1;
    pub const LOAD_STATE_CHANGED: i32 = 2;
    pub const IME_STATE_CHANGED: i32 = 3;
    pub const FULLSCREEN_STATE_CHANGED: i32 = 4;
    pub const HISTORY_CHANGED: i32 = 5;
    pub const TITLE_CHANGED: i32 = 6;
    pub const URL_CHANGED: i32 = 7;
}

impl BrowserEvent {
    pub fn decode(raw: &RawBrowserEvent) -> Self {
        let d0 = raw.data0;
        let d1 = raw.data1;
        match raw.event_type {
            code::NOP => Self::Nop,
            code::SHUTDOWN => Self::Shutdown,
            code::LOAD_STATE_CHANGED => Self::LoadStateChanged { loading: d0 == 1 },
            code::IME_STATE_CHANGED => Self::ImeStateChanged(match d0 {
                1 | 2 => ImeState::Show {
                    text: raw.text.clone().unwrap_or_default(),
                    caret_index: d1,
                    multiline: d0 == 2,
                },
                _ => ImeState::Hide,
            }),
            code::FULLSCREEN_STATE_CHANGED => {
                Self::FullscreenStateChanged(FullscreenPhase::from_native(d0))
            }
            code::HISTORY_CHANGED => Self::HistoryChanged {
                can_go_back: d0 == 1,
                can_go_forward: d1 == 1,
            },
            code::TITLE_CHANGED => Self::TitleChanged,
            code::URL_CHANGED => Self::UrlChanged,
            other => Self::Unknown(other),
        }
    }
}
