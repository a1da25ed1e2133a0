//! Outbound interaction payloads: pointer, key and window-control events.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum PointerEventKind {
    Enter = 0,
    Exit = 1,
    Over = 2,
    Press = 3,
    Release = 4,
    Click = 5,
    ScrollDiscrete = 6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum MouseButton {
    Left = 0,
    Right = 1,
    Middle = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub button: Option<MouseButton>,
    /// Discrete scroll counts (wheel clicks), only for `ScrollDiscrete`.
    pub scroll_x: i32,
    pub scroll_y: i32,
    /// Window pixel, origin top-left. -1 when not applicable.
    pub x: i32,
    pub y: i32,
}

impl PointerEvent {
    #[inline]
    pub fn enter() -> Self {
        Self::bare(PointerEventKind::Enter)
    }

    #[inline]
    pub fn exit() -> Self {
        Self::bare(PointerEventKind::Exit)
    }

    #[inline]
    pub fn over(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            ..Self::bare(PointerEventKind::Over)
        }
    }

    #[inline]
    pub fn button(kind: PointerEventKind, button: MouseButton, x: i32, y: i32) -> Self {
        Self {
            button: Some(button),
            x,
            y,
            ..Self::bare(kind)
        }
    }

    #[inline]
    pub fn scroll(scroll_x: i32, scroll_y: i32, x: i32, y: i32) -> Self {
        Self {
            scroll_x,
            scroll_y,
            x,
            y,
            ..Self::bare(PointerEventKind::ScrollDiscrete)
        }
    }

    #[inline]
    fn bare(kind: PointerEventKind) -> Self {
        Self {
            kind,
            button: None,
            scroll_x: 0,
            scroll_y: 0,
            x: -1,
            y: -1,
        }
    }

    #[inline]
    pub fn button_code(&self) -> i32 {
        self.button.map_or(-1, |b| b as i32)
    }
}

/// Texture coordinate (origin bottom-left, 0..1) to window pixel (origin top-left).
pub fn window_coord_for_tex_coord(u: f32, v: f32, width: u32, height: u32) -> (i32, i32) {
    let x = (u * width as f32) as i32;
    let y = ((1.0 - v) * height as f32) as i32;
    (x, y)
}

/// Native key codes. `Character` carries a unicode scalar in `KeyEvent::character`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum BrowserKey {
    Character = 0,
    Backspace,
    Delete,
    Tab,
    Clear,
    Return,
    Pause,
    Escape,
    Space,
    UpArrow,
    DownArrow,
    RightArrow,
    LeftArrow,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
    Numlock,
    CapsLock,
    ScrollLock,
    RightShift,
    LeftShift,
    RightControl,
    LeftControl,
    RightAlt,
    LeftAlt,
    LeftCommand,
    LeftWindows,
    RightCommand,
    RightWindows,
    AltGr,
    Help,
    Print,
    SysReq,
    Break,
    Menu,
    Keypad0,
    Keypad1,
    Keypad2,
    Keypad3,
    Keypad4,
    Keypad5,
    Keypad6,
    Keypad7,
    Keypad8,
    Keypad9,
    KeypadPeriod,
    KeypadDivide,
    KeypadMultiply,
    KeypadMinus,
    KeypadPlus,
    KeypadEnter,
    KeypadEquals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: BrowserKey,
    pub character: u32,
}

impl KeyEvent {
    #[inline]
    pub fn key(key: BrowserKey) -> Self {
        Self { key, character: 0 }
    }

    #[inline]
    pub fn character(ch: char) -> Self {
        Self {
            key: BrowserKey::Character,
            character: ch as u32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowControl {
    Refresh,
    Reload,
    Stop,
    GoBack,
    GoForward,
    GoHome,
    Navigate(String),
    ImeDismissed,
}

/// Native encoding of a control event: `(control_id, a, b, s)`.
pub struct ControlWire<'a> {
    pub id: i32,
    pub a: i32,
    pub b: i32,
    pub s: Option<&'a str>,
}

impl WindowControl {
    pub fn wire(&self) -> ControlWire<'_> {
        let (id, s) = match self {
            Self::Refresh => (0, None),
            Self::Reload => (1, None),
            Self::Stop => (2, None),
            Self::GoBack => (3, None),
            Self::GoForward => (4, None),
            Self::GoHome => (5, None),
            Self::Navigate(url) => (6, Some(url.as_str())),
            Self::ImeDismissed => (7, None),
        };
        ControlWire { id, a: 0, b: 0, s }
    }
}
