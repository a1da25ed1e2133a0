use crossbeam_channel::Sender;
use std::io::BufRead;

use newengine_core::{EngineError, EngineResult, Frame, Module, ModuleCtx};
use newengine_modules_browser::{BrowserApiRef, RenderTargetNotice, WindowControl, WindowUid};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    Open { width: u32, height: u32 },
    Close,
    Navigate(String),
    Control(WindowControl),
    Quit,
}

/// `open [w h]`, `close`, `go <url>`, `back`, `forward`, `reload`, `stop`,
/// `home`, `quit`.
pub fn parse_command(line: &str) -> Option<EditorEvent> {
    let mut it = line.split_whitespace();
    let cmd = it.next()?;
    let ev = match cmd {
        "open" => {
            let width = it.next().and_then(|v| v.parse().ok()).unwrap_or(1280);
            let height = it.next().and_then(|v| v.parse().ok()).unwrap_or(720);
            EditorEvent::Open { width, height }
        }
        "close" => EditorEvent::Close,
        "go" => EditorEvent::Navigate(it.next()?.to_string()),
        "back" => EditorEvent::Control(WindowControl::GoBack),
        "forward" => EditorEvent::Control(WindowControl::GoForward),
        "reload" => EditorEvent::Control(WindowControl::Reload),
        "refresh" => EditorEvent::Control(WindowControl::Refresh),
        "stop" => EditorEvent::Control(WindowControl::Stop),
        "home" => EditorEvent::Control(WindowControl::GoHome),
        "quit" | "exit" => EditorEvent::Quit,
        _ => return None,
    };
    Some(ev)
}

/// Feeds stdin lines into the engine bus until stdin closes.
pub fn spawn_stdin_commands(tx: Sender<EditorEvent>) {
    let spawned = std::thread::Builder::new()
        .name("editor-stdin".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                match parse_command(&line) {
                    Some(ev) => {
                        if tx.send(ev).is_err() {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => log::warn!("editor: unknown command '{}'", line.trim()),
                }
            }
        });
    if let Err(e) = spawned {
        log::warn!("editor: stdin commands unavailable: {e}");
    }
}

/// Drives the browser from bus commands and reports what it does.
pub struct BrowserController {
    focused: Option<WindowUid>,
}

impl BrowserController {
    #[inline]
    pub fn new() -> Self {
        Self { focused: None }
    }

    fn api<E: Send + 'static>(ctx: &mut ModuleCtx<'_, E>) -> EngineResult<BrowserApiRef> {
        let api = ctx.resources().require::<BrowserApiRef>()?;
        Ok((*api).clone())
    }

    fn apply(&mut self, api: &BrowserApiRef, ev: EditorEvent) -> bool {
        let res = match ev {
            EditorEvent::Open { width, height } => api.request_window(width, height).map(|uid| {
                self.focused = Some(uid);
            }),
            EditorEvent::Close => match self.focused.take() {
                Some(uid) => api.close_window(uid),
                None => Ok(()),
            },
            EditorEvent::Navigate(url) => match self.focused {
                Some(uid) => api.navigate(uid, &url),
                None => Ok(()),
            },
            EditorEvent::Control(control) => match self.focused {
                Some(uid) => api.control(uid, &control),
                None => Ok(()),
            },
            EditorEvent::Quit => return false,
        };
        if let Err(e) = res {
            log::warn!("editor: {e}");
        }
        true
    }
}

impl Default for BrowserController {
    fn default() -> Self {
        Self::new()
    }
}

impl Module<EditorEvent> for BrowserController {
    fn id(&self) -> &'static str {
        "editor-browser-controller"
    }

    fn start(&mut self, ctx: &mut ModuleCtx<'_, EditorEvent>) -> EngineResult<()> {
        let api = Self::api(ctx)?;
        self.focused = api.windows().first().map(|w| w.uid);
        Ok(())
    }

    fn update(&mut self, ctx: &mut ModuleCtx<'_, EditorEvent>, _frame: &Frame) -> EngineResult<()> {
        let api = match Self::api(ctx) {
            Ok(api) => api,
            Err(EngineError::Other(_)) => return Ok(()),
            Err(e) => return Err(e),
        };

        let mut events = Vec::new();
        ctx.bus().drain(|ev| events.push(ev));

        for ev in events {
            if !self.apply(&api, ev) {
                ctx.request_exit();
                return Ok(());
            }
        }

        for notice in api.drain_render_notices() {
            match notice {
                RenderTargetNotice::Activated {
                    uid,
                    width,
                    height,
                    format,
                    ..
                } => {
                    log::info!("editor: window {uid} ready {width}x{height} {format:?}");
                    self.focused.get_or_insert(uid);
                }
                RenderTargetNotice::Released { uid, .. } => {
                    if self.focused == Some(uid) {
                        self.focused = None;
                    }
                }
                other => log::debug!("editor: {other:?}"),
            }
        }
        Ok(())
    }
}
