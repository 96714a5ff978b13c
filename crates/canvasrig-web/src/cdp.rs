#![forbid(unsafe_code)]

//! [`SurfaceHost`] over the Chrome DevTools Protocol.
//!
//! One [`CdpHost`] drives one page. Probes and geometry go through page
//! script evaluation; input goes through `Input.dispatchMouseEvent` and
//! `Input.dispatchTouchEvent`; diagnostics come from listener tasks that
//! forward protocol events into the harness channel.

use std::fmt::Display;
use std::time::Duration;

use canvasrig_core::{Point, SurfaceRect};
use canvasrig_harness::diagnostics::DiagnosticReceiver;
use canvasrig_harness::{
    ConsoleLevel, DiagnosticEvent, DiagnosticSender, ElementState, HostError, InputEvent,
    PointerButton, PointerInput, PointerPhase, SurfaceHost, diagnostic_channel,
};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetTouchEmulationEnabledParams,
};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, DispatchTouchEventParams,
    DispatchTouchEventType, MouseButton, TouchPoint,
};
use chromiumoxide::cdp::browser_protocol::log::{
    EnableParams as LogEnableParams, EventEntryAdded, LogEntryLevel,
};
use chromiumoxide::cdp::js_protocol::runtime::{EventConsoleApiCalled, EventExceptionThrown};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::scripts;

/// Maximum simultaneous touch points advertised to the page.
const MAX_TOUCH_POINTS: i64 = 5;

fn protocol_error(err: impl Display) -> HostError {
    HostError::Protocol(err.to_string())
}

/// One protocol command produced for an [`InputEvent`].
#[derive(Debug, Clone)]
pub enum InputCommand {
    Mouse(DispatchMouseEventParams),
    Touch(DispatchTouchEventParams),
}

fn cdp_button(button: PointerButton) -> MouseButton {
    match button {
        PointerButton::Left => MouseButton::Left,
        PointerButton::Middle => MouseButton::Middle,
        PointerButton::Right => MouseButton::Right,
    }
}

/// Bitmask of held buttons, as the `buttons` field expects.
fn button_mask(button: PointerButton) -> i64 {
    match button {
        PointerButton::Left => 1,
        PointerButton::Right => 2,
        PointerButton::Middle => 4,
    }
}

fn mouse(
    kind: DispatchMouseEventType,
    at: Point,
    button: Option<PointerButton>,
    held: i64,
) -> Result<InputCommand, HostError> {
    let mut builder = DispatchMouseEventParams::builder()
        .r#type(kind.clone())
        .x(at.x)
        .y(at.y)
        .buttons(held);
    if let Some(button) = button {
        builder = builder.button(cdp_button(button));
        if kind != DispatchMouseEventType::MouseMoved {
            builder = builder.click_count(1);
        }
    }
    builder
        .build()
        .map(InputCommand::Mouse)
        .map_err(HostError::Protocol)
}

fn touch(kind: DispatchTouchEventType, at: Option<Point>) -> Result<InputCommand, HostError> {
    let points = match at {
        Some(at) => vec![
            TouchPoint::builder()
                .x(at.x)
                .y(at.y)
                .build()
                .map_err(HostError::Protocol)?,
        ],
        None => Vec::new(),
    };
    DispatchTouchEventParams::builder()
        .r#type(kind)
        .touch_points(points)
        .build()
        .map(InputCommand::Touch)
        .map_err(HostError::Protocol)
}

/// Protocol commands for one harness input event, in dispatch order.
pub fn input_commands(event: &InputEvent) -> Result<Vec<InputCommand>, HostError> {
    match *event {
        InputEvent::Pointer(PointerInput { phase, button, at }) => {
            let command = match phase {
                PointerPhase::Move => mouse(
                    DispatchMouseEventType::MouseMoved,
                    at,
                    button,
                    button.map_or(0, button_mask),
                )?,
                PointerPhase::Down => {
                    let button = button.unwrap_or_default();
                    mouse(
                        DispatchMouseEventType::MousePressed,
                        at,
                        Some(button),
                        button_mask(button),
                    )?
                }
                PointerPhase::Up => mouse(
                    DispatchMouseEventType::MouseReleased,
                    at,
                    Some(button.unwrap_or_default()),
                    0,
                )?,
            };
            Ok(vec![command])
        }
        InputEvent::Click { at, button } => Ok(vec![
            mouse(DispatchMouseEventType::MouseMoved, at, None, 0)?,
            mouse(
                DispatchMouseEventType::MousePressed,
                at,
                Some(button),
                button_mask(button),
            )?,
            mouse(DispatchMouseEventType::MouseReleased, at, Some(button), 0)?,
        ]),
        InputEvent::Tap { at } => Ok(vec![
            touch(DispatchTouchEventType::TouchStart, Some(at))?,
            touch(DispatchTouchEventType::TouchEnd, None)?,
        ]),
    }
}

/// A page driven over CDP.
#[derive(Debug)]
pub struct CdpHost {
    page: Page,
    origin: Instant,
    listeners: Vec<JoinHandle<()>>,
}

impl CdpHost {
    /// Wrap an already open page.
    pub fn new(page: Page) -> Self {
        Self {
            page,
            origin: Instant::now(),
            listeners: Vec::new(),
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Fix the viewport size and advertise touch support.
    pub async fn emulate_device(
        &self,
        width: u32,
        height: u32,
        touch: bool,
    ) -> Result<(), HostError> {
        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(width))
            .height(i64::from(height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(HostError::Protocol)?;
        self.page.execute(metrics).await.map_err(protocol_error)?;

        let mut touch_params = SetTouchEmulationEnabledParams::builder().enabled(touch);
        if touch {
            touch_params = touch_params.max_touch_points(MAX_TOUCH_POINTS);
        }
        let touch_params = touch_params.build().map_err(HostError::Protocol)?;
        self.page
            .execute(touch_params)
            .await
            .map_err(protocol_error)?;
        tracing::debug!(width, height, touch, "device emulation applied");
        Ok(())
    }

    /// Navigate and wait for the load event.
    pub async fn goto(&mut self, url: &str) -> Result<(), HostError> {
        tracing::info!(url, "navigating");
        self.page.goto(url).await.map_err(protocol_error)?;
        Ok(())
    }

    async fn evaluate_string(&self, script: String) -> Result<String, HostError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|err| HostError::Script(err.to_string()))?
            .into_value::<String>()
            .map_err(|err| HostError::Script(err.to_string()))
    }

    async fn send(&self, command: InputCommand) -> Result<(), HostError> {
        let sent = match command {
            InputCommand::Mouse(params) => self.page.execute(params).await.map(drop),
            InputCommand::Touch(params) => self.page.execute(params).await.map(drop),
        };
        sent.map_err(protocol_error)
    }

    async fn spawn_listeners(&mut self, tx: DiagnosticSender) -> Result<(), HostError> {
        let mut console = self
            .page
            .event_listener::<EventConsoleApiCalled>()
            .await
            .map_err(protocol_error)?;
        let mut faults = self
            .page
            .event_listener::<EventExceptionThrown>()
            .await
            .map_err(protocol_error)?;
        let mut entries = self
            .page
            .event_listener::<EventEntryAdded>()
            .await
            .map_err(protocol_error)?;
        self.page
            .execute(LogEnableParams::default())
            .await
            .map_err(protocol_error)?;

        let console_tx = tx.clone();
        self.listeners.push(tokio::spawn(async move {
            while let Some(event) = console.next().await {
                let level = ConsoleLevel::from_name(event.r#type.as_ref());
                let text = scripts::join_args(event.args.iter().map(|arg| {
                    scripts::arg_text(arg.value.as_ref(), arg.description.as_deref())
                }));
                if console_tx
                    .send(DiagnosticEvent::console(level, text))
                    .is_err()
                {
                    break;
                }
            }
        }));

        let fault_tx = tx.clone();
        self.listeners.push(tokio::spawn(async move {
            while let Some(event) = faults.next().await {
                let details = &event.exception_details;
                let exception = details.exception.as_ref();
                let message = scripts::page_error_message(
                    exception.and_then(|e| e.description.as_deref()),
                    exception.and_then(|e| e.value.as_ref()),
                    &details.text,
                );
                if fault_tx.send(DiagnosticEvent::page_error(message)).is_err() {
                    break;
                }
            }
        }));

        self.listeners.push(tokio::spawn(async move {
            while let Some(event) = entries.next().await {
                if event.entry.level != LogEntryLevel::Error {
                    continue;
                }
                let text = scripts::log_entry_text(&event.entry.text, event.entry.url.as_deref());
                if tx
                    .send(DiagnosticEvent::console(ConsoleLevel::Error, text))
                    .is_err()
                {
                    break;
                }
            }
        }));
        Ok(())
    }
}

impl Drop for CdpHost {
    fn drop(&mut self) {
        for listener in &self.listeners {
            listener.abort();
        }
    }
}

impl SurfaceHost for CdpHost {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn element_state(&mut self, selector: &str) -> Result<ElementState, HostError> {
        let raw = self.evaluate_string(scripts::probe_script(selector)).await?;
        scripts::parse_element_state(&raw)
    }

    async fn bounding_rect(&mut self, selector: &str) -> Result<Option<SurfaceRect>, HostError> {
        let raw = self.evaluate_string(scripts::rect_script(selector)).await?;
        scripts::parse_rect(&raw)
    }

    async fn dispatch(&mut self, event: InputEvent) -> Result<(), HostError> {
        for command in input_commands(&event)? {
            self.send(command).await?;
        }
        Ok(())
    }

    async fn subscribe_diagnostics(&mut self) -> Result<DiagnosticReceiver, HostError> {
        let (tx, rx) = diagnostic_channel();
        self.spawn_listeners(tx).await?;
        tracing::debug!(listeners = self.listeners.len(), "diagnostic listeners attached");
        Ok(rx)
    }
}
