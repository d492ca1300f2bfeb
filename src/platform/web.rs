//! Browser bindings (WASM only): canvas surface, frame scheduling,
//! event listeners and the share target.

use std::f64::consts::TAU;

use glam::Vec2;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, Event, EventTarget, HtmlAnchorElement, HtmlCanvasElement, Window};

use super::time::{FrameHandle, Scheduler};
use crate::error::GameError;
use crate::renderer::{Rgba, Surface, TextAlign};
use crate::share::{self, ShareCard, ShareTarget};

// Share sheet and clipboard go through small JS shims; both APIs are
// promise based and feature-detected at call time.
#[wasm_bindgen(inline_js = "
    export function share_score(text, image) {
        const nav = window.navigator;
        if (!nav.share) {
            return Promise.reject(new Error('share unavailable'));
        }
        const data = { title: 'Space Shooter', text };
        if (image && nav.canShare) {
            const [head, body] = image.split(',');
            const mime = head.split(':')[1].split(';')[0];
            const bytes = Uint8Array.from(atob(body), c => c.charCodeAt(0));
            const file = new File([bytes], 'space-shooter-score.png', { type: mime });
            if (nav.canShare({ files: [file] })) {
                data.files = [file];
            }
        }
        return nav.share(data);
    }

    export function write_clipboard(text) {
        const clipboard = window.navigator.clipboard;
        if (!clipboard || !clipboard.writeText) {
            return Promise.reject(new Error('clipboard unavailable'));
        }
        return clipboard.writeText(text);
    }
")]
extern "C" {
    fn share_score(text: &str, image: Option<String>) -> js_sys::Promise;
    fn write_clipboard(text: &str) -> js_sys::Promise;
}

fn window() -> Result<Window, GameError> {
    web_sys::window().ok_or_else(|| GameError::SurfaceUnavailable("no window".into()))
}

fn js_error(value: JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}

/// `Surface` over a canvas 2D context, in CSS pixels
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    size: Vec2,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, GameError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| GameError::SurfaceUnavailable(js_error(e)))?
            .ok_or_else(|| GameError::SurfaceUnavailable("2d context missing".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| GameError::SurfaceUnavailable("not a 2d context".into()))?;
        let size = Vec2::new(canvas.width() as f32, canvas.height() as f32);
        Ok(Self { canvas, ctx, size })
    }

    /// Match the backing store to the element's CSS size times `dpr`
    pub fn fit(&mut self, dpr: f64) -> Vec2 {
        let w = self.canvas.client_width().max(1) as f64;
        let h = self.canvas.client_height().max(1) as f64;
        self.canvas.set_width((w * dpr) as u32);
        self.canvas.set_height((h * dpr) as u32);
        if let Err(e) = self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0) {
            log::warn!("Canvas transform failed: {}", js_error(e));
        }
        self.size = Vec2::new(w as f32, h as f32);
        self.size
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn path_circle(&self, center: Vec2, radius: f32) {
        self.ctx.begin_path();
        let _ = self
            .ctx
            .arc(center.x as f64, center.y as f64, radius.max(0.0) as f64, 0.0, TAU);
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn translate(&mut self, offset: Vec2) {
        let _ = self.ctx.translate(offset.x as f64, offset.y as f64);
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.ctx.set_global_alpha(alpha.clamp(0.0, 1.0) as f64);
    }

    fn set_glow(&mut self, color: Rgba, blur: f32) {
        self.ctx.set_shadow_color(&color.to_css());
        self.ctx.set_shadow_blur(blur as f64);
    }

    fn clear(&mut self, color: Rgba) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx
            .fill_rect(0.0, 0.0, self.size.x as f64, self.size.y as f64);
    }

    fn fill_rect(&mut self, pos: Vec2, size: Vec2, color: Rgba) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx
            .fill_rect(pos.x as f64, pos.y as f64, size.x as f64, size.y as f64);
    }

    fn stroke_rect(&mut self, pos: Vec2, size: Vec2, color: Rgba, width: f32) {
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(width as f64);
        self.ctx
            .stroke_rect(pos.x as f64, pos.y as f64, size.x as f64, size.y as f64);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.path_circle(center, radius);
        self.ctx.fill();
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Rgba, width: f32) {
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(width as f64);
        self.path_circle(center, radius);
        self.ctx.stroke();
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.begin_path();
        self.ctx.move_to(first.x as f64, first.y as f64);
        for p in rest {
            self.ctx.line_to(p.x as f64, p.y as f64);
        }
        self.ctx.close_path();
        self.ctx.fill();
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32) {
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(width as f64);
        self.ctx.begin_path();
        self.ctx.move_to(from.x as f64, from.y as f64);
        self.ctx.line_to(to.x as f64, to.y as f64);
        self.ctx.stroke();
    }

    fn text(&mut self, text: &str, pos: Vec2, size: f32, color: Rgba, align: TextAlign) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.set_font(&format!("bold {}px 'Courier New', monospace", size.round()));
        self.ctx.set_text_align(align.as_css());
        let _ = self.ctx.fill_text(text, pos.x as f64, pos.y as f64);
    }
}

/// requestAnimationFrame scheduler around one long-lived callback
pub struct RafScheduler {
    window: Window,
    callback: js_sys::Function,
}

impl RafScheduler {
    /// `callback` must stay alive (owned by the host) for as long as frames run
    pub fn new(callback: &Closure<dyn FnMut(f64)>) -> Result<Self, GameError> {
        Ok(Self {
            window: window()?,
            callback: callback.as_ref().unchecked_ref::<js_sys::Function>().clone(),
        })
    }
}

impl Scheduler for RafScheduler {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        match self.window.request_animation_frame(&self.callback) {
            Ok(id) => Some(FrameHandle(id)),
            Err(e) => {
                log::error!("requestAnimationFrame failed: {}", js_error(e));
                None
            }
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let _ = self.window.cancel_animation_frame(handle.0);
    }
}

struct Listener {
    target: EventTarget,
    event: &'static str,
    handler: Closure<dyn FnMut(Event)>,
}

/// Event listeners that are removed again on `clear` or drop
#[derive(Default)]
pub struct ListenerSet {
    listeners: Vec<Listener>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, target: &EventTarget, event: &'static str, handler: impl FnMut(Event) + 'static) {
        let handler = Closure::<dyn FnMut(Event)>::new(handler);
        match target.add_event_listener_with_callback(event, handler.as_ref().unchecked_ref()) {
            Ok(()) => self.listeners.push(Listener {
                target: target.clone(),
                event,
                handler,
            }),
            Err(e) => log::warn!("Could not listen for {}: {}", event, js_error(e)),
        }
    }

    pub fn clear(&mut self) {
        for l in self.listeners.drain(..) {
            let _ = l
                .target
                .remove_event_listener_with_callback(l.event, l.handler.as_ref().unchecked_ref());
        }
    }
}

impl Drop for ListenerSet {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Share sheet, clipboard and download through the browser
#[derive(Default)]
pub struct WebShareTarget;

impl ShareTarget for WebShareTarget {
    fn card_image(&mut self, card: &ShareCard) -> Option<String> {
        let document = web_sys::window()?.document()?;
        let canvas = document
            .create_element("canvas")
            .ok()?
            .dyn_into::<HtmlCanvasElement>()
            .ok()?;
        canvas.set_width(share::CARD_SIZE as u32);
        canvas.set_height(share::CARD_SIZE as u32);
        let mut surface = match CanvasSurface::new(canvas) {
            Ok(surface) => surface,
            Err(e) => {
                log::warn!("Share card not rendered: {}", e);
                return None;
            }
        };
        share::render_share_card(card, &mut surface);
        surface.canvas().to_data_url().ok()
    }

    async fn share_native(&mut self, text: &str, image: Option<&str>) -> Result<(), GameError> {
        JsFuture::from(share_score(text, image.map(str::to_string)))
            .await
            .map(|_| ())
            .map_err(|e| GameError::ShareFailed(js_error(e)))
    }

    async fn copy_text(&mut self, text: &str) -> Result<(), GameError> {
        JsFuture::from(write_clipboard(text))
            .await
            .map(|_| ())
            .map_err(|_| GameError::ClipboardUnavailable)
    }

    fn download(&mut self, image: &str, file_name: &str) -> Result<(), GameError> {
        let document = window()?
            .document()
            .ok_or_else(|| GameError::ShareFailed("no document".into()))?;
        let anchor = document
            .create_element("a")
            .map_err(|e| GameError::ShareFailed(js_error(e)))?
            .dyn_into::<HtmlAnchorElement>()
            .map_err(|_| GameError::ShareFailed("anchor element unavailable".into()))?;
        anchor.set_href(image);
        anchor.set_download(file_name);
        anchor.click();
        Ok(())
    }
}
