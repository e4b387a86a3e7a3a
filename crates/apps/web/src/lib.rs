use std::cell::RefCell;
use std::fmt::Write as _;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use console_error_panic_hook::set_once;
use gloo_net::http::Request;
use layers::layer::Location;
use runtime::debounce::{DebounceTicket, Debouncer};
use runtime::frame::FrameGate;
use story::page::{self, Disclosure, LoaderLatch};
use story::{
    LayoutMode, ProgressThrottle, ResizeAction, ResizeWatcher, ScrollSample, ScrollTracker,
    StepEvent, StepSpan, StoryConfig, StoryController, StoryError, TabSwitcher,
};
use tracing::{Level, debug, error, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Element, EventTarget, HtmlElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit,
};

mod console;
mod dom;
mod maplibre;

use dom::DomLegendSurface;
use maplibre::MapLibreViewport;

const MAP_CONTAINER: &str = "map";
const SCROLL_CONTAINER: &str = "scroll-container";
const LOADER: &str = "loading-indicator";
const FIGURE_AREA: &str = "bomb-display";

// Guard against a second boot (hot reload or a host page calling twice).
static BOOTED: AtomicBool = AtomicBool::new(false);
static LOGGING: OnceLock<()> = OnceLock::new();

type Story = StoryController<MapLibreViewport, DomLegendSurface>;

struct PageState {
    config: StoryConfig,
    story: Story,
    layout: LayoutMode,
    tracker: ScrollTracker,
    scroll_frame: FrameGate,
    resize: ResizeWatcher,
    resize_debounce: Debouncer,
    progress: ProgressThrottle,
    tabs: TabSwitcher,
    bibliography: Disclosure,
    loader: LoaderLatch,
}

thread_local! {
    static STATE: RefCell<Option<PageState>> = const { RefCell::new(None) };
}

/// Runs `f` on the page state; returns the default before boot, during
/// teardown, or on a re-entrant call.
fn with_state<F, R>(f: F) -> R
where
    F: FnOnce(&mut PageState) -> R,
    R: Default,
{
    STATE.try_with(|cell| {
        cell.try_borrow_mut()
            .ok()
            .and_then(|mut page| page.as_mut().map(f))
            .unwrap_or_default()
    })
    .unwrap_or_default()
}

fn story_error(e: StoryError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    LOGGING.get_or_init(|| {
        set_once();
        console::init(Level::INFO);
    });
    Ok(())
}

/// Boots the page with the story compiled into the module.
#[wasm_bindgen]
pub fn boot_builtin() -> Result<(), JsValue> {
    boot(StoryConfig::builtin())
}

/// Boots the page with a story given as JSON text.
#[wasm_bindgen]
pub fn boot_story(config_json: &str) -> Result<(), JsValue> {
    boot(StoryConfig::from_json_str(config_json).map_err(story_error)?)
}

/// Fetches a story JSON file and boots with it, falling back to the built-in
/// story when the fetch or parse fails.
#[wasm_bindgen]
pub fn boot_story_from_url(url: String) {
    spawn_local(async move {
        let config = match load_story_config(&url).await {
            Ok(config) => config,
            Err(err) => {
                warn!(url = %url, error = %err, "story config unavailable, using built-in story");
                StoryConfig::builtin()
            }
        };
        if let Err(err) = boot(config) {
            error!(error = %maplibre::js_error_text(&err), "boot failed");
        }
    });
}

async fn load_story_config(url: &str) -> Result<StoryConfig, String> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| format!("fetch {url}: {e}"))?;
    if !resp.ok() {
        return Err(format!("fetch {url}: HTTP {}", resp.status()));
    }
    let text = resp.text().await.map_err(|e| format!("read {url}: {e}"))?;
    StoryConfig::from_json_str(&text).map_err(|e| e.to_string())
}

fn boot(config: StoryConfig) -> Result<(), JsValue> {
    if BOOTED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    let window = dom::window()?;
    let doc = dom::document()?;
    let width = window.inner_width()?.as_f64().unwrap_or(0.0);
    let breakpoint = config.layout.breakpoint_px;

    let user_agent = window.navigator().user_agent().unwrap_or_default();
    if page::should_block_mobile(&user_agent, width, breakpoint) {
        info!("small touch device, showing the mobile notice");
        block_mobile(&doc);
        return Ok(());
    }

    let layout = LayoutMode::for_width(width, breakpoint);
    let registry = config.registry().map_err(story_error)?;
    let surface = DomLegendSurface::bind(
        &doc,
        Location::ALL
            .into_iter()
            .filter_map(|l| config.panel_element(l).map(|el| (l, el))),
        registry.toggles().iter().map(|t| &t.id),
    );
    let viewport = MapLibreViewport::create(MAP_CONTAINER, &config.map)?;
    let story = StoryController::new(&config, viewport, surface).map_err(story_error)?;

    let timings = config.timings;
    let state = PageState {
        layout,
        tracker: ScrollTracker::default(),
        scroll_frame: FrameGate::new(),
        resize: ResizeWatcher::new(config.layout, width),
        resize_debounce: Debouncer::new(timings.resize_debounce),
        progress: ProgressThrottle::new(
            timings.progress_min_interval.as_f64(),
            config.layout.progress_min_delta_px,
        ),
        tabs: TabSwitcher::new(config.infographic.clone()),
        bibliography: Disclosure::default(),
        loader: LoaderLatch::default(),
        story,
        config,
    };
    info!(?layout, width, "booting story");

    wire_map_events(&state.story);
    let toggles: Vec<_> = state.story.registry().toggles().iter().map(|t| t.id.clone()).collect();
    let preload = state.config.preload.clone();
    STATE.with(|cell| *cell.borrow_mut() = Some(state));

    if layout == LayoutMode::Narrow {
        apply_narrow_layout(&doc);
    }
    wire_legend_buttons(&doc, &toggles);
    wire_tabs(&doc);
    wire_progress(layout)?;
    wire_resize(&window);
    wire_bibliography(&doc);
    preload_images(&preload);

    dom::set_timeout(timings.loader_timeout.get(), || {
        debug!("loader timeout reached");
        hide_loader();
    });
    Ok(())
}

fn block_mobile(doc: &web_sys::Document) {
    let (Some(blocker), Some(body)) = (doc.get_element_by_id("mobile-blocker"), doc.body()) else {
        return;
    };
    body.set_inner_html("");
    let _ = body.append_child(&blocker);
    dom::set_class(&blocker, "mobile-hidden", false);
}

fn apply_narrow_layout(doc: &web_sys::Document) {
    if let Some(body) = doc.body() {
        dom::set_style(&body, "overflow", "auto");
    }
    if let Some(root) = doc
        .document_element()
        .and_then(|e| e.dyn_into::<HtmlElement>().ok())
    {
        dom::set_style(&root, "overflow", "auto");
    }
    if let Some(container) = dom::html_by_id(doc, SCROLL_CONTAINER) {
        dom::set_style(&container, "position", "static");
        dom::set_style(&container, "height", "auto");
        dom::set_style(&container, "overflow", "visible");
    }
}

// ---- map ----

fn wire_map_events(story: &Story) {
    let on_load = Closure::<dyn FnMut()>::new(on_map_load);
    story.viewport().on("load", on_load.as_ref().unchecked_ref());
    on_load.forget();

    let on_error = Closure::<dyn FnMut(JsValue)>::new(|err: JsValue| {
        error!(error = %maplibre::js_error_text(&err), "map error");
        hide_loader();
    });
    story.viewport().on("error", on_error.as_ref().unchecked_ref());
    on_error.forget();
}

fn on_map_load() {
    info!("map loaded");
    hide_loader();
    let delay = with_state(|p| {
        let viewport = p.story.viewport();
        if let Err(err) = viewport.add_scale(p.config.map.scale_max_width_px) {
            warn!(error = %maplibre::js_error_text(&err), "scale control unavailable");
        }
        let added = viewport.install_layers(p.story.registry().layers());
        debug!(added, "layers installed");
        p.story.viewport_mut().mark_ready();
        p.story.on_map_ready();
        p.config.timings.initial_section_delay.get()
    });
    dom::set_timeout(delay, enter_section_under_reading_line);
}

fn hide_loader() {
    if !with_state(|p| p.loader.hide()) {
        return;
    }
    if let Some(loader) = dom::document()
        .ok()
        .and_then(|d| d.get_element_by_id(LOADER))
    {
        dom::set_class(&loader, "hidden", true);
    }
    start_intro();
}

// ---- scroll ----

fn scroll_target(layout: LayoutMode) -> Result<EventTarget, JsValue> {
    match layout {
        LayoutMode::Narrow => Ok(dom::window()?.into()),
        LayoutMode::Wide => dom::html_by_id(&dom::document()?, SCROLL_CONTAINER)
            .map(Into::into)
            .ok_or_else(|| JsValue::from_str("missing #scroll-container")),
    }
}

/// Scroll offset and extent as `(scroll_top, scroll_height, client_height)`.
fn scroll_metrics(layout: LayoutMode) -> Option<(f64, f64, f64)> {
    let window = web_sys::window()?;
    let doc = window.document()?;
    let viewport_height = window.inner_height().ok()?.as_f64()?;
    match layout {
        LayoutMode::Narrow => {
            let body = doc.body()?;
            Some((window.scroll_y().ok()?, f64::from(body.scroll_height()), viewport_height))
        }
        LayoutMode::Wide => {
            let c = dom::html_by_id(&doc, SCROLL_CONTAINER)?;
            Some((
                f64::from(c.scroll_top()),
                f64::from(c.scroll_height()),
                f64::from(c.client_height()),
            ))
        }
    }
}

fn sample(layout: LayoutMode) -> Option<ScrollSample> {
    let window = web_sys::window()?;
    let viewport_height = window.inner_height().ok()?.as_f64()?;
    let (scroll_top, _, _) = scroll_metrics(layout)?;
    Some(ScrollSample {
        scroll_top,
        viewport_height,
    })
}

fn measure_steps(layout: LayoutMode) -> Vec<StepSpan> {
    let Ok(doc) = dom::document() else {
        return Vec::new();
    };
    let page_y = web_sys::window()
        .and_then(|w| w.scroll_y().ok())
        .unwrap_or(0.0);
    dom::query_all(&doc, ".step")
        .into_iter()
        .filter_map(|el| {
            let id = el.id();
            if id.is_empty() {
                return None;
            }
            let el = el.dyn_into::<HtmlElement>().ok()?;
            Some(match layout {
                LayoutMode::Narrow => {
                    let rect = el.get_bounding_client_rect();
                    StepSpan::from_client_rect(id.into(), page_y, rect.top(), rect.height())
                }
                LayoutMode::Wide => StepSpan::from_offset(
                    id.into(),
                    f64::from(el.offset_top()),
                    f64::from(el.offset_height()),
                ),
            })
        })
        .collect()
}

fn init_scrollytelling() -> Result<(), JsValue> {
    let (layout, first_step_delay) = with_state(|p| {
        let spans = measure_steps(p.layout);
        debug!(steps = spans.len(), "measured steps");
        p.tracker.remeasure(spans);
        Some((p.layout, p.config.timings.first_step_delay.get()))
    })
    .ok_or_else(|| JsValue::from_str("story not booted"))?;

    dom::listen(&scroll_target(layout)?, "scroll", || {
        if with_state(|p| p.scroll_frame.request()) {
            request_frame(on_scroll_frame);
        }
    });
    observe_reveal(".timeline-item", 0.25, true)?;
    wire_initial_figure();

    dom::set_timeout(first_step_delay, enter_section_under_reading_line);
    Ok(())
}

fn request_frame(f: fn()) {
    let Ok(window) = dom::window() else {
        return;
    };
    let cb = Closure::once(f);
    let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
    cb.forget();
}

fn on_scroll_frame() {
    with_state(|p| {
        if !p.scroll_frame.begin_frame() {
            return;
        }
        let Some(sample) = sample(p.layout) else {
            return;
        };
        for event in p.tracker.update(sample) {
            match event {
                StepEvent::Exit { id, direction } => p.story.exit(id.as_str(), direction),
                StepEvent::Enter { id, .. } => p.story.enter(id.as_str()),
            }
        }
    });
}

/// Enters the step under the reading line, or the first step when the line
/// falls between steps. Deliberately not always the first step: a reload
/// mid-story must open on the section in view.
fn enter_section_under_reading_line() {
    with_state(|p| {
        let Some(sample) = sample(p.layout) else {
            return;
        };
        let id = p.tracker.initial_section(sample).cloned();
        if let Some(id) = id {
            info!(section = %id, "initial section");
            p.story.enter(id.as_str());
        }
    });
}

// ---- intro ----

fn start_intro() {
    info!("starting intro");
    if let Err(err) = observe_reveal(".fade-in", 0.2, false) {
        warn!(error = %maplibre::js_error_text(&err), "fade-in observer unavailable");
    }
    if let Err(err) = init_scrollytelling() {
        error!(error = %maplibre::js_error_text(&err), "scroll tracking init failed");
    }
}

/// Adds `visible` to each matching element once it scrolls into view. With
/// `cascade`, the n-th element waits n times the timeline step.
fn observe_reveal(selector: &str, threshold: f64, cascade: bool) -> Result<(), JsValue> {
    let doc = dom::document()?;
    let items = dom::query_all(&doc, selector);
    if items.is_empty() {
        return Ok(());
    }
    let step = with_state(|p| Some(p.config.timings.timeline_cascade)).unwrap_or_default();
    let ordered = items.clone();
    let cb = Closure::<dyn FnMut(js_sys::Array)>::new(move |entries: js_sys::Array| {
        for entry in entries.iter() {
            let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                continue;
            };
            if !entry.is_intersecting() {
                continue;
            }
            let target: Element = entry.target();
            if !cascade {
                dom::set_class(&target, "visible", true);
                continue;
            }
            let index = ordered.iter().position(|e| *e == target).unwrap_or(0);
            let delay = page::reveal_delay(index, step);
            dom::set_timeout(delay.get(), move || dom::set_class(&target, "visible", true));
        }
    });
    let init = IntersectionObserverInit::new();
    init.set_threshold(&JsValue::from_f64(threshold));
    let observer = IntersectionObserver::new_with_options(cb.as_ref().unchecked_ref(), &init)?;
    cb.forget();
    for item in &items {
        observer.observe(item);
    }
    Ok(())
}

// ---- legend ----

fn wire_legend_buttons(doc: &web_sys::Document, toggles: &[foundation::ids::ToggleId]) {
    for id in toggles {
        let Some(btn) = dom::html_by_id(doc, id.as_str()) else {
            continue;
        };
        let id = id.clone();
        dom::listen(&btn, "click", move || {
            let state = with_state(|p| p.story.click_toggle(id.as_str()));
            debug!(toggle = %id, ?state, "legend click");
        });
    }
}

// ---- infographic ----

fn wire_tabs(doc: &web_sys::Document) {
    for btn in dom::query_all(doc, ".tab-btn") {
        let Some(target) = btn.get_attribute("data-target") else {
            continue;
        };
        let clicked = btn.clone();
        dom::listen(&btn, "click", move || select_tab(&clicked, &target));
    }
}

fn select_tab(button: &Element, target: &str) {
    let Ok(doc) = dom::document() else {
        return;
    };
    for el in dom::query_all(&doc, ".tab-btn")
        .into_iter()
        .chain(dom::query_all(&doc, ".tab-content"))
    {
        dom::set_class(&el, "active", false);
    }
    dom::set_class(button, "active", true);
    if let Some(content) = doc.get_element_by_id(target) {
        dom::set_class(&content, "active", true);
    }
    let html = with_state(|p| p.tabs.select(target));
    show_figure(&html);
}

fn wire_initial_figure() {
    let html = with_state(|p| {
        let target = p.tabs.default_target()?.to_string();
        Some(p.tabs.html_for(&target))
    });
    if let Some(html) = html {
        show_figure(&html);
    }
}

fn show_figure(html: &str) {
    match dom::document()
        .ok()
        .and_then(|d| d.get_element_by_id(FIGURE_AREA))
    {
        Some(area) => area.set_inner_html(html),
        None => warn!("figure area not found"),
    }
}

// ---- progress ----

fn wire_progress(layout: LayoutMode) -> Result<(), JsValue> {
    let doc = dom::document()?;
    let (Some(bar), Some(indicator)) = (
        dom::html_by_id(&doc, "progress-bar"),
        dom::html_by_id(&doc, "progress-indicator"),
    ) else {
        return Ok(());
    };
    dom::listen(&scroll_target(layout)?, "scroll", move || {
        let Some((top, height, client)) = scroll_metrics(layout) else {
            return;
        };
        let now = dom::now_ms();
        if let Some(percent) = with_state(|p| p.progress.update(now, top, height, client)) {
            let value = format!("{percent}%");
            dom::set_style(&bar, "width", &value);
            dom::set_style(&indicator, "left", &value);
        }
    });
    Ok(())
}

// ---- resize ----

fn wire_resize(window: &web_sys::Window) {
    dom::listen(window, "resize", || {
        let Some((ticket, wait)) = with_state(|p| Some((p.resize_debounce.poke(), p.resize_debounce.wait())))
        else {
            return;
        };
        dom::set_timeout(wait.get(), move || on_resize_settled(ticket));
    });
}

fn on_resize_settled(ticket: DebounceTicket) {
    let Some(width) = web_sys::window()
        .and_then(|w| w.inner_width().ok())
        .and_then(|w| w.as_f64())
    else {
        return;
    };
    let action = with_state(|p| {
        if !p.resize_debounce.settle(ticket) {
            return None;
        }
        let action = p.resize.on_resize(width);
        if action == ResizeAction::Remeasure {
            let spans = measure_steps(p.layout);
            p.tracker.remeasure(spans);
        }
        Some(action)
    });
    match action {
        Some(ResizeAction::Reload) => {
            info!(width, "layout changed, reloading");
            if let Ok(window) = dom::window() {
                let _ = window.location().reload();
            }
        }
        Some(ResizeAction::Remeasure) => debug!(width, "step positions re-measured"),
        _ => {}
    }
}

// ---- bibliography ----

fn wire_bibliography(doc: &web_sys::Document) {
    let Some(toggle) = doc.query_selector(".bibliography-toggle").ok().flatten() else {
        return;
    };
    render_bibliography();
    dom::listen(&toggle, "click", toggle_bibliography);
}

/// Opens or closes the bibliography drawer.
#[wasm_bindgen]
pub fn toggle_bibliography() {
    let Some((ticket, close_ms)) = with_state(|p| {
        Some((p.bibliography.toggle(), p.config.timings.bibliography_close.get()))
    }) else {
        return;
    };
    render_bibliography();
    if let Some(ticket) = ticket {
        dom::set_timeout(close_ms, move || {
            if with_state(|p| p.bibliography.finish_close(ticket)) {
                render_bibliography();
            }
        });
    }
}

fn render_bibliography() {
    let Ok(doc) = dom::document() else {
        return;
    };
    let (Some(toggle), Some(content)) = (
        doc.query_selector(".bibliography-toggle").ok().flatten(),
        dom::html_by_id(&doc, "bibliography"),
    ) else {
        return;
    };
    let Some(view) = with_state(|p| Some(p.bibliography.view())) else {
        return;
    };
    let _ = toggle.set_attribute("aria-expanded", &view.aria_expanded.to_string());
    let _ = content.set_attribute("aria-hidden", &view.aria_hidden.to_string());
    dom::set_style(&content, "display", if view.displayed { "block" } else { "none" });
    dom::set_class(&content, "closing", view.closing_class);
}

// ---- misc ----

fn preload_images(urls: &[String]) {
    for url in urls {
        match web_sys::HtmlImageElement::new() {
            Ok(img) => img.set_src(url),
            Err(_) => warn!(url = %url, "image preload unavailable"),
        }
    }
}

/// Section the story last entered.
#[wasm_bindgen]
pub fn current_section() -> Option<String> {
    with_state(|p| p.story.current_section().map(|s| s.to_string()))
}

/// Recent story events, one `seq kind message` line each.
#[wasm_bindgen]
pub fn story_trace() -> String {
    with_state(|p| {
        let mut out = String::new();
        for event in p.story.trace().events() {
            let _ = writeln!(out, "{} {} {}", event.seq, event.kind, event.message);
        }
        out
    })
}

/// Counters and gauges as `name=value` lines.
#[wasm_bindgen]
pub fn story_metrics() -> String {
    with_state(|p| p.story.metrics().snapshot().render())
}
