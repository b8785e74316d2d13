//! Mic Bounce entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use web_sys::{HtmlCanvasElement, HtmlInputElement};

    use mic_bounce::FrameSnapshot;
    use mic_bounce::audio::{MicInput, PERMISSION_MESSAGE};
    use mic_bounce::consts::FX_HEIGHT;
    use mic_bounce::frame::FrameLoop;
    use mic_bounce::platform::web::{self, AnimationFrame};
    use mic_bounce::renderer::{Batch, RenderError, RenderState};
    use mic_bounce::settings::{Settings, SharedThreshold};
    use mic_bounce::sim::{Lane, Phase};

    struct App {
        frame_loop: FrameLoop<MicInput>,
        threshold: SharedThreshold,
        settings: Settings,
        render_state: Option<RenderState>,
        batch: Batch,
        raf: Option<AnimationFrame>,
    }

    impl App {
        fn new(settings: Settings, seed: u64) -> Self {
            let threshold = settings.threshold_cell();
            let mut frame_loop = FrameLoop::new(threshold.clone(), seed);
            frame_loop.set_fireworks_enabled(settings.fireworks);
            Self {
                frame_loop,
                threshold,
                settings,
                render_state: None,
                batch: Batch::new(),
                raf: None,
            }
        }

        fn is_running(&self) -> bool {
            self.raf.as_ref().is_some_and(AnimationFrame::is_running)
        }

        /// Run one display frame
        fn frame(&mut self, time: f64) {
            self.frame_loop.set_lane(read_lane());
            let snapshot = *self.frame_loop.frame(time, &mut self.batch);

            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&self.batch) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        let (w, h) = render_state.size;
                        let scale = render_state.scale;
                        render_state.resize(w, h, scale);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }

            self.update_hud(&snapshot);
        }

        /// Publish the snapshot to the DOM
        fn update_hud(&self, snapshot: &FrameSnapshot) {
            web::set_style("ball", "top", &format!("{}px", snapshot.y));

            web::set_style(
                "level-bar",
                "transform",
                &format!("scaleX({})", snapshot.level_unit),
            );
            web::set_style(
                "level-marker",
                "left",
                &format!("calc({:.2}% - 1px)", snapshot.threshold_unit * 100.0),
            );
            web::set_text("level-label", &format!("{:.1} dB", snapshot.level.db));
            web::set_text("threshold-value", &format!("{:.3} RMS", snapshot.threshold));
            web::set_text("threshold-db", &format!("{:.1} dB", snapshot.threshold_db));

            web::set_hidden("start-overlay", snapshot.phase != Phase::Idle);
            web::set_hidden("gameover-overlay", snapshot.phase != Phase::GameOver);

            web::set_hidden("hud-fps", !self.settings.show_fps);
            if self.settings.show_fps {
                web::set_text("hud-fps", &snapshot.fps.to_string());
            }
        }

        /// Stop the loop, cancel the restart and release the microphone
        fn teardown(&mut self) {
            if let Some(raf) = self.raf.take() {
                raf.cancel();
            }
            if let Some(mut mic) = self.frame_loop.teardown() {
                mic.close();
            }
        }
    }

    /// Lane size in CSS pixels: page width by game container height
    fn read_lane() -> Lane {
        let Some(window) = web_sys::window() else {
            return Lane::default();
        };
        let width = window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(800.0) as f32;
        let height = web::element("game")
            .map(|el| el.client_height() as f32)
            .filter(|h| *h > 0.0)
            .or_else(|| window.inner_height().ok().and_then(|v| v.as_f64()).map(|h| h as f32))
            .unwrap_or(500.0);
        Lane::new(width, height)
    }

    /// Size the fireworks canvas to the viewport width and a fixed height,
    /// accounting for device pixel density. Returns (width, height, dpr).
    fn size_canvas(canvas: &HtmlCanvasElement) -> (u32, u32, f32) {
        let Some(window) = web_sys::window() else {
            return (canvas.width(), canvas.height(), 1.0);
        };
        let dpr = window.device_pixel_ratio().max(1.0);
        let css_width = window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(800.0);
        let width = (css_width * dpr).floor() as u32;
        let height = (FX_HEIGHT as f64 * dpr).floor() as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        (width, height, dpr as f32)
    }

    async fn init_renderer(canvas: &HtmlCanvasElement) -> Result<RenderState, RenderError> {
        let (width, height, dpr) = size_canvas(canvas);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });
        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);
        RenderState::new(surface, &adapter, width, height, dpr).await
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Mic Bounce starting...");

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let app = Rc::new(RefCell::new(App::new(settings, seed)));

        if let Some(canvas) = web::element("fx-canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        {
            match init_renderer(&canvas).await {
                Ok(render_state) => app.borrow_mut().render_state = Some(render_state),
                Err(e) => log::warn!("Fireworks disabled, GPU setup failed: {}", e),
            }
            setup_resize(canvas, app.clone());
        } else {
            log::warn!("No #fx-canvas element; fireworks will not be drawn");
        }

        setup_threshold_slider(app.clone());
        setup_start_button(app.clone());
        setup_teardown(app.clone());

        // First HUD pass so the idle overlay and labels are correct
        let snapshot = *app.borrow().frame_loop.snapshot();
        app.borrow().update_hud(&snapshot);

        log::info!("Mic Bounce ready");
    }

    fn setup_resize(canvas: HtmlCanvasElement, app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        web::listen(&window, "resize", move |_event| {
            let (width, height, dpr) = size_canvas(&canvas);
            if let Some(ref mut render_state) = app.borrow_mut().render_state {
                render_state.resize(width, height, dpr);
            }
        });
    }

    fn setup_threshold_slider(app: Rc<RefCell<App>>) {
        let Some(slider) = web::element("threshold")
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        else {
            log::warn!("No #threshold slider");
            return;
        };
        slider.set_value(&format!("{:.3}", app.borrow().threshold.get()));

        let input = slider.clone();
        web::listen(&slider, "input", move |_event| {
            let Ok(value) = input.value().parse::<f32>() else {
                return;
            };
            let mut a = app.borrow_mut();
            // Shared cell: a running loop also reads this on its next frame
            let stored = a.threshold.set(value);
            a.settings.threshold = stored;
            a.settings.save();
            let snapshot = *a.frame_loop.refresh_threshold();
            a.update_hud(&snapshot);
        });
    }

    fn setup_start_button(app: Rc<RefCell<App>>) {
        let Some(button) = web::element("start-btn") else {
            log::warn!("No #start-btn");
            return;
        };
        web::listen(&button, "click", move |_event| {
            let app = app.clone();
            web::set_hidden("start-error", true);
            wasm_bindgen_futures::spawn_local(async move {
                match MicInput::open().await {
                    Ok(mic) => start_playing(&app, mic),
                    Err(e) => {
                        log::error!("{}", e);
                        web::set_text("start-error", PERMISSION_MESSAGE);
                        web::set_hidden("start-error", false);
                    }
                }
            });
        });
    }

    fn start_playing(app: &Rc<RefCell<App>>, mic: MicInput) {
        let mut a = app.borrow_mut();
        if let Some(mut previous) = a.frame_loop.attach_source(mic) {
            previous.close();
        }
        a.frame_loop.start(web::now_ms());

        if !a.is_running() {
            let app_tick = app.clone();
            a.raf = Some(AnimationFrame::start(move |time| {
                app_tick.borrow_mut().frame(time);
            }));
        }
    }

    fn setup_teardown(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        web::listen(&window, "pagehide", move |_event| {
            app.borrow_mut().teardown();
        });
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_app::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Mic Bounce (native) starting...");
    log::info!("Native mode runs a headless demo - run with `trunk serve` for the web version");

    let seconds = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(20);
    demo::run(seconds);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless run against a scripted clap pattern: claps for the first half,
/// silence afterwards so the ball drops and the restart kicks in.
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use mic_bounce::frame::FrameLoop;
    use mic_bounce::platform::SyntheticSource;
    use mic_bounce::renderer::Batch;
    use mic_bounce::settings::Settings;
    use mic_bounce::sim::{Lane, Phase};

    const FRAME_MS: f64 = 1000.0 / 60.0;

    pub fn run(seconds: u32) {
        let settings = Settings::load();
        let mut frame_loop = FrameLoop::new(settings.threshold_cell(), 0x5eed);
        frame_loop.set_fireworks_enabled(settings.fireworks);
        frame_loop.set_lane(Lane::new(1280.0, 720.0));
        // One 3-frame clap every 1.5 s
        frame_loop.attach_source(SyntheticSource::claps(0.3, 90, 3));
        frame_loop.start(0.0);

        let mut batch = Batch::new();
        let total_frames = (seconds as f64 * 1000.0 / FRAME_MS) as u32;
        let quiet_from = total_frames / 2;
        let (mut bounces, mut game_overs, mut peak_vertices) = (0u32, 0u32, 0usize);
        let mut last_phase = Phase::Playing;

        for i in 1..=total_frames {
            if i == quiet_from {
                log::info!("Going quiet at {:.1}s", i as f64 * FRAME_MS / 1000.0);
                frame_loop.attach_source(SyntheticSource::silence());
            }

            let now = i as f64 * FRAME_MS;
            let snapshot = *frame_loop.frame(now, &mut batch);
            peak_vertices = peak_vertices.max(batch.additive.len());

            if snapshot.bounced {
                bounces += 1;
                log::debug!("Bounce at {:.2}s ({:.1} dB)", now / 1000.0, snapshot.level.db);
            }
            if snapshot.game_over {
                game_overs += 1;
            }
            if snapshot.phase != last_phase {
                log::info!("{:.2}s: {} -> {}", now / 1000.0, last_phase.as_str(), snapshot.phase.as_str());
                last_phase = snapshot.phase;
            }
        }

        frame_loop.teardown();
        println!(
            "{} frames: {} bounces, {} game overs, peak {} spark vertices",
            total_frames, bounces, game_overs, peak_vertices
        );
    }
}
