//! Box Drop entry point
//!
//! Browser: WebGPU canvas driven by requestAnimationFrame.
//! Native: headless run on the manual scheduler, logging box heights.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent, WheelEvent};

    use box_drop::platform::{AnimationFrameScheduler, start_loop};
    use box_drop::renderer::RenderState;
    use box_drop::sim::{Action, InputState, RapierWorld, Simulation};
    use box_drop::{Camera, OrbitControls, Settings};

    /// Everything the frame loop and the DOM listeners share
    struct App {
        sim: Simulation<RapierWorld>,
        input: InputState,
        controls: OrbitControls,
        renderer: RenderState,
        canvas: HtmlCanvasElement,
        /// Last pointer position while dragging
        drag: Option<(i32, i32)>,
    }

    impl App {
        fn frame(&mut self, timestamp: f64) {
            let App {
                sim,
                input,
                controls,
                renderer,
                ..
            } = self;
            if let Err(e) = sim.frame(input, timestamp, controls, renderer) {
                log::error!("Frame failed: {e}");
            }
        }

        /// Match the backing store to the canvas' CSS size
        fn fit_canvas(&mut self, dpr: f64) {
            let width = (self.canvas.client_width() as f64 * dpr) as u32;
            let height = (self.canvas.client_height() as f64 * dpr) as u32;
            if width == 0 || height == 0 {
                return;
            }
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            self.renderer.resize(width, height);
            self.controls.camera_mut().set_viewport(width, height);
            log::info!("Resized to {width}x{height}");
        }
    }

    fn js_err(e: impl std::fmt::Display) -> JsValue {
        JsValue::from_str(&e.to_string())
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).map_err(js_err)?;

        log::info!("Box Drop starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let dpr = window.device_pixel_ratio();
        let width = ((canvas.client_width() as f64 * dpr) as u32).max(1);
        let height = ((canvas.client_height() as f64 * dpr) as u32).max(1);
        canvas.set_width(width);
        canvas.set_height(height);

        let settings = Settings::load();
        let seed = settings.seed.unwrap_or(js_sys::Date::now() as u64);

        let world = RapierWorld::new(settings.physics.gravity);
        let (sim, layout) = Simulation::new(world, &settings, seed).map_err(js_err)?;
        log::info!("Scene built with seed {seed}: {} boxes", layout.boxes.len());

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(js_err)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(js_err)?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let renderer = RenderState::new(surface, &adapter, width, height, &settings)
            .await
            .map_err(js_err)?;

        let camera = Camera::from_settings(&settings.camera, renderer.aspect());
        let controls = OrbitControls::new(camera, settings.controls.clone());

        let app = Rc::new(RefCell::new(App {
            sim,
            input: InputState::default(),
            controls,
            renderer,
            canvas: canvas.clone(),
            drag: None,
        }));

        setup_keyboard(&window, app.clone())?;
        setup_touch_buttons(&document, app.clone())?;
        setup_orbit(&window, &canvas, app.clone())?;
        setup_resize(&window, app.clone())?;

        let scheduler = Rc::new(AnimationFrameScheduler::new(window));
        let frame_app = app.clone();
        let _frame_loop = start_loop(scheduler, move |timestamp| {
            frame_app.borrow_mut().frame(timestamp);
        });

        log::info!("Box Drop running! Press Space to drop");
        Ok(())
    }

    fn setup_keyboard(window: &web_sys::Window, app: Rc<RefCell<App>>) -> Result<(), JsValue> {
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(action) = Action::from_key(&event.key()) {
                    // Space and arrows would otherwise scroll the page
                    event.prevent_default();
                    app.borrow_mut().input.press(action);
                }
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(action) = Action::from_key(&event.key()) {
                    app.borrow_mut().input.release(action);
                }
            });
            window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    /// On-screen buttons tagged with `data-action`
    fn setup_touch_buttons(document: &web_sys::Document, app: Rc<RefCell<App>>) -> Result<(), JsValue> {
        let nodes = document.query_selector_all("[data-action]")?;
        for i in 0..nodes.length() {
            let Some(element) = nodes.get(i).and_then(|n| n.dyn_into::<web_sys::Element>().ok()) else {
                continue;
            };
            let Some(name) = element.get_attribute("data-action") else {
                continue;
            };
            let Some(action) = Action::from_name(&name) else {
                log::warn!("Unknown data-action: {name}");
                continue;
            };

            {
                let app = app.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                    event.prevent_default();
                    app.borrow_mut().input.press(action);
                });
                element.add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref())?;
                closure.forget();
            }

            for kind in ["touchend", "touchcancel"] {
                let app = app.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                    event.prevent_default();
                    app.borrow_mut().input.release(action);
                });
                element.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
                closure.forget();
            }
        }
        Ok(())
    }

    /// Mouse drag orbits, wheel dollies
    fn setup_orbit(
        window: &web_sys::Window,
        canvas: &HtmlCanvasElement,
        app: Rc<RefCell<App>>,
    ) -> Result<(), JsValue> {
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                app.borrow_mut().drag = Some((event.client_x(), event.client_y()));
            });
            canvas.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut app = app.borrow_mut();
                if let Some((x, y)) = app.drag {
                    let (nx, ny) = (event.client_x(), event.client_y());
                    app.controls.rotate((nx - x) as f32, (ny - y) as f32);
                    app.drag = Some((nx, ny));
                }
            });
            window.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                app.borrow_mut().drag = None;
            });
            window.add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: WheelEvent| {
                event.prevent_default();
                app.borrow_mut().controls.zoom(event.delta_y() as f32);
            });
            canvas.add_event_listener_with_callback("wheel", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    fn setup_resize(window: &web_sys::Window, app: Rc<RefCell<App>>) -> Result<(), JsValue> {
        let win = window.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            app.borrow_mut().fit_canvas(win.device_pixel_ratio());
        });
        window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_app::run().await {
        log::error!("Start-up failed: {:?}", e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::RefCell;
    use std::rc::Rc;

    use box_drop::consts::FIXED_STEP;
    use box_drop::platform::{ManualScheduler, start_loop};
    use box_drop::sim::{
        Action, EntityKind, EntityRegistry, FrameRenderer, InputState, RapierWorld, Simulation,
    };
    use box_drop::{Camera, OrbitControls, Settings, SimError};

    /// Tick (1-based) from which `drop` is held
    const DROP_TICK: u64 = 6;
    /// Seed used when settings leave it open
    const DEFAULT_SEED: u64 = 2024;
    const LOG_EVERY: u64 = 60;

    /// Stands in for the GPU: reports box heights now and then
    #[derive(Default)]
    struct HeightLogger {
        frames: u64,
    }

    impl FrameRenderer for HeightLogger {
        fn render_frame(&mut self, entities: &EntityRegistry, _camera: &Camera) {
            self.frames += 1;
            if self.frames % LOG_EVERY != 0 {
                return;
            }
            let heights: Vec<f32> = entities
                .iter()
                .filter(|e| e.kind == EntityKind::Box && e.is_active())
                .map(|e| e.visual.position.y)
                .collect();
            if heights.is_empty() {
                log::info!("frame {}: boxes withheld", self.frames);
                return;
            }
            let lowest = heights.iter().copied().fold(f32::INFINITY, f32::min);
            let highest = heights.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            log::info!(
                "frame {}: {} boxes, y in [{lowest:.2}, {highest:.2}]",
                self.frames,
                heights.len()
            );
        }
    }

    /// Whether the tick following `completed` finished frames holds `drop`
    fn holds_drop(completed: u64) -> bool {
        completed + 1 >= DROP_TICK
    }

    struct Headless {
        sim: Simulation<RapierWorld>,
        input: InputState,
        controls: OrbitControls,
        renderer: HeightLogger,
        error: Option<SimError>,
    }

    pub fn run(frames: u32) -> Result<(), SimError> {
        let settings = Settings::load();
        let seed = settings.seed.unwrap_or(DEFAULT_SEED);
        let world = RapierWorld::new(settings.physics.gravity);
        let (sim, layout) = Simulation::new(world, &settings, seed)?;
        log::info!("Scene built with seed {seed}: {} boxes", layout.boxes.len());

        let camera = Camera::from_settings(&settings.camera, 16.0 / 9.0);
        let state = Rc::new(RefCell::new(Headless {
            sim,
            input: InputState::default(),
            controls: OrbitControls::new(camera, settings.controls.clone()),
            renderer: HeightLogger::default(),
            error: None,
        }));

        let scheduler = Rc::new(ManualScheduler::new());
        let frame_state = state.clone();
        let frame_loop = start_loop(scheduler.clone(), move |timestamp| {
            let mut guard = frame_state.borrow_mut();
            let Headless {
                sim,
                input,
                controls,
                renderer,
                error,
            } = &mut *guard;
            if holds_drop(sim.frames()) && !input.is_active(Action::Drop) {
                log::info!("Holding drop from tick {}", sim.frames() + 1);
                input.press(Action::Drop);
            }
            if let Err(e) = sim.frame(input, timestamp, controls, renderer) {
                *error = Some(e);
            }
        });

        let frame_ms = FIXED_STEP as f64 * 1000.0;
        for i in 0..frames {
            if !scheduler.fire(i as f64 * frame_ms) {
                break;
            }
            if let Some(e) = state.borrow_mut().error.take() {
                frame_loop.cancel();
                return Err(e);
            }
        }
        frame_loop.cancel();

        let state = state.borrow();
        log::info!(
            "Done after {} frames, {} bodies in the world",
            state.sim.frames(),
            state.sim.world.active_body_count()
        );
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_drop_held_from_sixth_tick() {
            // `completed` is 5 while the sixth tick runs
            assert!(!holds_drop(4));
            assert!(holds_drop(5));
            assert!(holds_drop(6));
        }

        #[test]
        fn test_headless_run_drops_boxes() {
            assert!(run(20).is_ok());
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Box Drop (native, headless) starting...");

    if let Err(e) = headless::run(600) {
        log::error!("Headless run failed: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
