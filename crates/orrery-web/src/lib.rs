pub mod label;
pub mod runner;

pub use label::DomLabel;
pub use runner::SimRunner;

/// Generate all `#[wasm_bindgen]` exports for a simulation.
///
/// Expands to:
/// - `thread_local!` storage for the SimRunner
/// - `with_runner()` helper function
/// - wasm-bindgen exports (sim_init, sim_tick, input handlers, label binding, buffer accessors)
///
/// # Usage
///
/// ```ignore
/// use wasm_bindgen::prelude::*;
/// use orrery_engine::*;
///
/// mod sim;
/// use sim::SolarSystem;
///
/// orrery_web::export_sim!(SolarSystem, "solar-system");
/// ```
///
/// # Arguments
///
/// - `$sim_type`: a type implementing `orrery_engine::Simulation` with a `new()` constructor
/// - `$sim_name`: a string literal used in log messages
#[macro_export]
macro_rules! export_sim {
    ($sim_type:ty, $sim_name:literal) => {
        use std::cell::RefCell;

        thread_local! {
            static RUNNER: RefCell<Option<$crate::SimRunner<$sim_type>>> = RefCell::new(None);
        }

        /// Run `f` against the runner. Calls made before `sim_init` are dropped with a warning.
        fn with_runner<R: Default>(f: impl FnOnce(&mut $crate::SimRunner<$sim_type>) -> R) -> R {
            RUNNER.with(|cell| match cell.borrow_mut().as_mut() {
                Some(runner) => f(runner),
                None => {
                    log::warn!("{}: call before sim_init()", $sim_name);
                    R::default()
                }
            })
        }

        #[wasm_bindgen]
        pub fn sim_init() {
            console_error_panic_hook::set_once();
            let _ = console_log::init_with_level(log::Level::Info);

            let sim = <$sim_type>::new();
            let runner = $crate::SimRunner::new(sim);

            RUNNER.with(|cell| {
                *cell.borrow_mut() = Some(runner);
            });

            with_runner(|r| r.init());
            log::info!("{}: initialized", $sim_name);
        }

        #[wasm_bindgen]
        pub fn sim_tick(dt: f32) {
            with_runner(|r| r.tick(dt));
        }

        #[wasm_bindgen]
        pub fn sim_resize(width: f32, height: f32) {
            with_runner(|r| r.push_input(InputEvent::Resize { width, height }));
        }

        #[wasm_bindgen]
        pub fn sim_pointer_down(x: f32, y: f32) {
            with_runner(|r| r.push_input(InputEvent::PointerDown { x, y }));
        }

        #[wasm_bindgen]
        pub fn sim_pointer_up(x: f32, y: f32) {
            with_runner(|r| r.push_input(InputEvent::PointerUp { x, y }));
        }

        #[wasm_bindgen]
        pub fn sim_pointer_move(x: f32, y: f32) {
            with_runner(|r| r.push_input(InputEvent::PointerMove { x, y }));
        }

        #[wasm_bindgen]
        pub fn sim_wheel(delta: f32) {
            with_runner(|r| r.push_input(InputEvent::Wheel { delta }));
        }

        #[wasm_bindgen]
        pub fn sim_key_down(key_code: u32) {
            with_runner(|r| r.push_input(InputEvent::KeyDown { key_code }));
        }

        #[wasm_bindgen]
        pub fn sim_key_up(key_code: u32) {
            with_runner(|r| r.push_input(InputEvent::KeyUp { key_code }));
        }

        #[wasm_bindgen]
        pub fn sim_custom_event(kind: u32, a: f32, b: f32, c: f32) {
            with_runner(|r| r.push_input(InputEvent::Custom { kind, a, b, c }));
        }

        // ---- Labels ----

        /// Body ids that want a DOM label, in registration order.
        #[wasm_bindgen]
        pub fn sim_label_ids() -> js_sys::Uint32Array {
            let ids = with_runner(|r| r.label_body_ids());
            js_sys::Uint32Array::from(ids.as_slice())
        }

        #[wasm_bindgen]
        pub fn sim_body_name(body: u32) -> Option<String> {
            with_runner(|r| r.body_name(body))
        }

        #[wasm_bindgen]
        pub fn sim_attach_label(body: u32, element: web_sys::HtmlElement) -> bool {
            with_runner(|r| r.attach_label(body, Box::new($crate::DomLabel(element))))
        }

        // ---- State ----

        #[wasm_bindgen]
        pub fn sim_time_years() -> f64 {
            with_runner(|r| r.time_years())
        }

        #[wasm_bindgen]
        pub fn sim_selected() -> u32 {
            with_runner(|r| r.selected())
        }

        #[wasm_bindgen]
        pub fn sim_camera_distance_au() -> f64 {
            with_runner(|r| r.camera_distance_au())
        }

        // ---- Buffer accessors ----

        #[wasm_bindgen]
        pub fn get_camera_ptr() -> *const f32 {
            with_runner(|r| Some(r.camera_ptr())).unwrap_or(std::ptr::null())
        }

        #[wasm_bindgen]
        pub fn get_instance_group_count() -> u32 {
            with_runner(|r| r.instance_group_count())
        }

        #[wasm_bindgen]
        pub fn get_instance_group_ptr(group: u32) -> *const f32 {
            with_runner(|r| Some(r.instance_group_ptr(group))).unwrap_or(std::ptr::null())
        }

        #[wasm_bindgen]
        pub fn get_instance_group_len(group: u32) -> u32 {
            with_runner(|r| r.instance_group_len(group))
        }

        #[wasm_bindgen]
        pub fn get_instance_group_key(group: u32) -> u32 {
            with_runner(|r| r.instance_group_key(group))
        }

        #[wasm_bindgen]
        pub fn get_instance_group_version(group: u32) -> f64 {
            with_runner(|r| r.instance_group_version(group))
        }

        #[wasm_bindgen]
        pub fn get_static_lines_ptr() -> *const f32 {
            with_runner(|r| Some(r.static_lines_ptr())).unwrap_or(std::ptr::null())
        }

        #[wasm_bindgen]
        pub fn get_static_line_vertex_count() -> u32 {
            with_runner(|r| r.static_line_vertex_count())
        }

        #[wasm_bindgen]
        pub fn get_trail_positions_ptr() -> *const f32 {
            with_runner(|r| Some(r.trail_positions_ptr())).unwrap_or(std::ptr::null())
        }

        #[wasm_bindgen]
        pub fn get_trail_colors_ptr() -> *const f32 {
            with_runner(|r| Some(r.trail_colors_ptr())).unwrap_or(std::ptr::null())
        }

        #[wasm_bindgen]
        pub fn get_trail_indices_ptr() -> *const u32 {
            with_runner(|r| Some(r.trail_indices_ptr())).unwrap_or(std::ptr::null())
        }

        #[wasm_bindgen]
        pub fn get_trail_index_count() -> u32 {
            with_runner(|r| r.trail_index_count())
        }

        #[wasm_bindgen]
        pub fn get_trail_vertex_capacity() -> u32 {
            with_runner(|r| r.trail_vertex_capacity())
        }
    };
}
