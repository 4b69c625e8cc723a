use wasm_bindgen::prelude::*;
use orrery_engine::*;

mod bodies;
mod sim;
use sim::SolarSystem;

orrery_web::export_sim!(SolarSystem, "solar-system");
