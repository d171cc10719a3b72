mod gui;
mod shape;

pub use gui::{CowsayGui, GuiEvent};
