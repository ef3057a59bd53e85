pub mod controls;
pub mod debug;
pub mod preview;
pub mod results;
pub mod text_input;
