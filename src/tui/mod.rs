// TUI module - Terminal User Interface
//
// Everything renders to plain strings with SGR escapes; there is no widget
// toolkit underneath. Building blocks, bottom-up:
// - text: display-width measurement, truncation, padding, wrapping
// - editor, dropdown: focusable input widgets
// - scrollback, overlay: output windowing and frame composition
// - focus, toast, scheduler, scroll, output: controller state pieces
// - controller: pure event -> requests state machine that renders frames
// - runtime: owns the terminal and executes controller requests

pub mod clipboard;
pub mod controller;
pub mod dropdown;
pub mod editor;
pub mod focus;
pub mod layout;
pub mod markdown;
pub mod output;
pub mod overlay;
pub mod runtime;
pub mod scheduler;
pub mod scroll;
pub mod scrollback;
pub mod text;
pub mod toast;
pub mod views;

pub use controller::{Controller, ControllerConfig};
pub use runtime::run;
