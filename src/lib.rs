// agentdeck - terminal console for coding-agent sessions across git worktrees
//
// Library layout:
// - tui: widgets, the interaction controller and the terminal host loop
// - backend: session/worktree interfaces plus an in-process demo backend
// - theme: palettes (bundled and user TOML files)
// - config, logging, cli: ambient plumbing shared with the binary

pub mod backend;
pub mod cli;
pub mod config;
pub mod logging;
pub mod theme;
pub mod tui;
