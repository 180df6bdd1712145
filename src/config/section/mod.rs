//! Configuration section definitions.
//!
//! Each module corresponds to a section in `devwatch.toml`:
//!
//! | Module   | TOML Section           | Purpose                              |
//! |----------|------------------------|--------------------------------------|
//! | `serve`  | `[serve]`              | Dev server for the renderer          |
//! | `target` | `[main]`, `[worker]`   | Watch-build targets                  |
//! | `host`   | `[host]`               | Host process launch                  |

mod host;
mod serve;
mod target;

pub use host::HostConfig;
pub use serve::ServeConfig;
pub use target::{Section, Strategy, TargetConfig};
