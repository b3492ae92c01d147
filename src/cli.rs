//! CLI domain: parse, route, output, and presentation only.
//! No telemetry logic lives here; the route table calls into the library.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{CallArgs, Cli, Commands};
pub use presentation::{
    format_config_toml, format_outcome, format_record_json, format_services_json,
    format_services_text,
};
pub use route::RunContext;
